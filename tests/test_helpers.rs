// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、读数场景生成、行数统计
// ==========================================
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use oee_kpi_monitor::db::{init_schema, open_sqlite_connection};
use oee_kpi_monitor::domain::{SensorReading, TimeWindow};
use oee_kpi_monitor::repository::reading_repo;
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 测试窗口起点
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
}

/// 60 个每分钟采样点构成的窗口 [base, base + 59min]
pub fn hour_window() -> TimeWindow {
    TimeWindow::new(base_time(), base_time() + Duration::minutes(59)).unwrap()
}

/// 写入一组同时刻的 STATUS/SPEED/QUALITY 读数
pub fn insert_sample(
    conn: &Connection,
    at: DateTime<Utc>,
    status: f64,
    speed: f64,
    quality: f64,
) -> Result<(), Box<dyn Error>> {
    for reading in [
        SensorReading::new(at, "STATUS001", status, "binary"),
        SensorReading::new(at, "SPEED001", speed, "units/hour"),
        SensorReading::new(at, "QUALITY001", quality, "ratio"),
    ] {
        reading_repo::insert_in(conn, &reading)?;
    }
    Ok(())
}

/// 标准场景: 60 个采样点，前 45 个运行；速度 90；合格率 0.98
pub fn seed_reference_scenario(conn: &Connection) -> Result<(), Box<dyn Error>> {
    for i in 0..60 {
        let status = if i < 45 { 1.0 } else { 0.0 };
        insert_sample(conn, base_time() + Duration::minutes(i), status, 90.0, 0.98)?;
    }
    Ok(())
}

/// 表行数
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}
