// ==========================================
// 产线 OEE 指标监控系统 - KPI 值仓储
// ==========================================
// 职责: kpi_values 表的写入（只追加）与查询
// 说明: 引擎写入走 insert_in，使用调用方传入的事务
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::{KpiName, KpiStatus, KpiValue, TimeWindow};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct KpiValueRepository {
    conn: Arc<Mutex<Connection>>,
}

impl KpiValueRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询某 KPI 在窗口内的值（按时间升序）
    pub fn find_in_window(
        &self,
        kpi_name: KpiName,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<KpiValue>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT time, kpi_name, value, status
            FROM kpi_values
            WHERE kpi_name = ?1 AND time BETWEEN ?2 AND ?3
            ORDER BY time ASC, id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![
                    kpi_name.as_str(),
                    format_ts(&window.start()),
                    format_ts(&window.end())
                ],
                |row| Ok(map_row(row)),
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter().collect()
    }

    /// 查询某 KPI 最近一次写入的值
    pub fn find_latest(&self, kpi_name: KpiName) -> RepositoryResult<Option<KpiValue>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT time, kpi_name, value, status
            FROM kpi_values
            WHERE kpi_name = ?1
            ORDER BY time DESC, id DESC
            LIMIT 1
            "#,
        )?;

        match stmt.query_row(params![kpi_name.as_str()], |row| Ok(map_row(row))) {
            Ok(value) => value.map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按时间戳统计条数（校验“一次计算写入 4 行”）
    pub fn count_at(&self, time: &chrono::DateTime<chrono::Utc>) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM kpi_values WHERE time = ?1",
            params![format_ts(time)],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }
}

/// 在给定连接/事务上写入 KPI 值
pub fn insert_in(conn: &Connection, value: &KpiValue) -> RepositoryResult<i64> {
    conn.execute(
        r#"
        INSERT INTO kpi_values (time, kpi_name, value, status)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            format_ts(&value.time),
            value.kpi_name.as_str(),
            value.value,
            value.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_row(row: &Row) -> RepositoryResult<KpiValue> {
    let raw_time: String = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_status: String = row.get(3)?;

    Ok(KpiValue {
        time: parse_ts(&raw_time).ok_or_else(|| RepositoryError::FieldValueError {
            field: "time".to_string(),
            message: format!("无法解析时间戳: {}", raw_time),
        })?,
        kpi_name: raw_name
            .parse()
            .map_err(|message| RepositoryError::FieldValueError {
                field: "kpi_name".to_string(),
                message,
            })?,
        value: row.get(2)?,
        status: raw_status
            .parse::<KpiStatus>()
            .map_err(|message| RepositoryError::FieldValueError {
                field: "status".to_string(),
                message,
            })?,
    })
}
