// ==========================================
// 产线 OEE 指标监控系统 - 传感器读数仓储
// ==========================================
// 职责: sensor_readings 表的写入与明细查询（采集侧使用）
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::{SensorReading, TimeWindow};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SensorReadingRepository - 读数仓储
// ==========================================
pub struct SensorReadingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SensorReadingRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入单条读数
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 同一传感器同一时刻已有读数
    pub fn insert(&self, reading: &SensorReading) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_in(&conn, reading)
    }

    /// 批量写入（单事务，全部成功或全部回滚）
    pub fn batch_insert(&self, readings: &[SensorReading]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for reading in readings {
            insert_in(&tx, reading)?;
        }

        tx.commit()?;
        Ok(readings.len())
    }

    /// 查询某传感器在窗口内的读数（按时间升序）
    pub fn find_by_sensor_in_window(
        &self,
        sensor_id: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<SensorReading>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT time, sensor_id, value, unit
            FROM sensor_readings
            WHERE sensor_id = ?1 AND time BETWEEN ?2 AND ?3
            ORDER BY time ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![sensor_id, format_ts(&window.start()), format_ts(&window.end())],
                |row| Ok(map_row(row)),
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter().collect()
    }

    /// 读数总条数
    pub fn count_all(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM sensor_readings", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

/// 在给定连接/事务上写入读数
pub fn insert_in(conn: &Connection, reading: &SensorReading) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO sensor_readings (time, sensor_id, value, unit)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            format_ts(&reading.time),
            reading.sensor_id,
            reading.value,
            reading.unit,
        ],
    )?;
    Ok(())
}

fn map_row(row: &Row) -> RepositoryResult<SensorReading> {
    let raw_time: String = row.get(0)?;
    let time = parse_ts(&raw_time).ok_or_else(|| RepositoryError::FieldValueError {
        field: "time".to_string(),
        message: format!("无法解析时间戳: {}", raw_time),
    })?;

    Ok(SensorReading {
        time,
        sensor_id: row.get(1)?,
        value: row.get(2)?,
        unit: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::{Duration, TimeZone, Utc};

    fn setup_repo() -> SensorReadingRepository {
        SensorReadingRepository::new(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_insert_and_find_in_window() {
        let repo = setup_repo();
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        for m in 0..5 {
            repo.insert(&SensorReading::new(base + Duration::minutes(m), "SPEED001", 80.0 + m as f64, "units/hour"))
                .unwrap();
        }

        let window = TimeWindow::new(base + Duration::minutes(1), base + Duration::minutes(3)).unwrap();
        let found = repo.find_by_sensor_in_window("SPEED001", &window).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].value, 81.0);
        assert_eq!(found[0].unit, "units/hour");
        assert_eq!(found[2].time, base + Duration::minutes(3));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let repo = setup_repo();
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        repo.insert(&SensorReading::new(ts, "STATUS001", 1.0, "binary")).unwrap();
        // 同一时刻不同传感器允许
        repo.insert(&SensorReading::new(ts, "SPEED001", 80.0, "units/hour")).unwrap();

        let err = repo
            .insert(&SensorReading::new(ts, "STATUS001", 0.0, "binary"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_batch_insert_rolls_back_on_conflict() {
        let repo = setup_repo();
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let batch = vec![
            SensorReading::new(ts, "STATUS001", 1.0, "binary"),
            SensorReading::new(ts + Duration::minutes(1), "STATUS001", 1.0, "binary"),
            SensorReading::new(ts, "STATUS001", 0.0, "binary"),
        ];
        assert!(repo.batch_insert(&batch).is_err());
        assert_eq!(repo.count_all().unwrap(), 0);

        assert_eq!(repo.batch_insert(&batch[..2]).unwrap(), 2);
        assert_eq!(repo.count_all().unwrap(), 2);
    }
}
