// ==========================================
// 产线 OEE 指标监控系统 - 告警仓储
// ==========================================
// 职责: alerts 表的写入、分页查询、确认
// 红线: 确认只允许 acknowledged 0 → 1，不提供其他修改
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::{Alert, AlertSeverity, NewAlert};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "SELECT id, time, kpi_name, severity, message, acknowledged FROM alerts";

pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入告警，返回带 id 的告警
    pub fn insert(&self, alert: NewAlert) -> RepositoryResult<Alert> {
        let conn = self.get_conn()?;
        let id = insert_in(&conn, &alert)?;
        Ok(alert.into_alert(id))
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let found = conn
            .query_row(&sql, params![id], |row| Ok(map_row(row)))
            .optional()?;
        found.transpose()
    }

    /// 分页查询（按 id 升序）
    pub fn list(&self, skip: u32, limit: u32) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY id ASC LIMIT ?1 OFFSET ?2", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![limit, skip], |row| Ok(map_row(row)))?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter().collect()
    }

    /// 确认告警（幂等）
    ///
    /// # 返回
    /// - Ok(()): 已确认（重复确认同样成功）
    /// - Err(NotFound): id 不存在，不修改任何行
    pub fn acknowledge(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE alerts SET acknowledged = 1 WHERE id = ?1",
            params![id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Alert".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 告警总数
    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

/// 在给定连接/事务上写入告警，返回自增 id
pub fn insert_in(conn: &Connection, alert: &NewAlert) -> RepositoryResult<i64> {
    conn.execute(
        r#"
        INSERT INTO alerts (time, kpi_name, severity, message, acknowledged)
        VALUES (?1, ?2, ?3, ?4, 0)
        "#,
        params![
            format_ts(&alert.time),
            alert.kpi_name,
            alert.severity.as_str(),
            alert.message,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 查询某 KPI 在 (since, until] 内最近一次告警时间（告警抑制使用）
pub fn latest_alert_time_in(
    conn: &Connection,
    kpi_name: &str,
    since: &DateTime<Utc>,
    until: &DateTime<Utc>,
) -> RepositoryResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = conn.query_row(
        r#"
        SELECT MAX(time) FROM alerts
        WHERE kpi_name = ?1 AND time > ?2 AND time <= ?3
        "#,
        params![kpi_name, format_ts(since), format_ts(until)],
        |row| row.get(0),
    )?;
    Ok(raw.as_deref().and_then(parse_ts))
}

fn map_row(row: &Row) -> RepositoryResult<Alert> {
    let raw_time: String = row.get(1)?;
    let raw_severity: String = row.get(3)?;
    let acknowledged: i64 = row.get(5)?;

    Ok(Alert {
        id: row.get(0)?,
        time: parse_ts(&raw_time).ok_or_else(|| RepositoryError::FieldValueError {
            field: "time".to_string(),
            message: format!("无法解析时间戳: {}", raw_time),
        })?,
        kpi_name: row.get(2)?,
        severity: raw_severity
            .parse::<AlertSeverity>()
            .map_err(|message| RepositoryError::FieldValueError {
                field: "severity".to_string(),
                message,
            })?,
        message: row.get(4)?,
        acknowledged: acknowledged != 0,
    })
}
