// ==========================================
// 产线 OEE 指标监控系统 - 读数查询访问器
// ==========================================
// 职责: 按传感器 + 时间窗口对读数做计数/均值聚合
// 约束:
// - 窗口两端闭区间，计数与均值一致
// - 无匹配行返回 None（NoData），不是 0
// - 每次查询有超时上限，超时以 QueryTimeout 返回
// - 连接由调用方持有并借给访问器，访问器不保存任何共享状态
// ==========================================

use crate::db::format_ts;
use crate::domain::TimeWindow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::time::{Duration, Instant};

/// progress handler 的检查粒度（SQLite 虚拟机指令数）
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// 读数值过滤条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueFilter {
    /// 不过滤
    Any,
    /// value >= x
    AtLeast(f64),
}

/// 门控条件: 仅统计“门控传感器同一时刻满足条件”的读数
///
/// 典型用法: 只统计设备运行时（STATUS001 >= 1）的速度读数
#[derive(Debug, Clone, PartialEq)]
pub struct SensorGate {
    pub sensor_id: String,
    pub min_value: f64,
}

impl SensorGate {
    pub fn at_least(sensor_id: impl Into<String>, min_value: f64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            min_value,
        }
    }
}

// ==========================================
// ReadingStore - 读数查询接口
// ==========================================
pub trait ReadingStore {
    /// 统计窗口内满足过滤条件的读数条数
    fn count_readings(
        &self,
        sensor_id: &str,
        window: &TimeWindow,
        filter: ValueFilter,
    ) -> RepositoryResult<u64>;

    /// 窗口内读数均值（无数据 → None）
    fn average_value(&self, sensor_id: &str, window: &TimeWindow) -> RepositoryResult<Option<f64>>;

    /// 窗口内、门控条件成立时刻的读数均值（无数据 → None）
    fn average_value_while(
        &self,
        sensor_id: &str,
        window: &TimeWindow,
        gate: &SensorGate,
    ) -> RepositoryResult<Option<f64>>;
}

// ==========================================
// SqliteReadingStore - 基于 sensor_readings 表的实现
// ==========================================
pub struct SqliteReadingStore<'c> {
    conn: &'c Connection,
    timeout: Option<Duration>,
}

impl<'c> SqliteReadingStore<'c> {
    /// 借用调用方的连接；timeout=None 表示不限时
    pub fn new(conn: &'c Connection, timeout: Option<Duration>) -> Self {
        Self { conn, timeout }
    }

    /// 在查询期间挂载 progress handler，超过 deadline 即中断语句
    fn with_deadline<T>(
        &self,
        op: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> RepositoryResult<T> {
        let Some(timeout) = self.timeout else {
            return op(self.conn).map_err(Into::into);
        };

        let deadline = Instant::now() + timeout;
        self.conn
            .progress_handler(PROGRESS_CHECK_OPS, Some(move || Instant::now() >= deadline));
        let result = op(self.conn);
        self.conn.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|e| {
            if RepositoryError::is_interrupted(&e) {
                RepositoryError::QueryTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                e.into()
            }
        })
    }
}

impl ReadingStore for SqliteReadingStore<'_> {
    fn count_readings(
        &self,
        sensor_id: &str,
        window: &TimeWindow,
        filter: ValueFilter,
    ) -> RepositoryResult<u64> {
        let start = format_ts(&window.start());
        let end = format_ts(&window.end());

        let count: i64 = self.with_deadline(|conn| match filter {
            ValueFilter::Any => conn.query_row(
                r#"
                SELECT COUNT(*) FROM sensor_readings
                WHERE sensor_id = ?1 AND time BETWEEN ?2 AND ?3
                "#,
                params![sensor_id, start, end],
                |row| row.get(0),
            ),
            ValueFilter::AtLeast(min) => conn.query_row(
                r#"
                SELECT COUNT(*) FROM sensor_readings
                WHERE sensor_id = ?1 AND time BETWEEN ?2 AND ?3 AND value >= ?4
                "#,
                params![sensor_id, start, end, min],
                |row| row.get(0),
            ),
        })?;

        Ok(count.max(0) as u64)
    }

    fn average_value(&self, sensor_id: &str, window: &TimeWindow) -> RepositoryResult<Option<f64>> {
        let start = format_ts(&window.start());
        let end = format_ts(&window.end());

        self.with_deadline(|conn| {
            conn.query_row(
                r#"
                SELECT AVG(value) FROM sensor_readings
                WHERE sensor_id = ?1 AND time BETWEEN ?2 AND ?3
                "#,
                params![sensor_id, start, end],
                |row| row.get::<_, Option<f64>>(0),
            )
        })
    }

    fn average_value_while(
        &self,
        sensor_id: &str,
        window: &TimeWindow,
        gate: &SensorGate,
    ) -> RepositoryResult<Option<f64>> {
        let start = format_ts(&window.start());
        let end = format_ts(&window.end());

        self.with_deadline(|conn| {
            conn.query_row(
                r#"
                SELECT AVG(s.value) FROM sensor_readings s
                WHERE s.sensor_id = ?1
                  AND s.time BETWEEN ?2 AND ?3
                  AND EXISTS (
                    SELECT 1 FROM sensor_readings g
                    WHERE g.sensor_id = ?4 AND g.time = s.time AND g.value >= ?5
                  )
                "#,
                params![sensor_id, start, end, gate.sensor_id, gate.min_value],
                |row| row.get::<_, Option<f64>>(0),
            )
        })
    }
}
