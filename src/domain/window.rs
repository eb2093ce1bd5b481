// ==========================================
// 产线 OEE 指标监控系统 - 计算窗口
// ==========================================
// 窗口两端均为闭区间 [start, end]，计数与均值查询口径一致
// ==========================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("无效的计算窗口: start={start} 晚于 end={end}")]
    StartAfterEnd {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("无效的窗口长度: {0} 秒")]
    NonPositiveLength(i64),
}

/// KPI 计算窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// 创建窗口，start 不得晚于 end
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// 以 end 为终点、向前回溯 length 的窗口（调度器使用）
    pub fn trailing(end: DateTime<Utc>, length: Duration) -> Result<Self, WindowError> {
        if length <= Duration::zero() {
            return Err(WindowError::NonPositiveLength(length.num_seconds()));
        }
        Self::new(end - length, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_rejects_inverted_bounds() {
        let a = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let b = a + Duration::minutes(5);
        assert!(TimeWindow::new(b, a).is_err());
        // 零长度窗口合法
        assert!(TimeWindow::new(a, a).is_ok());
    }

    #[test]
    fn test_trailing_window_is_inclusive() {
        let end = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let w = TimeWindow::trailing(end, Duration::minutes(5)).unwrap();
        assert_eq!(w.length(), Duration::minutes(5));
        assert!(w.contains(&w.start()));
        assert!(w.contains(&end));
        assert!(!w.contains(&(end + Duration::seconds(1))));
        assert!(TimeWindow::trailing(end, Duration::zero()).is_err());
    }
}
