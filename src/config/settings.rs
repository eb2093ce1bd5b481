// ==========================================
// 产线 OEE 指标监控系统 - 进程级设置
// ==========================================
// 来源: 环境变量（支持 .env 文件）
// - KPI_MONITOR_DB_PATH      数据库路径（默认: 用户数据目录）
// - KPI_MONITOR_INTERVAL_SECS 调度周期（默认: 300）
// - KPI_MONITOR_WINDOW_SECS  计算窗口长度（默认: 与调度周期相同）
// - KPI_MONITOR_LOG_FORMAT   pretty | json
// - KPI_MONITOR_HTTP_ADDR    告警 HTTP 服务监听地址（默认: 0.0.0.0:8000）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::logging::LogFormat;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "KPI_MONITOR_DB_PATH";
pub const ENV_INTERVAL_SECS: &str = "KPI_MONITOR_INTERVAL_SECS";
pub const ENV_WINDOW_SECS: &str = "KPI_MONITOR_WINDOW_SECS";
pub const ENV_LOG_FORMAT: &str = "KPI_MONITOR_LOG_FORMAT";
pub const ENV_HTTP_ADDR: &str = "KPI_MONITOR_HTTP_ADDR";

/// 默认调度周期: 5 分钟
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub db_path: String,
    pub interval: Duration,
    pub window: Duration,
    pub log_format: LogFormat,
    pub http_addr: SocketAddr,
}

impl AppSettings {
    /// 从进程环境读取（先加载 .env，已存在的环境变量优先）
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取（测试可注入）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = non_empty(ENV_DB_PATH).unwrap_or_else(default_db_path);

        let interval_secs = match non_empty(ENV_INTERVAL_SECS) {
            Some(raw) => parse_positive_secs(ENV_INTERVAL_SECS, &raw)?,
            None => DEFAULT_INTERVAL_SECS,
        };
        let window_secs = match non_empty(ENV_WINDOW_SECS) {
            Some(raw) => parse_positive_secs(ENV_WINDOW_SECS, &raw)?,
            None => interval_secs,
        };

        let log_format = match non_empty(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse::<LogFormat>().map_err(|message| ConfigError::InvalidEnv {
                name: ENV_LOG_FORMAT.to_string(),
                message,
            })?,
            None => LogFormat::default(),
        };

        let raw_addr = non_empty(ENV_HTTP_ADDR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnv {
                name: ENV_HTTP_ADDR.to_string(),
                message: format!("无法解析监听地址 '{}': {}", raw_addr, e),
            })?;

        Ok(Self {
            db_path,
            interval: Duration::from_secs(interval_secs),
            window: Duration::from_secs(window_secs),
            log_format,
            http_addr,
        })
    }
}

fn parse_positive_secs(name: &str, raw: &str) -> ConfigResult<u64> {
    match raw.parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            message: format!("必须为正整数秒, 实际 '{}'", raw),
        }),
    }
}

/// 默认数据库路径: <data_dir>/oee-kpi-monitor/kpi_monitor.db
///
/// 拿不到用户数据目录时退回当前目录
pub fn default_db_path() -> String {
    let mut path = PathBuf::from("./kpi_monitor.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("oee-kpi-monitor");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("kpi_monitor.db");
        } else {
            tracing::warn!("无法创建数据目录 {:?}，使用当前目录", dir);
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_window_defaults_to_interval() {
        let settings = AppSettings::from_lookup(lookup(&[
            (ENV_DB_PATH, "/tmp/kpi.db"),
            (ENV_INTERVAL_SECS, "60"),
        ]))
        .unwrap();
        assert_eq!(settings.db_path, "/tmp/kpi.db");
        assert_eq!(settings.interval, Duration::from_secs(60));
        assert_eq!(settings.window, Duration::from_secs(60));
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.http_addr, DEFAULT_HTTP_ADDR.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_invalid_env_values() {
        assert!(AppSettings::from_lookup(lookup(&[(ENV_INTERVAL_SECS, "0")])).is_err());
        assert!(AppSettings::from_lookup(lookup(&[(ENV_WINDOW_SECS, "abc")])).is_err());
        assert!(AppSettings::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).is_err());
        assert!(AppSettings::from_lookup(lookup(&[(ENV_HTTP_ADDR, "localhost")])).is_err());
    }

    #[test]
    fn test_sliding_window_longer_than_interval() {
        let settings = AppSettings::from_lookup(lookup(&[
            (ENV_DB_PATH, "kpi.db"),
            (ENV_INTERVAL_SECS, "300"),
            (ENV_WINDOW_SECS, "3600"),
            (ENV_LOG_FORMAT, "json"),
            (ENV_HTTP_ADDR, "127.0.0.1:9100"),
        ]))
        .unwrap();
        assert_eq!(settings.window, Duration::from_secs(3600));
        assert_eq!(settings.http_addr.port(), 9100);
        assert_eq!(settings.log_format, LogFormat::Json);
    }
}
