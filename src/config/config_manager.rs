// ==========================================
// 产线 OEE 指标监控系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// 规则: 未配置 → 使用默认值；已配置但无法解析 → 报错（不静默忽略）
// ==========================================

use crate::config::engine_config::{
    EngineConfig, QualityMode, QualityModeKind, DEFAULT_QUALITY_GOOD_THRESHOLD,
};
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::open_sqlite_connection;
use crate::domain::{KpiName, ThresholdTable, Thresholds};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入/覆盖配置值
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式，启动时记录日志用）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    /// 读取并解析配置，未配置时返回 None
    fn get_parsed<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("无法解析 '{}': {}", raw, e),
                }),
        }
    }

    // ===== 阈值 =====

    /// 加载阈值表（默认值 + 覆写）
    ///
    /// 键: threshold.<kpi>.warning / threshold.<kpi>.critical
    pub fn load_thresholds(&self) -> ConfigResult<ThresholdTable> {
        let mut table = ThresholdTable::default();

        for kpi in KpiName::ALL {
            let current = table.get(kpi);
            let warning: Option<f64> = self.get_parsed(&config_keys::threshold_warning(kpi))?;
            let critical: Option<f64> = self.get_parsed(&config_keys::threshold_critical(kpi))?;
            if warning.is_none() && critical.is_none() {
                continue;
            }

            let thresholds = Thresholds::new(
                warning.unwrap_or(current.warning()),
                critical.unwrap_or(current.critical()),
            )
            .map_err(|source| ConfigError::InvalidThreshold {
                kpi: kpi.to_string(),
                source,
            })?;
            table = table.with(kpi, thresholds);
        }

        Ok(table)
    }

    // ===== 引擎参数 =====

    /// 加载引擎参数（默认值 + 覆写），并校验
    pub fn load_engine_config(&self) -> ConfigResult<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(v) = self.get_parsed::<f64>(config_keys::IDEAL_SPEED)? {
            config.ideal_speed = v;
        }
        if let Some(v) = self.get_parsed::<f64>(config_keys::PERFORMANCE_CAP)? {
            config.performance_cap = v;
        }

        let good_threshold = self.get_parsed::<f64>(config_keys::QUALITY_GOOD_THRESHOLD)?;
        let kind = self
            .get_parsed::<QualityModeKind>(config_keys::QUALITY_MODE)?
            .unwrap_or(QualityModeKind::Average);
        config.quality_mode = match kind {
            QualityModeKind::Average => {
                if let Some(threshold) = good_threshold {
                    tracing::warn!(
                        quality_good_threshold = threshold,
                        "quality_mode 不是 good_count，quality_good_threshold 不生效"
                    );
                }
                QualityMode::Average
            }
            QualityModeKind::GoodCount => QualityMode::GoodCount {
                good_threshold: good_threshold.unwrap_or(DEFAULT_QUALITY_GOOD_THRESHOLD),
            },
        };

        if let Some(raw) = self.get_config_value(config_keys::ALERT_ON_COMPONENTS)? {
            config.alert_on_components =
                parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                    key: config_keys::ALERT_ON_COMPONENTS.to_string(),
                    message: format!("无法解析布尔值 '{}'", raw),
                })?;
        }
        if let Some(secs) = self.get_parsed::<u64>(config_keys::ALERT_SUPPRESSION_SECS)? {
            config.alert_suppression = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(ms) = self.get_parsed::<u64>(config_keys::QUERY_TIMEOUT_MS)? {
            config.query_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        if let Some(id) = self.get_config_value(config_keys::SENSOR_STATUS)? {
            config.sensors.status = id.trim().to_string();
        }
        if let Some(id) = self.get_config_value(config_keys::SENSOR_SPEED)? {
            config.sensors.speed = id.trim().to_string();
        }
        if let Some(id) = self.get_config_value(config_keys::SENSOR_QUALITY)? {
            config.sensors.quality = id.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::KpiName;

    // 性能开动率
    pub const IDEAL_SPEED: &str = "ideal_speed";
    pub const PERFORMANCE_CAP: &str = "performance_cap";

    // 合格率口径
    pub const QUALITY_MODE: &str = "quality_mode"; // average | good_count
    pub const QUALITY_GOOD_THRESHOLD: &str = "quality_good_threshold";

    // 告警
    pub const ALERT_ON_COMPONENTS: &str = "alert_on_components";
    pub const ALERT_SUPPRESSION_SECS: &str = "alert_suppression_secs"; // 0 = 不抑制

    // 查询
    pub const QUERY_TIMEOUT_MS: &str = "query_timeout_ms"; // 0 = 不限时

    // 传感器
    pub const SENSOR_STATUS: &str = "sensor.status";
    pub const SENSOR_SPEED: &str = "sensor.speed";
    pub const SENSOR_QUALITY: &str = "sensor.quality";

    pub fn threshold_warning(kpi: KpiName) -> String {
        format!("threshold.{}.warning", kpi.as_str().to_ascii_lowercase())
    }

    pub fn threshold_critical(kpi: KpiName) -> String {
        format!("threshold.{}.critical", kpi.as_str().to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn manager() -> ConfigManager {
        ConfigManager::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap()))).unwrap()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let m = manager();
        assert_eq!(m.load_thresholds().unwrap(), ThresholdTable::default());
        assert_eq!(m.load_engine_config().unwrap(), EngineConfig::default());
        assert_eq!(m.get_config_snapshot().unwrap(), "{}");
    }

    #[test]
    fn test_partial_threshold_override_keeps_other_bound() {
        let m = manager();
        m.set_config_value(&config_keys::threshold_warning(KpiName::Oee), "0.80").unwrap();

        let table = m.load_thresholds().unwrap();
        assert_eq!(table.get(KpiName::Oee).warning(), 0.80);
        assert_eq!(table.get(KpiName::Oee).critical(), 0.75);
    }

    #[test]
    fn test_inverted_threshold_override_is_rejected() {
        let m = manager();
        m.set_config_value(&config_keys::threshold_critical(KpiName::Quality), "0.99").unwrap();
        assert!(matches!(
            m.load_thresholds(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_engine_overrides() {
        let m = manager();
        m.set_config_value(config_keys::PERFORMANCE_CAP, "0.90").unwrap();
        m.set_config_value(config_keys::QUALITY_MODE, "good_count").unwrap();
        m.set_config_value(config_keys::QUALITY_GOOD_THRESHOLD, "0.97").unwrap();
        m.set_config_value(config_keys::ALERT_ON_COMPONENTS, "true").unwrap();
        m.set_config_value(config_keys::ALERT_SUPPRESSION_SECS, "600").unwrap();
        m.set_config_value(config_keys::QUERY_TIMEOUT_MS, "0").unwrap();

        let config = m.load_engine_config().unwrap();
        assert_eq!(config.performance_cap, 0.90);
        assert_eq!(config.quality_mode, QualityMode::GoodCount { good_threshold: 0.97 });
        assert!(config.alert_on_components);
        assert_eq!(config.alert_suppression, Some(Duration::from_secs(600)));
        assert_eq!(config.query_timeout, None);
    }

    #[test]
    fn test_good_threshold_without_good_count_mode_is_ignored() {
        let m = manager();
        m.set_config_value(config_keys::QUALITY_GOOD_THRESHOLD, "0.97").unwrap();
        assert_eq!(m.load_engine_config().unwrap().quality_mode, QualityMode::Average);

        m.set_config_value(config_keys::QUALITY_MODE, "average").unwrap();
        assert_eq!(m.load_engine_config().unwrap().quality_mode, QualityMode::Average);

        // 非法阈值即使不生效也要报错
        m.set_config_value(config_keys::QUALITY_GOOD_THRESHOLD, "high").unwrap();
        assert!(matches!(
            m.load_engine_config(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unparsable_value_is_an_error() {
        let m = manager();
        m.set_config_value(config_keys::IDEAL_SPEED, "fast").unwrap();
        assert!(matches!(
            m.load_engine_config(),
            Err(ConfigError::InvalidValue { .. })
        ));

        m.set_config_value(config_keys::IDEAL_SPEED, "-1").unwrap();
        assert!(m.load_engine_config().is_err());
    }
}
