// ==========================================
// 产线 OEE 指标监控系统 - 引擎策略参数
// ==========================================
// 职责: 计算口径相关的策略参数（理想速度、性能上限、合格率口径、告警策略）
// 来源: 默认值 + config_kv 覆写（见 ConfigManager）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::{QUALITY_SENSOR_ID, SPEED_SENSOR_ID, STATUS_SENSOR_ID};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 默认理想速度（单位/小时）
pub const DEFAULT_IDEAL_SPEED: f64 = 90.0;
/// 默认性能开动率上限
pub const DEFAULT_PERFORMANCE_CAP: f64 = 1.0;
/// good_count 口径下的默认合格下限
pub const DEFAULT_QUALITY_GOOD_THRESHOLD: f64 = 0.95;
/// 默认单次查询超时
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);
/// 告警抑制窗口上限: 366 天
pub const MAX_ALERT_SUPPRESSION: Duration = Duration::from_secs(366 * 24 * 3600);

// ==========================================
// QualityMode - 合格率口径
// ==========================================
// 两种口径只能二选一，由配置显式指定
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityMode {
    /// QUALITY001 读数的均值（每个读数本身就是比率）
    Average,
    /// value >= good_threshold 的读数数 / 总读数
    GoodCount { good_threshold: f64 },
}

impl QualityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityMode::Average => "average",
            QualityMode::GoodCount { .. } => "good_count",
        }
    }
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityMode::Average => write!(f, "average"),
            QualityMode::GoodCount { good_threshold } => {
                write!(f, "good_count(>={})", good_threshold)
            }
        }
    }
}

/// 仅解析口径名称；good_count 的阈值另行配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityModeKind {
    Average,
    GoodCount,
}

impl FromStr for QualityModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(QualityModeKind::Average),
            "good_count" => Ok(QualityModeKind::GoodCount),
            other => Err(format!("未知合格率口径: {}", other)),
        }
    }
}

// ==========================================
// SensorIds - 参与计算的传感器
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SensorIds {
    pub status: String,
    pub speed: String,
    pub quality: String,
}

impl Default for SensorIds {
    fn default() -> Self {
        Self {
            status: STATUS_SENSOR_ID.to_string(),
            speed: SPEED_SENSOR_ID.to_string(),
            quality: QUALITY_SENSOR_ID.to_string(),
        }
    }
}

// ==========================================
// EngineConfig
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// 理想速度，必须 > 0
    pub ideal_speed: f64,
    /// 性能开动率上限 ∈ (0, 1]
    pub performance_cap: f64,
    pub quality_mode: QualityMode,
    /// 是否对三个分量也做告警评估（默认仅 OEE）
    pub alert_on_components: bool,
    /// 告警抑制窗口；None 表示不抑制（每次非 normal 评估都写一条告警）
    pub alert_suppression: Option<Duration>,
    /// 单次读数查询超时；None 表示不限时
    pub query_timeout: Option<Duration>,
    pub sensors: SensorIds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ideal_speed: DEFAULT_IDEAL_SPEED,
            performance_cap: DEFAULT_PERFORMANCE_CAP,
            quality_mode: QualityMode::Average,
            alert_on_components: false,
            alert_suppression: None,
            query_timeout: Some(DEFAULT_QUERY_TIMEOUT),
            sensors: SensorIds::default(),
        }
    }
}

impl EngineConfig {
    /// 校验参数取值
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.ideal_speed.is_finite() && self.ideal_speed > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "ideal_speed".to_string(),
                message: format!("必须为正数, 实际 {}", self.ideal_speed),
            });
        }
        if !(self.performance_cap > 0.0 && self.performance_cap <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "performance_cap".to_string(),
                message: format!("必须在 (0, 1] 内, 实际 {}", self.performance_cap),
            });
        }
        if let QualityMode::GoodCount { good_threshold } = self.quality_mode {
            if !(0.0..=1.0).contains(&good_threshold) {
                return Err(ConfigError::InvalidValue {
                    key: "quality_good_threshold".to_string(),
                    message: format!("必须在 [0, 1] 内, 实际 {}", good_threshold),
                });
            }
        }
        if let Some(window) = self.alert_suppression {
            if window > MAX_ALERT_SUPPRESSION {
                return Err(ConfigError::InvalidValue {
                    key: "alert_suppression_secs".to_string(),
                    message: format!(
                        "不能超过 {} 秒, 实际 {}",
                        MAX_ALERT_SUPPRESSION.as_secs(),
                        window.as_secs()
                    ),
                });
            }
        }
        for (key, id) in [
            ("sensor.status", &self.sensors.status),
            ("sensor.speed", &self.sensors.speed),
            ("sensor.quality", &self.sensors.quality),
        ] {
            if id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "传感器 ID 不能为空".to_string(),
                });
            }
        }
        Ok(())
    }
}
