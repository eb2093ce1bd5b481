// ==========================================
// 产线 OEE 指标监控系统 - 配置层
// ==========================================
// 职责:
// - 引擎策略参数与阈值（config_kv 表覆写默认值）
// - 进程级设置（环境变量 / .env）
// 约束: 配置在启动时加载，运行期只读
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod error;
pub mod settings;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::{EngineConfig, QualityMode, SensorIds};
pub use error::{ConfigError, ConfigResult};
pub use settings::AppSettings;
