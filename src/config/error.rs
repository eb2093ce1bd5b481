// ==========================================
// 产线 OEE 指标监控系统 - 配置层错误类型
// ==========================================

use crate::domain::ThresholdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值无效 (key={key}): {message}")]
    InvalidValue { key: String, message: String },

    #[error("阈值配置无效 (kpi={kpi}): {source}")]
    InvalidThreshold {
        kpi: String,
        #[source]
        source: ThresholdError,
    },

    #[error("环境变量无效 ({name}): {message}")]
    InvalidEnv { name: String, message: String },

    #[error("配置读取失败: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
