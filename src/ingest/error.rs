// ==========================================
// 产线 OEE 指标监控系统 - 采集模块错误类型
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("不支持的主题: {0}（期望 plant/sensors/<名称>）")]
    UnsupportedTopic(String),

    #[error("无效的读数报文: {0}")]
    InvalidPayload(String),

    #[error("CSV 解析失败 (行 {row}): {message}")]
    CsvRow { row: usize, message: String },

    #[error("CSV 读取失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("读数写入失败: {0}")]
    Persistence(#[from] RepositoryError),
}

pub type IngestResult<T> = Result<T, IngestError>;
