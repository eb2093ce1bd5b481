// ==========================================
// 产线 OEE 指标监控系统 - 引擎层错误类型
// ==========================================
// 分类:
// - QueryFailure: 读数查询失败（分量计算器内部吸收为 0.0，不会到达这里）
// - PersistenceFailure: KPI 值/告警写入失败，整次计算事务回滚
// - InvalidWindow: 调度方传入的窗口非法
// ==========================================

use crate::domain::WindowError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("读数查询失败: {0}")]
    QueryFailure(#[source] RepositoryError),

    #[error("指标持久化失败: {0}")]
    PersistenceFailure(#[source] RepositoryError),

    #[error(transparent)]
    InvalidWindow(#[from] WindowError),
}

impl EngineError {
    pub(crate) fn persistence(err: impl Into<RepositoryError>) -> Self {
        EngineError::PersistenceFailure(err.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
