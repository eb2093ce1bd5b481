// ==========================================
// 产线 OEE 指标监控系统 - 分量计算器公共契约
// ==========================================
// 三个分量（时间开动率/性能开动率/合格品率）统一遵循:
// - 测得值 Ok(Some(v)) → 截断到 [0,1]（非有限值按 0.0 处理）
// - 无数据 Ok(None)    → 1.0（未接入仪表不等于停机，乐观默认）
// - 查询失败 Err       → 0.0（失败按最坏情况处理），记录 error 日志，不向上抛
// 两个默认值刻意不同，不要合并。
// ==========================================

use crate::domain::{KpiName, TimeWindow};
use crate::repository::{ReadingStore, RepositoryResult};

/// 无数据时的默认值
pub const NO_DATA_DEFAULT: f64 = 1.0;
/// 查询失败时的默认值
pub const QUERY_FAILURE_DEFAULT: f64 = 0.0;

/// 截断到 [0,1]
pub fn clamp_ratio(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub trait ComponentCalculator: Send + Sync {
    /// 对应的 KPI
    fn kpi(&self) -> KpiName;

    /// 原始测量，None 表示窗口内无数据
    fn measure(&self, store: &dyn ReadingStore, window: &TimeWindow) -> RepositoryResult<Option<f64>>;

    /// 计算分量值，保证结果 ∈ [0,1] 且不返回错误
    fn compute(&self, store: &dyn ReadingStore, window: &TimeWindow) -> f64 {
        match self.measure(store, window) {
            Ok(Some(value)) => clamp_ratio(value),
            Ok(None) => {
                tracing::debug!(kpi = %self.kpi(), %window, "窗口内无数据，使用默认值 {}", NO_DATA_DEFAULT);
                NO_DATA_DEFAULT
            }
            Err(e) => {
                tracing::error!(kpi = %self.kpi(), %window, error = %e, "计算 {} 失败", self.kpi());
                QUERY_FAILURE_DEFAULT
            }
        }
    }
}
