// ==========================================
// 产线 OEE 指标监控系统 - KPI 状态判定
// ==========================================
// 口径: 所有现有 KPI 均“越高越好”
//
//   value >= warning              → normal
//   critical <= value < warning   → warning
//   value < critical              → critical
//
// 注意: warning 阈值是“正常”的下界，不是“开始警告”的点；
//       两个下界都是闭区间（value == warning 为 normal）。
// ==========================================

use crate::domain::{KpiStatus, Thresholds};

/// 按阈值判定状态
pub fn classify(value: f64, warning_threshold: f64, critical_threshold: f64) -> KpiStatus {
    if value >= warning_threshold {
        KpiStatus::Normal
    } else if value >= critical_threshold {
        KpiStatus::Warning
    } else {
        KpiStatus::Critical
    }
}

/// 按阈值表条目判定状态
pub fn classify_with(value: f64, thresholds: &Thresholds) -> KpiStatus {
    classify(value, thresholds.warning(), thresholds.critical())
}
