// ==========================================
// 产线 OEE 指标监控系统 - API 层
// ==========================================
// 职责: 告警与 KPI 的查询/操作接口；告警接口另经 HTTP 对外提供
// ==========================================

pub mod alert_api;
pub mod error;
pub mod http;
pub mod kpi_api;

// 重导出核心类型
pub use alert_api::{AlertApi, AlertView, CreateAlertRequest};
pub use error::{ApiError, ApiResult};
pub use kpi_api::KpiApi;
