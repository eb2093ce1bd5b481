// ==========================================
// 产线 OEE 指标监控系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、取值约束
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod alert;
pub mod kpi;
pub mod reading;
pub mod types;
pub mod window;

// 重导出核心类型
pub use alert::{Alert, NewAlert};
pub use kpi::{KpiValue, ThresholdError, ThresholdTable, Thresholds};
pub use reading::{SensorReading, QUALITY_SENSOR_ID, SPEED_SENSOR_ID, STATUS_SENSOR_ID};
pub use types::{AlertSeverity, KpiName, KpiStatus};
pub use window::{TimeWindow, WindowError};
