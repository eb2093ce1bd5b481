// ==========================================
// 产线 OEE 指标监控系统 - 引擎层
// ==========================================
// 职责: 分量计算、状态判定、告警生成、OEE 聚合
// 红线: 引擎不拼读数 SQL，读数一律经 ReadingStore 访问
// ==========================================

pub mod alert_emitter;
pub mod availability;
pub mod calculator;
pub mod error;
pub mod oee;
pub mod performance;
pub mod quality;
pub mod status;

// 重导出核心引擎
pub use alert_emitter::AlertEmitter;
pub use availability::AvailabilityCalculator;
pub use calculator::{ComponentCalculator, NO_DATA_DEFAULT, QUERY_FAILURE_DEFAULT};
pub use error::{EngineError, EngineResult};
pub use oee::{OeeEngine, OeeReport};
pub use performance::PerformanceCalculator;
pub use quality::QualityCalculator;
pub use status::{classify, classify_with};
