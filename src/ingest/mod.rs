// ==========================================
// 产线 OEE 指标监控系统 - 采集层
// ==========================================
// 职责: 外部读数（消息 / CSV）→ sensor_readings
// ==========================================

pub mod csv_source;
pub mod error;
pub mod payload;
pub mod service;
pub mod simulator;

pub use error::{IngestError, IngestResult};
pub use payload::{decode_message, SensorPayload, SENSOR_TOPIC_PREFIX};
pub use service::IngestService;
pub use simulator::{SensorSimulator, SimulatedMessage};
