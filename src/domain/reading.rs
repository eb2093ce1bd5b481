// ==========================================
// 产线 OEE 指标监控系统 - 传感器读数
// ==========================================
// 对齐: sensor_readings 表，主键 (time, sensor_id)
// 读数为只读事实，写入后不修改
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 设备运行状态传感器（>= 1 视为运行）
pub const STATUS_SENSOR_ID: &str = "STATUS001";
/// 产线速度传感器（单位/小时）
pub const SPEED_SENSOR_ID: &str = "SPEED001";
/// 合格率传感器（每个样本为 [0,1] 的比率）
pub const QUALITY_SENSOR_ID: &str = "QUALITY001";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub time: DateTime<Utc>,
    pub sensor_id: String,
    pub value: f64,
    pub unit: String,
}

impl SensorReading {
    pub fn new(
        time: DateTime<Utc>,
        sensor_id: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            time,
            sensor_id: sensor_id.into(),
            value,
            unit: unit.into(),
        }
    }
}
