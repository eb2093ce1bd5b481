// ==========================================
// 产线 OEE 指标监控系统 - 时间开动率
// ==========================================
// availability = 运行读数数 / 状态读数总数
// 运行: 状态传感器 value >= 1
// ==========================================

use crate::domain::{KpiName, TimeWindow};
use crate::engine::calculator::ComponentCalculator;
use crate::repository::{ReadingStore, RepositoryResult, ValueFilter};

/// 状态读数 >= 该值视为运行
pub const RUNNING_MIN_VALUE: f64 = 1.0;

pub struct AvailabilityCalculator {
    status_sensor: String,
}

impl AvailabilityCalculator {
    pub fn new(status_sensor: impl Into<String>) -> Self {
        Self {
            status_sensor: status_sensor.into(),
        }
    }
}

impl ComponentCalculator for AvailabilityCalculator {
    fn kpi(&self) -> KpiName {
        KpiName::Availability
    }

    fn measure(&self, store: &dyn ReadingStore, window: &TimeWindow) -> RepositoryResult<Option<f64>> {
        let total = store.count_readings(&self.status_sensor, window, ValueFilter::Any)?;
        if total == 0 {
            return Ok(None);
        }

        let running = store.count_readings(
            &self.status_sensor,
            window,
            ValueFilter::AtLeast(RUNNING_MIN_VALUE),
        )?;
        Ok(Some(running as f64 / total as f64))
    }
}
