// ==========================================
// 产线 OEE 指标监控系统 - 性能开动率
// ==========================================
// performance = min(运行期间平均速度 / 理想速度, 上限)
// - 只统计状态传感器同一时刻 >= 1 的速度读数（停机时的速度无意义）
// - 上限 performance_cap 为显式配置（默认 1.0），最终再截断到 [0,1]
// - 运行期间平均速度为 0 → 0.0；窗口内没有运行期间的速度读数 → 无数据
// ==========================================

use crate::domain::{KpiName, TimeWindow};
use crate::engine::availability::RUNNING_MIN_VALUE;
use crate::engine::calculator::ComponentCalculator;
use crate::repository::{ReadingStore, RepositoryResult, SensorGate};

pub struct PerformanceCalculator {
    speed_sensor: String,
    gate: SensorGate,
    ideal_speed: f64,
    cap: f64,
}

impl PerformanceCalculator {
    /// ideal_speed 与 cap 的取值范围由 EngineConfig::validate 保证
    pub fn new(
        speed_sensor: impl Into<String>,
        status_sensor: impl Into<String>,
        ideal_speed: f64,
        cap: f64,
    ) -> Self {
        Self {
            speed_sensor: speed_sensor.into(),
            gate: SensorGate::at_least(status_sensor, RUNNING_MIN_VALUE),
            ideal_speed,
            cap,
        }
    }
}

impl ComponentCalculator for PerformanceCalculator {
    fn kpi(&self) -> KpiName {
        KpiName::Performance
    }

    fn measure(&self, store: &dyn ReadingStore, window: &TimeWindow) -> RepositoryResult<Option<f64>> {
        let avg_speed = store.average_value_while(&self.speed_sensor, window, &self.gate)?;
        Ok(avg_speed.map(|speed| (speed / self.ideal_speed).min(self.cap)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorReading;
    use crate::repository::reading_store::testing::{FailingReadingStore, MemoryReadingStore};
    use chrono::{Duration, TimeZone, Utc};

    fn window() -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::hours(1)).unwrap()
    }

    fn store_with(samples: &[(f64, f64)]) -> MemoryReadingStore {
        let w = window();
        let mut store = MemoryReadingStore::default();
        for (i, (status, speed)) in samples.iter().enumerate() {
            let t = w.start() + Duration::minutes(i as i64);
            store.push(SensorReading::new(t, "STATUS001", *status, "binary"));
            store.push(SensorReading::new(t, "SPEED001", *speed, "units/hour"));
        }
        store
    }

    #[test]
    fn test_only_running_samples_count() {
        let store = store_with(&[(1.0, 72.0), (0.0, 0.0), (1.0, 72.0)]);
        let calc = PerformanceCalculator::new("SPEED001", "STATUS001", 90.0, 1.0);
        assert!((calc.compute(&store, &window()) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_cap_applies() {
        let store = store_with(&[(1.0, 90.0), (1.0, 90.0)]);
        let calc = PerformanceCalculator::new("SPEED001", "STATUS001", 90.0, 0.90);
        assert_eq!(calc.compute(&store, &window()), 0.90);

        // 噪声导致超过理想速度，默认上限 1.0
        let store = store_with(&[(1.0, 120.0)]);
        let calc = PerformanceCalculator::new("SPEED001", "STATUS001", 90.0, 1.0);
        assert_eq!(calc.compute(&store, &window()), 1.0);
    }

    #[test]
    fn test_never_running_is_no_data() {
        let store = store_with(&[(0.0, 0.0), (0.0, 0.0)]);
        let calc = PerformanceCalculator::new("SPEED001", "STATUS001", 90.0, 0.90);
        assert_eq!(calc.compute(&store, &window()), 1.0);
    }

    #[test]
    fn test_zero_speed_while_running_is_zero() {
        let store = store_with(&[(1.0, 0.0), (1.0, 0.0)]);
        let calc = PerformanceCalculator::new("SPEED001", "STATUS001", 90.0, 1.0);
        assert_eq!(calc.compute(&store, &window()), 0.0);
    }

    #[test]
    fn test_query_failure_is_pessimistic() {
        let calc = PerformanceCalculator::new("SPEED001", "STATUS001", 90.0, 1.0);
        assert_eq!(calc.compute(&FailingReadingStore, &window()), 0.0);
    }
}
