// ==========================================
// 产线 OEE 指标监控系统 - 合格品率
// ==========================================
// 口径（QualityMode，二选一）:
// - Average:   合格率传感器读数均值（每个读数本身是 [0,1] 比率）
// - GoodCount: value >= good_threshold 的读数数 / 总读数
// 无数据 → 1.0；查询失败 → 0.0
// ==========================================

use crate::config::QualityMode;
use crate::domain::{KpiName, TimeWindow};
use crate::engine::calculator::ComponentCalculator;
use crate::repository::{ReadingStore, RepositoryResult, ValueFilter};

pub struct QualityCalculator {
    quality_sensor: String,
    mode: QualityMode,
}

impl QualityCalculator {
    pub fn new(quality_sensor: impl Into<String>, mode: QualityMode) -> Self {
        Self {
            quality_sensor: quality_sensor.into(),
            mode,
        }
    }
}

impl ComponentCalculator for QualityCalculator {
    fn kpi(&self) -> KpiName {
        KpiName::Quality
    }

    fn measure(&self, store: &dyn ReadingStore, window: &TimeWindow) -> RepositoryResult<Option<f64>> {
        match self.mode {
            QualityMode::Average => store.average_value(&self.quality_sensor, window),
            QualityMode::GoodCount { good_threshold } => {
                let total = store.count_readings(&self.quality_sensor, window, ValueFilter::Any)?;
                if total == 0 {
                    return Ok(None);
                }
                let good = store.count_readings(
                    &self.quality_sensor,
                    window,
                    ValueFilter::AtLeast(good_threshold),
                )?;
                Ok(Some(good as f64 / total as f64))
            }
        }
    }
}
