// ==========================================
// 产线 OEE 指标监控系统 - KPI 值与阈值
// ==========================================
// 对齐: kpi_values 表（只追加）
// ==========================================

use crate::domain::types::{KpiName, KpiStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// KpiValue - 单次计算写入的 KPI 记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiValue {
    pub time: DateTime<Utc>,   // 窗口结束时间
    pub kpi_name: KpiName,
    pub value: f64,            // 约定 ∈ [0,1]
    pub status: KpiStatus,
}

// ==========================================
// Thresholds - 单个 KPI 的阈值
// ==========================================
// 注意命名:
// - warning: “正常”的下界（value >= warning 即 normal）
// - critical: “警告”的下界（critical <= value < warning 为 warning）
// 因此必须满足 critical <= warning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    warning: f64,
    critical: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("阈值超出 [0,1]: warning={warning}, critical={critical}")]
    OutOfRange { warning: f64, critical: f64 },

    #[error("阈值顺序错误: critical={critical} 大于 warning={warning}")]
    Inverted { warning: f64, critical: f64 },
}

impl Thresholds {
    pub fn new(warning: f64, critical: f64) -> Result<Self, ThresholdError> {
        let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_range(warning) || !in_range(critical) {
            return Err(ThresholdError::OutOfRange { warning, critical });
        }
        if critical > warning {
            return Err(ThresholdError::Inverted { warning, critical });
        }
        Ok(Self { warning, critical })
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn critical(&self) -> f64 {
        self.critical
    }
}

// ==========================================
// ThresholdTable - 阈值表
// ==========================================
// 启动时加载，运行期只读；显式传入引擎，不做全局变量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    availability: Thresholds,
    performance: Thresholds,
    quality: Thresholds,
    oee: Thresholds,
}

impl ThresholdTable {
    pub fn new(
        availability: Thresholds,
        performance: Thresholds,
        quality: Thresholds,
        oee: Thresholds,
    ) -> Self {
        Self {
            availability,
            performance,
            quality,
            oee,
        }
    }

    pub fn get(&self, kpi: KpiName) -> Thresholds {
        match kpi {
            KpiName::Availability => self.availability,
            KpiName::Performance => self.performance,
            KpiName::Quality => self.quality,
            KpiName::Oee => self.oee,
        }
    }

    /// 覆写单个 KPI 的阈值
    pub fn with(mut self, kpi: KpiName, thresholds: Thresholds) -> Self {
        match kpi {
            KpiName::Availability => self.availability = thresholds,
            KpiName::Performance => self.performance = thresholds,
            KpiName::Quality => self.quality = thresholds,
            KpiName::Oee => self.oee = thresholds,
        }
        self
    }
}

impl Default for ThresholdTable {
    /// 产线现行阈值
    fn default() -> Self {
        Self {
            availability: Thresholds { warning: 0.90, critical: 0.80 },
            performance: Thresholds { warning: 0.95, critical: 0.85 },
            quality: Thresholds { warning: 0.98, critical: 0.95 },
            oee: Thresholds { warning: 0.85, critical: 0.75 },
        }
    }
}
