// ==========================================
// 产线 OEE 指标监控系统 - KPI 查询 API
// ==========================================
// 只读: KPI 值只由引擎写入
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{KpiName, KpiValue, TimeWindow};
use crate::repository::KpiValueRepository;

pub struct KpiApi {
    kpi_repo: Arc<KpiValueRepository>,
}

impl KpiApi {
    pub fn new(kpi_repo: Arc<KpiValueRepository>) -> Self {
        Self { kpi_repo }
    }

    /// 每个 KPI 最近一次的值（尚未计算过的 KPI 不出现在结果中）
    pub fn latest_values(&self) -> ApiResult<Vec<KpiValue>> {
        let mut values = Vec::with_capacity(KpiName::ALL.len());
        for kpi in KpiName::ALL {
            if let Some(value) = self.kpi_repo.find_latest(kpi)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// 查询某 KPI 在 [start, end] 内的值
    ///
    /// # 参数
    /// - kpi_name: availability / performance / quality / OEE
    pub fn list_values(
        &self,
        kpi_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<Vec<KpiValue>> {
        let kpi = kpi_name.parse::<KpiName>().map_err(ApiError::InvalidInput)?;
        let window =
            TimeWindow::new(start, end).map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        Ok(self.kpi_repo.find_in_window(kpi, &window)?)
    }
}
