// ==========================================
// 产线 OEE 指标监控系统 - 告警生成
// ==========================================
// 规则:
// - 状态 normal → 不产生告警
// - 状态 warning/critical → 写入一条同级别告警，acknowledged=false
// - 告警时间 = 传入时间戳（引擎传入窗口结束时间，与 KPI 值一致）
// - 可选抑制: 同一 KPI 在抑制窗口内已有告警则跳过（默认关闭）
// 写入使用调用方的连接/事务，失败由调用方回滚
// ==========================================

use crate::domain::{Alert, AlertSeverity, KpiName, NewAlert, ThresholdTable};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::status::classify_with;
use crate::repository::alert_repo;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::time::Duration;

pub struct AlertEmitter {
    thresholds: ThresholdTable,
    suppression: Option<Duration>,
}

impl AlertEmitter {
    pub fn new(thresholds: ThresholdTable, suppression: Option<Duration>) -> Self {
        Self {
            thresholds,
            suppression,
        }
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// 判定并按需写入告警
    ///
    /// # 返回
    /// - Ok(Some(alert)): 已写入
    /// - Ok(None): 状态正常或被抑制
    pub fn evaluate_and_emit(
        &self,
        conn: &Connection,
        kpi: KpiName,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> EngineResult<Option<Alert>> {
        let status = classify_with(value, &self.thresholds.get(kpi));
        let Some(severity) = AlertSeverity::from_status(status) else {
            return Ok(None);
        };

        if self.is_suppressed(conn, kpi, timestamp)? {
            tracing::debug!(kpi = %kpi, %severity, "抑制窗口内已有告警，跳过");
            return Ok(None);
        }

        let new_alert = NewAlert::for_kpi(kpi, severity, value, timestamp);
        let id = alert_repo::insert_in(conn, &new_alert).map_err(EngineError::persistence)?;
        let alert = new_alert.into_alert(id);

        tracing::warn!(
            alert_id = alert.id,
            kpi = %kpi,
            %severity,
            value,
            "{}",
            alert.message
        );
        Ok(Some(alert))
    }

    fn is_suppressed(
        &self,
        conn: &Connection,
        kpi: KpiName,
        timestamp: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let Some(window) = self.suppression else {
            return Ok(false);
        };
        let Some(since) = chrono::Duration::from_std(window)
            .ok()
            .and_then(|window| timestamp.checked_sub_signed(window))
        else {
            tracing::warn!(
                kpi = %kpi,
                suppression_secs = window.as_secs(),
                "告警抑制窗口超出可表示范围，本次不抑制"
            );
            return Ok(false);
        };

        let latest = alert_repo::latest_alert_time_in(conn, kpi.as_str(), &since, &timestamp)
            .map_err(EngineError::QueryFailure)?;
        Ok(latest.is_some())
    }
}
