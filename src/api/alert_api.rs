// ==========================================
// 产线 OEE 指标监控系统 - 告警 API
// ==========================================
// 职责: 人工创建告警、分页查询、按 id 查询、确认
// 红线: 确认是唯一允许的修改，且只能 false → true
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Alert, AlertSeverity, NewAlert};
use crate::repository::AlertRepository;

/// 默认分页大小
pub const DEFAULT_LIST_LIMIT: u32 = 100;
/// 单页上限
pub const MAX_LIST_LIMIT: u32 = 1000;

// ==========================================
// AlertApi - 告警 API
// ==========================================
pub struct AlertApi {
    alert_repo: Arc<AlertRepository>,
}

impl AlertApi {
    pub fn new(alert_repo: Arc<AlertRepository>) -> Self {
        Self { alert_repo }
    }

    /// 人工创建告警（时间为当前时间）
    ///
    /// # 返回
    /// - Ok(AlertView): 已持久化的告警
    /// - Err(InvalidInput): 名称/消息为空或级别非法
    pub fn create_alert(&self, request: CreateAlertRequest) -> ApiResult<AlertView> {
        let kpi_name = request.kpi_name.trim();
        if kpi_name.is_empty() {
            return Err(ApiError::InvalidInput("kpi_name不能为空".to_string()));
        }
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ApiError::InvalidInput("message不能为空".to_string()));
        }
        let severity = request
            .severity
            .parse::<AlertSeverity>()
            .map_err(ApiError::InvalidInput)?;

        let alert = self.alert_repo.insert(NewAlert {
            time: Utc::now(),
            kpi_name: kpi_name.to_string(),
            severity,
            message: message.to_string(),
        })?;

        tracing::info!(alert_id = alert.id, kpi = %alert.kpi_name, %severity, "人工告警已创建");
        Ok(AlertView::from(alert))
    }

    /// 分页查询告警（按 id 升序）
    ///
    /// # 参数
    /// - skip: 跳过条数（默认 0）
    /// - limit: 返回条数（默认 100，上限 1000，0 非法）
    pub fn list_alerts(&self, skip: Option<u32>, limit: Option<u32>) -> ApiResult<Vec<AlertView>> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit必须大于0".to_string()));
        }
        let limit = limit.min(MAX_LIST_LIMIT);

        let alerts = self.alert_repo.list(skip, limit)?;
        Ok(alerts.into_iter().map(AlertView::from).collect())
    }

    /// 按 id 查询告警
    pub fn get_alert(&self, id: i64) -> ApiResult<AlertView> {
        self.alert_repo
            .find_by_id(id)?
            .map(AlertView::from)
            .ok_or_else(|| ApiError::NotFound(format!("Alert(id={})不存在", id)))
    }

    /// 确认告警（幂等）
    ///
    /// # 返回
    /// - Ok(AlertView): 确认后的告警
    /// - Err(NotFound): id 不存在，不修改任何行
    pub fn acknowledge_alert(&self, id: i64) -> ApiResult<AlertView> {
        self.alert_repo.acknowledge(id)?;
        tracing::info!(alert_id = id, "告警已确认");
        self.get_alert(id)
    }
}

// ==========================================
// DTO
// ==========================================

/// 人工创建告警请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlertRequest {
    pub kpi_name: String,
    pub severity: String,
    pub message: String,
}

/// 告警视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertView {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub kpi_name: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub acknowledged: bool,
}

impl From<Alert> for AlertView {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id,
            time: alert.time,
            kpi_name: alert.kpi_name,
            severity: alert.severity,
            message: alert.message,
            acknowledged: alert.acknowledged,
        }
    }
}
