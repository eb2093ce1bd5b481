// ==========================================
// 产线 OEE 指标监控系统 - 告警领域模型
// ==========================================
// 对齐: alerts 表
// 生命周期: 创建时 acknowledged=false，仅允许确认一次 (false → true)
// ==========================================

use crate::domain::types::{AlertSeverity, KpiName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 已持久化的告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub kpi_name: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub acknowledged: bool,
}

/// 待写入的告警（id 由数据库分配）
///
/// kpi_name 为自由文本：人工告警可以挂在任意名称下
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub time: DateTime<Utc>,
    pub kpi_name: String,
    pub severity: AlertSeverity,
    pub message: String,
}

impl NewAlert {
    /// 引擎告警: 消息包含 KPI 名称、状态与百分比
    pub fn for_kpi(kpi: KpiName, severity: AlertSeverity, value: f64, time: DateTime<Utc>) -> Self {
        Self {
            time,
            kpi_name: kpi.as_str().to_string(),
            severity,
            message: format!(
                "KPI {} 处于 {} 状态 (值: {:.2}%)",
                kpi,
                severity,
                value * 100.0
            ),
        }
    }

    pub fn into_alert(self, id: i64) -> Alert {
        Alert {
            id,
            time: self.time,
            kpi_name: self.kpi_name,
            severity: self.severity,
            message: self.message,
            acknowledged: false,
        }
    }
}
