// ==========================================
// 产线 OEE 指标监控系统 - 领域类型定义
// ==========================================
// KPI 名称 / KPI 状态 / 告警级别
// 数据库存储格式: 小写（OEE 除外，保持历史口径 "OEE"）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// KPI 名称
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KpiName {
    #[serde(rename = "availability")]
    Availability, // 时间开动率
    #[serde(rename = "performance")]
    Performance, // 性能开动率
    #[serde(rename = "quality")]
    Quality, // 合格品率
    #[serde(rename = "OEE")]
    Oee, // 设备综合效率
}

impl KpiName {
    /// 每次计算写入的全部 KPI（写入顺序）
    pub const ALL: [KpiName; 4] = [
        KpiName::Availability,
        KpiName::Performance,
        KpiName::Quality,
        KpiName::Oee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiName::Availability => "availability",
            KpiName::Performance => "performance",
            KpiName::Quality => "quality",
            KpiName::Oee => "OEE",
        }
    }
}

impl fmt::Display for KpiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KpiName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "availability" => Ok(KpiName::Availability),
            "performance" => Ok(KpiName::Performance),
            "quality" => Ok(KpiName::Quality),
            "OEE" | "oee" => Ok(KpiName::Oee),
            other => Err(format!("未知 KPI: {}", other)),
        }
    }
}

// ==========================================
// KPI 状态
// ==========================================
// 所有现有 KPI 均为“越高越好”
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiStatus {
    Normal,
    Warning,
    Critical,
}

impl KpiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiStatus::Normal => "normal",
            KpiStatus::Warning => "warning",
            KpiStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for KpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KpiStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "normal" => Ok(KpiStatus::Normal),
            "warning" => Ok(KpiStatus::Warning),
            "critical" => Ok(KpiStatus::Critical),
            other => Err(format!("未知 KPI 状态: {}", other)),
        }
    }
}

// ==========================================
// 告警级别
// ==========================================
// 只有非 normal 状态才会产生告警，因此没有 Normal 变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }

    /// 由 KPI 状态推导告警级别（normal → None）
    pub fn from_status(status: KpiStatus) -> Option<Self> {
        match status {
            KpiStatus::Normal => None,
            KpiStatus::Warning => Some(AlertSeverity::Warning),
            KpiStatus::Critical => Some(AlertSeverity::Critical),
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "warning" => Ok(AlertSeverity::Warning),
            "critical" => Ok(AlertSeverity::Critical),
            other => Err(format!("未知告警级别: {}", other)),
        }
    }
}
