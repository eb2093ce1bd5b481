// ==========================================
// 产线 OEE 指标监控系统 - 读数报文解码
// ==========================================
// 主题: plant/sensors/<名称>（前缀后至少一级非空）
// 报文: {"sensor_id": "...", "value": 1.0, "unit": "...", "timestamp": "..."}
// - unit 可选，缺省为 ""
// - timestamp 可选，缺省为接收时间
// ==========================================

use crate::domain::SensorReading;
use crate::ingest::error::{IngestError, IngestResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// 读数主题前缀
pub const SENSOR_TOPIC_PREFIX: &str = "plant/sensors/";

/// 无时区时间戳允许的格式（按 UTC 解释）
const NAIVE_TS_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Deserialize)]
pub struct SensorPayload {
    pub sensor_id: Option<String>,
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// 主题是否属于读数主题
pub fn is_sensor_topic(topic: &str) -> bool {
    topic
        .strip_prefix(SENSOR_TOPIC_PREFIX)
        .map(|rest| rest.split('/').next().is_some_and(|seg| !seg.is_empty()))
        .unwrap_or(false)
}

/// 解析时间戳: RFC 3339 或无时区格式（视为 UTC）
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TS_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// 解码一条消息为读数
///
/// # 返回
/// - Err(UnsupportedTopic): 主题不匹配
/// - Err(InvalidPayload): JSON 非法、缺少 sensor_id/value、value 非有限值、时间戳无法解析
pub fn decode_message(
    topic: &str,
    payload: &[u8],
    received_at: DateTime<Utc>,
) -> IngestResult<SensorReading> {
    if !is_sensor_topic(topic) {
        return Err(IngestError::UnsupportedTopic(topic.to_string()));
    }

    let decoded: SensorPayload = serde_json::from_slice(payload)
        .map_err(|e| IngestError::InvalidPayload(format!("JSON 解析失败: {}", e)))?;

    let sensor_id = decoded
        .sensor_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| IngestError::InvalidPayload("sensor_id 缺失".to_string()))?;

    let value = decoded
        .value
        .ok_or_else(|| IngestError::InvalidPayload("value 缺失".to_string()))?;
    if !value.is_finite() {
        return Err(IngestError::InvalidPayload(format!("value 非有限值: {}", value)));
    }

    let time = match decoded.timestamp.as_deref() {
        None => received_at,
        Some(raw) => parse_timestamp(raw)
            .ok_or_else(|| IngestError::InvalidPayload(format!("无法解析时间戳: {}", raw)))?,
    };

    Ok(SensorReading::new(
        time,
        sensor_id,
        value,
        decoded.unit.unwrap_or_default(),
    ))
}
