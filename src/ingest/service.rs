// ==========================================
// 产线 OEE 指标监控系统 - 读数采集服务
// ==========================================
// 职责: 消息解码 + 持久化（传输层由外部适配器负责）
// ==========================================

use crate::domain::SensorReading;
use crate::ingest::error::IngestResult;
use crate::ingest::payload::decode_message;
use crate::repository::SensorReadingRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct IngestService {
    reading_repo: Arc<SensorReadingRepository>,
}

impl IngestService {
    pub fn new(reading_repo: Arc<SensorReadingRepository>) -> Self {
        Self { reading_repo }
    }

    /// 处理一条消息: 解码并写入
    ///
    /// 同一传感器同一时刻的重复读数以仓储错误返回
    pub fn handle_message(
        &self,
        topic: &str,
        payload: &[u8],
        received_at: DateTime<Utc>,
    ) -> IngestResult<SensorReading> {
        let reading = match decode_message(topic, payload, received_at) {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(topic, error = %e, "读数报文被拒绝");
                return Err(e);
            }
        };

        self.reading_repo.insert(&reading)?;
        tracing::debug!(
            sensor_id = %reading.sensor_id,
            value = reading.value,
            unit = %reading.unit,
            "读数已写入"
        );
        Ok(reading)
    }

    /// 批量写入已解码的读数（单事务）
    pub fn ingest_batch(&self, readings: &[SensorReading]) -> IngestResult<usize> {
        let n = self.reading_repo.batch_insert(readings)?;
        tracing::info!(count = n, "批量读数已写入");
        Ok(n)
    }
}
