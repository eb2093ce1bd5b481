// ==========================================
// 产线 OEE 指标监控系统 - 传感器模拟器
// ==========================================
// 每个采样时刻生成三条消息（状态/速度/合格率），时间戳相同:
// - 状态: 每次采样以 1% 概率在运行/停机之间切换
// - 速度: 运行时 80 × U(0.9, 1.1)，停机为 0
// - 合格率: 运行时 U(0.93, 1.0)，停机为 0
// ==========================================

use crate::domain::{QUALITY_SENSOR_ID, SPEED_SENSOR_ID, STATUS_SENSOR_ID};
use crate::ingest::payload::SENSOR_TOPIC_PREFIX;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

const DOWNTIME_TOGGLE_PROBABILITY: f64 = 0.01;
const BASE_SPEED: f64 = 80.0;

/// 一条待发布的消息
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub struct SensorSimulator {
    rng: StdRng,
    running: bool,
}

impl SensorSimulator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, running: true }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 生成 at 时刻的一组消息
    pub fn sample(&mut self, at: DateTime<Utc>) -> Vec<SimulatedMessage> {
        if self.rng.gen_bool(DOWNTIME_TOGGLE_PROBABILITY) {
            self.running = !self.running;
        }

        let (status, speed, quality) = if self.running {
            (
                1.0,
                round_to(BASE_SPEED * self.rng.gen_range(0.9..=1.1), 2),
                round_to(self.rng.gen_range(0.93..=1.0), 3),
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let timestamp = at.to_rfc3339_opts(SecondsFormat::Micros, true);
        [
            ("status", STATUS_SENSOR_ID, status, "binary"),
            ("speed", SPEED_SENSOR_ID, speed, "units/hour"),
            ("quality", QUALITY_SENSOR_ID, quality, "ratio"),
        ]
        .into_iter()
        .map(|(channel, sensor_id, value, unit)| SimulatedMessage {
            topic: format!("{}{}", SENSOR_TOPIC_PREFIX, channel),
            payload: json!({
                "sensor_id": sensor_id,
                "value": value,
                "unit": unit,
                "timestamp": timestamp,
            })
            .to_string()
            .into_bytes(),
        })
        .collect()
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
