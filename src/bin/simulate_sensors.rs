// 传感器模拟: 生成历史读数并经采集服务写入（不依赖消息代理）。
//
// Usage:
//   cargo run --bin simulate_sensors -- [db_path] [minutes] [seed]
//
// 以当前时间为终点，向前每分钟生成一组 STATUS001 / SPEED001 / QUALITY001 读数；
// minutes 默认 60。

use anyhow::Context;
use chrono::{Duration, DurationRound, Utc};
use oee_kpi_monitor::config::AppSettings;
use oee_kpi_monitor::db::{init_schema, open_sqlite_connection};
use oee_kpi_monitor::ingest::{IngestService, SensorSimulator};
use oee_kpi_monitor::logging;
use oee_kpi_monitor::repository::SensorReadingRepository;
use std::sync::{Arc, Mutex};

fn main() -> anyhow::Result<()> {
    let settings = AppSettings::from_env()?;
    logging::init(settings.log_format);

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or(settings.db_path);
    let minutes: i64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("无效的分钟数: {}", raw))?,
        None => 60,
    };
    let seed: Option<u64> = args
        .next()
        .map(|raw| raw.parse().with_context(|| format!("无效的随机种子: {}", raw)))
        .transpose()?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let service = IngestService::new(Arc::new(SensorReadingRepository::new(Arc::new(
        Mutex::new(conn),
    ))));

    let end = Utc::now().duration_trunc(Duration::minutes(1))?;
    let mut simulator = SensorSimulator::new(seed);
    let mut written = 0usize;
    let mut rejected = 0usize;

    for offset in (0..minutes).rev() {
        let at = end - Duration::minutes(offset);
        for message in simulator.sample(at) {
            match service.handle_message(&message.topic, &message.payload, Utc::now()) {
                Ok(_) => written += 1,
                Err(e) => {
                    rejected += 1;
                    tracing::warn!(topic = %message.topic, error = %e, "读数写入失败");
                }
            }
        }
    }

    tracing::info!(written, rejected, "模拟读数生成完成");
    println!("written={} rejected={}", written, rejected);
    Ok(())
}
