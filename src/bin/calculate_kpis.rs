// 一次性计算: 以当前时间为终点、回溯 N 分钟计算一次 OEE 并打印结果（JSON）。
//
// Usage:
//   cargo run --bin calculate_kpis -- [db_path] [minutes]
//
// 未指定 db_path 时使用 KPI_MONITOR_DB_PATH / 默认数据目录；minutes 默认 5。

use anyhow::Context;
use chrono::{Duration, Utc};
use oee_kpi_monitor::config::{AppSettings, ConfigManager};
use oee_kpi_monitor::db::{init_schema, open_sqlite_connection};
use oee_kpi_monitor::domain::TimeWindow;
use oee_kpi_monitor::engine::OeeEngine;
use oee_kpi_monitor::logging;

fn main() -> anyhow::Result<()> {
    let settings = AppSettings::from_env()?;
    logging::init(settings.log_format);

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or(settings.db_path);
    let minutes: i64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("无效的分钟数: {}", raw))?,
        None => 5,
    };

    let mut conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    let config_manager = ConfigManager::new(&db_path)?;
    let engine = OeeEngine::new(
        config_manager.load_engine_config()?,
        config_manager.load_thresholds()?,
    );

    let window = TimeWindow::trailing(Utc::now(), Duration::minutes(minutes))?;
    let report = engine.evaluate(&mut conn, &window)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("OEE: {:.2}%", report.oee * 100.0);
    Ok(())
}
