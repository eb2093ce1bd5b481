// CSV 读数导入: sensor_id,timestamp,value[,unit]，单事务写入。
//
// Usage:
//   cargo run --bin import_readings -- <csv_path> [db_path]

use anyhow::Context;
use oee_kpi_monitor::config::AppSettings;
use oee_kpi_monitor::db::{init_schema, open_sqlite_connection};
use oee_kpi_monitor::ingest::{csv_source, IngestService};
use oee_kpi_monitor::logging;
use oee_kpi_monitor::repository::SensorReadingRepository;
use std::fs::File;
use std::sync::{Arc, Mutex};

fn main() -> anyhow::Result<()> {
    let settings = AppSettings::from_env()?;
    logging::init(settings.log_format);

    let mut args = std::env::args().skip(1);
    let csv_path = args
        .next()
        .context("缺少参数: <csv_path> [db_path]")?;
    let db_path = args.next().unwrap_or(settings.db_path);

    let file = File::open(&csv_path).with_context(|| format!("无法打开文件 {}", csv_path))?;
    let readings = csv_source::read_readings(file)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let service = IngestService::new(Arc::new(SensorReadingRepository::new(Arc::new(
        Mutex::new(conn),
    ))));

    let imported = service.ingest_batch(&readings)?;
    println!("imported={} file={}", imported, csv_path);
    Ok(())
}
