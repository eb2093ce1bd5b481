// ==========================================
// 产线 OEE 指标监控系统 - CSV 读数来源
// ==========================================
// 格式: 表头 sensor_id,timestamp,value[,unit]（列顺序不限）
// 校验: 必需列缺失、时间戳/数值无法解析均报错并带行号
// ==========================================

use crate::domain::SensorReading;
use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::payload::parse_timestamp;
use csv::ReaderBuilder;
use std::io::Read;

const REQUIRED_COLUMNS: [&str; 3] = ["sensor_id", "timestamp", "value"];

/// 读取全部读数
pub fn read_readings<R: Read>(reader: R) -> IngestResult<Vec<SensorReading>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let mut indices = [0usize; 3];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column(name).ok_or_else(|| IngestError::CsvRow {
            row: 1,
            message: format!("缺少必需列: {}", name),
        })?;
    }
    let [id_idx, ts_idx, value_idx] = indices;
    let unit_idx = column("unit");

    let mut readings = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // 表头占第 1 行
        let row = idx + 2;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let field = |i: usize, name: &str| {
            record
                .get(i)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| IngestError::CsvRow {
                    row,
                    message: format!("{} 为空", name),
                })
        };

        let sensor_id = field(id_idx, "sensor_id")?;
        let raw_ts = field(ts_idx, "timestamp")?;
        let raw_value = field(value_idx, "value")?;

        let time = parse_timestamp(raw_ts).ok_or_else(|| IngestError::CsvRow {
            row,
            message: format!("无法解析时间戳: {}", raw_ts),
        })?;
        let value = raw_value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| IngestError::CsvRow {
                row,
                message: format!("无法解析数值: {}", raw_value),
            })?;
        let unit = unit_idx.and_then(|i| record.get(i)).unwrap_or("");

        readings.push(SensorReading::new(time, sensor_id, value, unit));
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_reads_rows_in_any_column_order() {
        let data = "\
value,sensor_id,timestamp,unit
1,STATUS001,2025-03-01T10:00:00Z,binary
88.2,SPEED001,2025-03-01 10:00:00,units/hour

0.97,QUALITY001,2025-03-01T10:00:00Z,
";
        let readings = read_readings(data.as_bytes()).unwrap();
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[1].sensor_id, "SPEED001");
        assert_eq!(readings[1].time, Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        assert_eq!(readings[2].unit, "");
    }

    #[test]
    fn test_missing_column() {
        let data = "sensor_id,value\nSTATUS001,1\n";
        assert!(matches!(
            read_readings(data.as_bytes()),
            Err(IngestError::CsvRow { row: 1, .. })
        ));
    }

    #[test]
    fn test_bad_value_reports_row() {
        let data = "sensor_id,timestamp,value\nSTATUS001,2025-03-01T10:00:00Z,1\nSTATUS001,2025-03-01T10:01:00Z,abc\n";
        assert!(matches!(
            read_readings(data.as_bytes()),
            Err(IngestError::CsvRow { row: 3, .. })
        ));
    }
}
