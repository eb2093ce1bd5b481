// ==========================================
// 产线 OEE 指标监控系统 - OEE 聚合引擎
// ==========================================
// 流程（单次运行）:
// 1. 读数查询: 三个分量依次计算（各自吸收 NoData / QueryFailure）
// 2. oee = availability × performance × quality
// 3. 单事务: 写入 4 条 KpiValue（时间 = 窗口结束）+ 告警
// 4. 提交；任一写入失败则整体回滚，不留部分结果
//
// 入口:
// - calculate_oee: 失败收敛为 0.0（调度器使用，不中断循环）
// - evaluate:      返回完整结果或错误（工具/测试使用）
// ==========================================

use crate::config::EngineConfig;
use crate::domain::{Alert, KpiName, KpiValue, ThresholdTable, TimeWindow};
use crate::engine::alert_emitter::AlertEmitter;
use crate::engine::availability::AvailabilityCalculator;
use crate::engine::calculator::{clamp_ratio, ComponentCalculator, QUERY_FAILURE_DEFAULT};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::performance::PerformanceCalculator;
use crate::engine::quality::QualityCalculator;
use crate::engine::status::classify_with;
use crate::repository::{kpi_value_repo, SqliteReadingStore};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

// ==========================================
// OeeReport - 单次运行结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct OeeReport {
    pub run_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
    pub kpi_values: Vec<KpiValue>,
    pub alerts: Vec<Alert>,
}

// ==========================================
// OeeEngine
// ==========================================
pub struct OeeEngine {
    availability: AvailabilityCalculator,
    performance: PerformanceCalculator,
    quality: QualityCalculator,
    emitter: AlertEmitter,
    config: EngineConfig,
}

impl OeeEngine {
    /// 构造引擎（配置与阈值在启动时加载并校验）
    pub fn new(config: EngineConfig, thresholds: ThresholdTable) -> Self {
        let sensors = &config.sensors;
        Self {
            availability: AvailabilityCalculator::new(sensors.status.clone()),
            performance: PerformanceCalculator::new(
                sensors.speed.clone(),
                sensors.status.clone(),
                config.ideal_speed,
                config.performance_cap,
            ),
            quality: QualityCalculator::new(sensors.quality.clone(), config.quality_mode),
            emitter: AlertEmitter::new(thresholds, config.alert_suppression),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        self.emitter.thresholds()
    }

    /// 计算窗口 OEE（失败收敛）
    ///
    /// # 返回
    /// - 成功: OEE ∈ [0,1]，4 条 KpiValue 及告警已提交
    /// - 失败: 0.0，已记录 error 日志，数据库无任何本次写入
    pub fn calculate_oee(&self, conn: &mut Connection, window: &TimeWindow) -> f64 {
        match self.evaluate(conn, window) {
            Ok(report) => report.oee,
            Err(e) => {
                tracing::error!(%window, error = %e, "OEE 计算失败，本次结果按 0.0 处理");
                QUERY_FAILURE_DEFAULT
            }
        }
    }

    /// 按起止时间计算（起止非法时同样收敛为 0.0）
    pub fn calculate_oee_between(
        &self,
        conn: &mut Connection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> f64 {
        match TimeWindow::new(start, end) {
            Ok(window) => self.calculate_oee(conn, &window),
            Err(e) => {
                tracing::error!(error = %EngineError::from(e), "OEE 计算失败，本次结果按 0.0 处理");
                QUERY_FAILURE_DEFAULT
            }
        }
    }

    /// 计算并持久化，返回完整结果
    pub fn evaluate(&self, conn: &mut Connection, window: &TimeWindow) -> EngineResult<OeeReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("oee_run", run_id = %run_id, %window);
        let _enter = span.enter();

        // ===== 1. 读数查询 =====
        let (availability, performance, quality) = {
            let store = SqliteReadingStore::new(conn, self.config.query_timeout);
            (
                self.availability.compute(&store, window),
                self.performance.compute(&store, window),
                self.quality.compute(&store, window),
            )
        };

        // ===== 2. 聚合 =====
        let oee = clamp_ratio(availability * performance * quality);
        let end = window.end();
        let kpi_values: Vec<KpiValue> = [
            (KpiName::Availability, availability),
            (KpiName::Performance, performance),
            (KpiName::Quality, quality),
            (KpiName::Oee, oee),
        ]
        .into_iter()
        .map(|(kpi_name, value)| KpiValue {
            time: end,
            kpi_name,
            value,
            status: classify_with(value, &self.thresholds().get(kpi_name)),
        })
        .collect();

        // ===== 3. 单事务写入 =====
        let tx = conn.transaction().map_err(EngineError::persistence)?;
        for value in &kpi_values {
            kpi_value_repo::insert_in(&tx, value).map_err(EngineError::PersistenceFailure)?;
        }

        let mut alerts = Vec::new();
        for value in kpi_values.iter().filter(|v| self.alerts_enabled_for(v.kpi_name)) {
            if let Some(alert) = self.emitter.evaluate_and_emit(&tx, value.kpi_name, value.value, end)? {
                alerts.push(alert);
            }
        }

        // ===== 4. 提交 =====
        tx.commit().map_err(EngineError::persistence)?;

        tracing::info!(
            availability,
            performance,
            quality,
            oee,
            alerts = alerts.len(),
            "OEE 计算完成"
        );

        Ok(OeeReport {
            run_id,
            window_start: window.start(),
            window_end: end,
            availability,
            performance,
            quality,
            oee,
            kpi_values,
            alerts,
        })
    }

    fn alerts_enabled_for(&self, kpi: KpiName) -> bool {
        kpi == KpiName::Oee || self.config.alert_on_components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::{AlertSeverity, KpiStatus, SensorReading};
    use crate::repository::reading_repo;
    use chrono::{Duration, TimeZone};

    fn window() -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::minutes(59)).unwrap()
    }

    /// 60 个采样点: 45 运行 / 15 停机；速度 90；合格率 0.98
    fn seed_scenario(conn: &Connection) {
        let w = window();
        for i in 0..60 {
            let t = w.start() + Duration::minutes(i);
            let status = if i < 45 { 1.0 } else { 0.0 };
            for reading in [
                SensorReading::new(t, "STATUS001", status, "binary"),
                SensorReading::new(t, "SPEED001", 90.0, "units/hour"),
                SensorReading::new(t, "QUALITY001", 0.98, "ratio"),
            ] {
                reading_repo::insert_in(conn, &reading).unwrap();
            }
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    fn capped_engine() -> OeeEngine {
        let config = EngineConfig {
            performance_cap: 0.90,
            ..EngineConfig::default()
        };
        OeeEngine::new(config, ThresholdTable::default())
    }

    #[test]
    fn test_scenario_product_and_alert() {
        let mut conn = open_in_memory().unwrap();
        seed_scenario(&conn);

        let report = capped_engine().evaluate(&mut conn, &window()).unwrap();
        assert_eq!(report.availability, 0.75);
        assert_eq!(report.performance, 0.90);
        assert!((report.quality - 0.98).abs() < 1e-9);
        assert!((report.oee - 0.6615).abs() < 1e-9);

        assert_eq!(report.kpi_values.len(), 4);
        assert!(report.kpi_values.iter().all(|v| v.time == window().end()));
        assert_eq!(report.kpi_values[3].status, KpiStatus::Critical);

        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].kpi_name, "OEE");
        assert_eq!(report.alerts[0].severity, AlertSeverity::Critical);

        assert_eq!(count(&conn, "kpi_values"), 4);
        assert_eq!(count(&conn, "alerts"), 1);
    }

    #[test]
    fn test_empty_window_is_optimistic() {
        let mut conn = open_in_memory().unwrap();
        let engine = OeeEngine::new(EngineConfig::default(), ThresholdTable::default());

        assert_eq!(engine.calculate_oee(&mut conn, &window()), 1.0);
        assert_eq!(count(&conn, "kpi_values"), 4);
        assert_eq!(count(&conn, "alerts"), 0);
    }

    #[test]
    fn test_component_alerts_are_opt_in() {
        let mut conn = open_in_memory().unwrap();
        seed_scenario(&conn);

        let config = EngineConfig {
            performance_cap: 0.90,
            alert_on_components: true,
            ..EngineConfig::default()
        };
        let report = OeeEngine::new(config, ThresholdTable::default())
            .evaluate(&mut conn, &window())
            .unwrap();

        // availability 0.75 (critical), performance 0.90 (warning), OEE 0.6615 (critical)
        let names: Vec<&str> = report.alerts.iter().map(|a| a.kpi_name.as_str()).collect();
        assert_eq!(names[..2], ["availability", "performance"]);
        assert_eq!(names.last(), Some(&"OEE"));
        assert_eq!(report.alerts[1].severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_write_failure_rolls_back_everything() {
        let mut conn = open_in_memory().unwrap();
        seed_scenario(&conn);
        conn.execute_batch("DROP TABLE alerts;").unwrap();

        assert_eq!(capped_engine().calculate_oee(&mut conn, &window()), 0.0);
        assert_eq!(count(&conn, "kpi_values"), 0);
    }

    #[test]
    fn test_invalid_bounds_return_zero() {
        let mut conn = open_in_memory().unwrap();
        let w = window();
        let engine = capped_engine();
        assert_eq!(engine.calculate_oee_between(&mut conn, w.end(), w.start()), 0.0);
        assert_eq!(count(&conn, "kpi_values"), 0);
    }
}
