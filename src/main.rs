// ==========================================
// 产线 OEE 指标监控系统 - 调度主入口
// ==========================================
// 启动: 读取环境设置 → 初始化日志 → 建表 → 加载配置与阈值 → 周期计算 + 告警 HTTP 服务
// 退出: Ctrl-C（监听失败时同样停止两者，并以错误退出）
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;
use oee_kpi_monitor::api::AlertApi;
use oee_kpi_monitor::config::{AppSettings, ConfigManager};
use oee_kpi_monitor::db::{init_schema, open_sqlite_connection};
use oee_kpi_monitor::engine::OeeEngine;
use oee_kpi_monitor::logging;
use oee_kpi_monitor::repository::AlertRepository;
use oee_kpi_monitor::scheduler::{run_service, KpiScheduler};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::from_env().context("读取环境设置失败")?;
    logging::init(settings.log_format);

    tracing::info!("==================================================");
    tracing::info!("{}", oee_kpi_monitor::APP_NAME);
    tracing::info!("系统版本: {}", oee_kpi_monitor::VERSION);
    tracing::info!("==================================================");
    tracing::info!("使用数据库: {}", settings.db_path);

    {
        let conn = open_sqlite_connection(&settings.db_path)
            .with_context(|| format!("无法打开数据库 {}", settings.db_path))?;
        init_schema(&conn).context("初始化数据库结构失败")?;
    }

    let config_manager = ConfigManager::new(&settings.db_path).context("初始化配置管理器失败")?;
    let engine_config = config_manager.load_engine_config().context("加载引擎参数失败")?;
    let thresholds = config_manager.load_thresholds().context("加载阈值失败")?;

    let snapshot = config_manager.get_config_snapshot()?;
    tracing::info!(%snapshot, "配置覆写快照");
    tracing::info!(
        ideal_speed = engine_config.ideal_speed,
        performance_cap = engine_config.performance_cap,
        quality_mode = %engine_config.quality_mode,
        alert_on_components = engine_config.alert_on_components,
        "引擎参数已加载"
    );

    let scheduler = KpiScheduler::new(
        OeeEngine::new(engine_config, thresholds),
        settings.db_path.clone(),
        settings.interval,
        settings.window,
    );

    let alert_conn = open_sqlite_connection(&settings.db_path)
        .with_context(|| format!("无法打开数据库 {}", settings.db_path))?;
    let alert_api = Arc::new(AlertApi::new(Arc::new(AlertRepository::new(Arc::new(
        Mutex::new(alert_conn),
    )))));
    let listener = TcpListener::bind(settings.http_addr)
        .await
        .with_context(|| format!("无法监听 {}", settings.http_addr))?;

    run_service(&scheduler, listener, alert_api, tokio::signal::ctrl_c())
        .await
        .context("监听退出信号失败")?;

    tracing::info!("已退出");
    Ok(())
}
