// ==========================================
// 产线 OEE 指标监控系统 - 定时调度
// ==========================================
// 每个周期:
// - 以当前时间为终点、回溯 window 构造计算窗口
// - 在 blocking 线程池中打开独立连接并执行一次 OEE 计算
// - 单次失败只记录日志（引擎本身收敛为 0.0），不中断循环
// 服务模式: 调度循环与告警 HTTP 服务共用一个退出信号
// ==========================================

use crate::api::{http, AlertApi};
use crate::db::open_sqlite_connection;
use crate::domain::TimeWindow;
use crate::engine::{OeeEngine, QUERY_FAILURE_DEFAULT};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

pub struct KpiScheduler {
    engine: Arc<OeeEngine>,
    db_path: String,
    interval: Duration,
    window: Duration,
}

impl KpiScheduler {
    pub fn new(engine: OeeEngine, db_path: impl Into<String>, interval: Duration, window: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            db_path: db_path.into(),
            interval,
            window,
        }
    }

    /// 以 now 为窗口终点执行一次计算（同步，阻塞当前线程）
    pub fn run_once(&self, now: DateTime<Utc>) -> f64 {
        run_cycle(&self.engine, &self.db_path, self.window, now)
    }

    /// 在 blocking 线程池中执行一次计算
    pub async fn tick(&self) -> f64 {
        let engine = Arc::clone(&self.engine);
        let db_path = self.db_path.clone();
        let window = self.window;

        match tokio::task::spawn_blocking(move || run_cycle(&engine, &db_path, window, Utc::now())).await {
            Ok(oee) => oee,
            Err(e) => {
                tracing::error!(error = %e, "计算任务异常退出");
                QUERY_FAILURE_DEFAULT
            }
        }
    }

    /// 周期执行，直到 shutdown 完成
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            window_secs = self.window.as_secs(),
            db_path = %self.db_path,
            "KPI 调度已启动"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let oee = self.tick().await;
                    tracing::debug!(oee, "本周期计算结束");
                }
                _ = &mut shutdown => {
                    tracing::info!("KPI 调度已停止");
                    break;
                }
            }
        }
    }
}

/// 同时运行调度循环与告警 HTTP 服务，直到 signal 完成
///
/// signal 返回错误（例如无法监听 Ctrl-C）时同样停止两者，并把错误交给调用方
pub async fn run_service<S>(
    scheduler: &KpiScheduler,
    listener: TcpListener,
    alert_api: Arc<AlertApi>,
    signal: S,
) -> std::io::Result<()>
where
    S: Future<Output = std::io::Result<()>>,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(http::serve(
        listener,
        alert_api,
        wait_for_shutdown(shutdown_rx.clone()),
    ));

    let signal = async move {
        let result = signal.await;
        let _ = shutdown_tx.send(true);
        result
    };
    let (signal_result, ()) =
        tokio::join!(signal, scheduler.run_until(wait_for_shutdown(shutdown_rx)));

    match server.await {
        Ok(Ok(())) => tracing::info!("告警 HTTP 服务已停止"),
        Ok(Err(e)) => tracing::error!(error = %e, "告警 HTTP 服务异常退出"),
        Err(e) => tracing::error!(error = %e, "告警 HTTP 任务异常退出"),
    }

    signal_result
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

fn run_cycle(engine: &OeeEngine, db_path: &str, window: Duration, now: DateTime<Utc>) -> f64 {
    let window = match chrono::Duration::from_std(window)
        .map_err(|e| e.to_string())
        .and_then(|len| TimeWindow::trailing(now, len).map_err(|e| e.to_string()))
    {
        Ok(window) => window,
        Err(e) => {
            tracing::error!(error = %e, "计算窗口无效");
            return QUERY_FAILURE_DEFAULT;
        }
    };

    let mut conn = match open_sqlite_connection(db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(db_path, error = %e, "打开数据库失败");
            return QUERY_FAILURE_DEFAULT;
        }
    };

    engine.calculate_oee(&mut conn, &window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::db::init_schema;
    use crate::domain::ThresholdTable;
    use crate::repository::AlertRepository;
    use std::sync::Mutex;

    fn scheduler(db_path: &str) -> KpiScheduler {
        let engine = OeeEngine::new(EngineConfig::default(), ThresholdTable::default());
        KpiScheduler::new(engine, db_path, Duration::from_secs(1), Duration::from_secs(300))
    }

    #[test]
    fn test_run_once_on_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kpi.db");
        let path = path.to_str().unwrap();
        init_schema(&open_sqlite_connection(path).unwrap()).unwrap();

        assert_eq!(scheduler(path).run_once(Utc::now()), 1.0);
    }

    #[test]
    fn test_missing_schema_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        assert_eq!(scheduler(path.to_str().unwrap()).run_once(Utc::now()), 0.0);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kpi.db");
        let path = path.to_str().unwrap().to_string();
        init_schema(&open_sqlite_connection(&path).unwrap()).unwrap();

        let scheduler = scheduler(&path);
        // 首个 tick 立即触发，随后关闭
        scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await;

        let conn = open_sqlite_connection(&path).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM kpi_values", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 4);
    }

    async fn service_parts(path: &str) -> (TcpListener, Arc<AlertApi>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let conn = Arc::new(Mutex::new(open_sqlite_connection(path).unwrap()));
        let api = Arc::new(AlertApi::new(Arc::new(AlertRepository::new(conn))));
        (listener, api)
    }

    #[tokio::test]
    async fn test_signal_failure_stops_service_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kpi.db");
        let path = path.to_str().unwrap().to_string();
        init_schema(&open_sqlite_connection(&path).unwrap()).unwrap();

        let scheduler = scheduler(&path);
        let (listener, api) = service_parts(&path).await;
        let signal = async {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "signal handler unavailable",
            ))
        };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_service(&scheduler, listener, api, signal),
        )
        .await
        .expect("service should stop promptly");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_service_runs_until_signal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kpi.db");
        let path = path.to_str().unwrap().to_string();
        init_schema(&open_sqlite_connection(&path).unwrap()).unwrap();

        let scheduler = scheduler(&path);
        let (listener, api) = service_parts(&path).await;
        let signal = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        };

        run_service(&scheduler, listener, api, signal).await.unwrap();

        let conn = open_sqlite_connection(&path).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM kpi_values", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 4);
    }
}
