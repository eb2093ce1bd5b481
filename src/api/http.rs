// ==========================================
// 产线 OEE 指标监控系统 - 告警 HTTP 服务
// ==========================================
// 路由:
// - POST /alerts/                    人工创建告警
// - GET  /alerts/?skip=&limit=       分页查询
// - GET  /alerts/{id}                按 id 查询
// - PUT  /alerts/{id}/acknowledge    确认告警
// - GET  /health                     存活检查
// 错误码: InvalidInput → 400, NotFound → 404, Conflict → 409, 其余 → 500
// ==========================================

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::api::alert_api::{AlertApi, AlertView, CreateAlertRequest};
use crate::api::error::{ApiError, ApiResult};

/// 构建告警路由
pub fn router(api: Arc<AlertApi>) -> Router {
    Router::new()
        .route("/alerts", get(list_alerts).post(create_alert))
        .route("/alerts/", get(list_alerts).post(create_alert))
        .route("/alerts/:id", get(get_alert))
        .route("/alerts/:id/acknowledge", put(acknowledge_alert))
        .route("/health", get(health_handler))
        .with_state(api)
}

/// 在已绑定的监听器上提供服务，shutdown 完成后优雅退出
pub async fn serve<F>(listener: TcpListener, api: Arc<AlertApi>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "告警 HTTP 服务已启动");
    }
    axum::serve(listener, router(api))
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    skip: Option<u32>,
    limit: Option<u32>,
}

async fn create_alert(
    State(api): State<Arc<AlertApi>>,
    Json(request): Json<CreateAlertRequest>,
) -> ApiResult<Json<AlertView>> {
    run_blocking(api, move |api| api.create_alert(request))
        .await
        .map(Json)
}

async fn list_alerts(
    State(api): State<Arc<AlertApi>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AlertView>>> {
    run_blocking(api, move |api| api.list_alerts(query.skip, query.limit))
        .await
        .map(Json)
}

async fn get_alert(
    State(api): State<Arc<AlertApi>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AlertView>> {
    run_blocking(api, move |api| api.get_alert(id)).await.map(Json)
}

async fn acknowledge_alert(
    State(api): State<Arc<AlertApi>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AlertView>> {
    run_blocking(api, move |api| api.acknowledge_alert(id))
        .await
        .map(Json)
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 仓储调用是同步 SQLite 访问，放到阻塞线程池执行
async fn run_blocking<T, F>(api: Arc<AlertApi>, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&AlertApi) -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&api))
        .await
        .map_err(|e| ApiError::InternalError(format!("告警请求执行失败: {}", e)))?
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) | ApiError::Other(_) => {
                tracing::error!(error = %self, "告警接口内部错误");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ApiError::InvalidInput("limit".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("Alert(id=9)".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ApiError::DatabaseError("locked".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
