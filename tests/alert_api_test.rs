// ==========================================
// AlertApi 集成测试
// ==========================================
// 测试目标: 创建、分页、确认（幂等）与 NotFound 语义
// ==========================================

mod test_helpers;

use oee_kpi_monitor::api::{AlertApi, ApiError, CreateAlertRequest};
use oee_kpi_monitor::domain::AlertSeverity;
use oee_kpi_monitor::repository::AlertRepository;
use std::sync::{Arc, Mutex};
use test_helpers::{count_rows, create_test_db, open_test_connection};

fn setup() -> (tempfile::NamedTempFile, String, AlertApi) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = Arc::new(Mutex::new(open_test_connection(&db_path).unwrap()));
    let api = AlertApi::new(Arc::new(AlertRepository::new(conn)));
    (temp_file, db_path, api)
}

fn request(kpi_name: &str, severity: &str) -> CreateAlertRequest {
    CreateAlertRequest {
        kpi_name: kpi_name.to_string(),
        severity: severity.to_string(),
        message: format!("{} 人工告警", kpi_name),
    }
}

#[test]
fn test_create_and_get() {
    let (_temp_file, _db_path, api) = setup();

    let created = api.create_alert(request("OEE", "critical")).unwrap();
    assert_eq!(created.severity, AlertSeverity::Critical);
    assert!(!created.acknowledged);

    let fetched = api.get_alert(created.id).unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn test_free_text_kpi_name_is_accepted() {
    let (_temp_file, _db_path, api) = setup();
    let created = api.create_alert(request("line-2 conveyor", "warning")).unwrap();
    assert_eq!(created.kpi_name, "line-2 conveyor");
}

#[test]
fn test_list_pagination_and_cap() {
    let (_temp_file, _db_path, api) = setup();
    for i in 0..5 {
        api.create_alert(request(&format!("K{}", i), "warning")).unwrap();
    }

    let all = api.list_alerts(None, None).unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));

    let page = api.list_alerts(Some(2), Some(2)).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].kpi_name, "K2");

    // 超过上限的 limit 被截断而不是报错
    assert_eq!(api.list_alerts(None, Some(5000)).unwrap().len(), 5);
    assert!(api.list_alerts(Some(10), None).unwrap().is_empty());
    assert!(matches!(api.list_alerts(None, Some(0)), Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_acknowledge_is_idempotent() {
    let (_temp_file, _db_path, api) = setup();
    let created = api.create_alert(request("OEE", "warning")).unwrap();

    assert!(api.acknowledge_alert(created.id).unwrap().acknowledged);
    assert!(api.acknowledge_alert(created.id).unwrap().acknowledged);
}

#[test]
fn test_acknowledge_unknown_id_touches_nothing() {
    let (_temp_file, db_path, api) = setup();
    api.create_alert(request("OEE", "warning")).unwrap();

    assert!(matches!(api.acknowledge_alert(999), Err(ApiError::NotFound(_))));

    let conn = open_test_connection(&db_path).unwrap();
    assert_eq!(count_rows(&conn, "alerts"), 1);
    let acked: i64 = conn
        .query_row("SELECT COUNT(*) FROM alerts WHERE acknowledged = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(acked, 0);
}

#[test]
fn test_invalid_requests() {
    let (_temp_file, _db_path, api) = setup();
    assert!(matches!(api.create_alert(request("", "warning")), Err(ApiError::InvalidInput(_))));
    assert!(matches!(api.create_alert(request("OEE", "normal")), Err(ApiError::InvalidInput(_))));
}
