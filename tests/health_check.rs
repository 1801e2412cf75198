use actix_web::{test, web, App};
use gatekeeper_server::{configure, AppState, InMemoryUserDirectory, Settings};
use chrono::DateTime;
use std::sync::Arc;

#[actix_rt::test]
async fn test_health_check() {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let state = AppState::with_directory(config, Arc::new(InMemoryUserDirectory::new())).unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure)
    ).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["database"], "healthy");
    assert_eq!(json["environment"], "test");
    assert!(DateTime::parse_from_rfc3339(
        json["timestamp"].as_str().unwrap()
    ).is_ok());
}

#[actix_rt::test]
async fn test_ping_root_and_version() {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let state = AppState::with_directory(config, Arc::new(InMemoryUserDirectory::new())).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure)
    ).await;

    let req = test::TestRequest::get().uri("/health/ping").to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json["message"], "pong");

    let req = test::TestRequest::get().uri("/").to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json["app_name"], "backend-api");

    let req = test::TestRequest::get().uri("/health/version").to_request();
    let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_rt::test]
async fn test_detailed_status() {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let state = AppState::with_directory(config, Arc::new(InMemoryUserDirectory::new())).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure)
    ).await;

    let req = test::TestRequest::get().uri("/health/status").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], "operational");
    assert_eq!(json["services"]["auth_service"], "running");
    assert_eq!(json["database"]["status"], "healthy");
    assert_eq!(json["database"]["type"], "in-memory");
    assert_eq!(json["system"]["environment"], "test");
}
