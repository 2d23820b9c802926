mod common;

use axum::extract::State;
use hair_storefront_api::{routes::health::health_check, state::AppState};
use sea_orm::DatabaseConnection;

#[tokio::test]
async fn health_reports_missing_database_as_degraded() {
    let state = AppState::new(
        DatabaseConnection::Disconnected,
        common::test_config("postgres://unused"),
    )
    .unwrap();

    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "degraded");
    assert!(!data.database);
}

#[tokio::test]
async fn health_reports_ok_with_a_database() {
    let Some(database_url) = common::database_url() else {
        return;
    };
    let state = common::setup_state(&database_url).await.unwrap();

    let data = health_check(State(state)).await.0.data.unwrap();
    assert_eq!(data.status, "ok");
    assert!(data.database);
}
