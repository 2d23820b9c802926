mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hair_storefront_api::{
    paystack,
    routes::{build_app, payments::SIGNATURE_HEADER},
    state::AppState,
};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

// None of these requests reach the database.
fn app() -> axum::Router {
    let state = AppState::new(
        DatabaseConnection::Disconnected,
        common::test_config("postgres://unused"),
    )
    .expect("state");
    build_app(state)
}

#[tokio::test]
async fn health_is_public_and_tagged_with_request_id() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let response = app()
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn customer_routes_require_a_bearer_token() {
    let response = app()
        .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app()
        .oneshot(
            Request::get("/api/admin/dashboard")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_rejects_bad_signatures() {
    let body = r#"{"event":"charge.success","data":{"reference":"x","status":"success","amount":1}}"#;

    let unsigned = app()
        .oneshot(
            Request::post("/api/payments/webhook")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

    let wrong_key = paystack::sign("sk_test_someone_else", body.as_bytes());
    let forged = app()
        .oneshot(
            Request::post("/api/payments/webhook")
                .header(SIGNATURE_HEADER, wrong_key)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}
