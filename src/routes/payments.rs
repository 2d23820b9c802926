use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};

use crate::{
    dto::payments::{InitializePaymentRequest, PaymentInit, PaymentOutcome},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initialize", post(initialize_payment))
        .route("/verify/{reference}", get(verify_payment))
        .route("/webhook", post(webhook))
}

#[utoipa::path(
    post,
    path = "/api/payments/initialize",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Paystack checkout link", body = ApiResponse<PaymentInit>),
        (status = 400, description = "Order already paid or cancelled"),
        (status = 502, description = "Payment gateway error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn initialize_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<InitializePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentInit>>> {
    let resp = payment_service::initialize_for_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payments/verify/{reference}",
    params(("reference" = String, Path, description = "Payment reference")),
    responses(
        (status = 200, description = "Verified and settled", body = ApiResponse<PaymentOutcome>),
        (status = 404, description = "Not found"),
        (status = 502, description = "Payment gateway error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(reference): Path<String>,
) -> AppResult<Json<ApiResponse<PaymentOutcome>>> {
    let resp = payment_service::verify_payment(&state, &user, reference).await?;
    Ok(Json(resp))
}

/// Paystack calls this with the raw event body signed in `x-paystack-signature`.
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    request_body(content = String, description = "Raw Paystack event JSON"),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 401, description = "Missing or invalid signature"),
    ),
    tag = "Payments"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let resp = payment_service::handle_webhook(&state, &body, signature).await?;
    Ok(Json(resp))
}
