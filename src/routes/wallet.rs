use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::{
        payments::PaymentInit,
        wallet::{TopupRequest, WalletOverview},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::wallet_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(my_wallet))
        .route("/topup", post(topup))
}

#[utoipa::path(
    get,
    path = "/api/wallet/me",
    params(Pagination),
    responses(
        (status = 200, description = "Balance and transactions", body = ApiResponse<WalletOverview>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn my_wallet(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<WalletOverview>>> {
    let resp = wallet_service::get_my_wallet(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wallet/topup",
    request_body = TopupRequest,
    responses(
        (status = 200, description = "Paystack checkout link for the top-up", body = ApiResponse<PaymentInit>),
        (status = 400, description = "Amount below minimum"),
        (status = 502, description = "Payment gateway error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wallet"
)]
pub async fn topup(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TopupRequest>,
) -> AppResult<Json<ApiResponse<PaymentInit>>> {
    let resp = wallet_service::topup(&state, &user, payload).await?;
    Ok(Json(resp))
}
