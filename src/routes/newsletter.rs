use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::newsletter::SubscribeRequest,
    error::AppResult,
    models::NewsletterSubscriber,
    response::ApiResponse,
    services::newsletter_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscribed or reactivated", body = ApiResponse<NewsletterSubscriber>),
        (status = 400, description = "Invalid email address"),
    ),
    tag = "Newsletter"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<NewsletterSubscriber>>> {
    let resp = newsletter_service::subscribe(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/unsubscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Unsubscribed", body = ApiResponse<NewsletterSubscriber>),
        (status = 404, description = "Unknown email"),
    ),
    tag = "Newsletter"
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<NewsletterSubscriber>>> {
    let resp = newsletter_service::unsubscribe(&state, payload).await?;
    Ok(Json(resp))
}
