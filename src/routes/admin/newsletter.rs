use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::newsletter::SubscriberList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{Pagination, SubscriberFilter},
    services::newsletter_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/newsletter/subscribers", get(list_subscribers))
}

#[utoipa::path(
    get,
    path = "/api/admin/newsletter/subscribers",
    params(Pagination, SubscriberFilter),
    responses(
        (status = 200, description = "Subscribers", body = ApiResponse<SubscriberList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_subscribers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<SubscriberFilter>,
) -> AppResult<Json<ApiResponse<SubscriberList>>> {
    let resp = newsletter_service::list_subscribers(&state, &user, pagination, filter).await?;
    Ok(Json(resp))
}
