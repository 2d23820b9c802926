use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::seo::{SeoAudit, UpdateSeoRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{BlogPost, Product},
    response::ApiResponse,
    services::seo_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/seo/audit", get(audit))
        .route("/seo/products/{id}", patch(update_product_seo))
        .route("/seo/blog/{id}", patch(update_post_seo))
}

#[utoipa::path(
    get,
    path = "/api/admin/seo/audit",
    responses(
        (status = 200, description = "Meta problems across products and posts", body = ApiResponse<SeoAudit>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn audit(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SeoAudit>>> {
    let resp = seo_service::run_audit(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/seo/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateSeoRequest,
    responses(
        (status = 200, description = "Meta updated", body = ApiResponse<Product>),
        (status = 400, description = "Meta too long or invalid slug"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product_seo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSeoRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = seo_service::update_product_seo(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/seo/blog/{id}",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = UpdateSeoRequest,
    responses(
        (status = 200, description = "Meta updated", body = ApiResponse<BlogPost>),
        (status = 400, description = "Meta too long or invalid slug"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_post_seo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSeoRequest>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = seo_service::update_post_seo(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
