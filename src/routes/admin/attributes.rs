use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::attributes::{AttributeList, AttributeWithTerms, CreateAttributeRequest, TermRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::AttributeTerm,
    response::ApiResponse,
    services::attribute_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/attributes", get(list_attributes).post(create_attribute))
        .route("/attributes/{id}", delete(delete_attribute))
        .route("/attributes/{id}/terms", post(add_term))
        .route("/terms/{id}", put(update_term).delete(delete_term))
}

#[utoipa::path(
    get,
    path = "/api/admin/attributes",
    responses(
        (status = 200, description = "Attributes with their terms", body = ApiResponse<AttributeList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_attributes(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AttributeList>>> {
    let resp = attribute_service::list_attributes(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/attributes",
    request_body = CreateAttributeRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<AttributeWithTerms>),
        (status = 409, description = "Slug already in use"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_attribute(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAttributeRequest>,
) -> AppResult<Json<ApiResponse<AttributeWithTerms>>> {
    let resp = attribute_service::create_attribute(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/attributes/{id}",
    params(("id" = Uuid, Path, description = "Attribute id")),
    responses(
        (status = 200, description = "Deleted with its terms"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_attribute(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = attribute_service::delete_attribute(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/attributes/{id}/terms",
    params(("id" = Uuid, Path, description = "Attribute id")),
    request_body = TermRequest,
    responses(
        (status = 200, description = "Term added", body = ApiResponse<AttributeTerm>),
        (status = 404, description = "Attribute not found"),
        (status = 409, description = "Term slug already used in this attribute"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_term(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TermRequest>,
) -> AppResult<Json<ApiResponse<AttributeTerm>>> {
    let resp = attribute_service::add_term(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/terms/{id}",
    params(("id" = Uuid, Path, description = "Term id")),
    request_body = TermRequest,
    responses(
        (status = 200, description = "Term updated", body = ApiResponse<AttributeTerm>),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_term(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TermRequest>,
) -> AppResult<Json<ApiResponse<AttributeTerm>>> {
    let resp = attribute_service::update_term(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/terms/{id}",
    params(("id" = Uuid, Path, description = "Term id")),
    responses(
        (status = 200, description = "Term deleted"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_term(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = attribute_service::delete_term(&state, &user, id).await?;
    Ok(Json(resp))
}
