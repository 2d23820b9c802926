use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::collections::{
        CollectionDetail, CollectionList, CollectionRequest, SetProductsRequest,
        UpdateCollectionRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Collection,
    response::ApiResponse,
    routes::params::Pagination,
    services::collection_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/{id}",
            put(update_collection).delete(delete_collection),
        )
        .route("/collections/{id}/products", put(set_products))
        .route(
            "/collections/{id}/products/{product_id}",
            delete(remove_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/admin/collections",
    params(Pagination),
    responses(
        (status = 200, description = "All collections", body = ApiResponse<CollectionList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_collections(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CollectionList>>> {
    let resp = collection_service::admin_list_collections(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/collections",
    request_body = CollectionRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<Collection>),
        (status = 409, description = "Slug already in use"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CollectionRequest>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let resp = collection_service::create_collection(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/collections/{id}",
    params(("id" = Uuid, Path, description = "Collection id")),
    request_body = UpdateCollectionRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Collection>),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCollectionRequest>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let resp = collection_service::update_collection(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/collections/{id}",
    params(("id" = Uuid, Path, description = "Collection id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = collection_service::delete_collection(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/collections/{id}/products",
    params(("id" = Uuid, Path, description = "Collection id")),
    request_body = SetProductsRequest,
    responses(
        (status = 200, description = "Membership replaced in the given order", body = ApiResponse<CollectionDetail>),
        (status = 400, description = "Unknown product id"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_products(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetProductsRequest>,
) -> AppResult<Json<ApiResponse<CollectionDetail>>> {
    let resp = collection_service::set_products(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/collections/{id}/products/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Collection id"),
        ("product_id" = Uuid, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Removed from collection"),
        (status = 404, description = "Not a member"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn remove_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = collection_service::remove_product(&state, &user, id, product_id).await?;
    Ok(Json(resp))
}
