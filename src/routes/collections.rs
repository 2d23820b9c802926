use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::{
        collections::{CollectionDetail, CollectionList},
        flash_sales::FlashSaleList,
    },
    error::AppResult,
    response::ApiResponse,
    services::{collection_service, flash_sale_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_collections))
        .route("/{slug}", get(get_collection))
}

pub fn flash_sale_router() -> Router<AppState> {
    Router::new().route("/active", get(active_flash_sales))
}

#[utoipa::path(
    get,
    path = "/api/collections",
    responses(
        (status = 200, description = "Active collections", body = ApiResponse<CollectionList>)
    ),
    tag = "Collections"
)]
pub async fn list_collections(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CollectionList>>> {
    let resp = collection_service::list_collections(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/collections/{slug}",
    params(("slug" = String, Path, description = "Collection slug")),
    responses(
        (status = 200, description = "Collection with active products by position", body = ApiResponse<CollectionDetail>),
        (status = 404, description = "Not found"),
    ),
    tag = "Collections"
)]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<CollectionDetail>>> {
    let resp = collection_service::get_collection_by_slug(&state, slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/flash-sales/active",
    responses(
        (status = 200, description = "Sales running now, with product ids", body = ApiResponse<FlashSaleList>)
    ),
    tag = "Collections"
)]
pub async fn active_flash_sales(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<FlashSaleList>>> {
    let resp = flash_sale_service::list_active(&state).await?;
    Ok(Json(resp))
}
