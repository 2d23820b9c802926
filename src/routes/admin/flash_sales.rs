use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        collections::SetProductsRequest,
        flash_sales::{FlashSaleList, FlashSaleRequest, FlashSaleWithProducts, UpdateFlashSaleRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::flash_sale_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/flash-sales", get(list_flash_sales).post(create_flash_sale))
        .route(
            "/flash-sales/{id}",
            put(update_flash_sale).delete(delete_flash_sale),
        )
        .route("/flash-sales/{id}/products", put(set_products))
}

#[utoipa::path(
    get,
    path = "/api/admin/flash-sales",
    params(Pagination),
    responses(
        (status = 200, description = "All flash sales", body = ApiResponse<FlashSaleList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_flash_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<FlashSaleList>>> {
    let resp = flash_sale_service::list_flash_sales(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/flash-sales",
    request_body = FlashSaleRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<FlashSaleWithProducts>),
        (status = 400, description = "Invalid window or percent"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_flash_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<FlashSaleRequest>,
) -> AppResult<Json<ApiResponse<FlashSaleWithProducts>>> {
    let resp = flash_sale_service::create_flash_sale(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/flash-sales/{id}",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    request_body = UpdateFlashSaleRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<FlashSaleWithProducts>),
        (status = 400, description = "Invalid window or percent"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_flash_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFlashSaleRequest>,
) -> AppResult<Json<ApiResponse<FlashSaleWithProducts>>> {
    let resp = flash_sale_service::update_flash_sale(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/flash-sales/{id}",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_flash_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = flash_sale_service::delete_flash_sale(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/flash-sales/{id}/products",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    request_body = SetProductsRequest,
    responses(
        (status = 200, description = "Product set replaced", body = ApiResponse<FlashSaleWithProducts>),
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
) -> AppResult<Json<ApiResponse<FlashSaleWithProducts>>> {
    let resp = flash_sale_service::set_products(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
