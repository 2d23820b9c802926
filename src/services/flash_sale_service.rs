use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        collections::SetProductsRequest,
        flash_sales::{FlashSaleList, FlashSaleRequest, FlashSaleWithProducts, UpdateFlashSaleRequest},
    },
    entity::{
        flash_sale_products::{self, Entity as FlashSaleProducts},
        flash_sales::{self, Entity as FlashSales},
        products::{self, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    pricing::{self, MAX_DISCOUNT_PERCENT},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation,
};

/// Best live sale percent per product, for the given products only.
pub async fn active_percents<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
    now: DateTime<Utc>,
) -> AppResult<HashMap<Uuid, i32>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = FlashSaleProducts::find()
        .find_also_related(FlashSales)
        .filter(flash_sale_products::Column::ProductId.is_in(product_ids.iter().copied()))
        .filter(flash_sales::Column::IsActive.eq(true))
        .filter(flash_sales::Column::StartsAt.lte(now))
        .filter(flash_sales::Column::EndsAt.gt(now))
        .all(conn)
        .await?;

    let mut percents: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for (link, sale) in rows {
        if let Some(sale) = sale.filter(|s| pricing::sale_is_live(s, now)) {
            percents
                .entry(link.product_id)
                .or_default()
                .push(sale.discount_percent);
        }
    }

    Ok(percents
        .into_iter()
        .filter_map(|(id, ps)| pricing::best_percent(ps).map(|p| (id, p)))
        .collect())
}

fn validate_window(
    percent: i32,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> AppResult<()> {
    if !(1..=MAX_DISCOUNT_PERCENT).contains(&percent) {
        return Err(AppError::BadRequest(format!(
            "discount_percent must be between 1 and {MAX_DISCOUNT_PERCENT}"
        )));
    }
    if ends_at <= starts_at {
        return Err(AppError::BadRequest("ends_at must be after starts_at".into()));
    }
    Ok(())
}

async fn product_ids_for<C: ConnectionTrait>(conn: &C, sale_id: Uuid) -> AppResult<Vec<Uuid>> {
    Ok(FlashSaleProducts::find()
        .select_only()
        .column(flash_sale_products::Column::ProductId)
        .filter(flash_sale_products::Column::FlashSaleId.eq(sale_id))
        .into_tuple::<Uuid>()
        .all(conn)
        .await?)
}

async fn with_products<C: ConnectionTrait>(
    conn: &C,
    sale: flash_sales::Model,
) -> AppResult<FlashSaleWithProducts> {
    let product_ids = product_ids_for(conn, sale.id).await?;
    Ok(FlashSaleWithProducts {
        flash_sale: sale.into(),
        product_ids,
    })
}

pub async fn list_active(state: &AppState) -> AppResult<ApiResponse<FlashSaleList>> {
    let now = Utc::now();
    let sales = FlashSales::find()
        .filter(flash_sales::Column::IsActive.eq(true))
        .filter(flash_sales::Column::StartsAt.lte(now))
        .filter(flash_sales::Column::EndsAt.gt(now))
        .order_by_asc(flash_sales::Column::EndsAt)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(sales.len());
    for sale in sales {
        items.push(with_products(&state.orm, sale).await?);
    }

    Ok(ApiResponse::success("Ok", FlashSaleList { items }, Some(Meta::empty())))
}

pub async fn list_flash_sales(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FlashSaleList>> {
    ensure_manager(user)?;
    let (page, per_page, limit, offset) = pagination.window();

    let finder = FlashSales::find().order_by_desc(flash_sales::Column::StartsAt);
    let total = finder.clone().count(&state.orm).await?;
    let sales = finder.limit(limit).offset(offset).all(&state.orm).await?;

    let mut items = Vec::with_capacity(sales.len());
    for sale in sales {
        items.push(with_products(&state.orm, sale).await?);
    }

    Ok(ApiResponse::success(
        "Ok",
        FlashSaleList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn create_flash_sale(
    state: &AppState,
    user: &AuthUser,
    payload: FlashSaleRequest,
) -> AppResult<ApiResponse<FlashSaleWithProducts>> {
    ensure_manager(user)?;
    let name = validation::required("name", &payload.name)?;
    validate_window(payload.discount_percent, payload.starts_at, payload.ends_at)?;

    let sale = flash_sales::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        discount_percent: Set(payload.discount_percent),
        starts_at: Set(payload.starts_at.into()),
        ends_at: Set(payload.ends_at.into()),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "flash_sale_create",
        "flash_sales",
        serde_json::json!({ "flash_sale_id": sale.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Flash sale created",
        FlashSaleWithProducts {
            flash_sale: sale.into(),
            product_ids: Vec::new(),
        },
        None,
    ))
}

pub async fn update_flash_sale(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateFlashSaleRequest,
) -> AppResult<ApiResponse<FlashSaleWithProducts>> {
    ensure_manager(user)?;
    let sale = FlashSales::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let percent = payload.discount_percent.unwrap_or(sale.discount_percent);
    let starts_at = payload
        .starts_at
        .unwrap_or_else(|| sale.starts_at.with_timezone(&Utc));
    let ends_at = payload
        .ends_at
        .unwrap_or_else(|| sale.ends_at.with_timezone(&Utc));
    validate_window(percent, starts_at, ends_at)?;

    let mut active: flash_sales::ActiveModel = sale.into();
    if let Some(name) = payload.name {
        active.name = Set(validation::required("name", &name)?);
    }
    active.discount_percent = Set(percent);
    active.starts_at = Set(starts_at.into());
    active.ends_at = Set(ends_at.into());
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let sale = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "flash_sale_update",
        "flash_sales",
        serde_json::json!({ "flash_sale_id": sale.id }),
    )
    .await;

    let resp = with_products(&state.orm, sale).await?;
    Ok(ApiResponse::success("Flash sale updated", resp, None))
}

pub async fn delete_flash_sale(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = FlashSales::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "flash_sale_delete",
        "flash_sales",
        serde_json::json!({ "flash_sale_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Flash sale deleted"))
}

/// Replace the set of products the sale applies to.
pub async fn set_products(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetProductsRequest,
) -> AppResult<ApiResponse<FlashSaleWithProducts>> {
    ensure_manager(user)?;
    let mut product_ids = payload.product_ids;
    product_ids.sort();
    product_ids.dedup();

    let txn = state.orm.begin().await?;
    let sale = FlashSales::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let known = Products::find()
        .filter(products::Column::Id.is_in(product_ids.iter().copied()))
        .count(&txn)
        .await?;
    if known != product_ids.len() as u64 {
        return Err(AppError::BadRequest("Unknown product id".into()));
    }

    FlashSaleProducts::delete_many()
        .filter(flash_sale_products::Column::FlashSaleId.eq(id))
        .exec(&txn)
        .await?;
    for product_id in &product_ids {
        flash_sale_products::ActiveModel {
            id: Set(Uuid::new_v4()),
            flash_sale_id: Set(id),
            product_id: Set(*product_id),
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "flash_sale_products",
        "flash_sales",
        serde_json::json!({ "flash_sale_id": id, "products": product_ids.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Flash sale products updated",
        FlashSaleWithProducts {
            flash_sale: sale.into(),
            product_ids,
        },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_validation() {
        let now = Utc::now();
        assert!(validate_window(20, now, now + Duration::hours(1)).is_ok());
        assert!(validate_window(0, now, now + Duration::hours(1)).is_err());
        assert!(validate_window(91, now, now + Duration::hours(1)).is_err());
        assert!(validate_window(20, now, now).is_err());
    }
}
