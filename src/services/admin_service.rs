use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{Dashboard, InventoryAdjustRequest, StatusCount},
        orders::{MarkPaidRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::ProductList,
    },
    entity::{
        enums::{OrderStatus, PaymentMethod, PaymentStatus, ReviewStatus, Role},
        newsletter_subscribers::{self, Entity as NewsletterSubscribers},
        orders::{self, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        reviews::{self, Entity as Reviews},
        users::{self, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{LowStockFilter, OrderFilter, Pagination, SortOrder},
    services::order_service,
    state::AppState,
};

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Dashboard>> {
    ensure_staff(user)?;

    let orders_by_status = Orders::find()
        .select_only()
        .column(orders::Column::Status)
        .column_as(Expr::cust("COUNT(*)"), "count")
        .group_by(orders::Column::Status)
        .into_tuple::<(OrderStatus, i64)>()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount {
            status,
            count: count.max(0) as u64,
        })
        .collect();

    let paid_revenue = Orders::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(total_amount), 0)::BIGINT"), "revenue")
        .filter(orders::Column::PaymentStatus.eq(PaymentStatus::Paid))
        .into_tuple::<i64>()
        .one(&state.orm)
        .await?
        .unwrap_or(0);

    let customers = Users::find()
        .filter(users::Column::Role.eq(Role::Customer))
        .count(&state.orm)
        .await?;
    let low_stock_products = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::Stock.lte(state.config.low_stock_threshold))
        .count(&state.orm)
        .await?;
    let pending_reviews = Reviews::find()
        .filter(reviews::Column::Status.eq(ReviewStatus::Pending))
        .count(&state.orm)
        .await?;
    let active_subscribers = NewsletterSubscribers::find()
        .filter(newsletter_subscribers::Column::IsActive.eq(true))
        .count(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Dashboard",
        Dashboard {
            orders_by_status,
            paid_revenue,
            customers,
            low_stock_products,
            pending_reviews,
            active_subscribers,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    filter: OrderFilter,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let (page, per_page, limit, offset) = pagination.window();

    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(orders::Column::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match filter.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(orders::Column::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(orders::Column::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await?;
    let orders = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_service::with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let existing = order_service::lock_order(&txn, id, None).await?;
    let from = existing.status;
    if !from.can_transition_to(payload.status) {
        return Err(AppError::BadRequest(format!(
            "Cannot move order from {} to {}",
            from.as_str(),
            payload.status.as_str()
        )));
    }

    let order = if payload.status == OrderStatus::Cancelled {
        order_service::cancel_locked(&txn, existing).await?
    } else {
        let mut active: orders::ActiveModel = existing.into();
        active.status = Set(payload.status);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    };
    let data = order_service::with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "from": from, "to": payload.status }),
    )
    .await;

    Ok(ApiResponse::success("Order updated", data, Some(Meta::empty())))
}

/// Record an offline payment, typically cash on delivery.
pub async fn mark_order_paid(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MarkPaidRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;
    let existing = order_service::lock_order(&txn, id, None).await?;
    order_service::ensure_payable(&existing)?;

    let reference = payload
        .reference
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| format!("COD-{}", existing.order_number));
    let order =
        order_service::mark_paid(&txn, existing, PaymentMethod::CashOnDelivery, &reference).await?;
    let data = order_service::with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_mark_paid",
        "orders",
        serde_json::json!({ "order_id": id, "reference": reference }),
    )
    .await;

    Ok(ApiResponse::success("Payment recorded", data, Some(Meta::empty())))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    filter: LowStockFilter,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_staff(user)?;
    let threshold = filter.threshold.unwrap_or(state.config.low_stock_threshold);
    let (page, per_page, limit, offset) = pagination.window();

    let finder = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await?;
    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product.stock + payload.delta;
    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}
