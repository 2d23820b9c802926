use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        addresses::{self, Entity as Addresses},
        cart_items::{self, Entity as CartItems},
        enums::{OrderStatus, PaymentMethod, PaymentStatus},
        order_items::{self, Entity as OrderItems},
        orders::{self, Entity as Orders},
        product_variants::{self, Entity as ProductVariants},
        products::{self, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, OrderItem},
    pricing::{self, PricedLine},
    response::{ApiResponse, Meta},
    routes::params::{OrderFilter, Pagination, SortOrder},
    services::{flash_sale_service, setting_service, wallet_service},
    state::AppState,
};

/// `ORD-YYYYMMDD-XXXXXXXX`, suffix taken from the order id.
pub fn build_order_number(order_id: Uuid, at: DateTime<Utc>) -> String {
    let date = at.format("%Y%m%d");
    let simple = order_id.simple().to_string().to_uppercase();
    format!("ORD-{}-{}", date, &simple[..8])
}

pub async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .order_by_asc(order_items::Column::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
) -> AppResult<OrderWithItems> {
    let items = load_items(conn, order.id).await?;
    Ok(OrderWithItems {
        order: order.into(),
        items,
    })
}

pub async fn lock_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    owner: Option<Uuid>,
) -> AppResult<orders::Model> {
    let mut condition = Condition::all().add(orders::Column::Id.eq(id));
    if let Some(owner) = owner {
        condition = condition.add(orders::Column::UserId.eq(owner));
    }
    Orders::find()
        .filter(condition)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub fn ensure_payable(order: &orders::Model) -> AppResult<()> {
    if order.payment_status != PaymentStatus::Unpaid {
        return Err(AppError::BadRequest("Order already paid".into()));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::BadRequest("Order is cancelled".into()));
    }
    Ok(())
}

/// Record a successful payment; a pending order moves on to processing.
pub async fn mark_paid<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
    method: PaymentMethod,
    reference: &str,
) -> AppResult<orders::Model> {
    let now = Utc::now();
    let next_status = if order.status == OrderStatus::Pending {
        OrderStatus::Processing
    } else {
        order.status
    };

    let mut active: orders::ActiveModel = order.into();
    active.payment_status = Set(PaymentStatus::Paid);
    active.payment_method = Set(method);
    active.payment_reference = Set(Some(reference.to_string()));
    active.status = Set(next_status);
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    Ok(active.update(conn).await?)
}

/// Put ordered quantities back on the product or variant they came from.
async fn restore_stock<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .all(conn)
        .await?;

    for item in items {
        match item.variant_id {
            Some(variant_id) => {
                ProductVariants::update_many()
                    .col_expr(
                        product_variants::Column::Stock,
                        Expr::col(product_variants::Column::Stock).add(item.quantity),
                    )
                    .filter(product_variants::Column::Id.eq(variant_id))
                    .exec(conn)
                    .await?;
            }
            None => {
                Products::update_many()
                    .col_expr(
                        products::Column::Stock,
                        Expr::col(products::Column::Stock).add(item.quantity),
                    )
                    .filter(products::Column::Id.eq(item.product_id))
                    .exec(conn)
                    .await?;
            }
        }
    }
    Ok(())
}

/// Cancel a locked order: restock, and refund to the wallet when it was paid.
pub async fn cancel_locked<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
) -> AppResult<orders::Model> {
    if !order.status.can_transition_to(OrderStatus::Cancelled) {
        return Err(AppError::BadRequest(format!(
            "Cannot cancel an order that is {}",
            order.status.as_str()
        )));
    }

    restore_stock(conn, order.id).await?;

    let refunded = order.payment_status == PaymentStatus::Paid;
    if refunded {
        wallet_service::credit(
            conn,
            order.user_id,
            order.total_amount,
            &format!("REFUND-{}", order.order_number),
            &format!("Refund for order {}", order.order_number),
        )
        .await?;
    }

    let mut active: orders::ActiveModel = order.into();
    active.status = Set(OrderStatus::Cancelled);
    if refunded {
        active.payment_status = Set(PaymentStatus::Refunded);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

async fn shipping_address<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    address_id: Option<Uuid>,
) -> AppResult<addresses::Model> {
    let mut finder = Addresses::find().filter(addresses::Column::UserId.eq(user_id));
    finder = match address_id {
        Some(id) => finder.filter(addresses::Column::Id.eq(id)),
        None => finder.filter(addresses::Column::IsDefault.eq(true)),
    };
    match finder.one(conn).await? {
        Some(address) => Ok(address),
        None if address_id.is_some() => Err(AppError::NotFound),
        None => Err(AppError::BadRequest("A shipping address is required".into())),
    }
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let now = Utc::now();
    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .order_by_asc(cart_items::Column::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let address = shipping_address(&txn, user.user_id, payload.address_id).await?;

    let mut locked_products: HashMap<Uuid, products::Model> = HashMap::new();
    let mut rows = Vec::with_capacity(cart.len());
    for line in &cart {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }

        let product = match locked_products.get(&line.product_id) {
            Some(p) => p.clone(),
            None => {
                let p = Products::find_by_id(line.product_id)
                    .lock(LockType::Update)
                    .one(&txn)
                    .await?
                    .ok_or(AppError::NotFound)?;
                locked_products.insert(p.id, p.clone());
                p
            }
        };
        if !product.is_active {
            return Err(AppError::BadRequest(format!(
                "{} is no longer available",
                product.name
            )));
        }

        let variant = match line.variant_id {
            Some(variant_id) => {
                let v = ProductVariants::find_by_id(variant_id)
                    .lock(LockType::Update)
                    .one(&txn)
                    .await?
                    .filter(|v| v.product_id == product.id)
                    .ok_or(AppError::NotFound)?;
                Some(v)
            }
            None => None,
        };

        let available = variant.as_ref().map_or(product.stock, |v| v.stock);
        if available < line.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }

        rows.push((line.quantity, product, variant));
    }

    let product_ids: Vec<Uuid> = locked_products.keys().copied().collect();
    let percents = flash_sale_service::active_percents(&txn, &product_ids, now).await?;
    let rules = setting_service::shipping_rules(&txn).await?;

    let priced: Vec<PricedLine> = rows
        .iter()
        .map(|(quantity, product, variant)| {
            let unit = pricing::unit_price(product.price, variant.as_ref().and_then(|v| v.price));
            PricedLine {
                unit_price: unit,
                discount_per_unit: pricing::discount_per_unit(
                    unit,
                    percents.get(&product.id).copied(),
                ),
                quantity: *quantity,
            }
        })
        .collect();
    let totals = pricing::totals(&priced, &rules);

    let order_id = Uuid::new_v4();
    let shipping_address = serde_json::to_value(Address::from(address))
        .map_err(|e| AppError::Internal(e.into()))?;

    let order = orders::ActiveModel {
        id: Set(order_id),
        order_number: Set(build_order_number(order_id, now)),
        user_id: Set(user.user_id),
        subtotal: Set(totals.subtotal),
        discount_amount: Set(totals.discount),
        shipping_fee: Set(totals.shipping),
        total_amount: Set(totals.total),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Unpaid),
        payment_method: Set(payload.payment_method),
        payment_reference: Set(None),
        shipping_address: Set(shipping_address),
        note: Set(crate::validation::optional(payload.note)),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(rows.len());
    for ((quantity, product, variant), line) in rows.iter().zip(&priced) {
        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            variant_id: Set(variant.as_ref().map(|v| v.id)),
            product_name: Set(product.name.clone()),
            variant_label: Set(variant.as_ref().map(|v| v.label())),
            quantity: Set(*quantity),
            unit_price: Set(line.charged_unit_price()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item.into());

        // reduce stock
        match variant {
            Some(v) => {
                ProductVariants::update_many()
                    .col_expr(
                        product_variants::Column::Stock,
                        Expr::col(product_variants::Column::Stock).sub(*quantity),
                    )
                    .filter(product_variants::Column::Id.eq(v.id))
                    .exec(&txn)
                    .await?;
            }
            None => {
                Products::update_many()
                    .col_expr(
                        products::Column::Stock,
                        Expr::col(products::Column::Stock).sub(*quantity),
                    )
                    .filter(products::Column::Id.eq(product.id))
                    .exec(&txn)
                    .await?;
            }
        }
    }

    // clear cart
    CartItems::delete_many()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    filter: OrderFilter,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, per_page, limit, offset) = pagination.window();
    let mut condition = Condition::all().add(orders::Column::UserId.eq(user.user_id));
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
        "Ok",
        OrderList { items: orders },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(orders::Column::UserId.eq(user.user_id))
                .add(orders::Column::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let resp = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", resp, Some(Meta::empty())))
}

/// Customers may only cancel orders that are still pending and unpaid.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id, Some(user.user_id)).await?;
    if order.status != OrderStatus::Pending || order.payment_status != PaymentStatus::Unpaid {
        return Err(AppError::BadRequest(
            "Only pending, unpaid orders can be cancelled".into(),
        ));
    }

    let order = cancel_locked(&txn, order).await?;
    let resp = with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", resp, Some(Meta::empty())))
}

pub async fn pay_with_wallet(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id, Some(user.user_id)).await?;
    ensure_payable(&order)?;

    let reference = format!("WAL-{}", order.order_number);
    wallet_service::debit(
        &txn,
        user.user_id,
        order.total_amount,
        &reference,
        &format!("Payment for order {}", order.order_number),
    )
    .await?;
    let order = mark_paid(&txn, order, PaymentMethod::Wallet, &reference).await?;
    let resp = with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": id, "method": "wallet" }),
    )
    .await;

    Ok(ApiResponse::success("Payment recorded", resp, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_number_format() {
        let id = Uuid::parse_str("3f2a9c1e-0000-4000-8000-000000000000").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(build_order_number(id, at), "ORD-20250307-3F2A9C1E");
    }
}
