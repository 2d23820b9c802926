use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartItemDto, CartList},
    entity::{
        cart_items::{self, Entity as CartItems},
        product_variants::{self, Entity as ProductVariants},
        products::{self, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    pricing::{self, PricedLine},
    response::{ApiResponse, Meta},
    services::flash_sale_service,
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let lines = CartItems::find()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .order_by_desc(cart_items::Column::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let variant_ids: Vec<Uuid> = lines.iter().filter_map(|(c, _)| c.variant_id).collect();
    let variants: HashMap<Uuid, product_variants::Model> = if variant_ids.is_empty() {
        HashMap::new()
    } else {
        ProductVariants::find()
            .filter(product_variants::Column::Id.is_in(variant_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect()
    };

    let product_ids: Vec<Uuid> = lines.iter().map(|(c, _)| c.product_id).collect();
    let percents = flash_sale_service::active_percents(&state.orm, &product_ids, Utc::now()).await?;

    let mut items = Vec::with_capacity(lines.len());
    let mut priced = Vec::with_capacity(lines.len());
    for (line, product) in lines {
        let Some(product) = product else { continue };
        let variant = line.variant_id.and_then(|id| variants.get(&id).cloned());
        let percent = percents.get(&product.id).copied();
        let unit = pricing::unit_price(product.price, variant.as_ref().and_then(|v| v.price));
        let priced_line = PricedLine {
            unit_price: unit,
            discount_per_unit: pricing::discount_per_unit(unit, percent),
            quantity: line.quantity,
        };
        priced.push(priced_line);
        items.push(CartItemDto {
            id: line.id,
            product: crate::models::Product::from(product).with_sale_percent(percent),
            variant: variant.map(Into::into),
            quantity: line.quantity,
            unit_price: unit,
            discounted_unit_price: priced_line.charged_unit_price(),
            line_total: priced_line.charged_unit_price() * i64::from(line.quantity),
        });
    }

    // shipping is settled at checkout
    let totals = pricing::totals(&priced, &pricing::ShippingRules::default());
    let meta = Meta::single_page(items.len());

    Ok(ApiResponse::success(
        "OK",
        CartList {
            items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            total: totals.total,
        },
        Some(meta),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<crate::models::CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest("quantity must be > 0".into()));
    }

    let product = Products::find_by_id(payload.product_id)
        .filter(products::Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let available = match payload.variant_id {
        Some(variant_id) => {
            ProductVariants::find_by_id(variant_id)
                .one(&state.orm)
                .await?
                .filter(|v| v.product_id == product.id)
                .ok_or_else(|| AppError::BadRequest("Variant does not belong to product".into()))?
                .stock
        }
        None => product.stock,
    };
    if payload.quantity > available {
        return Err(AppError::BadRequest("Insufficient stock".into()));
    }

    let mut condition = Condition::all()
        .add(cart_items::Column::UserId.eq(user.user_id))
        .add(cart_items::Column::ProductId.eq(product.id));
    condition = match payload.variant_id {
        Some(variant_id) => condition.add(cart_items::Column::VariantId.eq(variant_id)),
        None => condition.add(cart_items::Column::VariantId.is_null()),
    };
    let existing = CartItems::find().filter(condition).one(&state.orm).await?;

    let item = match existing {
        Some(line) => {
            let mut active: cart_items::ActiveModel = line.into();
            active.quantity = Set(payload.quantity);
            active.update(&state.orm).await?
        }
        None => {
            cart_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                variant_id: Set(payload.variant_id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "variant_id": payload.variant_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Added to cart", item.into(), Some(Meta::empty())))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(cart_items::Column::Id.eq(item_id))
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": item_id }),
    )
    .await;

    Ok(ApiResponse::done("Removed"))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::done("Cart cleared"))
}
