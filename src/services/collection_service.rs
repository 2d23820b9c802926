use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::collections::{
        CollectionDetail, CollectionList, CollectionRequest, SetProductsRequest,
        UpdateCollectionRequest,
    },
    entity::{
        collection_products::{self, Entity as CollectionProducts},
        collections::{self, Entity as Collections},
        products::{self, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::Collection,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service,
    slug,
    state::AppState,
    validation,
};

/// Member products in display order.
async fn member_products<C: ConnectionTrait>(
    conn: &C,
    collection_id: Uuid,
    active_only: bool,
) -> AppResult<Vec<crate::models::Product>> {
    let mut finder = CollectionProducts::find()
        .filter(collection_products::Column::CollectionId.eq(collection_id))
        .order_by_asc(collection_products::Column::Position)
        .find_also_related(Products);
    if active_only {
        finder = finder.filter(products::Column::IsActive.eq(true));
    }

    let models: Vec<products::Model> = finder
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(_, product)| product)
        .collect();
    product_service::with_sale_prices(conn, models).await
}

pub async fn list_collections(state: &AppState) -> AppResult<ApiResponse<CollectionList>> {
    let items: Vec<Collection> = Collections::find()
        .filter(collections::Column::IsActive.eq(true))
        .order_by_asc(collections::Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::success("Ok", CollectionList { items }, Some(Meta::empty())))
}

pub async fn get_collection_by_slug(
    state: &AppState,
    slug: String,
) -> AppResult<ApiResponse<CollectionDetail>> {
    let collection = Collections::find()
        .filter(collections::Column::Slug.eq(slug))
        .filter(collections::Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let products = member_products(&state.orm, collection.id, true).await?;
    Ok(ApiResponse::success(
        "Ok",
        CollectionDetail {
            collection: collection.into(),
            products,
        },
        None,
    ))
}

pub async fn admin_list_collections(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CollectionList>> {
    ensure_manager(user)?;
    let (page, per_page, limit, offset) = pagination.window();
    let finder = Collections::find().order_by_asc(collections::Column::Name);
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
        "Ok",
        CollectionList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn create_collection(
    state: &AppState,
    user: &AuthUser,
    payload: CollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure_manager(user)?;
    let name = validation::required("name", &payload.name)?;
    let slug = slug::resolve(payload.slug.as_deref(), &name)
        .ok_or_else(|| AppError::BadRequest("Cannot derive a slug from name".into()))?;

    let collection = collections::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(validation::optional(payload.description)),
        image_url: Set(validation::optional(payload.image_url)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "collection_create",
        "collections",
        serde_json::json!({ "collection_id": collection.id }),
    )
    .await;

    Ok(ApiResponse::success("Collection created", collection.into(), None))
}

pub async fn update_collection(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure_manager(user)?;
    let existing = Collections::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: collections::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(validation::required("name", &name)?);
    }
    if let Some(raw) = payload.slug {
        let slug = slug::resolve(Some(raw.as_str()), "")
            .ok_or_else(|| AppError::BadRequest("Invalid slug".into()))?;
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(validation::optional(Some(description)));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(validation::optional(Some(image_url)));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let collection = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "collection_update",
        "collections",
        serde_json::json!({ "collection_id": collection.id }),
    )
    .await;

    Ok(ApiResponse::success("Collection updated", collection.into(), None))
}

pub async fn delete_collection(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = Collections::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "collection_delete",
        "collections",
        serde_json::json!({ "collection_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Collection deleted"))
}

/// Order-preserving dedup of the requested ids.
fn dedup_in_order(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Replace membership; list order becomes `position`.
pub async fn set_products(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetProductsRequest,
) -> AppResult<ApiResponse<CollectionDetail>> {
    ensure_manager(user)?;
    let product_ids = dedup_in_order(payload.product_ids);

    let txn = state.orm.begin().await?;
    let collection = Collections::find_by_id(id)
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

    CollectionProducts::delete_many()
        .filter(collection_products::Column::CollectionId.eq(id))
        .exec(&txn)
        .await?;
    for (position, product_id) in product_ids.iter().enumerate() {
        collection_products::ActiveModel {
            id: Set(Uuid::new_v4()),
            collection_id: Set(id),
            product_id: Set(*product_id),
            position: Set(position as i32),
        }
        .insert(&txn)
        .await?;
    }
    let products = member_products(&txn, id, false).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "collection_products",
        "collections",
        serde_json::json!({ "collection_id": id, "products": product_ids.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Collection products updated",
        CollectionDetail {
            collection: collection.into(),
            products,
        },
        None,
    ))
}

pub async fn remove_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = CollectionProducts::delete_many()
        .filter(collection_products::Column::CollectionId.eq(id))
        .filter(collection_products::Column::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "collection_product_remove",
        "collections",
        serde_json::json!({ "collection_id": id, "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::done("Product removed from collection"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_position() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_in_order(vec![b, a, b, a]), vec![b, a]);
    }
}
