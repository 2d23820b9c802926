use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Query, extension::postgres::PgExpr},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        CreateProductRequest, ProductDetail, ProductList, RatingSummary, UpdateProductRequest,
        UpdateVariantRequest, VariantRequest,
    },
    entity::{
        collection_products::{self, Entity as CollectionProducts},
        collections::{self, Entity as Collections},
        enums::ReviewStatus,
        product_variants::{self, Entity as ProductVariants},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        reviews::{self, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::{Product, ProductVariant},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductFilter, ProductSortBy, SortOrder},
    services::flash_sale_service,
    slug,
    state::AppState,
    validation,
};

/// Convert catalog rows, attaching the live flash-sale price where one applies.
pub async fn with_sale_prices<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let percents = flash_sale_service::active_percents(conn, &ids, Utc::now()).await?;
    Ok(models
        .into_iter()
        .map(|p| {
            let percent = percents.get(&p.id).copied();
            Product::from(p).with_sale_percent(percent)
        })
        .collect())
}

fn filter_condition(filter: &ProductFilter, active_only: bool) -> Condition {
    let mut condition = Condition::all();
    if active_only {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(search) = filter.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = filter.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = filter.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(featured) = filter.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }

    if let Some(in_stock) = filter.in_stock {
        let variant_in_stock = Column::Id.in_subquery(
            Query::select()
                .column(product_variants::Column::ProductId)
                .from(ProductVariants)
                .and_where(product_variants::Column::Stock.gt(0))
                .to_owned(),
        );
        let stocked = Condition::any()
            .add(Column::Stock.gt(0))
            .add(variant_in_stock);
        condition = if in_stock {
            condition.add(stocked)
        } else {
            condition.add(stocked.not())
        };
    }

    if let Some(collection) = filter.collection.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Column::Id.in_subquery(
                Query::select()
                    .column((CollectionProducts, collection_products::Column::ProductId))
                    .from(CollectionProducts)
                    .inner_join(
                        Collections,
                        Expr::col((Collections, collections::Column::Id)).equals((
                            CollectionProducts,
                            collection_products::Column::CollectionId,
                        )),
                    )
                    .and_where(Expr::col((Collections, collections::Column::Slug)).eq(collection.as_str()))
                    .to_owned(),
            ),
        );
    }

    condition
}

async fn list(
    state: &AppState,
    pagination: Pagination,
    filter: ProductFilter,
    active_only: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, per_page, limit, offset) = pagination.window();

    let sort_col = match filter.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(filter_condition(&filter, active_only));
    finder = match filter.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await?;
    let models = finder.limit(limit).offset(offset).all(&state.orm).await?;
    let items = with_sale_prices(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn list_products(
    state: &AppState,
    pagination: Pagination,
    filter: ProductFilter,
) -> AppResult<ApiResponse<ProductList>> {
    list(state, pagination, filter, true).await
}

pub async fn admin_list_products(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    filter: ProductFilter,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_manager(user)?;
    list(state, pagination, filter, false).await
}

pub async fn rating_summary<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<RatingSummary> {
    let row = Reviews::find()
        .select_only()
        .column_as(Expr::cust("COUNT(*)"), "count")
        .column_as(Expr::cust("AVG(rating)::DOUBLE PRECISION"), "average")
        .filter(reviews::Column::ProductId.eq(product_id))
        .filter(reviews::Column::Status.eq(ReviewStatus::Approved))
        .into_tuple::<(i64, Option<f64>)>()
        .one(conn)
        .await?;

    let (count, average) = row.unwrap_or((0, None));
    Ok(RatingSummary {
        count,
        average: average.map(|a| (a * 10.0).round() / 10.0),
    })
}

async fn detail<C: ConnectionTrait>(conn: &C, product: ProductModel) -> AppResult<ProductDetail> {
    let variants: Vec<ProductVariant> = ProductVariants::find()
        .filter(product_variants::Column::ProductId.eq(product.id))
        .order_by_asc(product_variants::Column::Name)
        .order_by_asc(product_variants::Column::Value)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let percent = flash_sale_service::active_percents(conn, &[product.id], Utc::now())
        .await?
        .get(&product.id)
        .copied();
    let rating = rating_summary(conn, product.id).await?;

    Ok(ProductDetail {
        product: Product::from(product).with_sale_percent(percent),
        variants,
        flash_sale_percent: percent,
        rating,
    })
}

pub async fn find_active_by_slug<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
) -> AppResult<ProductModel> {
    Products::find()
        .filter(Column::Slug.eq(slug))
        .filter(Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_product_by_slug(
    state: &AppState,
    slug: String,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = find_active_by_slug(&state.orm, &slug).await?;
    let resp = detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product", resp, None))
}

pub async fn admin_get_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_manager(user)?;
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let resp = detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product", resp, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_manager(user)?;
    let name = validation::required("name", &payload.name)?;
    let slug = slug::resolve(payload.slug.as_deref(), &name)
        .ok_or_else(|| AppError::BadRequest("Cannot derive a slug from name".into()))?;
    validation::non_negative("price", payload.price)?;
    validation::non_negative("stock", payload.stock.into())?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(validation::optional(payload.description)),
        price: Set(payload.price),
        compare_at_price: Set(payload.compare_at_price),
        stock: Set(payload.stock),
        image_url: Set(validation::optional(payload.image_url)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        meta_title: Set(validation::optional(payload.meta_title)),
        meta_description: Set(validation::optional(payload.meta_description)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_manager(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
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
    if let Some(price) = payload.price {
        validation::non_negative("price", price)?;
        active.price = Set(price);
    }
    if let Some(compare_at_price) = payload.compare_at_price {
        active.compare_at_price = Set(Some(compare_at_price));
    }
    if let Some(stock) = payload.stock {
        validation::non_negative("stock", stock.into())?;
        active.stock = Set(stock);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(validation::optional(Some(image_url)));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

pub async fn add_variant(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: VariantRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    ensure_manager(user)?;
    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    validation::non_negative("stock", payload.stock.into())?;
    if let Some(price) = payload.price {
        validation::non_negative("price", price)?;
    }

    let variant = product_variants::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        name: Set(validation::required("name", &payload.name)?),
        value: Set(validation::required("value", &payload.value)?),
        image_url: Set(validation::optional(payload.image_url)),
        stock: Set(payload.stock),
        price: Set(payload.price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "variant_create",
        "product_variants",
        serde_json::json!({ "product_id": product_id, "variant_id": variant.id }),
    )
    .await;

    Ok(ApiResponse::success("Variant created", variant.into(), None))
}

pub async fn update_variant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateVariantRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    ensure_manager(user)?;
    let existing = ProductVariants::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: product_variants::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(validation::required("name", &name)?);
    }
    if let Some(value) = payload.value {
        active.value = Set(validation::required("value", &value)?);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(validation::optional(Some(image_url)));
    }
    if let Some(stock) = payload.stock {
        validation::non_negative("stock", stock.into())?;
        active.stock = Set(stock);
    }
    if let Some(price) = payload.price {
        validation::non_negative("price", price)?;
        active.price = Set(Some(price));
    }
    let variant = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "variant_update",
        "product_variants",
        serde_json::json!({ "variant_id": variant.id }),
    )
    .await;

    Ok(ApiResponse::success("Variant updated", variant.into(), None))
}

pub async fn delete_variant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = ProductVariants::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "variant_delete",
        "product_variants",
        serde_json::json!({ "variant_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Variant deleted"))
}
