use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::attributes::{AttributeList, AttributeWithTerms, CreateAttributeRequest, TermRequest},
    entity::{
        product_attribute_terms::{self, Entity as ProductAttributeTerms},
        product_attributes::{self, Entity as ProductAttributes},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::AttributeTerm,
    response::{ApiResponse, Meta},
    slug,
    state::AppState,
    validation,
};

pub async fn list_attributes(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AttributeList>> {
    ensure_manager(user)?;
    let rows = ProductAttributes::find()
        .order_by_asc(product_attributes::Column::Name)
        .find_with_related(ProductAttributeTerms)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(attribute, mut terms)| {
            terms.sort_by(|a, b| a.name.cmp(&b.name));
            AttributeWithTerms {
                attribute: attribute.into(),
                terms: terms.into_iter().map(Into::into).collect(),
            }
        })
        .collect();

    Ok(ApiResponse::success("Ok", AttributeList { items }, Some(Meta::empty())))
}

pub async fn create_attribute(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAttributeRequest,
) -> AppResult<ApiResponse<AttributeWithTerms>> {
    ensure_manager(user)?;
    let name = validation::required("name", &payload.name)?;
    let slug = slug::resolve(payload.slug.as_deref(), &name)
        .ok_or_else(|| AppError::BadRequest("Cannot derive a slug from name".into()))?;

    let attribute = product_attributes::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "attribute_create",
        "product_attributes",
        serde_json::json!({ "attribute_id": attribute.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Attribute created",
        AttributeWithTerms {
            attribute: attribute.into(),
            terms: Vec::new(),
        },
        None,
    ))
}

pub async fn delete_attribute(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = ProductAttributes::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "attribute_delete",
        "product_attributes",
        serde_json::json!({ "attribute_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Attribute deleted"))
}

pub async fn add_term(
    state: &AppState,
    user: &AuthUser,
    attribute_id: Uuid,
    payload: TermRequest,
) -> AppResult<ApiResponse<AttributeTerm>> {
    ensure_manager(user)?;
    ProductAttributes::find_by_id(attribute_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let name = validation::required("name", &payload.name)?;
    let slug = slug::resolve(payload.slug.as_deref(), &name)
        .ok_or_else(|| AppError::BadRequest("Cannot derive a slug from name".into()))?;

    let term = product_attribute_terms::ActiveModel {
        id: Set(Uuid::new_v4()),
        attribute_id: Set(attribute_id),
        name: Set(name),
        slug: Set(slug),
        swatch_image: Set(validation::optional(payload.swatch_image)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "term_create",
        "product_attribute_terms",
        serde_json::json!({ "attribute_id": attribute_id, "term_id": term.id }),
    )
    .await;

    Ok(ApiResponse::success("Term created", term.into(), None))
}

pub async fn update_term(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: TermRequest,
) -> AppResult<ApiResponse<AttributeTerm>> {
    ensure_manager(user)?;
    let existing = ProductAttributeTerms::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let name = validation::required("name", &payload.name)?;
    let slug = slug::resolve(payload.slug.as_deref(), &name)
        .ok_or_else(|| AppError::BadRequest("Cannot derive a slug from name".into()))?;

    let mut active: product_attribute_terms::ActiveModel = existing.into();
    active.name = Set(name);
    active.slug = Set(slug);
    active.swatch_image = Set(validation::optional(payload.swatch_image));
    let term = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "term_update",
        "product_attribute_terms",
        serde_json::json!({ "term_id": term.id }),
    )
    .await;

    Ok(ApiResponse::success("Term updated", term.into(), None))
}

pub async fn delete_term(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = ProductAttributeTerms::delete_many()
        .filter(product_attribute_terms::Column::Id.eq(id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "term_delete",
        "product_attribute_terms",
        serde_json::json!({ "term_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Term deleted"))
}
