use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::reviews::{CreateReviewRequest, ModerateReviewRequest, ReviewList},
    entity::{
        enums::ReviewStatus,
        reviews::{self, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ReviewFilter},
    services::product_service,
    state::AppState,
    validation,
};

pub async fn list_product_reviews(
    state: &AppState,
    slug: String,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let product = product_service::find_active_by_slug(&state.orm, &slug).await?;
    let (page, per_page, limit, offset) = pagination.window();

    let finder = Reviews::find()
        .filter(reviews::Column::ProductId.eq(product.id))
        .filter(reviews::Column::Status.eq(ReviewStatus::Approved))
        .order_by_desc(reviews::Column::CreatedAt);
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
        ReviewList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    slug: String,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }
    let body = validation::required("body", &payload.body)?;
    let product = product_service::find_active_by_slug(&state.orm, &slug).await?;

    let exists = Reviews::find()
        .filter(
            Condition::all()
                .add(reviews::Column::ProductId.eq(product.id))
                .add(reviews::Column::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(
            "You have already reviewed this product".into(),
        ));
    }

    let review = reviews::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        user_id: Set(user.user_id),
        rating: Set(payload.rating),
        title: Set(validation::optional(payload.title)),
        body: Set(body),
        status: Set(ReviewStatus::Pending),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review submitted for moderation",
        review.into(),
        None,
    ))
}

pub async fn admin_list_reviews(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    filter: ReviewFilter,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_staff(user)?;
    let (page, per_page, limit, offset) = pagination.window();

    let mut finder = Reviews::find().order_by_desc(reviews::Column::CreatedAt);
    if let Some(status) = filter.status {
        finder = finder.filter(reviews::Column::Status.eq(status));
    }
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
        ReviewList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn moderate_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ModerateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_staff(user)?;
    let existing = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: reviews::ActiveModel = existing.into();
    active.status = Set(payload.status);
    let review = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "review_moderate",
        "reviews",
        serde_json::json!({ "review_id": id, "status": payload.status }),
    )
    .await;

    Ok(ApiResponse::success("Review updated", review.into(), None))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = Reviews::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Review deleted"))
}
