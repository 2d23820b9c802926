use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::newsletter::{SubscribeRequest, SubscriberList},
    entity::newsletter_subscribers::{self, Entity as NewsletterSubscribers},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::NewsletterSubscriber,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, SubscriberFilter},
    state::AppState,
    validation,
};

/// Subscribe, or reactivate a previously unsubscribed address.
pub async fn subscribe(
    state: &AppState,
    payload: SubscribeRequest,
) -> AppResult<ApiResponse<NewsletterSubscriber>> {
    let email = validation::normalize_email(&payload.email)?;

    let existing = NewsletterSubscribers::find()
        .filter(newsletter_subscribers::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let subscriber = match existing {
        Some(sub) if sub.is_active => sub,
        Some(sub) => {
            let mut active: newsletter_subscribers::ActiveModel = sub.into();
            active.is_active = Set(true);
            active.unsubscribed_at = Set(None);
            active.update(&state.orm).await?
        }
        None => {
            newsletter_subscribers::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(email),
                is_active: Set(true),
                created_at: NotSet,
                unsubscribed_at: Set(None),
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        &state.orm,
        None,
        "newsletter_subscribe",
        "newsletter_subscribers",
        serde_json::json!({ "subscriber_id": subscriber.id }),
    )
    .await;

    Ok(ApiResponse::success("Subscribed", subscriber.into(), None))
}

pub async fn unsubscribe(
    state: &AppState,
    payload: SubscribeRequest,
) -> AppResult<ApiResponse<NewsletterSubscriber>> {
    let email = validation::normalize_email(&payload.email)?;

    let existing = NewsletterSubscribers::find()
        .filter(newsletter_subscribers::Column::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let subscriber = if existing.is_active {
        let mut active: newsletter_subscribers::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.unsubscribed_at = Set(Some(Utc::now().into()));
        active.update(&state.orm).await?
    } else {
        existing
    };

    audit::record(
        &state.orm,
        None,
        "newsletter_unsubscribe",
        "newsletter_subscribers",
        serde_json::json!({ "subscriber_id": subscriber.id }),
    )
    .await;

    Ok(ApiResponse::success("Unsubscribed", subscriber.into(), None))
}

pub async fn list_subscribers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    filter: SubscriberFilter,
) -> AppResult<ApiResponse<SubscriberList>> {
    ensure_manager(user)?;
    let (page, per_page, limit, offset) = pagination.window();

    let mut finder =
        NewsletterSubscribers::find().order_by_desc(newsletter_subscribers::Column::CreatedAt);
    if let Some(active) = filter.active {
        finder = finder.filter(newsletter_subscribers::Column::IsActive.eq(active));
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
        SubscriberList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}
