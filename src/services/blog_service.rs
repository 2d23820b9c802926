use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::blog::{CreatePostRequest, PostList, UpdatePostRequest},
    entity::{
        blog_posts::{self, Entity as BlogPosts},
        enums::PostStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::BlogPost,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    slug,
    state::AppState,
    validation,
};

/// `published_at` is stamped the first time a post goes out and kept after.
fn published_at_for(
    status: PostStatus,
    current: Option<sea_orm::prelude::DateTimeWithTimeZone>,
) -> Option<sea_orm::prelude::DateTimeWithTimeZone> {
    match (status, current) {
        (_, Some(at)) => Some(at),
        (PostStatus::Published, None) => Some(Utc::now().into()),
        (PostStatus::Draft, None) => None,
    }
}

async fn page_of(
    state: &AppState,
    pagination: Pagination,
    published_only: bool,
) -> AppResult<ApiResponse<PostList>> {
    let (page, per_page, limit, offset) = pagination.window();
    let mut finder = BlogPosts::find();
    finder = if published_only {
        finder
            .filter(blog_posts::Column::Status.eq(PostStatus::Published))
            .order_by_desc(blog_posts::Column::PublishedAt)
    } else {
        finder.order_by_desc(blog_posts::Column::CreatedAt)
    };

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
        PostList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn list_published(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<PostList>> {
    page_of(state, pagination, true).await
}

pub async fn get_published(state: &AppState, slug: String) -> AppResult<ApiResponse<BlogPost>> {
    let post = BlogPosts::find()
        .filter(blog_posts::Column::Slug.eq(slug))
        .filter(blog_posts::Column::Status.eq(PostStatus::Published))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Ok", post.into(), None))
}

pub async fn admin_list_posts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PostList>> {
    ensure_manager(user)?;
    page_of(state, pagination, false).await
}

pub async fn admin_get_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_manager(user)?;
    let post = BlogPosts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Ok", post.into(), None))
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_manager(user)?;
    let title = validation::required("title", &payload.title)?;
    let content = validation::required("content", &payload.content)?;
    let slug = slug::resolve(payload.slug.as_deref(), &title)
        .ok_or_else(|| AppError::BadRequest("Cannot derive a slug from title".into()))?;
    let status = payload.status.unwrap_or(PostStatus::Draft);

    let post = blog_posts::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        slug: Set(slug),
        excerpt: Set(validation::optional(payload.excerpt)),
        content: Set(content),
        cover_image: Set(validation::optional(payload.cover_image)),
        author_id: Set(Some(user.user_id)),
        status: Set(status),
        published_at: Set(published_at_for(status, None)),
        meta_title: Set(validation::optional(payload.meta_title)),
        meta_description: Set(validation::optional(payload.meta_description)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "post_create",
        "blog_posts",
        serde_json::json!({ "post_id": post.id }),
    )
    .await;

    Ok(ApiResponse::success("Post created", post.into(), None))
}

pub async fn update_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    ensure_manager(user)?;
    let existing = BlogPosts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let current_published_at = existing.published_at;

    let mut active: blog_posts::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(validation::required("title", &title)?);
    }
    if let Some(raw) = payload.slug {
        let slug = slug::resolve(Some(raw.as_str()), "")
            .ok_or_else(|| AppError::BadRequest("Invalid slug".into()))?;
        active.slug = Set(slug);
    }
    if let Some(excerpt) = payload.excerpt {
        active.excerpt = Set(validation::optional(Some(excerpt)));
    }
    if let Some(content) = payload.content {
        active.content = Set(validation::required("content", &content)?);
    }
    if let Some(cover_image) = payload.cover_image {
        active.cover_image = Set(validation::optional(Some(cover_image)));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
        active.published_at = Set(published_at_for(status, current_published_at));
    }
    active.updated_at = Set(Utc::now().into());
    let post = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "post_update",
        "blog_posts",
        serde_json::json!({ "post_id": post.id }),
    )
    .await;

    Ok(ApiResponse::success("Post updated", post.into(), None))
}

pub async fn delete_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;
    let result = BlogPosts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "post_delete",
        "blog_posts",
        serde_json::json!({ "post_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Post deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn publishing_stamps_once() {
        assert!(published_at_for(PostStatus::Draft, None).is_none());
        assert!(published_at_for(PostStatus::Published, None).is_some());

        let earlier: sea_orm::prelude::DateTimeWithTimeZone =
            (Utc::now() - Duration::days(3)).into();
        assert_eq!(
            published_at_for(PostStatus::Published, Some(earlier)),
            Some(earlier)
        );
        // unpublishing keeps the original stamp
        assert_eq!(published_at_for(PostStatus::Draft, Some(earlier)), Some(earlier));
    }
}
