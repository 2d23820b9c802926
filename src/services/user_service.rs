use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::admin::{UpdateRoleRequest, UserList},
    entity::users::{self, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, UserFilter},
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    filter: UserFilter,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, per_page, limit, offset) = pagination.window();

    let mut condition = Condition::all();
    if let Some(role) = filter.role {
        condition = condition.add(users::Column::Role.eq(role));
    }
    if let Some(q) = filter.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(users::Column::Email).ilike(format!("%{}%", q)));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(users::Column::CreatedAt);
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
        "Users",
        UserList { items },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn update_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    if id == user.user_id && payload.role != user.role {
        return Err(AppError::BadRequest("You cannot change your own role".into()));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.role;

    let mut active: users::ActiveModel = existing.into();
    active.role = Set(payload.role);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_role_update",
        "users",
        serde_json::json!({ "user_id": id, "from": previous, "to": payload.role }),
    )
    .await;

    Ok(ApiResponse::success("Role updated", updated.into(), None))
}
