use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::account::{AddressList, AddressRequest, ChangePasswordRequest, UpdateProfileRequest},
    entity::{
        addresses::{self, Entity as Addresses},
        users::{self, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, User},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
    validation,
};

const DEFAULT_COUNTRY: &str = "NG";

async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<users::Model> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let me = current_user(state, user).await?;
    Ok(ApiResponse::success("Ok", me.into(), None))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let me = current_user(state, user).await?;
    let mut active: users::ActiveModel = me.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(validation::optional(Some(full_name)));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(validation::optional(Some(phone)));
    }
    active.updated_at = Set(Utc::now().into());
    let me = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Profile updated", me.into(), None))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let me = current_user(state, user).await?;
    if !auth_service::verify_password(&me.password_hash, &payload.current_password)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    validation::password(&payload.new_password)?;

    let hash = auth_service::hash_password(&payload.new_password)?;
    let mut active: users::ActiveModel = me.into();
    active.password_hash = Set(hash);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "password_change",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::done("Password changed"))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items: Vec<Address> = Addresses::find()
        .filter(addresses::Column::UserId.eq(user.user_id))
        .order_by_desc(addresses::Column::IsDefault)
        .order_by_desc(addresses::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::success("Ok", AddressList { items }, Some(Meta::empty())))
}

async fn own_address<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<addresses::Model> {
    Addresses::find()
        .filter(
            Condition::all()
                .add(addresses::Column::Id.eq(id))
                .add(addresses::Column::UserId.eq(user_id)),
        )
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn clear_default<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(addresses::Column::IsDefault, Expr::value(false))
        .filter(addresses::Column::UserId.eq(user_id))
        .filter(addresses::Column::IsDefault.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}

struct AddressFields {
    label: Option<String>,
    recipient: String,
    phone: String,
    line1: String,
    line2: Option<String>,
    city: String,
    state: String,
    country: String,
}

fn address_fields(payload: AddressRequest) -> AppResult<AddressFields> {
    Ok(AddressFields {
        label: validation::optional(payload.label),
        recipient: validation::required("recipient", &payload.recipient)?,
        phone: validation::required("phone", &payload.phone)?,
        line1: validation::required("line1", &payload.line1)?,
        line2: validation::optional(payload.line2),
        city: validation::required("city", &payload.city)?,
        state: validation::required("state", &payload.state)?,
        country: validation::optional(payload.country)
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
    })
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let wants_default = payload.is_default.unwrap_or(false);
    let fields = address_fields(payload)?;

    let txn = state.orm.begin().await?;
    let has_default = Addresses::find()
        .filter(addresses::Column::UserId.eq(user.user_id))
        .filter(addresses::Column::IsDefault.eq(true))
        .one(&txn)
        .await?
        .is_some();
    // the first address is always the default
    let is_default = wants_default || !has_default;
    if is_default && has_default {
        clear_default(&txn, user.user_id).await?;
    }

    let address = addresses::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        label: Set(fields.label),
        recipient: Set(fields.recipient),
        phone: Set(fields.phone),
        line1: Set(fields.line1),
        line2: Set(fields.line2),
        city: Set(fields.city),
        state: Set(fields.state),
        country: Set(fields.country),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Address created", address.into(), None))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let wants_default = payload.is_default.unwrap_or(false);
    let fields = address_fields(payload)?;

    let txn = state.orm.begin().await?;
    let existing = own_address(&txn, user.user_id, id).await?;
    let make_default = wants_default && !existing.is_default;
    if make_default {
        clear_default(&txn, user.user_id).await?;
    }

    let mut active: addresses::ActiveModel = existing.into();
    active.label = Set(fields.label);
    active.recipient = Set(fields.recipient);
    active.phone = Set(fields.phone);
    active.line1 = Set(fields.line1);
    active.line2 = Set(fields.line2);
    active.city = Set(fields.city);
    active.state = Set(fields.state);
    active.country = Set(fields.country);
    if make_default {
        active.is_default = Set(true);
    }
    let address = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Address updated", address.into(), None))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let existing = own_address(&txn, user.user_id, id).await?;
    let was_default = existing.is_default;
    Addresses::delete_by_id(existing.id).exec(&txn).await?;

    if was_default {
        let next = Addresses::find()
            .filter(addresses::Column::UserId.eq(user.user_id))
            .order_by_desc(addresses::Column::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(next) = next {
            let mut active: addresses::ActiveModel = next.into();
            active.is_default = Set(true);
            active.update(&txn).await?;
        }
    }
    txn.commit().await?;

    Ok(ApiResponse::done("Address deleted"))
}

pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = own_address(&txn, user.user_id, id).await?;
    if existing.is_default {
        txn.commit().await?;
        return Ok(ApiResponse::success("Default address set", existing.into(), None));
    }

    clear_default(&txn, user.user_id).await?;
    let mut active: addresses::ActiveModel = existing.into();
    active.is_default = Set(true);
    let address = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Default address set", address.into(), None))
}
