use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, EntityTrait, QueryOrder, sea_query::OnConflict,
};
use serde_json::Value;

use crate::{
    audit,
    dto::settings::{SettingList, UpdateSettingRequest},
    entity::settings::{self, Entity as Settings},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Setting,
    pricing::ShippingRules,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const SHIPPING_FEE: &str = "shipping_fee";
pub const FREE_SHIPPING_THRESHOLD: &str = "free_shipping_threshold";

pub async fn get_value<C: ConnectionTrait>(conn: &C, key: &str) -> AppResult<Option<Value>> {
    Ok(Settings::find_by_id(key.to_string())
        .one(conn)
        .await?
        .map(|s| s.value))
}

/// Insert or replace a setting value.
pub async fn put_value<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    value: Value,
) -> AppResult<settings::Model> {
    Settings::insert(settings::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value),
        updated_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::column(settings::Column::Key)
            .update_columns([settings::Column::Value, settings::Column::UpdatedAt])
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    Settings::find_by_id(key.to_string())
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Numbers may be stored as JSON numbers or numeric strings.
fn as_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn shipping_rules<C: ConnectionTrait>(conn: &C) -> AppResult<ShippingRules> {
    let flat_fee = get_value(conn, SHIPPING_FEE)
        .await?
        .as_ref()
        .and_then(as_amount)
        .unwrap_or(0);
    let free_threshold = get_value(conn, FREE_SHIPPING_THRESHOLD)
        .await?
        .as_ref()
        .and_then(as_amount);
    Ok(ShippingRules {
        flat_fee,
        free_threshold,
    })
}

pub async fn list_settings(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SettingList>> {
    ensure_admin(user)?;
    let items: Vec<Setting> = Settings::find()
        .order_by_asc(settings::Column::Key)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::success("Ok", SettingList { items }, Some(Meta::empty())))
}

pub async fn update_setting(
    state: &AppState,
    user: &AuthUser,
    key: String,
    payload: UpdateSettingRequest,
) -> AppResult<ApiResponse<Setting>> {
    ensure_admin(user)?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(AppError::BadRequest("key is required".into()));
    }
    if matches!(key.as_str(), SHIPPING_FEE | FREE_SHIPPING_THRESHOLD)
        && !as_amount(&payload.value).is_some_and(|v| v >= 0)
    {
        return Err(AppError::BadRequest(format!(
            "{key} must be a non-negative amount in kobo"
        )));
    }

    let setting = put_value(&state.orm, &key, payload.value).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "setting_update",
        "settings",
        serde_json::json!({ "key": key }),
    )
    .await;

    Ok(ApiResponse::success("Setting saved", setting.into(), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amounts_accept_numbers_and_numeric_strings() {
        assert_eq!(as_amount(&json!(2500)), Some(2500));
        assert_eq!(as_amount(&json!(" 1500 ")), Some(1500));
        assert_eq!(as_amount(&json!("free")), None);
        assert_eq!(as_amount(&json!(true)), None);
    }
}
