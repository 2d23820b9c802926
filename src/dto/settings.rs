use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Setting;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingRequest {
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingList {
    pub items: Vec<Setting>,
}
