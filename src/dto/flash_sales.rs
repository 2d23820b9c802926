use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::FlashSale;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FlashSaleRequest {
    pub name: String,
    pub discount_percent: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateFlashSaleRequest {
    pub name: Option<String>,
    pub discount_percent: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FlashSaleWithProducts {
    pub flash_sale: FlashSale,
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FlashSaleList {
    pub items: Vec<FlashSaleWithProducts>,
}
