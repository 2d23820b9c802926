use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::enums::{OrderStatus, Role},
    models::User,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub orders_by_status: Vec<StatusCount>,
    /// Kobo collected on paid orders.
    pub paid_revenue: i64,
    pub customers: u64,
    pub low_stock_products: u64,
    pub pending_reviews: u64,
    pub active_subscribers: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}
