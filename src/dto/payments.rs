use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, Payment};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitializePaymentRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentInit {
    pub reference: String,
    pub authorization_url: String,
    pub access_code: String,
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub order: Option<Order>,
    pub wallet_balance: Option<i64>,
}
