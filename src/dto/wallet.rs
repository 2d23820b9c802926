use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Wallet, WalletTransaction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopupRequest {
    /// Kobo.
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletOverview {
    pub wallet: Wallet,
    pub transactions: Vec<WalletTransaction>,
}
