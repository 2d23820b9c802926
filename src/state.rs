use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, paystack::PaystackClient};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub paystack: PaystackClient,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: AppConfig) -> anyhow::Result<Self> {
        let paystack = PaystackClient::new(&config.paystack)?;
        Ok(Self {
            orm,
            config: Arc::new(config),
            paystack,
        })
    }
}
