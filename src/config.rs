use std::env;

use anyhow::Context;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub paystack: PaystackConfig,
    /// Public origin of the storefront, used for sitemap and callback links.
    pub site_url: String,
    pub cors_origins: Vec<String>,
    pub low_stock_threshold: i32,
}

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: Option<String>,
    pub base_url: String,
    pub callback_url: Option<String>,
}

impl PaystackConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env::var("PAYSTACK_SECRET_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PAYSTACK_BASE_URL.to_string()),
            callback_url: env::var("PAYSTACK_CALLBACK_URL").ok(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();
        let low_stock_threshold = env::var("LOW_STOCK_THRESHOLD")
            .ok()
            .and_then(|t| t.parse::<i32>().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_hours,
            paystack: PaystackConfig::from_env(),
            site_url,
            cors_origins,
            low_stock_threshold,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_origins;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        let origins = parse_origins(" https://shop.example.com/, ,http://localhost:5173");
        assert_eq!(
            origins,
            vec!["https://shop.example.com", "http://localhost:5173"]
        );
    }
}
