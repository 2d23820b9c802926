#![allow(dead_code)]

use hair_storefront_api::{
    config::{AppConfig, PaystackConfig},
    db::{create_orm_conn, run_migrations},
    entity::{
        enums::Role,
        product_variants,
        products::{self, ActiveModel as ProductActive},
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

pub const PAYSTACK_TEST_KEY: &str = "sk_test_integration";

/// `None` when no database is configured; callers skip.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
            None
        }
    }
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-secret".into(),
        jwt_ttl_hours: 1,
        paystack: PaystackConfig {
            secret_key: Some(PAYSTACK_TEST_KEY.into()),
            base_url: "http://127.0.0.1:9".into(),
            callback_url: None,
        },
        site_url: "http://localhost:3000".into(),
        cors_origins: Vec::new(),
        low_stock_threshold: 5,
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, wallet_transactions, wallets, payments, order_items, orders, \
         cart_items, reviews, flash_sale_products, flash_sales, collection_products, collections, \
         product_attribute_terms, product_attributes, product_variants, products, addresses, \
         blog_posts, newsletter_subscribers, settings, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    AppState::new(orm, test_config(database_url))
}

pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        full_name: Set(None),
        phone: Set(None),
        role: Set(role),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

pub async fn create_product(
    state: &AppState,
    slug: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<products::Model> {
    Ok(ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Product {slug}")),
        slug: Set(slug.to_string()),
        description: Set(Some("Human hair".into())),
        price: Set(price),
        compare_at_price: Set(None),
        stock: Set(stock),
        image_url: Set(None),
        is_active: Set(true),
        is_featured: Set(false),
        meta_title: Set(None),
        meta_description: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

pub async fn create_variant(
    state: &AppState,
    product_id: Uuid,
    value: &str,
    stock: i32,
) -> anyhow::Result<product_variants::Model> {
    Ok(product_variants::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        name: Set("Color".into()),
        value: Set(value.to_string()),
        image_url: Set(None),
        stock: Set(stock),
        price: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}
