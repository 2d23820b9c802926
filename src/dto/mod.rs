pub mod account;
pub mod admin;
pub mod attributes;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod collections;
pub mod flash_sales;
pub mod newsletter;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod seo;
pub mod settings;
pub mod wallet;
