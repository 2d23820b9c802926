pub mod account_service;
pub mod admin_service;
pub mod attribute_service;
pub mod auth_service;
pub mod blog_service;
pub mod cart_service;
pub mod collection_service;
pub mod flash_sale_service;
pub mod newsletter_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod review_service;
pub mod seo_service;
pub mod setting_service;
pub mod sitemap_service;
pub mod user_service;
pub mod wallet_service;
