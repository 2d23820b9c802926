pub mod addresses;
pub mod audit_logs;
pub mod blog_posts;
pub mod cart_items;
pub mod collection_products;
pub mod collections;
pub mod enums;
pub mod flash_sale_products;
pub mod flash_sales;
pub mod newsletter_subscribers;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod product_attribute_terms;
pub mod product_attributes;
pub mod product_variants;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod users;
pub mod wallet_transactions;
pub mod wallets;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use blog_posts::Entity as BlogPosts;
pub use cart_items::Entity as CartItems;
pub use collection_products::Entity as CollectionProducts;
pub use collections::Entity as Collections;
pub use flash_sale_products::Entity as FlashSaleProducts;
pub use flash_sales::Entity as FlashSales;
pub use newsletter_subscribers::Entity as NewsletterSubscribers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use product_attribute_terms::Entity as ProductAttributeTerms;
pub use product_attributes::Entity as ProductAttributes;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use settings::Entity as Settings;
pub use users::Entity as Users;
pub use wallet_transactions::Entity as WalletTransactions;
pub use wallets::Entity as Wallets;
