use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    addresses, blog_posts, cart_items,
    enums::{
        OrderStatus, PaymentMethod, PaymentPurpose, PaymentStatus, PostStatus, ReviewStatus, Role,
        TransactionStatus, WalletTxKind,
    },
    collections, flash_sales, newsletter_subscribers, order_items, orders, payments,
    product_attribute_terms, product_attributes, product_variants, products, reviews, settings,
    users, wallet_transactions, wallets,
};

type Timestamp = sea_orm::prelude::DateTimeWithTimeZone;

fn utc(ts: Timestamp) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            phone: model.phone,
            role: model.role,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub label: Option<String>,
    pub recipient: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            label: model.label,
            recipient: model.recipient,
            phone: model.phone,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            state: model.state,
            country: model.country,
            is_default: model.is_default,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    /// Price after the best live flash-sale discount, when one applies.
    pub sale_price: Option<i64>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn with_sale_percent(mut self, percent: Option<i32>) -> Self {
        self.sale_price = percent
            .map(|p| self.price - crate::pricing::discount_per_unit(self.price, Some(p)));
        self
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            price: model.price,
            compare_at_price: model.compare_at_price,
            sale_price: None,
            stock: model.stock,
            image_url: model.image_url,
            is_active: model.is_active,
            is_featured: model.is_featured,
            meta_title: model.meta_title,
            meta_description: model.meta_description,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub value: String,
    pub image_url: Option<String>,
    pub stock: i32,
    pub price: Option<i64>,
}

impl From<product_variants::Model> for ProductVariant {
    fn from(model: product_variants::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            name: model.name,
            value: model.value,
            image_url: model.image_url,
            stock: model.stock,
            price: model.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<product_attributes::Model> for Attribute {
    fn from(model: product_attributes::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttributeTerm {
    pub id: Uuid,
    pub attribute_id: Uuid,
    pub name: String,
    pub slug: String,
    pub swatch_image: Option<String>,
}

impl From<product_attribute_terms::Model> for AttributeTerm {
    fn from(model: product_attribute_terms::Model) -> Self {
        Self {
            id: model.id,
            attribute_id: model.attribute_id,
            name: model.name,
            slug: model.slug,
            swatch_image: model.swatch_image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<collections::Model> for Collection {
    fn from(model: collections::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            image_url: model.image_url,
            is_active: model.is_active,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FlashSale {
    pub id: Uuid,
    pub name: String,
    pub discount_percent: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<flash_sales::Model> for FlashSale {
    fn from(model: flash_sales::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            discount_percent: model.discount_percent,
            starts_at: utc(model.starts_at),
            ends_at: utc(model.ends_at),
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            quantity: model.quantity,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_fee: i64,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    #[schema(value_type = Object)]
    pub shipping_address: serde_json::Value,
    pub note: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            subtotal: model.subtotal,
            discount_amount: model.discount_amount,
            shipping_fee: model.shipping_fee,
            total_amount: model.total_amount,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            payment_reference: model.payment_reference,
            shipping_address: model.shipping_address,
            note: model.note,
            paid_at: model.paid_at.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub variant_label: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            product_name: model.product_name,
            variant_label: model.variant_label,
            quantity: model.quantity,
            unit_price: model.unit_price,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub reference: String,
    pub purpose: PaymentPurpose,
    pub order_id: Option<Uuid>,
    pub amount: i64,
    pub status: TransactionStatus,
    pub authorization_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            reference: model.reference,
            purpose: model.purpose,
            order_id: model.order_id,
            amount: model.amount,
            status: model.status,
            authorization_url: model.authorization_url,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: Option<String>,
    pub body: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            rating: model.rating,
            title: model.title,
            body: model.body,
            status: model.status,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub author_id: Option<Uuid>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<blog_posts::Model> for BlogPost {
    fn from(model: blog_posts::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            excerpt: model.excerpt,
            content: model.content,
            cover_image: model.cover_image,
            author_id: model.author_id,
            status: model.status,
            published_at: model.published_at.map(utc),
            meta_title: model.meta_title,
            meta_description: model.meta_description,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<wallets::Model> for Wallet {
    fn from(model: wallets::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            balance: model.balance,
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub kind: WalletTxKind,
    pub amount: i64,
    pub balance_after: i64,
    pub reference: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<wallet_transactions::Model> for WalletTransaction {
    fn from(model: wallet_transactions::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            amount: model.amount,
            balance_after: model.balance_after,
            reference: model.reference,
            description: model.description,
            created_at: utc(model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Setting {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl From<settings::Model> for Setting {
    fn from(model: settings::Model) -> Self {
        Self {
            key: model.key,
            value: model.value,
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewsletterSubscriber {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl From<newsletter_subscribers::Model> for NewsletterSubscriber {
    fn from(model: newsletter_subscribers::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            is_active: model.is_active,
            created_at: utc(model.created_at),
            unsubscribed_at: model.unsubscribed_at.map(utc),
        }
    }
}
