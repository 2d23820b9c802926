use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    entity::enums::{
        OrderStatus, PaymentMethod, PaymentPurpose, PaymentStatus, PostStatus, ReviewStatus,
        Role, TransactionStatus, WalletTxKind,
    },
    models::{
        Address, Attribute, AttributeTerm, BlogPost, CartItem, Collection, FlashSale,
        NewsletterSubscriber, Order, OrderItem, Payment, Product, ProductVariant, Review, Setting,
        User, Wallet, WalletTransaction,
    },
    response::Meta,
    routes::{
        account, admin, auth, blog, cart, collections, health, newsletter, orders, params,
        payments, products, sitemap, wallet,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        sitemap::sitemap,
        auth::register,
        auth::login,
        account::get_me,
        account::update_me,
        account::change_password,
        account::list_addresses,
        account::create_address,
        account::update_address,
        account::delete_address,
        account::set_default_address,
        products::list_products,
        products::get_product,
        products::list_reviews,
        products::create_review,
        collections::list_collections,
        collections::get_collection,
        collections::active_flash_sales,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        orders::pay_with_wallet,
        payments::initialize_payment,
        payments::verify_payment,
        payments::webhook,
        wallet::my_wallet,
        wallet::topup,
        blog::list_posts,
        blog::get_post,
        newsletter::subscribe,
        newsletter::unsubscribe,
        admin::dashboard::dashboard,
        admin::orders::list_all_orders,
        admin::orders::get_order_admin,
        admin::orders::update_order_status,
        admin::orders::mark_order_paid,
        admin::orders::list_low_stock,
        admin::orders::adjust_inventory,
        admin::catalog::list_products,
        admin::catalog::create_product,
        admin::catalog::get_product,
        admin::catalog::update_product,
        admin::catalog::delete_product,
        admin::catalog::add_variant,
        admin::catalog::update_variant,
        admin::catalog::delete_variant,
        admin::attributes::list_attributes,
        admin::attributes::create_attribute,
        admin::attributes::delete_attribute,
        admin::attributes::add_term,
        admin::attributes::update_term,
        admin::attributes::delete_term,
        admin::collections::list_collections,
        admin::collections::create_collection,
        admin::collections::update_collection,
        admin::collections::delete_collection,
        admin::collections::set_products,
        admin::collections::remove_product,
        admin::flash_sales::list_flash_sales,
        admin::flash_sales::create_flash_sale,
        admin::flash_sales::update_flash_sale,
        admin::flash_sales::delete_flash_sale,
        admin::flash_sales::set_products,
        admin::reviews::list_reviews,
        admin::reviews::moderate_review,
        admin::reviews::delete_review,
        admin::blog::list_posts,
        admin::blog::create_post,
        admin::blog::get_post,
        admin::blog::update_post,
        admin::blog::delete_post,
        admin::seo::audit,
        admin::seo::update_product_seo,
        admin::seo::update_post_seo,
        admin::newsletter::list_subscribers,
        admin::settings::list_settings,
        admin::settings::update_setting,
        admin::users::list_users,
        admin::users::update_role
    ),
    components(
        schemas(
            User,
            Address,
            Product,
            ProductVariant,
            Attribute,
            AttributeTerm,
            Collection,
            FlashSale,
            CartItem,
            Order,
            OrderItem,
            Payment,
            Review,
            BlogPost,
            Wallet,
            WalletTransaction,
            Setting,
            NewsletterSubscriber,
            Role,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            PaymentPurpose,
            TransactionStatus,
            ReviewStatus,
            PostStatus,
            WalletTxKind,
            params::Pagination,
            Meta
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and sitemap"),
        (name = "Auth", description = "Registration and login"),
        (name = "Account", description = "Profile and address book"),
        (name = "Products", description = "Catalog browsing"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Collections", description = "Collections and flash sales"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Payments", description = "Paystack payments and webhook"),
        (name = "Wallet", description = "Store credit"),
        (name = "Blog", description = "Published posts"),
        (name = "Newsletter", description = "Newsletter subscription"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/sitemap.xml",
            "/api/orders/checkout",
            "/api/payments/webhook",
            "/api/wallet/topup",
            "/api/admin/collections/{id}/products/{product_id}",
            "/api/admin/settings/{key}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
