mod common;

use hair_storefront_api::{
    dto::{
        account::AddressRequest,
        cart::AddToCartRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        wallet::TopupRequest,
    },
    entity::{
        enums::{OrderStatus, PaymentMethod, PaymentStatus, Role},
        products::{self, Entity as Products},
        product_variants::Entity as ProductVariants,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{LowStockFilter, Pagination},
    services::{
        account_service, admin_service, cart_service, order_service, wallet_service,
    },
    state::AppState,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

fn address(recipient: &str, is_default: Option<bool>) -> AddressRequest {
    AddressRequest {
        label: None,
        recipient: recipient.into(),
        phone: "08030000000".into(),
        line1: "12 Allen Avenue".into(),
        line2: None,
        city: "Ikeja".into(),
        state: "Lagos".into(),
        country: None,
        is_default,
    }
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        address_id: None,
        payment_method: PaymentMethod::Paystack,
        note: None,
    }
}

async fn default_address(state: &AppState, user: &AuthUser) -> anyhow::Result<Option<Uuid>> {
    Ok(account_service::list_addresses(state, user)
        .await?
        .data
        .unwrap()
        .items
        .into_iter()
        .find(|a| a.is_default)
        .map(|a| a.id))
}

async fn set_product(
    state: &AppState,
    product: &products::Model,
    stock: i32,
    is_active: bool,
) -> anyhow::Result<()> {
    let mut active: products::ActiveModel = product.clone().into();
    active.stock = Set(stock);
    active.is_active = Set(is_active);
    active.update(&state.orm).await?;
    Ok(())
}

// Customer fills a cart, checks out, pays from the wallet; staff cancels and the
// payment is refunded to the wallet with stock restored.
#[tokio::test]
async fn checkout_wallet_payment_and_refund_flow() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;

    let customer = common::create_user(&state, Role::Customer, "buyer@example.com").await?;
    let admin = common::create_user(&state, Role::Admin, "admin@example.com").await?;
    let product = common::create_product(&state, "body-wave-wig", 10_000, 10).await?;
    let variant = common::create_variant(&state, product.id, "Honey Blonde", 3).await?;

    account_service::create_address(
        &state,
        &customer,
        AddressRequest {
            label: Some("Home".into()),
            recipient: "Ada Buyer".into(),
            phone: "08030000000".into(),
            line1: "12 Allen Avenue".into(),
            line2: None,
            city: "Ikeja".into(),
            state: "Lagos".into(),
            country: None,
            is_default: None,
        },
    )
    .await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            variant_id: None,
            quantity: 2,
        },
    )
    .await?;
    let too_many = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            variant_id: Some(variant.id),
            quantity: 4,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            variant_id: Some(variant.id),
            quantity: 1,
        },
    )
    .await?;

    let order = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Wallet,
            note: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.order.subtotal, 30_000);
    assert_eq!(order.order.total_amount, 30_000);
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.order.payment_status, PaymentStatus::Unpaid);
    assert!(order.order.order_number.starts_with("ORD-"));

    let cart = cart_service::list_cart(&state, &customer).await?.data.unwrap();
    assert!(cart.items.is_empty());
    let stocked = Products::find_by_id(product.id).one(&state.orm).await?.unwrap();
    assert_eq!(stocked.stock, 8);
    let stocked_variant = ProductVariants::find_by_id(variant.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(stocked_variant.stock, 2);

    let broke = order_service::pay_with_wallet(&state, &customer, order.order.id).await;
    assert!(matches!(broke, Err(AppError::BadRequest(_))));

    let txn = state.orm.begin().await?;
    wallet_service::credit(&txn, customer.user_id, 50_000, "TEST-CREDIT", "Test credit").await?;
    txn.commit().await?;

    let paid = order_service::pay_with_wallet(&state, &customer, order.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(paid.order.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.order.status, OrderStatus::Processing);
    let wallet = wallet_service::get_my_wallet(&state, &customer, Pagination::new(1, 20))
        .await?
        .data
        .unwrap();
    assert_eq!(wallet.wallet.balance, 20_000);

    let again = order_service::pay_with_wallet(&state, &customer, order.order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    let late_cancel = order_service::cancel_order(&state, &customer, order.order.id).await;
    assert!(matches!(late_cancel, Err(AppError::BadRequest(_))));

    let cancelled = admin_service::update_order_status(
        &state,
        &admin,
        order.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.order.payment_status, PaymentStatus::Refunded);

    let wallet = wallet_service::get_my_wallet(&state, &customer, Pagination::new(1, 20))
        .await?
        .data
        .unwrap();
    assert_eq!(wallet.wallet.balance, 50_000);
    let restored = Products::find_by_id(product.id).one(&state.orm).await?.unwrap();
    assert_eq!(restored.stock, 10);
    let restored_variant = ProductVariants::find_by_id(variant.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(restored_variant.stock, 3);

    let forbidden = admin_service::list_low_stock(
        &state,
        &customer,
        Pagination::default(),
        LowStockFilter::default(),
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));
    let low = admin_service::list_low_stock(
        &state,
        &admin,
        Pagination::new(1, 20),
        LowStockFilter {
            threshold: Some(10),
        },
    )
    .await?;
    assert!(
        low.data.unwrap().items.iter().any(|p| p.id == product.id),
        "expected product to appear in low-stock list"
    );

    checkout_guards_and_address_defaults(&state, &admin).await
}

// Address defaults, checkout rejections at lock time, and the top-up floor.
async fn checkout_guards_and_address_defaults(
    state: &AppState,
    admin: &AuthUser,
) -> anyhow::Result<()> {
    let customer = common::create_user(state, Role::Customer, "guard@example.com").await?;
    let product = common::create_product(state, "guard-wig", 12_000, 10).await?;
    cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            variant_id: None,
            quantity: 2,
        },
    )
    .await?;

    let no_address = order_service::checkout(state, &customer, checkout_request()).await;
    assert!(matches!(no_address, Err(AppError::BadRequest(_))));
    let cart = cart_service::list_cart(state, &customer).await?;
    assert_eq!(cart.data.unwrap().items.len(), 1);
    assert_eq!(cart.meta.unwrap().per_page, Some(1));

    let first = account_service::create_address(state, &customer, address("First", None))
        .await?
        .data
        .unwrap();
    assert!(first.is_default);
    let second = account_service::create_address(state, &customer, address("Second", None))
        .await?
        .data
        .unwrap();
    assert!(!second.is_default);
    let third = account_service::create_address(state, &customer, address("Third", Some(true)))
        .await?
        .data
        .unwrap();
    assert!(third.is_default);
    assert_eq!(default_address(state, &customer).await?, Some(third.id));

    account_service::delete_address(state, &customer, third.id).await?;
    assert_eq!(default_address(state, &customer).await?, Some(second.id));

    // stock dropped after the line went into the cart
    set_product(state, &product, 1, true).await?;
    let short = order_service::checkout(state, &customer, checkout_request()).await;
    assert!(matches!(short, Err(AppError::BadRequest(_))));
    let unchanged = Products::find_by_id(product.id).one(&state.orm).await?.unwrap();
    assert_eq!(unchanged.stock, 1);

    set_product(state, &product, 10, false).await?;
    let inactive = order_service::checkout(state, &customer, checkout_request()).await;
    assert!(matches!(inactive, Err(AppError::BadRequest(_))));

    // inactive products stay out of the low-stock list, like the dashboard count
    let low = admin_service::list_low_stock(
        state,
        admin,
        Pagination::new(1, 100),
        LowStockFilter {
            threshold: Some(10),
        },
    )
    .await?;
    assert!(!low.data.unwrap().items.iter().any(|p| p.id == product.id));

    let tiny = wallet_service::topup(
        state,
        &customer,
        TopupRequest {
            amount: wallet_service::MIN_TOPUP - 1,
        },
    )
    .await;
    assert!(matches!(tiny, Err(AppError::BadRequest(_))));

    Ok(())
}
