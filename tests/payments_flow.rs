mod common;

use hair_storefront_api::{
    dto::{
        account::AddressRequest,
        cart::AddToCartRequest,
        orders::CheckoutRequest,
    },
    entity::{
        enums::{PaymentMethod, PaymentPurpose, PaymentStatus, Role, TransactionStatus},
        payments,
    },
    error::AppError,
    paystack::{self, TransactionData},
    routes::params::Pagination,
    services::{account_service, cart_service, order_service, payment_service, wallet_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use uuid::Uuid;

async fn pending_payment(
    state: &AppState,
    user_id: Uuid,
    reference: &str,
    purpose: PaymentPurpose,
    order_id: Option<Uuid>,
    amount: i64,
) -> anyhow::Result<()> {
    payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        reference: Set(reference.to_string()),
        purpose: Set(purpose),
        order_id: Set(order_id),
        amount: Set(amount),
        status: Set(TransactionStatus::Pending),
        authorization_url: Set(None),
        gateway_response: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

fn gateway(reference: &str, status: &str, amount: i64) -> TransactionData {
    TransactionData {
        reference: reference.to_string(),
        status: status.to_string(),
        amount,
        currency: Some("NGN".into()),
        gateway_response: None,
        paid_at: None,
        channel: Some("card".into()),
    }
}

fn charge_success(reference: &str, amount: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "event": "charge.success",
        "data": { "reference": reference, "status": "success", "amount": amount }
    }))
    .unwrap()
}

async fn balance(state: &AppState, user: &hair_storefront_api::middleware::auth::AuthUser) -> anyhow::Result<i64> {
    Ok(wallet_service::get_my_wallet(state, user, Pagination::default())
        .await?
        .data
        .unwrap()
        .wallet
        .balance)
}

// Webhook and verify both settle through the same idempotent path.
#[tokio::test]
async fn webhook_and_verify_settle_once() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&database_url).await?;
    let customer = common::create_user(&state, Role::Customer, "payer@example.com").await?;

    // wallet top-up through the webhook
    pending_payment(
        &state,
        customer.user_id,
        "PSK-topup",
        PaymentPurpose::WalletTopup,
        None,
        20_000,
    )
    .await?;
    let body = charge_success("PSK-topup", 20_000);
    let signature = paystack::sign(common::PAYSTACK_TEST_KEY, &body);

    let forged = payment_service::handle_webhook(&state, &body, Some("deadbeef")).await;
    assert!(matches!(forged, Err(AppError::Unauthorized(_))));
    let unsigned = payment_service::handle_webhook(&state, &body, None).await;
    assert!(matches!(unsigned, Err(AppError::Unauthorized(_))));

    payment_service::handle_webhook(&state, &body, Some(&signature)).await?;
    payment_service::handle_webhook(&state, &body, Some(&signature)).await?;
    assert_eq!(balance(&state, &customer).await?, 20_000);

    let other = br#"{"event":"transfer.success","data":{"reference":"PSK-topup","status":"success","amount":1}}"#;
    let resp = payment_service::handle_webhook(
        &state,
        other,
        Some(&paystack::sign(common::PAYSTACK_TEST_KEY, other)),
    )
    .await?;
    assert_eq!(resp.message, "Event ignored");

    let unknown = charge_success("PSK-never-issued", 5_000);
    let resp = payment_service::handle_webhook(
        &state,
        &unknown,
        Some(&paystack::sign(common::PAYSTACK_TEST_KEY, &unknown)),
    )
    .await?;
    assert_eq!(resp.message, "Unknown reference");

    // order payment
    let product = common::create_product(&state, "closure-5x5", 45_000, 4).await?;
    account_service::create_address(
        &state,
        &customer,
        AddressRequest {
            label: None,
            recipient: "Payer".into(),
            phone: "08030000001".into(),
            line1: "1 Marina".into(),
            line2: None,
            city: "Lagos Island".into(),
            state: "Lagos".into(),
            country: Some("ng".into()),
            is_default: Some(true),
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product.id,
            variant_id: None,
            quantity: 1,
        },
    )
    .await?;
    let order = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            address_id: None,
            payment_method: PaymentMethod::Paystack,
            note: Some("Call on arrival".into()),
        },
    )
    .await?
    .data
    .unwrap()
    .order;

    pending_payment(
        &state,
        customer.user_id,
        "PSK-order",
        PaymentPurpose::Order,
        Some(order.id),
        order.total_amount,
    )
    .await?;

    let short = payment_service::settle_payment(&state.orm, &gateway("PSK-order", "success", 100)).await?;
    assert_eq!(short.payment.status, TransactionStatus::Failed);
    assert_eq!(short.order.unwrap().payment_status, PaymentStatus::Unpaid);

    let paid = payment_service::settle_payment(
        &state.orm,
        &gateway("PSK-order", "success", order.total_amount),
    )
    .await?;
    assert_eq!(paid.payment.status, TransactionStatus::Success);
    let paid_order = paid.order.unwrap();
    assert_eq!(paid_order.payment_status, PaymentStatus::Paid);
    assert_eq!(paid_order.payment_reference.as_deref(), Some("PSK-order"));

    let replay = payment_service::settle_payment(
        &state.orm,
        &gateway("PSK-order", "success", order.total_amount),
    )
    .await?;
    assert_eq!(replay.payment.status, TransactionStatus::Success);
    assert_eq!(balance(&state, &customer).await?, 20_000);

    Ok(())
}
