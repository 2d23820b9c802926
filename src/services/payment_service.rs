use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::payments::{InitializePaymentRequest, PaymentInit, PaymentOutcome},
    entity::{
        enums::{PaymentMethod, PaymentPurpose, TransactionStatus},
        payments::{self, Entity as Payments},
        users::Entity as Users,
        wallets::{self, Entity as Wallets},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    paystack::{self, InitializeTransaction, TransactionData, WebhookEvent},
    response::{ApiResponse, Meta},
    services::{order_service, wallet_service},
    state::AppState,
};

pub const CHARGE_SUCCESS: &str = "charge.success";

/// What settling a gateway result does to a stored payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    AlreadySettled,
    Reject(TransactionStatus),
    Succeed,
}

pub fn decide(payment: &payments::Model, data: &TransactionData) -> Settlement {
    if payment.status == TransactionStatus::Success {
        return Settlement::AlreadySettled;
    }
    if !data.is_success() {
        return match data.status.as_str() {
            "abandoned" => Settlement::Reject(TransactionStatus::Abandoned),
            _ => Settlement::Reject(TransactionStatus::Failed),
        };
    }
    if data.amount != payment.amount {
        return Settlement::Reject(TransactionStatus::Failed);
    }
    Settlement::Succeed
}

/// Create a Paystack transaction and the pending payment row that tracks it.
pub async fn start_payment(
    state: &AppState,
    user_id: Uuid,
    purpose: PaymentPurpose,
    order_id: Option<Uuid>,
    amount: i64,
) -> AppResult<PaymentInit> {
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let reference = paystack::new_reference();
    let purpose_name = match purpose {
        PaymentPurpose::Order => "order",
        PaymentPurpose::WalletTopup => "wallet_topup",
    };
    let request = InitializeTransaction {
        email: &user.email,
        amount,
        reference: &reference,
        callback_url: state.paystack.callback_url(),
        metadata: serde_json::json!({
            "purpose": purpose_name,
            "order_id": order_id,
            "user_id": user_id,
        }),
    };
    let initialized = state.paystack.initialize(&request).await?;

    payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        reference: Set(reference.clone()),
        purpose: Set(purpose),
        order_id: Set(order_id),
        amount: Set(amount),
        status: Set(TransactionStatus::Pending),
        authorization_url: Set(Some(initialized.authorization_url.clone())),
        gateway_response: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(%reference, amount, purpose = purpose_name, "payment initialized");

    Ok(PaymentInit {
        reference,
        authorization_url: initialized.authorization_url,
        access_code: initialized.access_code,
        amount,
    })
}

pub async fn initialize_for_order(
    state: &AppState,
    user: &AuthUser,
    payload: InitializePaymentRequest,
) -> AppResult<ApiResponse<PaymentInit>> {
    let order = crate::entity::Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .filter(|o| o.user_id == user.user_id)
        .ok_or(AppError::NotFound)?;
    order_service::ensure_payable(&order)?;

    let init = start_payment(
        state,
        user.user_id,
        PaymentPurpose::Order,
        Some(order.id),
        order.total_amount,
    )
    .await?;

    Ok(ApiResponse::success("Payment initialized", init, None))
}

async fn outcome<C: ConnectionTrait>(conn: &C, payment: payments::Model) -> AppResult<PaymentOutcome> {
    let order = match payment.order_id {
        Some(order_id) => crate::entity::Orders::find_by_id(order_id)
            .one(conn)
            .await?
            .map(Into::into),
        None => None,
    };
    let wallet_balance = match payment.purpose {
        PaymentPurpose::WalletTopup => Wallets::find()
            .filter(wallets::Column::UserId.eq(payment.user_id))
            .one(conn)
            .await?
            .map(|w| w.balance),
        PaymentPurpose::Order => None,
    };
    Ok(PaymentOutcome {
        payment: payment.into(),
        order,
        wallet_balance,
    })
}

/// Apply a verified gateway result. Safe to call any number of times for
/// the same reference: the payment row is locked and a settled payment is
/// returned untouched.
pub async fn settle_payment(
    conn: &DatabaseConnection,
    data: &TransactionData,
) -> AppResult<PaymentOutcome> {
    let txn = conn.begin().await?;
    let payment = Payments::find()
        .filter(payments::Column::Reference.eq(data.reference.as_str()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let decision = decide(&payment, data);
    if decision == Settlement::AlreadySettled {
        let resp = outcome(&txn, payment).await?;
        txn.commit().await?;
        return Ok(resp);
    }

    let gateway_response =
        serde_json::to_value(data).map_err(|e| AppError::Internal(e.into()))?;
    let mut active: payments::ActiveModel = payment.clone().into();
    active.gateway_response = Set(Some(gateway_response));
    active.updated_at = Set(Utc::now().into());

    match decision {
        Settlement::Reject(status) => {
            tracing::warn!(
                reference = %payment.reference,
                gateway_status = %data.status,
                expected = payment.amount,
                received = data.amount,
                "payment not settled"
            );
            active.status = Set(status);
        }
        Settlement::Succeed => {
            active.status = Set(TransactionStatus::Success);
            apply_success(&txn, &payment).await?;
            tracing::info!(reference = %payment.reference, amount = payment.amount, "payment settled");
        }
        Settlement::AlreadySettled => {}
    }

    let payment = active.update(&txn).await?;
    let resp = outcome(&txn, payment).await?;
    txn.commit().await?;
    Ok(resp)
}

async fn apply_success<C: ConnectionTrait>(conn: &C, payment: &payments::Model) -> AppResult<()> {
    match (payment.purpose, payment.order_id) {
        (PaymentPurpose::Order, Some(order_id)) => {
            let order = order_service::lock_order(conn, order_id, None).await?;
            if order_service::ensure_payable(&order).is_ok() {
                order_service::mark_paid(conn, order, PaymentMethod::Paystack, &payment.reference)
                    .await?;
            } else {
                // money arrived for an order that can no longer take it
                wallet_service::credit(
                    conn,
                    payment.user_id,
                    payment.amount,
                    &payment.reference,
                    &format!("Credit for unapplied payment on order {}", order.order_number),
                )
                .await?;
            }
        }
        _ => {
            wallet_service::credit(
                conn,
                payment.user_id,
                payment.amount,
                &payment.reference,
                "Wallet top-up",
            )
            .await?;
        }
    }
    Ok(())
}

pub async fn verify_payment(
    state: &AppState,
    user: &AuthUser,
    reference: String,
) -> AppResult<ApiResponse<PaymentOutcome>> {
    let payment = Payments::find()
        .filter(payments::Column::Reference.eq(reference.as_str()))
        .one(&state.orm)
        .await?
        .filter(|p| p.user_id == user.user_id)
        .ok_or(AppError::NotFound)?;

    if payment.status == TransactionStatus::Success {
        let resp = outcome(&state.orm, payment).await?;
        return Ok(ApiResponse::success("Payment already settled", resp, None));
    }

    let data = state.paystack.verify(&reference).await?;
    let resp = settle_payment(&state.orm, &data).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "payment_verify",
        "payments",
        serde_json::json!({ "reference": reference, "gateway_status": data.status }),
    )
    .await;

    Ok(ApiResponse::success("Payment verified", resp, Some(Meta::empty())))
}

pub async fn handle_webhook(
    state: &AppState,
    body: &[u8],
    signature: Option<&str>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let valid = signature.is_some_and(|sig| state.paystack.verify_signature(body, sig));
    if !valid {
        return Err(AppError::Unauthorized("Invalid webhook signature".into()));
    }

    let event: WebhookEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;
    if event.event != CHARGE_SUCCESS {
        tracing::debug!(event = %event.event, "webhook event ignored");
        return Ok(ApiResponse::done("Event ignored"));
    }

    match settle_payment(&state.orm, &event.data).await {
        Ok(resp) => {
            audit::record(
                &state.orm,
                None,
                "payment_webhook",
                "payments",
                serde_json::json!({
                    "reference": event.data.reference,
                    "status": resp.payment.status,
                }),
            )
            .await;
            Ok(ApiResponse::done("Event processed"))
        }
        // references we never issued are acknowledged so Paystack stops retrying
        Err(AppError::NotFound) => {
            tracing::warn!(reference = %event.data.reference, "webhook for unknown reference");
            Ok(ApiResponse::done("Unknown reference"))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(status: TransactionStatus, amount: i64) -> payments::Model {
        payments::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            reference: "PSK-1".into(),
            purpose: PaymentPurpose::Order,
            order_id: Some(Uuid::new_v4()),
            amount,
            status,
            authorization_url: None,
            gateway_response: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn data(status: &str, amount: i64) -> TransactionData {
        TransactionData {
            reference: "PSK-1".into(),
            status: status.into(),
            amount,
            currency: Some("NGN".into()),
            gateway_response: None,
            paid_at: None,
            channel: None,
        }
    }

    #[test]
    fn settled_payments_are_left_alone() {
        let p = payment(TransactionStatus::Success, 5_000);
        assert_eq!(decide(&p, &data("success", 5_000)), Settlement::AlreadySettled);
        assert_eq!(decide(&p, &data("failed", 5_000)), Settlement::AlreadySettled);
    }

    #[test]
    fn gateway_failures_map_to_status() {
        let p = payment(TransactionStatus::Pending, 5_000);
        assert_eq!(
            decide(&p, &data("abandoned", 5_000)),
            Settlement::Reject(TransactionStatus::Abandoned)
        );
        assert_eq!(
            decide(&p, &data("failed", 5_000)),
            Settlement::Reject(TransactionStatus::Failed)
        );
    }

    #[test]
    fn amount_mismatch_fails() {
        let p = payment(TransactionStatus::Pending, 5_000);
        assert_eq!(
            decide(&p, &data("success", 4_999)),
            Settlement::Reject(TransactionStatus::Failed)
        );
    }

    #[test]
    fn failed_payment_can_still_succeed_later() {
        let p = payment(TransactionStatus::Failed, 5_000);
        assert_eq!(decide(&p, &data("success", 5_000)), Settlement::Succeed);
    }
}
