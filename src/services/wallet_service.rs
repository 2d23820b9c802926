use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    dto::{
        payments::PaymentInit,
        wallet::{TopupRequest, WalletOverview},
    },
    entity::{
        enums::{PaymentPurpose, WalletTxKind},
        wallet_transactions::{self, Entity as WalletTransactions},
        wallets::{self, Entity as Wallets},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::payment_service,
    state::AppState,
};

/// Smallest top-up Paystack will accept, in kobo.
pub const MIN_TOPUP: i64 = 10_000;

pub async fn ensure_wallet<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<wallets::Model, DbErr> {
    if let Some(wallet) = Wallets::find()
        .filter(wallets::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(wallet);
    }

    wallets::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        balance: Set(0),
        updated_at: NotSet,
    }
    .insert(conn)
    .await
}

async fn locked_wallet<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<wallets::Model> {
    ensure_wallet(conn, user_id).await?;
    Wallets::find()
        .filter(wallets::Column::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Apply a signed movement to the caller's wallet and journal it. Must run
/// inside a transaction so the row lock holds until commit.
async fn apply<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    kind: WalletTxKind,
    amount: i64,
    reference: &str,
    description: &str,
) -> AppResult<wallets::Model> {
    if amount <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }

    let wallet = locked_wallet(conn, user_id).await?;
    let balance = match kind {
        WalletTxKind::Credit => wallet.balance + amount,
        WalletTxKind::Debit if wallet.balance >= amount => wallet.balance - amount,
        WalletTxKind::Debit => {
            return Err(AppError::BadRequest("Insufficient wallet balance".into()));
        }
    };

    let wallet_id = wallet.id;
    let mut active: wallets::ActiveModel = wallet.into();
    active.balance = Set(balance);
    active.updated_at = Set(Utc::now().into());
    let wallet = active.update(conn).await?;

    wallet_transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        wallet_id: Set(wallet_id),
        kind: Set(kind),
        amount: Set(amount),
        balance_after: Set(balance),
        reference: Set(reference.to_string()),
        description: Set(Some(description.to_string())),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(wallet)
}

pub async fn credit<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    amount: i64,
    reference: &str,
    description: &str,
) -> AppResult<wallets::Model> {
    apply(conn, user_id, WalletTxKind::Credit, amount, reference, description).await
}

pub async fn debit<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    amount: i64,
    reference: &str,
    description: &str,
) -> AppResult<wallets::Model> {
    apply(conn, user_id, WalletTxKind::Debit, amount, reference, description).await
}

pub async fn get_my_wallet(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WalletOverview>> {
    let wallet = ensure_wallet(&state.orm, user.user_id).await?;
    let (page, per_page, limit, offset) = pagination.window();

    let finder = WalletTransactions::find()
        .filter(wallet_transactions::Column::WalletId.eq(wallet.id))
        .order_by_desc(wallet_transactions::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let transactions = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        WalletOverview {
            wallet: wallet.into(),
            transactions,
        },
        Some(Meta::counted(page, per_page, total)),
    ))
}

pub async fn topup(
    state: &AppState,
    user: &AuthUser,
    payload: TopupRequest,
) -> AppResult<ApiResponse<PaymentInit>> {
    if payload.amount < MIN_TOPUP {
        return Err(AppError::BadRequest(format!(
            "Minimum top-up is {MIN_TOPUP} kobo"
        )));
    }

    let init = payment_service::start_payment(
        state,
        user.user_id,
        PaymentPurpose::WalletTopup,
        None,
        payload.amount,
    )
    .await?;

    Ok(ApiResponse::success("Top-up initialized", init, None))
}
