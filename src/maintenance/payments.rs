use chrono::{DateTime, Duration, Utc};
use clap::Args;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    config::PaystackConfig,
    entity::{
        enums::TransactionStatus,
        payments::{self, Entity as Payments},
    },
    paystack::{self, PaystackClient},
    services::payment_service,
};

#[derive(Debug, Args)]
pub struct DiagnosticsArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Verify a single payment reference with Paystack
    #[arg(long)]
    pub reference: Option<String>,

    /// Pending payments older than this many hours are reported as stale
    #[arg(long, default_value_t = 24)]
    pub stale_hours: i64,

    /// Verify stale payments with Paystack and settle the ones that succeeded
    #[arg(long)]
    pub reverify: bool,
}

/// Human readable verdict on the configured secret key.
pub fn describe_key(secret_key: Option<&str>) -> String {
    match secret_key {
        None => "PAYSTACK_SECRET_KEY is not set".to_string(),
        Some(key) => match paystack::key_mode(key) {
            Some(mode) => format!("secret key present ({mode} mode)"),
            None => "secret key present but does not start with sk_test_ or sk_live_".to_string(),
        },
    }
}

pub fn stale_cutoff(now: DateTime<Utc>, stale_hours: i64) -> DateTime<Utc> {
    now - Duration::hours(stale_hours.max(0))
}

pub async fn run(args: DiagnosticsArgs) -> anyhow::Result<()> {
    let config = PaystackConfig::from_env();
    println!("{}", describe_key(config.secret_key.as_deref()));
    println!("base url: {}", config.base_url);
    let client = PaystackClient::new(&config)?;
    let conn = super::connect(&args.database_url).await?;

    if let Some(reference) = &args.reference {
        check_reference(&conn, &client, reference, args.reverify).await?;
    }

    let cutoff = stale_cutoff(Utc::now(), args.stale_hours);
    let stale = Payments::find()
        .filter(payments::Column::Status.eq(TransactionStatus::Pending))
        .filter(payments::Column::CreatedAt.lt(cutoff))
        .order_by_asc(payments::Column::CreatedAt)
        .all(&conn)
        .await?;

    println!(
        "{} pending payment(s) older than {}h",
        stale.len(),
        args.stale_hours
    );
    for payment in &stale {
        println!(
            "{}\t{:?}\t{}\t{}",
            payment.reference, payment.purpose, payment.amount, payment.created_at
        );
    }

    if args.reverify {
        if !client.is_configured() {
            anyhow::bail!("cannot re-verify without PAYSTACK_SECRET_KEY");
        }
        for payment in &stale {
            check_reference(&conn, &client, &payment.reference, true).await?;
        }
    }

    Ok(())
}

async fn check_reference(
    conn: &DatabaseConnection,
    client: &PaystackClient,
    reference: &str,
    settle: bool,
) -> anyhow::Result<()> {
    let data = client.verify(reference).await?;
    println!(
        "{}\tgateway={}\tamount={}\t{}",
        data.reference,
        data.status,
        data.amount,
        data.gateway_response.as_deref().unwrap_or("-")
    );

    if settle {
        let outcome = payment_service::settle_payment(conn, &data).await?;
        tracing::info!(
            reference,
            status = ?outcome.payment.status,
            "payment re-verified"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_descriptions() {
        assert_eq!(describe_key(None), "PAYSTACK_SECRET_KEY is not set");
        assert_eq!(describe_key(Some("sk_live_x")), "secret key present (live mode)");
        assert!(describe_key(Some("pk_test_x")).contains("does not start"));
    }

    #[test]
    fn cutoff_never_moves_forward() {
        let now = Utc::now();
        assert_eq!(stale_cutoff(now, 2), now - Duration::hours(2));
        assert_eq!(stale_cutoff(now, -5), now);
    }
}
