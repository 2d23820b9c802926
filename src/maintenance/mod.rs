//! One-off maintenance jobs run through the `maintenance` binary.
//!
//! Jobs talk to the database through SeaORM directly and reuse the service
//! layer helpers where a business rule applies (wallet creation, payment
//! settlement). They run sequentially and stop at the first error.

use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;

use crate::db::{create_orm_conn, run_migrations};

pub mod payments;
pub mod seed;
pub mod swatches;
pub mod sync;

#[derive(Debug, Parser)]
#[command(name = "maintenance", about = "Hair storefront maintenance jobs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Insert demo users, catalog and reviews
    Seed(seed::SeedCommand),
    /// Suggest or apply swatch images for color variants
    MatchSwatches(swatches::MatchSwatchesArgs),
    /// Check Paystack configuration and pending payments
    PaymentDiagnostics(payments::DiagnosticsArgs),
    /// Copy catalog data and settings from one database to another
    Sync(sync::SyncArgs),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Seed(command) => seed::run(command).await,
            Commands::MatchSwatches(args) => swatches::run(args).await,
            Commands::PaymentDiagnostics(args) => payments::run(args).await,
            Commands::Sync(args) => sync::run(args).await,
        }
    }
}

/// Connect and make sure the schema is current before a job touches it.
pub(crate) async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let conn = create_orm_conn(database_url).await?;
    run_migrations(&conn).await?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "maintenance",
            "seed",
            "--database-url",
            "postgres://localhost/shop",
            "users",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Seed(_)));

        let cli = Cli::try_parse_from([
            "maintenance",
            "payment-diagnostics",
            "--database-url",
            "postgres://localhost/shop",
            "--stale-hours",
            "6",
            "--reverify",
        ])
        .unwrap();
        match cli.command {
            Commands::PaymentDiagnostics(args) => {
                assert_eq!(args.stale_hours, 6);
                assert!(args.reverify);
                assert!(args.reference.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sync_requires_both_urls() {
        assert!(
            Cli::try_parse_from(["maintenance", "sync", "--source", "postgres://a/db"]).is_err()
        );
        let cli = Cli::try_parse_from([
            "maintenance",
            "sync",
            "--source",
            "postgres://a/db",
            "--target",
            "postgres://b/db",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Sync(args) => {
                assert!(args.dry_run);
                assert!(!args.migrates_target());
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "maintenance",
            "sync",
            "--source",
            "postgres://a/db",
            "--target",
            "postgres://b/db",
        ])
        .unwrap();
        match cli.command {
            Commands::Sync(args) => assert!(args.migrates_target()),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
