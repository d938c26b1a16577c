use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{Actor, Role};
use crate::services::{FeeService, LedgerService};

/// Operator recorded on ledger entries created from the command line.
pub const CLI_ACTOR_EMAIL: &str = "cli@fundops.local";

#[derive(Parser)]
#[command(name = "fundops-core")]
#[command(
    about = "Fund administration back office: applications, investors, ledger and payments",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Print and validate the configuration
    Config,

    /// Management fee commands
    #[command(subcommand)]
    Fees(FeeCommands),

    /// Ledger commands
    #[command(subcommand)]
    Ledger(LedgerCommands),
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum FeeCommands {
    /// Charge the monthly management fee on every account not yet assessed
    Assess {
        /// Month to assess, as YYYY-MM
        #[arg(value_name = "MONTH")]
        month: String,
    },
}

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Replay the ledger and compare it with stored balances
    Verify {
        /// Account to verify; all accounts when omitted
        #[arg(value_name = "ACCOUNT_ID")]
        account_id: Option<Uuid>,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;
    println!("Database migrations completed");

    Ok(())
}

pub async fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Database Max Connections: {}", config.database_max_connections);
    println!(
        "  CORS Allowed Origins: {}",
        config
            .cors_allowed_origins
            .as_ref()
            .map(|origins| origins.join(", "))
            .unwrap_or_else(|| "*".to_string())
    );
    println!("  Log Format: {:?}", config.log_format);
    println!("  Log Request Body: {}", config.log_request_body);
    println!("  Management Fee Rate: {}%", config.management_fee_rate);

    let pool = crate::db::create_pool(config).await?;
    let report = crate::startup::validate_environment(config, &pool).await;
    report.print();

    if !report.is_valid() {
        anyhow::bail!("Configuration is invalid");
    }

    tracing::info!("Configuration is valid");
    Ok(())
}

pub async fn handle_fees_assess(config: &Config, month: &str) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;
    let service = FeeService::new(pool, config.management_fee_rate.clone());
    let actor = Actor::new(CLI_ACTOR_EMAIL, Role::BimAdmin);

    let fees = service.assess(&actor, month).await?;
    for fee in &fees {
        println!("{}  {}  {}", fee.account_id, fee.month, fee.fee_amount);
    }
    println!("Assessed {} account(s) for {}", fees.len(), month);

    Ok(())
}

pub async fn handle_ledger_verify(config: &Config, account_id: Option<Uuid>) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;
    let service = LedgerService::new(pool);
    let actor = Actor::new(CLI_ACTOR_EMAIL, Role::BimAdmin);

    let results = match account_id {
        Some(id) => vec![service.verify_account(&actor, id).await?],
        None => service.verify_all(&actor).await?,
    };

    let mut discrepancies = 0;
    for result in &results {
        let verdict = if result.reconciliation.consistent {
            "ok"
        } else {
            discrepancies += 1;
            "MISMATCH"
        };
        println!(
            "{}  {}  stored={}  replayed={}  entries={}",
            result.account_number,
            verdict,
            result.reconciliation.stored.current_balance,
            result.reconciliation.replayed.current_balance,
            result.reconciliation.entry_count
        );
    }

    if discrepancies > 0 {
        anyhow::bail!("{} account(s) do not match their ledger", discrepancies);
    }
    println!("Verified {} account(s)", results.len());
    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
