//! # Khata Command-Line Application
//!
//! Entry point for the Khata stock-and-salesman ledger.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            khata (CLI)                                  │
//! │                                                                         │
//! │  main.rs ────► parses one subcommand, sets up logging and paths        │
//! │                                                                         │
//! │  config.rs ──► resolves db path + report dir (flags/env/data dir)      │
//! │                                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  khata-engine: ReconciliationEngine                              │  │
//! │  │  add_product / record_issue / record_return / snapshot / ...     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file: khata.db (WAL mode, migrations on connect)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One process invocation = one user command = one visible state
//! transition; there is never a second command in flight.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use khata_core::Money;
use khata_db::{Database, DbConfig};
use khata_engine::{PlainTextRenderer, ReconciliationEngine, ReportWriter};

// =============================================================================
// Argument Parsing
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "khata")]
#[command(about = "Stock and salesman ledger with per-salesman reports")]
#[command(version)]
struct Cli {
    /// Path to the SQLite database (defaults to the platform data dir)
    #[arg(long, env = "KHATA_DB_PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Base directory for generated reports
    #[arg(long, env = "KHATA_REPORT_DIR", global = true)]
    report_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stock a product, merging into a line with the same name, price and
    /// category
    AddProduct {
        name: String,
        quantity: i64,
        /// Unit price in rupees, e.g. "20.50"
        price: String,
        #[arg(long)]
        category: Option<String>,
    },

    /// Overwrite a product's quantity and unit price
    EditProduct {
        id: String,
        quantity: i64,
        /// New unit price in rupees
        price: String,
    },

    /// Delete a product line (ledger rows naming it are kept)
    DeleteProduct { id: String },

    /// Register a salesman (creates a zeroed ledger row per product)
    AddSalesman { name: String },

    /// Delete a salesman and all their ledger rows
    DeleteSalesman { name: String },

    /// Issue stock to a salesman
    Issue {
        salesman: String,
        product: String,
        quantity: i64,
    },

    /// Record a return: QUANTITY is the new running total of returned
    /// units, and must stay below the issued quantity
    Return {
        salesman: String,
        product: String,
        quantity: i64,
    },

    /// Record a salesman-level expense in rupees
    Expense { salesman: String, amount: String },

    /// Write a report for one salesman, or for everyone when omitted
    Report { salesman: Option<String> },

    /// Zero all ledger records (run after reports have been taken)
    Clear {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },

    /// List the inventory
    Inventory,

    /// List salesmen
    Salesmen,

    /// Show a salesman's ledger
    Ledger { salesman: String },
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = AppConfig::resolve(cli.db_path, cli.report_dir)?;
    info!(db = %config.db_path.display(), "Opening database");

    let db = Database::new(DbConfig::new(&config.db_path)).await?;
    let engine = ReconciliationEngine::new(db);

    let result = run_command(&engine, &config, cli.command).await;

    engine.database().close().await;

    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: warnings only, so command output stays clean
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Command Dispatch
// =============================================================================

async fn run_command(
    engine: &ReconciliationEngine,
    config: &AppConfig,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::AddProduct {
            name,
            quantity,
            price,
            category,
        } => {
            let price = parse_rupees(&price)?;
            let product = engine
                .add_product(&name, quantity, price, category.as_deref())
                .await?;
            println!(
                "Stocked {}: {} units at {} ({} total)",
                product.name,
                product.quantity,
                product.unit_price(),
                product.total_value()
            );
        }

        Command::EditProduct {
            id,
            quantity,
            price,
        } => {
            let price = parse_rupees(&price)?;
            let product = engine.edit_product(&id, quantity, price).await?;
            println!(
                "Updated {}: {} units at {} ({} total)",
                product.name,
                product.quantity,
                product.unit_price(),
                product.total_value()
            );
        }

        Command::DeleteProduct { id } => {
            let product = engine.delete_product(&id).await?;
            println!("Deleted {}", product.name);
        }

        Command::AddSalesman { name } => {
            let rows = engine.add_salesman(&name).await?;
            println!("Added salesman {} ({} ledger rows)", name.trim(), rows);
        }

        Command::DeleteSalesman { name } => {
            let rows = engine.delete_salesman(&name).await?;
            println!("Deleted salesman {} ({} ledger rows)", name.trim(), rows);
        }

        Command::Issue {
            salesman,
            product,
            quantity,
        } => {
            let entry = engine.record_issue(&salesman, &product, quantity).await?;
            println!(
                "Issued {} x {} to {} (total issued {}, payment {})",
                quantity,
                entry.product_name,
                entry.salesman_name,
                entry.issued_quantity,
                entry.payment()
            );
        }

        Command::Return {
            salesman,
            product,
            quantity,
        } => {
            let entry = engine.record_return(&salesman, &product, quantity).await?;
            println!(
                "Recorded return of {} for {} (sales {}, payment {})",
                entry.returned_quantity,
                entry.product_name,
                entry.sales_quantity(),
                entry.payment()
            );
        }

        Command::Expense { salesman, amount } => {
            let amount = parse_rupees(&amount)?;
            engine.record_expense(&salesman, amount).await?;
            println!("Recorded expense {} for {}", amount, salesman.trim());
        }

        Command::Report { salesman } => {
            let writer = ReportWriter::new(&config.report_dir);
            let renderer = PlainTextRenderer;

            let salesmen = match salesman {
                Some(name) => vec![name],
                None => engine.list_salesmen().await?,
            };

            if salesmen.is_empty() {
                println!("No salesmen to report on");
                return Ok(());
            }

            for name in salesmen {
                let snapshot = engine.salesman_snapshot(&name).await?;
                let path = writer.write(&renderer, &snapshot)?;
                println!("Report for {} written to {}", snapshot.salesman_name, path.display());
            }
        }

        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear all ledger records without --yes");
            }
            let rows = engine.clear_records().await?;
            println!("Cleared {} ledger rows (rows kept, values zeroed)", rows);
        }

        Command::Inventory => {
            let products = engine.list_inventory().await?;
            if products.is_empty() {
                println!("Inventory is empty");
                return Ok(());
            }

            println!(
                "{:<36} {:<24} {:>8} {:>12} {:>14} {:<12}",
                "ID", "Name", "Qty", "Rate", "Total", "Category"
            );
            for p in products {
                println!(
                    "{:<36} {:<24} {:>8} {:>12} {:>14} {:<12}",
                    p.id,
                    p.name,
                    p.quantity,
                    p.unit_price().to_string(),
                    p.total_value().to_string(),
                    p.category.as_deref().unwrap_or("-")
                );
            }
        }

        Command::Salesmen => {
            let salesmen = engine.list_salesmen().await?;
            if salesmen.is_empty() {
                println!("No salesmen yet");
                return Ok(());
            }
            for name in salesmen {
                println!("{}", name);
            }
        }

        Command::Ledger { salesman } => {
            let entries = engine.entries_for(&salesman).await?;

            println!(
                "{:<24} {:>8} {:>10} {:>8} {:>14}",
                "Product", "Issued", "Returned", "Sales", "Payment"
            );
            for e in entries {
                println!(
                    "{:<24} {:>8} {:>10} {:>8} {:>14}",
                    e.product_name,
                    e.issued_quantity,
                    e.returned_quantity,
                    e.sales_quantity(),
                    e.payment().to_string()
                );
            }
        }
    }

    Ok(())
}

// =============================================================================
// Price Parsing
// =============================================================================

/// Parses a rupee amount like "20", "20.5" or "20.50" into Money.
///
/// Floats never touch the value: the rupee and paisa parts are parsed as
/// integers directly.
fn parse_rupees(input: &str) -> anyhow::Result<Money> {
    let input = input.trim();

    if input.is_empty() {
        bail!("amount is required");
    }
    if input.starts_with('-') {
        bail!("amount must not be negative: {input}");
    }

    let mut parts = input.splitn(2, '.');

    let rupees: i64 = parts
        .next()
        .unwrap_or_default()
        .parse()
        .with_context(|| format!("invalid rupee amount: {input}"))?;

    let paisa: i64 = match parts.next() {
        None => 0,
        Some(frac) if frac.len() == 1 => {
            let d: i64 = frac
                .parse()
                .with_context(|| format!("invalid paisa amount: {input}"))?;
            d * 10
        }
        Some(frac) if frac.len() == 2 => frac
            .parse()
            .with_context(|| format!("invalid paisa amount: {input}"))?,
        Some(_) => bail!("amount has more than two decimal places: {input}"),
    };

    Ok(Money::from_rupees_paisa(rupees, paisa))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rupees_whole() {
        assert_eq!(parse_rupees("20").unwrap().paisa(), 2000);
        assert_eq!(parse_rupees(" 7 ").unwrap().paisa(), 700);
        assert_eq!(parse_rupees("0").unwrap().paisa(), 0);
    }

    #[test]
    fn test_parse_rupees_fractional() {
        assert_eq!(parse_rupees("20.50").unwrap().paisa(), 2050);
        assert_eq!(parse_rupees("20.5").unwrap().paisa(), 2050);
        assert_eq!(parse_rupees("0.05").unwrap().paisa(), 5);
    }

    #[test]
    fn test_parse_rupees_rejects_bad_input() {
        assert!(parse_rupees("").is_err());
        assert!(parse_rupees("-5").is_err());
        assert!(parse_rupees("20.505").is_err());
        assert!(parse_rupees("abc").is_err());
        assert!(parse_rupees("20.x").is_err());
    }

    #[test]
    fn test_cli_parses_issue_command() {
        let cli = Cli::parse_from(["khata", "issue", "Asha", "rice", "10"]);
        match cli.command {
            Command::Issue {
                salesman,
                product,
                quantity,
            } => {
                assert_eq!(salesman, "Asha");
                assert_eq!(product, "rice");
                assert_eq!(quantity, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_return_with_running_total() {
        let cli = Cli::parse_from(["khata", "return", "Asha", "rice", "4"]);
        assert!(matches!(cli.command, Command::Return { quantity: 4, .. }));
    }
}
