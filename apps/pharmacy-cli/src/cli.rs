//! # Command-Line Definition
//!
//! Every subcommand maps onto one main-menu action; the permission flag
//! behind that action is checked after login.
//!
//! ```text
//! pharmacy [--db PATH] [--user NAME --password PW] [--json] <COMMAND>
//!
//!   init-admin                         first account, every permission
//!   menu                               main menu with enabled entries
//!   products   list|show|add|edit
//!   stock      receive|alerts
//!   drugs      add|show|add-batch|quality|expiring
//!   categories list|show|add|rename
//!   companies  list|show|add|rename
//!   clients    list|add|edit|personal
//!   users      list|show|add|edit|grant|revoke
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pharmacy")]
#[command(about = "Pharmacy back-office: stock, catalogue, clients and staff accounts")]
#[command(version)]
pub struct Cli {
    /// Database file (defaults to PHARMACY_DB_PATH, then the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Username to log in with
    #[arg(long, short, global = true, env = "PHARMACY_USER")]
    pub user: Option<String>,

    /// Password to log in with
    #[arg(long, short, global = true, env = "PHARMACY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the first administrator (only while no accounts exist)
    InitAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
        /// Password for the new account (falls back to --password)
        #[arg(long = "new-password")]
        new_password: Option<String>,
    },

    /// Log in and show the main menu
    Menu,

    /// Products and their stock levels
    #[command(subcommand)]
    Products(ProductCommand),

    /// Stock receipts and low-stock notifications
    #[command(subcommand)]
    Stock(StockCommand),

    /// Drugs, quality control and batches
    #[command(subcommand)]
    Drugs(DrugCommand),

    /// Product categories
    #[command(subcommand)]
    Categories(CatalogueCommand),

    /// Manufacturers and suppliers
    #[command(subcommand)]
    Companies(CatalogueCommand),

    /// Clients and your personal client list
    #[command(subcommand)]
    Clients(ClientCommand),

    /// Staff accounts and permissions
    #[command(subcommand)]
    Users(UserCommand),
}

// =============================================================================
// Products / Stock / Drugs
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// List products, optionally filtered
    List {
        /// Case-insensitive part of the product name
        #[arg(long)]
        search: Option<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Company name
        #[arg(long)]
        company: Option<String>,
    },
    /// Show one product (e.g. P000012)
    Show { code: String },
    /// Add a product
    Add(NewProductArgs),
    /// Overwrite fields of a product
    Edit {
        code: String,
        #[command(flatten)]
        changes: ProductChanges,
    },
}

#[derive(Debug, Args)]
pub struct NewProductArgs {
    #[arg(long)]
    pub name: String,
    /// Purchase cost, e.g. 2.50
    #[arg(long)]
    pub cost: String,
    /// Selling price, e.g. 4.20
    #[arg(long)]
    pub price: String,
    /// Units on hand
    #[arg(long, default_value_t = 0)]
    pub quantity: i64,
    /// Notify at or below this many units
    #[arg(long, default_value_t = 0)]
    pub limit: i64,
    /// Company code (e.g. S0001)
    #[arg(long)]
    pub company: Option<String>,
    /// Category code (e.g. C0003)
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct ProductChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub cost: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub quantity: Option<i64>,
    #[arg(long)]
    pub limit: Option<i64>,
    /// Company code, or "none" to clear
    #[arg(long)]
    pub company: Option<String>,
    /// Category code, or "none" to clear
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// Record a receipt: add units to a product
    Receive { code: String, quantity: i64 },
    /// Products at or below their quantity limit
    Alerts,
}

#[derive(Debug, Subcommand)]
pub enum DrugCommand {
    /// Add a drug
    Add {
        #[command(flatten)]
        product: NewProductArgs,
        /// Mark as having passed quality control
        #[arg(long)]
        quality: bool,
    },
    /// Show a drug with its batches
    Show { code: String },
    /// Receive a batch; its quantity is added to stock
    AddBatch {
        code: String,
        #[arg(long)]
        batch: String,
        #[arg(long)]
        quantity: i64,
        /// Expiration date (YYYY-MM-DD)
        #[arg(long)]
        expires: NaiveDate,
    },
    /// Record the quality-control outcome
    Quality {
        code: String,
        /// Mark as failed instead of passed
        #[arg(long)]
        failed: bool,
    },
    /// Batches expiring before a date (default: the configured warning window)
    Expiring {
        #[arg(long)]
        before: Option<NaiveDate>,
    },
}

// =============================================================================
// Catalogue
// =============================================================================

/// Shared by `categories` and `companies`.
#[derive(Debug, Subcommand)]
pub enum CatalogueCommand {
    /// List all entries
    List,
    /// Show one entry
    Show { code: String },
    /// Add an entry under the next free code
    Add { name: String },
    /// Rename an entry
    Rename { code: String, name: String },
}

// =============================================================================
// Clients / Users
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// List clients
    List {
        /// Case-insensitive part of the client's name
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a client
    Add {
        #[arg(long)]
        fullname: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Overwrite fields of a client
    Edit {
        id: i64,
        #[arg(long)]
        fullname: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Your personal client list
    #[command(subcommand)]
    Personal(PersonalCommand),
}

#[derive(Debug, Subcommand)]
pub enum PersonalCommand {
    List,
    Add { id: i64 },
    Remove { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List accounts
    List,
    /// Show an account with its permissions
    Show { username: String },
    /// Create an account
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
        #[arg(long = "new-password")]
        new_password: String,
        /// Permission to grant (repeatable), e.g. view-stock
        #[arg(long = "grant")]
        grants: Vec<String>,
        /// Grant every permission
        #[arg(long, conflicts_with = "grants")]
        all: bool,
    },
    /// Overwrite account fields
    Edit {
        username: String,
        #[arg(long)]
        new_username: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long = "new-password")]
        new_password: Option<String>,
        /// Replace every flag: one 0/1 per permission in menu order
        #[arg(long)]
        flags: Option<String>,
    },
    /// Grant permissions
    Grant {
        username: String,
        #[arg(required = true)]
        permissions: Vec<String>,
    },
    /// Revoke permissions
    Revoke {
        username: String,
        #[arg(required = true)]
        permissions: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stock_receive() {
        let cli = Cli::try_parse_from([
            "pharmacy", "--user", "maria", "--password", "pw", "stock", "receive", "P000012", "24",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("maria"));
        match cli.command {
            Command::Stock(StockCommand::Receive { code, quantity }) => {
                assert_eq!(code, "P000012");
                assert_eq!(quantity, 24);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_batch_date() {
        let cli = Cli::try_parse_from([
            "pharmacy", "drugs", "add-batch", "P000001", "--batch", "B1", "--quantity", "5",
            "--expires", "2027-03-01",
        ])
        .unwrap();
        match cli.command {
            Command::Drugs(DrugCommand::AddBatch { expires, .. }) => {
                assert_eq!(expires, NaiveDate::from_ymd_opt(2027, 3, 1).unwrap());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from([
            "pharmacy", "drugs", "add-batch", "P000001", "--batch", "B1", "--quantity", "5",
            "--expires", "next week",
        ])
        .is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pharmacy", "menu", "--json", "--db", "x.db"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
    }
}
