//! # Commands Module
//!
//! One module per menu section. Every command logs in, checks the flag
//! behind its menu action, then calls into the repositories and returns a
//! serializable result.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (Context, dispatch, shared parsing)
//! ├── session.rs    ◄─── init-admin, menu
//! ├── product.rs    ◄─── products list/show/add/edit
//! ├── stock.rs      ◄─── stock receive/alerts
//! ├── drug.rs       ◄─── drugs add/show/add-batch/quality/expiring
//! ├── catalogue.rs  ◄─── categories and companies
//! ├── client.rs     ◄─── clients and personal lists
//! └── user.rs       ◄─── staff accounts and permissions
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pharmacy --user maria --password ... stock receive P000012 24          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ctx.authorize(MenuAction::ReceiveStock)                                │
//! │    ├── users().authenticate(maria, ...) ──► Session                     │
//! │    └── session.require_action(..)        ──► edit_stock granted?        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  db.products().add_stock(12, 24) ──► ProductRow ──► table or JSON       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalogue;
pub mod client;
pub mod drug;
pub mod product;
pub mod session;
pub mod stock;
pub mod user;

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::error::{CliError, CliResult, ErrorCode};
use crate::output::Output;
use pharmacy_core::codes::{parse_code, CodeKind};
use pharmacy_core::{CoreError, MenuAction, Money, Session};
use pharmacy_db::Database;

/// Login details given on the command line or through the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Everything a command needs: the database, settings and who is asking.
#[derive(Debug, Clone)]
pub struct Context {
    pub db: Database,
    pub config: AppConfig,
    credentials: Option<Credentials>,
}

impl Context {
    pub fn new(db: Database, config: AppConfig, credentials: Option<Credentials>) -> Self {
        Context {
            db,
            config,
            credentials,
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Checks the credentials against the users table.
    pub async fn login(&self) -> CliResult<Session> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            CliError::new(
                ErrorCode::Unauthenticated,
                "Log in with --user and --password (or PHARMACY_USER / PHARMACY_PASSWORD)",
            )
        })?;

        match self
            .db
            .users()
            .authenticate(&creds.username, &creds.password)
            .await?
        {
            Some(user) => Ok(Session::new(user)),
            None => Err(CoreError::InvalidCredentials.into()),
        }
    }

    /// Logs in and checks the permission behind `action`.
    pub async fn authorize(&self, action: MenuAction) -> CliResult<Session> {
        let session = self.login().await?;
        session.require_action(action)?;
        debug!(user = %session.user().username, action = ?action, "Authorized");
        Ok(session)
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Runs one parsed command and prints its result.
pub async fn execute(ctx: &Context, command: Command, out: &Output) -> CliResult<()> {
    match command {
        Command::InitAdmin {
            username,
            full_name,
            new_password,
        } => out.emit(&session::init_admin(ctx, &username, &full_name, new_password).await?),
        Command::Menu => out.emit(&session::menu(ctx).await?),
        Command::Products(cmd) => product::execute(ctx, cmd, out).await,
        Command::Stock(cmd) => stock::execute(ctx, cmd, out).await,
        Command::Drugs(cmd) => drug::execute(ctx, cmd, out).await,
        Command::Categories(cmd) => catalogue::execute_categories(ctx, cmd, out).await,
        Command::Companies(cmd) => catalogue::execute_companies(ctx, cmd, out).await,
        Command::Clients(cmd) => client::execute(ctx, cmd, out).await,
        Command::Users(cmd) => user::execute(ctx, cmd, out).await,
    }
}

// =============================================================================
// Shared Parsing
// =============================================================================

/// Parses an operator-entered amount into cents, naming the field on error.
pub(crate) fn parse_money(field: &str, input: &str) -> CliResult<i64> {
    Money::parse(input)
        .map(|m| m.cents())
        .map_err(|e| CliError::validation(format!("{field}: {e}")))
}

pub(crate) fn parse(kind: CodeKind, input: &str) -> CliResult<i64> {
    Ok(parse_code(kind, input)?)
}

/// Optional reference given on the command line; `none` clears it.
pub(crate) fn parse_reference(kind: CodeKind, input: &str) -> CliResult<Option<i64>> {
    if input.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse(kind, input).map(Some)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use pharmacy_core::{NewUser, Permission, UserPermissions};

    pub const PASSWORD: &str = "s3cret";

    pub async fn database() -> Database {
        Database::new(pharmacy_db::DbConfig::in_memory())
            .await
            .unwrap()
    }

    /// Creates a user holding exactly `grants` and returns a context logged
    /// in as them.
    pub async fn context_with(db: &Database, username: &str, grants: &[Permission]) -> Context {
        let mut permissions = UserPermissions::default();
        for p in grants {
            permissions.set(*p, true);
        }
        db.users()
            .insert(&NewUser {
                username: username.to_string(),
                password: PASSWORD.to_string(),
                full_name: format!("{username} Example"),
                permissions,
            })
            .await
            .unwrap();
        as_user(db, username)
    }

    pub fn as_user(db: &Database, username: &str) -> Context {
        Context::new(
            db.clone(),
            AppConfig::default(),
            Some(Credentials {
                username: username.to_string(),
                password: PASSWORD.to_string(),
            }),
        )
    }

    pub async fn admin(db: &Database) -> Context {
        context_with(db, "admin", &Permission::ALL).await
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use pharmacy_core::Permission;

    #[test]
    fn test_parse_money_names_field() {
        assert_eq!(parse_money("price", "4,20").unwrap(), 420);
        let err = parse_money("price", "4.205").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.starts_with("price:"));
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse_reference(CodeKind::Company, "S0002").unwrap(), Some(2));
        assert_eq!(parse_reference(CodeKind::Company, "none").unwrap(), None);
        assert!(parse_reference(CodeKind::Company, "C0002").is_err());
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let db = database().await;
        let ctx = Context::new(db, AppConfig::default(), None);
        let err = ctx.login().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let db = database().await;
        context_with(&db, "maria", &[]).await;

        let ctx = Context::new(
            db,
            AppConfig::default(),
            Some(Credentials {
                username: "maria".to_string(),
                password: "nope".to_string(),
            }),
        );
        let err = ctx.login().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_authorize_checks_permission() {
        let db = database().await;
        let ctx = context_with(&db, "clerk", &[Permission::ViewStock]).await;

        assert!(ctx.authorize(MenuAction::ViewStock).await.is_ok());
        let err = ctx.authorize(MenuAction::ReceiveStock).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
