//! # Session Commands
//!
//! Bootstrapping the first account and the main menu.

use serde::Serialize;
use tracing::info;

use super::Context;
use crate::error::{CliError, CliResult};
use crate::output::Render;
use pharmacy_core::validation::{validate_name, validate_password, validate_username};
use pharmacy_core::{MenuAction, NewUser, UserPermissions};

/// Result of `init-admin`.
#[derive(Debug, Serialize)]
pub struct AdminCreated {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl Render for AdminCreated {
    fn render(&self) -> String {
        format!(
            "Created administrator '{}' ({}) with every permission",
            self.username, self.full_name
        )
    }
}

/// Creates the first account with every permission. Refused once any
/// account exists; further accounts go through `users add`.
pub async fn init_admin(
    ctx: &Context,
    username: &str,
    full_name: &str,
    new_password: Option<String>,
) -> CliResult<AdminCreated> {
    let password = new_password
        .or_else(|| ctx.credentials().map(|c| c.password.clone()))
        .ok_or_else(|| CliError::validation("password is required (--new-password)"))?;

    validate_username(username)?;
    validate_password(&password)?;
    validate_name("full name", full_name)?;

    let user = ctx
        .db
        .users()
        .insert_first(&NewUser {
            username: username.to_string(),
            password,
            full_name: full_name.trim().to_string(),
            permissions: UserPermissions::all(),
        })
        .await?
        .ok_or_else(|| {
            CliError::conflict("Accounts already exist; ask an administrator to run `users add`")
        })?;

    info!(id = user.id, username = %user.username, "Administrator created");

    Ok(AdminCreated {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
    })
}

#[derive(Debug, Serialize)]
pub struct MenuEntry {
    pub section: &'static str,
    pub action: MenuAction,
    pub label: &'static str,
    pub enabled: bool,
}

/// The main menu as seen by the logged-in user.
#[derive(Debug, Serialize)]
pub struct MenuView {
    pub username: String,
    pub full_name: String,
    pub entries: Vec<MenuEntry>,
}

impl MenuView {
    pub fn enabled(&self) -> impl Iterator<Item = &MenuEntry> {
        self.entries.iter().filter(|e| e.enabled)
    }
}

impl Render for MenuView {
    fn render(&self) -> String {
        let mut lines = vec![format!("Logged in as {} ({})", self.full_name, self.username)];
        let mut section = "";
        for entry in &self.entries {
            if entry.section != section {
                section = entry.section;
                lines.push(String::new());
                lines.push(section.to_string());
            }
            let mark = if entry.enabled { "x" } else { " " };
            lines.push(format!("  [{}] {}", mark, entry.label));
        }
        lines.join("\n")
    }
}

/// Logs in and lists every menu entry with its enabled state.
pub async fn menu(ctx: &Context) -> CliResult<MenuView> {
    let session = ctx.login().await?;

    let entries = session
        .menu()
        .into_iter()
        .map(|(action, enabled)| MenuEntry {
            section: action.section(),
            action,
            label: action.label(),
            enabled,
        })
        .collect();

    Ok(MenuView {
        username: session.user().username.clone(),
        full_name: session.user().full_name.clone(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::AppConfig;
    use crate::error::ErrorCode;
    use pharmacy_core::Permission;

    #[tokio::test]
    async fn test_init_admin_only_once() {
        let db = database().await;
        let ctx = Context::new(db.clone(), AppConfig::default(), None);

        let created = init_admin(&ctx, "admin", "Administrator", Some("admin-pw".into()))
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let admin = db.users().get(1).await.unwrap().unwrap();
        assert_eq!(admin.permissions, UserPermissions::all());

        let err = init_admin(&ctx, "second", "Second", Some("admin-pw".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_init_admin_validates_input() {
        let db = database().await;
        let ctx = Context::new(db, AppConfig::default(), None);

        let err = init_admin(&ctx, "admin", "Administrator", Some("pw".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = init_admin(&ctx, "admin", "Administrator", None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_menu_reflects_permissions() {
        let db = database().await;
        let ctx = context_with(
            &db,
            "clerk",
            &[Permission::ViewStock, Permission::Invoice],
        )
        .await;

        let view = menu(&ctx).await.unwrap();
        assert_eq!(view.entries.len(), MenuAction::ALL.len());

        let enabled: Vec<_> = view.enabled().map(|e| e.action).collect();
        // Invoice without view_bills stays disabled
        assert_eq!(enabled, vec![MenuAction::ViewStock, MenuAction::ViewProducts]);

        let text = view.render();
        assert!(text.contains("Storage"));
        assert!(text.contains("  [x] View stock"));
        assert!(text.contains("  [ ] Add new receipt"));
    }
}
