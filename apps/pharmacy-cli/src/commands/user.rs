//! # User Commands
//!
//! Staff accounts and their permission flags. Everything here requires
//! `user_administration`.
//!
//! ## Flag Nesting
//! ```text
//! view_stock ──► edit_stock
//! view_orders ──► add_orders, change_order_state
//! view_bills ──► invoice
//! ```
//! A child is only stored while its parent is granted. Revoking a parent
//! clears its children in the same write.

use serde::Serialize;
use tracing::{info, warn};

use super::Context;
use crate::cli::UserCommand;
use crate::error::{CliError, CliResult};
use crate::output::{table, Output, Render};
use pharmacy_core::validation::{validate_name, validate_password, validate_username};
use pharmacy_core::{MenuAction, NewUser, Permission, Session, User, UserPermissions};

#[derive(Debug, Serialize)]
pub struct PermissionRow {
    pub permission: Permission,
    pub label: &'static str,
    pub granted: bool,
    /// Granted and not blocked by an absent parent.
    pub effective: bool,
}

/// An account with every flag spelled out.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub permissions: Vec<PermissionRow>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        let perms = &user.permissions;
        UserView {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            permissions: Permission::ALL
                .into_iter()
                .map(|p| PermissionRow {
                    permission: p,
                    label: p.label(),
                    granted: perms.get(p),
                    effective: perms.allows(p),
                })
                .collect(),
        }
    }
}

impl Render for UserView {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "{} ({}), id {}",
            self.full_name, self.username, self.id
        )];
        for row in &self.permissions {
            let indent = if row.permission.parent().is_some() { "    " } else { "  " };
            let mark = if row.effective { "x" } else { " " };
            lines.push(format!("{indent}[{mark}] {}", row.label));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub granted: Vec<Permission>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct UserList(pub Vec<UserSummary>);

impl Render for UserList {
    fn render(&self) -> String {
        let rows: Vec<_> = self
            .0
            .iter()
            .map(|u| {
                vec![
                    u.id.to_string(),
                    u.username.clone(),
                    u.full_name.clone(),
                    u.granted.len().to_string(),
                ]
            })
            .collect();
        table(&["Id", "Username", "Full name", "Permissions"], &rows)
    }
}

/// Fields to overwrite on `users edit`.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub new_username: Option<String>,
    pub full_name: Option<String>,
    pub new_password: Option<String>,
    /// One `0`/`1` per permission in menu order.
    pub flags: Option<String>,
}

pub async fn execute(ctx: &Context, cmd: UserCommand, out: &Output) -> CliResult<()> {
    match cmd {
        UserCommand::List => out.emit(&list(ctx).await?),
        UserCommand::Show { username } => out.emit(&show(ctx, &username).await?),
        UserCommand::Add {
            username,
            full_name,
            new_password,
            grants,
            all,
        } => {
            let permissions = if all {
                UserPermissions::all()
            } else {
                parse_grants(&grants)?
            };
            out.emit(&add(ctx, &username, &full_name, new_password, permissions).await?)
        }
        UserCommand::Edit {
            username,
            new_username,
            full_name,
            new_password,
            flags,
        } => {
            let changes = UserChanges {
                new_username,
                full_name,
                new_password,
                flags,
            };
            out.emit(&edit(ctx, &username, &changes).await?)
        }
        UserCommand::Grant {
            username,
            permissions,
        } => out.emit(&grant(ctx, &username, &permissions, true).await?),
        UserCommand::Revoke {
            username,
            permissions,
        } => out.emit(&grant(ctx, &username, &permissions, false).await?),
    }
}

pub async fn list(ctx: &Context) -> CliResult<UserList> {
    ctx.authorize(MenuAction::UserAdministration).await?;

    let users = ctx.db.users().get_all().await?;
    Ok(UserList(
        users
            .into_iter()
            .map(|u| UserSummary {
                granted: u.permissions.granted(),
                id: u.id,
                username: u.username,
                full_name: u.full_name,
            })
            .collect(),
    ))
}

pub async fn show(ctx: &Context, username: &str) -> CliResult<UserView> {
    ctx.authorize(MenuAction::UserAdministration).await?;
    Ok(UserView::from(&load(ctx, username).await?))
}

pub async fn add(
    ctx: &Context,
    username: &str,
    full_name: &str,
    password: String,
    permissions: UserPermissions,
) -> CliResult<UserView> {
    let session = ctx.authorize(MenuAction::UserAdministration).await?;

    validate_username(username)?;
    validate_password(&password)?;
    validate_name("full name", full_name)?;

    let user = ctx
        .db
        .users()
        .insert(&NewUser {
            username: username.to_string(),
            password,
            full_name: full_name.trim().to_string(),
            permissions,
        })
        .await?;

    info!(
        id = user.id,
        username = %user.username,
        by = %session.user().username,
        "Account added by administrator"
    );
    Ok(UserView::from(&user))
}

/// Overwrites the given fields. `flags` replaces every permission at once.
pub async fn edit(ctx: &Context, username: &str, changes: &UserChanges) -> CliResult<UserView> {
    let session = ctx.authorize(MenuAction::UserAdministration).await?;

    let mut user = load(ctx, username).await?;
    if let Some(new_username) = &changes.new_username {
        validate_username(new_username)?;
        user.username = new_username.clone();
    }
    if let Some(full_name) = &changes.full_name {
        validate_name("full name", full_name)?;
        user.full_name = full_name.trim().to_string();
    }
    if let Some(password) = &changes.new_password {
        validate_password(password)?;
    }
    if let Some(flags) = &changes.flags {
        let permissions = parse_flags(flags)?;
        guard_own_administration(&session, &user, &permissions)?;
        user.permissions = permissions;
    }

    ctx.db
        .users()
        .update(&user, changes.new_password.as_deref())
        .await?;

    let stored = ctx
        .db
        .users()
        .get(user.id)
        .await?
        .ok_or_else(|| CliError::not_found("User", &user.username))?;
    Ok(UserView::from(&stored))
}

/// Grants (or revokes) the named permissions and leaves the rest alone.
pub async fn grant(
    ctx: &Context,
    username: &str,
    names: &[String],
    granted: bool,
) -> CliResult<UserView> {
    let session = ctx.authorize(MenuAction::UserAdministration).await?;

    let mut user = load(ctx, username).await?;
    let changes = names
        .iter()
        .map(|n| n.parse::<Permission>().map(|p| (p, granted)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut preview = user.permissions;
    for (p, g) in &changes {
        preview.set(*p, *g);
    }
    guard_own_administration(&session, &user, &preview.normalized())?;

    user.permissions = ctx
        .db
        .users()
        .update_permissions(user.id, &changes)
        .await?;

    info!(
        username = %user.username,
        changes = ?changes,
        by = %session.user().username,
        "Permissions changed"
    );
    Ok(UserView::from(&user))
}

// =============================================================================
// Helpers
// =============================================================================

async fn load(ctx: &Context, username: &str) -> CliResult<User> {
    ctx.db
        .users()
        .get_by_username(username)
        .await?
        .ok_or_else(|| CliError::not_found("User", username))
}

/// Administrators cannot lock themselves out.
fn guard_own_administration(
    session: &Session,
    target: &User,
    permissions: &UserPermissions,
) -> CliResult<()> {
    if session.user().id == target.id && !permissions.get(Permission::UserAdministration) {
        warn!(username = %target.username, "Refused to revoke own user administration");
        return Err(CliError::validation(
            "You cannot revoke your own user administration permission",
        ));
    }
    Ok(())
}

fn parse_grants(names: &[String]) -> CliResult<UserPermissions> {
    let mut permissions = UserPermissions::default();
    for name in names {
        permissions.set(name.parse()?, true);
    }
    Ok(permissions)
}

/// Parses `1,1,0,...` (any separators) into a full set of flags.
pub(crate) fn parse_flags(input: &str) -> CliResult<UserPermissions> {
    let mut flags = Vec::with_capacity(Permission::ALL.len());
    for c in input.chars() {
        match c {
            '0' => flags.push(false),
            '1' => flags.push(true),
            c if c.is_whitespace() || c == ',' || c == ';' => {}
            other => {
                return Err(CliError::validation(format!(
                    "flags: unexpected character '{other}', use 0 or 1"
                )))
            }
        }
    }

    if flags.len() != Permission::ALL.len() {
        return Err(CliError::validation(format!(
            "flags: expected {} values, got {}",
            Permission::ALL.len(),
            flags.len()
        )));
    }

    Ok(UserPermissions::from_flags(&flags))
}
