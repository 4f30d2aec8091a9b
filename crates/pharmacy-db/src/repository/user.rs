//! # User Repository
//!
//! Database operations for staff accounts and their permission flags.
//!
//! ## Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  users                               user_permissions                   │
//! │  ┌──────────────────────────────┐    ┌──────────────────────────────┐   │
//! │  │ id  username  password_hash  │◄───┤ user_id                      │   │
//! │  │     full_name                │ 1:1│ view_stock, edit_stock, ...  │   │
//! │  └──────────────────────────────┘    │ (12 flag columns)            │   │
//! │                                      └──────────────────────────────┘   │
//! │                                                                         │
//! │  Both rows are written in one transaction. Flags are normalized         │
//! │  before every write: a child flag without its parent is cleared.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::password::{hash_password, verify_password};
use pharmacy_core::{NewUser, Permission, User, UserPermissions};

const SELECT_USER: &str = r#"
    SELECT
        u.id,
        u.username,
        u.password_hash,
        u.full_name,
        COALESCE(p.view_stock, 0)          AS view_stock,
        COALESCE(p.edit_stock, 0)          AS edit_stock,
        COALESCE(p.add_products, 0)        AS add_products,
        COALESCE(p.view_notifications, 0)  AS view_notifications,
        COALESCE(p.create_client_list, 0)  AS create_client_list,
        COALESCE(p.view_orders, 0)         AS view_orders,
        COALESCE(p.add_orders, 0)          AS add_orders,
        COALESCE(p.change_order_state, 0)  AS change_order_state,
        COALESCE(p.view_bills, 0)          AS view_bills,
        COALESCE(p.invoice, 0)             AS invoice,
        COALESCE(p.view_salaries, 0)       AS view_salaries,
        COALESCE(p.user_administration, 0) AS user_administration
    FROM users u
    LEFT JOIN user_permissions p ON p.user_id = u.id
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users (username, password_hash, full_name)
    VALUES (?1, ?2, ?3)
    RETURNING id
"#;

const INSERT_FIRST_USER: &str = r#"
    INSERT INTO users (username, password_hash, full_name)
    SELECT ?1, ?2, ?3
    WHERE NOT EXISTS (SELECT 1 FROM users)
    RETURNING id
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    full_name: String,
    #[sqlx(flatten)]
    permissions: UserPermissions,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            permissions: row.permissions,
        }
    }
}

/// Repository for user database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = UserRepository::new(pool);
///
/// match repo.authenticate("maria", "s3cret").await? {
///     Some(user) => Session::new(user),
///     None => return Err(CoreError::InvalidCredentials.into()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists every user, ordered by id.
    pub async fn get_all(&self) -> DbResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY u.id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Gets a user by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Gets a user by username (exact match).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.username = ?1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Creates a user: hashes the password, then writes the account row and
    /// its permission row in one transaction.
    ///
    /// ## Returns
    /// * `Ok(User)` - The stored user with its assigned id
    /// * `Err(DbError::UniqueViolation)` - Username already taken
    pub async fn insert(&self, new_user: &NewUser) -> DbResult<User> {
        debug!(username = %new_user.username, "Inserting user");

        self.create(new_user, INSERT_USER)
            .await?
            .ok_or_else(|| DbError::Internal("INSERT returned no id".to_string()))
    }

    /// Creates the first account of an empty database.
    ///
    /// The emptiness check is part of the INSERT statement itself, so two
    /// concurrent bootstraps cannot both succeed.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - The table was empty and the user was stored
    /// * `Ok(None)` - An account already exists; nothing was written
    pub async fn insert_first(&self, new_user: &NewUser) -> DbResult<Option<User>> {
        debug!(username = %new_user.username, "Inserting first user");

        self.create(new_user, INSERT_FIRST_USER).await
    }

    async fn create(&self, new_user: &NewUser, insert_sql: &str) -> DbResult<Option<User>> {
        let password_hash = hash_password(&new_user.password)?;
        let permissions = new_user.permissions.normalized();

        let mut tx = self.pool.begin().await?;

        let id: Option<i64> = sqlx::query_scalar(insert_sql)
            .bind(&new_user.username)
            .bind(&password_hash)
            .bind(&new_user.full_name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value(new_user.username.clone()))?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("INSERT INTO user_permissions (user_id) VALUES (?1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        write_permissions(&mut *tx, id, &permissions).await?;

        tx.commit().await?;

        info!(id, username = %new_user.username, "User created");

        Ok(Some(User {
            id,
            username: new_user.username.clone(),
            password_hash,
            full_name: new_user.full_name.clone(),
            permissions,
        }))
    }

    /// Overwrites username, full name and permissions. The password is
    /// replaced only when `new_password` is given.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No user with this id
    /// * `Err(DbError::UniqueViolation)` - New username already taken
    pub async fn update(&self, user: &User, new_password: Option<&str>) -> DbResult<()> {
        debug!(
            id = user.id,
            username = %user.username,
            password_changed = new_password.is_some(),
            "Updating user"
        );

        let password_hash = new_password.map(hash_password).transpose()?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = ?2,
                full_name = ?3,
                password_hash = COALESCE(?4, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(user.username.clone()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user.id));
        }

        write_permissions(&mut *tx, user.id, &user.permissions.normalized()).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Replaces every permission flag of a user.
    ///
    /// ## Returns
    /// The flags as stored (normalized).
    pub async fn set_permissions(
        &self,
        id: i64,
        permissions: &UserPermissions,
    ) -> DbResult<UserPermissions> {
        let normalized = permissions.normalized();
        debug!(id, granted = ?normalized.granted(), "Setting user permissions");

        let result = write_permissions(&self.pool, id, &normalized).await?;
        if result == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(normalized)
    }

    /// Toggles individual flags, leaving the others as they are.
    ///
    /// Revoking a parent also clears its children; granting a child whose
    /// parent is absent has no effect.
    ///
    /// ## Returns
    /// The flags as stored after the change.
    pub async fn update_permissions(
        &self,
        id: i64,
        changes: &[(Permission, bool)],
    ) -> DbResult<UserPermissions> {
        debug!(id, changes = ?changes, "Updating user permissions");

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, UserPermissions>(
            r#"
            SELECT
                view_stock, edit_stock, add_products, view_notifications,
                create_client_list, view_orders, add_orders, change_order_state,
                view_bills, invoice, view_salaries, user_administration
            FROM user_permissions
            WHERE user_id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut permissions = current.ok_or_else(|| DbError::not_found("User", id))?;
        for (permission, granted) in changes {
            permissions.set(*permission, *granted);
        }
        let permissions = permissions.normalized();

        write_permissions(&mut *tx, id, &permissions).await?;
        tx.commit().await?;

        Ok(permissions)
    }

    /// Checks a username/password pair.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - Credentials match
    /// * `Ok(None)` - Unknown username or wrong password
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            debug!(username, "Login rejected: unknown user");
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash) {
            debug!(username, "Login rejected: wrong password");
            return Ok(None);
        }

        info!(id = user.id, username, "User logged in");
        Ok(Some(user))
    }

    /// Counts user accounts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Writes all twelve flags of an existing permission row. Returns the number
/// of rows touched (0 when the user has none).
async fn write_permissions<'e, E>(
    executor: E,
    user_id: i64,
    permissions: &UserPermissions,
) -> DbResult<u64>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE user_permissions SET
            view_stock = ?2,
            edit_stock = ?3,
            add_products = ?4,
            view_notifications = ?5,
            create_client_list = ?6,
            view_orders = ?7,
            add_orders = ?8,
            change_order_state = ?9,
            view_bills = ?10,
            invoice = ?11,
            view_salaries = ?12,
            user_administration = ?13
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .bind(permissions.view_stock)
    .bind(permissions.edit_stock)
    .bind(permissions.add_products)
    .bind(permissions.view_notifications)
    .bind(permissions.create_client_list)
    .bind(permissions.view_orders)
    .bind(permissions.add_orders)
    .bind(permissions.change_order_state)
    .bind(permissions.view_bills)
    .bind(permissions.invoice)
    .bind(permissions.view_salaries)
    .bind(permissions.user_administration)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use pharmacy_core::{NewUser, Permission, UserPermissions};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_user(username: &str, permissions: UserPermissions) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "s3cret".to_string(),
            full_name: format!("{username} Example"),
            permissions,
        }
    }

    #[tokio::test]
    async fn test_insert_hashes_password() {
        let db = db().await;
        let user = db
            .users()
            .insert(&new_user("maria", UserPermissions::all()))
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_ne!(user.password_hash, "s3cret");

        let loaded = db.users().get_by_username("maria").await.unwrap().unwrap();
        assert_eq!(loaded, user);
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_normalizes_permissions() {
        let db = db().await;
        let mut perms = UserPermissions::default();
        perms.edit_stock = true;
        perms.view_orders = true;
        perms.add_orders = true;

        let user = db.users().insert(&new_user("joe", perms)).await.unwrap();
        assert!(!user.permissions.edit_stock);
        assert!(user.permissions.add_orders);

        let loaded = db.users().get(user.id).await.unwrap().unwrap();
        assert_eq!(loaded.permissions, user.permissions);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let db = db().await;
        db.users()
            .insert(&new_user("maria", UserPermissions::default()))
            .await
            .unwrap();

        let err = db
            .users()
            .insert(&new_user("maria", UserPermissions::default()))
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "maria"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_first_only_on_empty_table() {
        let db = db().await;
        let users = db.users();

        let admin = users
            .insert_first(&new_user("admin", UserPermissions::all()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.id, 1);
        assert_eq!(admin.permissions, UserPermissions::all());

        let second = users
            .insert_first(&new_user("intruder", UserPermissions::all()))
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(users.count().await.unwrap(), 1);
        assert!(users.get_by_username("intruder").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_first_inserts_create_one_account() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("users.db")))
            .await
            .unwrap();
        let (a, b) = (db.users(), db.users());

        let first = new_user("first", UserPermissions::all());
        let second = new_user("second", UserPermissions::all());
        let (a, b) = tokio::join!(a.insert_first(&first), b.insert_first(&second));

        let created = [a, b]
            .into_iter()
            .filter(|r| matches!(r, Ok(Some(_))))
            .count();
        assert_eq!(created, 1);
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = db().await;
        db.users()
            .insert(&new_user("maria", UserPermissions::default()))
            .await
            .unwrap();

        let users = db.users();
        assert!(users.authenticate("maria", "s3cret").await.unwrap().is_some());
        assert!(users.authenticate("maria", "wrong").await.unwrap().is_none());
        assert!(users.authenticate("nobody", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_password_unless_given() {
        let db = db().await;
        let users = db.users();
        let mut user = users
            .insert(&new_user("maria", UserPermissions::default()))
            .await
            .unwrap();

        user.full_name = "Maria Lopez".to_string();
        user.permissions.view_stock = true;
        users.update(&user, None).await.unwrap();

        let loaded = users.get(user.id).await.unwrap().unwrap();
        assert_eq!(loaded.full_name, "Maria Lopez");
        assert!(loaded.permissions.view_stock);
        assert!(users.authenticate("maria", "s3cret").await.unwrap().is_some());

        users.update(&loaded, Some("n3w-pass")).await.unwrap();
        assert!(users.authenticate("maria", "s3cret").await.unwrap().is_none());
        assert!(users.authenticate("maria", "n3w-pass").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = db().await;
        let user = db
            .users()
            .insert(&new_user("maria", UserPermissions::default()))
            .await
            .unwrap();

        let ghost = pharmacy_core::User { id: 99, ..user };
        let err = db.users().update(&ghost, None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_permissions_from_flags() {
        let db = db().await;
        let user = db
            .users()
            .insert(&new_user("maria", UserPermissions::default()))
            .await
            .unwrap();

        let flags = [true, true, false, true, false, false, false, false, true, true];
        let stored = db
            .users()
            .set_permissions(user.id, &UserPermissions::from_flags(&flags))
            .await
            .unwrap();
        assert!(stored.edit_stock);
        assert!(stored.invoice);
        assert!(!stored.user_administration);

        let err = db
            .users()
            .set_permissions(99, &UserPermissions::all())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_permissions_toggles_single_flags() {
        let db = db().await;
        let users = db.users();
        let user = users
            .insert(&new_user("maria", UserPermissions::default()))
            .await
            .unwrap();

        let perms = users
            .update_permissions(
                user.id,
                &[(Permission::ViewStock, true), (Permission::EditStock, true)],
            )
            .await
            .unwrap();
        assert_eq!(
            perms.granted(),
            vec![Permission::ViewStock, Permission::EditStock]
        );

        // Revoking the parent clears the child
        let perms = users
            .update_permissions(user.id, &[(Permission::ViewStock, false)])
            .await
            .unwrap();
        assert!(perms.granted().is_empty());

        let loaded = users.get(user.id).await.unwrap().unwrap();
        assert_eq!(loaded.permissions, perms);
    }

    #[tokio::test]
    async fn test_get_all_ordered_by_id() {
        let db = db().await;
        for name in ["maria", "joe", "ann"] {
            db.users()
                .insert(&new_user(name, UserPermissions::default()))
                .await
                .unwrap();
        }

        let names: Vec<_> = db
            .users()
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["maria", "joe", "ann"]);
    }
}
