//! # Client Repository
//!
//! Database operations for clients and each user's personal client list.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharmacy_core::{Client, NewClient};

/// Repository for client database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ClientRepository::new(pool);
///
/// let client = repo.insert(&new_client).await?;
/// repo.add_personal(session.user().id, client.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists every client, ordered by id.
    pub async fn get_all(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, fullname, address, phone
            FROM clients
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Gets a client by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, fullname, address, phone
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Inserts a client; the id is assigned by the database.
    pub async fn insert(&self, client: &NewClient) -> DbResult<Client> {
        debug!(fullname = %client.fullname, "Inserting client");

        let created = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (fullname, address, phone)
            VALUES (?1, ?2, ?3)
            RETURNING id, fullname, address, phone
            "#,
        )
        .bind(&client.fullname)
        .bind(&client.address)
        .bind(&client.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Overwrites every field of an existing client.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No client with this id
    pub async fn update(&self, client: &Client) -> DbResult<()> {
        debug!(id = client.id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                fullname = ?2,
                address = ?3,
                phone = ?4
            WHERE id = ?1
            "#,
        )
        .bind(client.id)
        .bind(&client.fullname)
        .bind(&client.address)
        .bind(&client.phone)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", client.id));
        }

        Ok(())
    }

    // =========================================================================
    // Personal Client List
    // =========================================================================

    /// Adds a client to a user's personal list. Adding twice is a no-op.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown user or client
    pub async fn add_personal(&self, user_id: i64, client_id: i64) -> DbResult<()> {
        debug!(user_id, client_id, "Adding personal client");

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO personal_clients (user_id, client_id)
            VALUES (?1, ?2)
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a client from a user's personal list.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - The client was not on the list
    pub async fn remove_personal(&self, user_id: i64, client_id: i64) -> DbResult<()> {
        debug!(user_id, client_id, "Removing personal client");

        let result =
            sqlx::query("DELETE FROM personal_clients WHERE user_id = ?1 AND client_id = ?2")
                .bind(user_id)
                .bind(client_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Personal client", client_id));
        }

        Ok(())
    }

    /// A user's personal clients, ordered by id.
    pub async fn get_personal(&self, user_id: i64) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT c.id, c.fullname, c.address, c.phone
            FROM personal_clients pc
            JOIN clients c ON c.id = pc.client_id
            WHERE pc.user_id = ?1
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use pharmacy_core::{Client, NewClient, NewUser, UserPermissions};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_client(name: &str) -> NewClient {
        NewClient {
            fullname: name.to_string(),
            address: "12 High Street".to_string(),
            phone: "+34 600 000 000".to_string(),
        }
    }

    async fn user(db: &Database, username: &str) -> i64 {
        db.users()
            .insert(&NewUser {
                username: username.to_string(),
                password: "1234".to_string(),
                full_name: username.to_string(),
                permissions: UserPermissions::default(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let db = db().await;
        let a = db.clients().insert(&new_client("Ana Ruiz")).await.unwrap();
        let b = db.clients().insert(&new_client("Luis Gil")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(db.clients().get_all().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_update() {
        let db = db().await;
        let client = db.clients().insert(&new_client("Ana Ruiz")).await.unwrap();

        let moved = Client {
            address: "3 Low Road".to_string(),
            ..client
        };
        db.clients().update(&moved).await.unwrap();
        assert_eq!(db.clients().get(moved.id).await.unwrap(), Some(moved));

        let ghost = Client {
            id: 77,
            fullname: "Ghost".to_string(),
            address: String::new(),
            phone: String::new(),
        };
        let err = db.clients().update(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_personal_lists_are_per_user() {
        let db = db().await;
        let maria = user(&db, "maria").await;
        let joe = user(&db, "joe").await;
        let ana = db.clients().insert(&new_client("Ana Ruiz")).await.unwrap();
        let luis = db.clients().insert(&new_client("Luis Gil")).await.unwrap();

        let clients = db.clients();
        clients.add_personal(maria, luis.id).await.unwrap();
        clients.add_personal(maria, ana.id).await.unwrap();
        clients.add_personal(maria, ana.id).await.unwrap();
        clients.add_personal(joe, luis.id).await.unwrap();

        let personal = clients.get_personal(maria).await.unwrap();
        assert_eq!(personal, vec![ana.clone(), luis.clone()]);
        assert_eq!(clients.get_personal(joe).await.unwrap(), vec![luis.clone()]);

        clients.remove_personal(maria, ana.id).await.unwrap();
        assert_eq!(clients.get_personal(maria).await.unwrap(), vec![luis]);

        let err = clients.remove_personal(maria, ana.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_personal_unknown_client_is_rejected() {
        let db = db().await;
        let maria = user(&db, "maria").await;

        let err = db.clients().add_personal(maria, 42).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
