//! # Client Commands
//!
//! The shared client register and each user's personal client list.
//! Everything here sits behind the `create_client_list` flag.

use serde::Serialize;
use tracing::info;

use super::Context;
use crate::cli::{ClientCommand, PersonalCommand};
use crate::error::{CliError, CliResult};
use crate::output::{table, Message, Output, Render};
use pharmacy_core::validation::{validate_name, validate_phone};
use pharmacy_core::{Client, MenuAction, NewClient};

const HEADERS: [&str; 4] = ["Id", "Name", "Address", "Phone"];

fn cells(client: &Client) -> Vec<String> {
    vec![
        client.id.to_string(),
        client.fullname.clone(),
        client.address.clone(),
        client.phone.clone(),
    ]
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ClientView(pub Client);

impl Render for ClientView {
    fn render(&self) -> String {
        table(&HEADERS, &[cells(&self.0)])
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ClientList(pub Vec<Client>);

impl Render for ClientList {
    fn render(&self) -> String {
        let rows: Vec<_> = self.0.iter().map(cells).collect();
        table(&HEADERS, &rows)
    }
}

/// Fields to overwrite on `clients edit`.
#[derive(Debug, Default)]
pub struct ClientChanges {
    pub fullname: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

pub async fn execute(ctx: &Context, cmd: ClientCommand, out: &Output) -> CliResult<()> {
    match cmd {
        ClientCommand::List { search } => out.emit(&list(ctx, search.as_deref()).await?),
        ClientCommand::Add {
            fullname,
            address,
            phone,
        } => out.emit(&add(ctx, &fullname, &address, &phone).await?),
        ClientCommand::Edit {
            id,
            fullname,
            address,
            phone,
        } => {
            let changes = ClientChanges {
                fullname,
                address,
                phone,
            };
            out.emit(&edit(ctx, id, &changes).await?)
        }
        ClientCommand::Personal(cmd) => match cmd {
            PersonalCommand::List => out.emit(&personal_list(ctx).await?),
            PersonalCommand::Add { id } => out.emit(&personal_add(ctx, id).await?),
            PersonalCommand::Remove { id } => out.emit(&personal_remove(ctx, id).await?),
        },
    }
}

/// Every client, or those whose name contains `search` in any case.
pub async fn list(ctx: &Context, search: Option<&str>) -> CliResult<ClientList> {
    ctx.authorize(MenuAction::ViewClients).await?;

    let clients = ctx.db.clients().get_all().await?;
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    Ok(ClientList(match needle {
        Some(needle) => clients
            .into_iter()
            .filter(|c| c.fullname.to_lowercase().contains(&needle))
            .collect(),
        None => clients,
    }))
}

pub async fn add(ctx: &Context, fullname: &str, address: &str, phone: &str) -> CliResult<ClientView> {
    ctx.authorize(MenuAction::ViewClients).await?;

    validate_name("client name", fullname)?;
    validate_phone(phone)?;

    let client = ctx
        .db
        .clients()
        .insert(&NewClient {
            fullname: fullname.trim().to_string(),
            address: address.trim().to_string(),
            phone: phone.trim().to_string(),
        })
        .await?;

    info!(id = client.id, "Client added");
    Ok(ClientView(client))
}

pub async fn edit(ctx: &Context, id: i64, changes: &ClientChanges) -> CliResult<ClientView> {
    ctx.authorize(MenuAction::ViewClients).await?;

    let mut client = load(ctx, id).await?;
    if let Some(fullname) = &changes.fullname {
        validate_name("client name", fullname)?;
        client.fullname = fullname.trim().to_string();
    }
    if let Some(address) = &changes.address {
        client.address = address.trim().to_string();
    }
    if let Some(phone) = &changes.phone {
        validate_phone(phone)?;
        client.phone = phone.trim().to_string();
    }

    ctx.db.clients().update(&client).await?;
    Ok(ClientView(client))
}

// =============================================================================
// Personal List
// =============================================================================

pub async fn personal_list(ctx: &Context) -> CliResult<ClientList> {
    let session = ctx.authorize(MenuAction::ViewClients).await?;
    let clients = ctx.db.clients().get_personal(session.user().id).await?;
    Ok(ClientList(clients))
}

pub async fn personal_add(ctx: &Context, id: i64) -> CliResult<Message> {
    let session = ctx.authorize(MenuAction::ViewClients).await?;

    let client = load(ctx, id).await?;
    ctx.db.clients().add_personal(session.user().id, id).await?;

    Ok(Message::new(format!(
        "Added {} to your personal clients",
        client.fullname
    )))
}

pub async fn personal_remove(ctx: &Context, id: i64) -> CliResult<Message> {
    let session = ctx.authorize(MenuAction::ViewClients).await?;

    ctx.db
        .clients()
        .remove_personal(session.user().id, id)
        .await?;

    Ok(Message::new(format!(
        "Removed client {id} from your personal clients"
    )))
}

async fn load(ctx: &Context, id: i64) -> CliResult<Client> {
    ctx.db
        .clients()
        .get(id)
        .await?
        .ok_or_else(|| CliError::not_found("Client", &id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::ErrorCode;
    use pharmacy_core::Permission;

    async fn clerk(db: &pharmacy_db::Database, username: &str) -> Context {
        context_with(
            db,
            username,
            &[Permission::ViewStock, Permission::CreateClientList],
        )
        .await
    }

    #[tokio::test]
    async fn test_add_and_search() {
        let db = database().await;
        let ctx = clerk(&db, "maria").await;

        let first = add(&ctx, "Nikos Papadopoulos", "Athens", "+30 210 1234567")
            .await
            .unwrap();
        assert_eq!(first.0.id, 1);
        add(&ctx, "Eleni Georgiou", "", "").await.unwrap();

        assert_eq!(list(&ctx, None).await.unwrap().0.len(), 2);
        let hits = list(&ctx, Some("PAPA")).await.unwrap();
        assert_eq!(hits.0.len(), 1);
        assert_eq!(hits.0[0].fullname, "Nikos Papadopoulos");
    }

    #[tokio::test]
    async fn test_add_validates_phone() {
        let db = database().await;
        let ctx = clerk(&db, "maria").await;

        let err = add(&ctx, "Nikos", "", "call me").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_edit_keeps_unchanged_fields() {
        let db = database().await;
        let ctx = clerk(&db, "maria").await;
        add(&ctx, "Nikos", "Athens", "210").await.unwrap();

        let changes = ClientChanges {
            phone: Some("211".to_string()),
            ..ClientChanges::default()
        };
        let edited = edit(&ctx, 1, &changes).await.unwrap();
        assert_eq!(edited.0.address, "Athens");
        assert_eq!(edited.0.phone, "211");

        let err = edit(&ctx, 9, &changes).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_personal_lists_are_per_user() {
        let db = database().await;
        let maria = clerk(&db, "maria").await;
        let kostas = clerk(&db, "kostas").await;
        add(&maria, "Nikos", "", "").await.unwrap();
        add(&maria, "Eleni", "", "").await.unwrap();

        personal_add(&maria, 2).await.unwrap();
        personal_add(&maria, 2).await.unwrap();
        personal_add(&kostas, 1).await.unwrap();

        let mine = personal_list(&maria).await.unwrap();
        assert_eq!(mine.0.len(), 1);
        assert_eq!(mine.0[0].fullname, "Eleni");

        personal_remove(&maria, 2).await.unwrap();
        assert!(personal_list(&maria).await.unwrap().0.is_empty());
        assert_eq!(personal_list(&kostas).await.unwrap().0.len(), 1);

        let err = personal_remove(&maria, 2).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        let err = personal_add(&maria, 42).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_clients_require_create_client_list() {
        let db = database().await;
        let ctx = context_with(&db, "viewer", &[Permission::ViewStock]).await;

        let err = list(&ctx, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
