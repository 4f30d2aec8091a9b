//! # Drug Commands
//!
//! Drugs are products with a quality-control flag and dated batches.
//! Receiving a batch adds its units to the product's stock.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::product::{build_product, check_receipt, load_listing, ProductRow};
use super::{parse, Context};
use crate::cli::{DrugCommand, NewProductArgs};
use crate::config::MAX_EXPIRY_WARNING_DAYS;
use crate::error::{CliError, CliResult};
use crate::output::{table, Message, Output, Render};
use pharmacy_core::codes::{format_code, CodeKind};
use pharmacy_core::validation::{validate_batch_code, validate_stock_movement};
use pharmacy_core::{Drug, DrugBatch, MenuAction};

#[derive(Debug, Serialize)]
pub struct BatchRow {
    pub batch_code: String,
    pub product_code: String,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub expiration_date: NaiveDate,
    pub expired: bool,
}

impl BatchRow {
    fn new(batch: &DrugBatch, product_name: Option<String>, today: NaiveDate) -> Self {
        BatchRow {
            batch_code: batch.batch_code.clone(),
            product_code: format_code(CodeKind::Product, batch.product_code),
            product_name,
            quantity: batch.quantity,
            expiration_date: batch.expiration_date,
            expired: batch.is_expired(today),
        }
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.batch_code.clone(),
            self.product_code.clone(),
            self.product_name.clone().unwrap_or_default(),
            self.quantity.to_string(),
            format!(
                "{}{}",
                self.expiration_date,
                if self.expired { " (expired)" } else { "" }
            ),
        ]
    }
}

const BATCH_HEADERS: [&str; 5] = ["Batch", "Product", "Name", "Qty", "Expires"];

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct BatchList(pub Vec<BatchRow>);

impl Render for BatchList {
    fn render(&self) -> String {
        let rows: Vec<_> = self.0.iter().map(BatchRow::cells).collect();
        table(&BATCH_HEADERS, &rows)
    }
}

/// A drug with its batches.
#[derive(Debug, Serialize)]
pub struct DrugView {
    pub product: ProductRow,
    pub quality: bool,
    pub batch_quantity: i64,
    pub batches: Vec<BatchRow>,
}

impl Render for DrugView {
    fn render(&self) -> String {
        let rows: Vec<_> = self.batches.iter().map(BatchRow::cells).collect();
        format!(
            "{}\n\nQuality control: {}\nUnits in batches: {}\n\n{}",
            self.product.render(),
            if self.quality { "passed" } else { "not passed" },
            self.batch_quantity,
            table(&BATCH_HEADERS, &rows)
        )
    }
}

pub async fn execute(ctx: &Context, cmd: DrugCommand, out: &Output) -> CliResult<()> {
    match cmd {
        DrugCommand::Add { product, quality } => out.emit(&add(ctx, &product, quality).await?),
        DrugCommand::Show { code } => out.emit(&show(ctx, &code).await?),
        DrugCommand::AddBatch {
            code,
            batch,
            quantity,
            expires,
        } => out.emit(&add_batch(ctx, &code, &batch, quantity, expires).await?),
        DrugCommand::Quality { code, failed } => out.emit(&set_quality(ctx, &code, !failed).await?),
        DrugCommand::Expiring { before } => {
            let before = match before {
                Some(date) => date,
                None => default_expiry_cutoff(ctx.today(), ctx.config.expiry_warning_days),
            };
            out.emit(&expiring(ctx, before).await?)
        }
    }
}

pub async fn add(ctx: &Context, args: &NewProductArgs, quality: bool) -> CliResult<DrugView> {
    ctx.authorize(MenuAction::AddProduct).await?;

    let code = ctx.db.products().next_code().await?;
    let product = build_product(ctx, code, args).await?;
    ctx.db.drugs().insert(&Drug::new(product, quality)).await?;

    info!(code = %format_code(CodeKind::Product, code), quality, "Drug added");

    load_view(ctx, code).await
}

pub async fn show(ctx: &Context, code: &str) -> CliResult<DrugView> {
    ctx.authorize(MenuAction::ViewProducts).await?;
    load_view(ctx, parse(CodeKind::Product, code)?).await
}

pub async fn add_batch(
    ctx: &Context,
    code: &str,
    batch_code: &str,
    quantity: i64,
    expires: NaiveDate,
) -> CliResult<DrugView> {
    ctx.authorize(MenuAction::ReceiveStock).await?;

    let code = parse(CodeKind::Product, code)?;
    validate_batch_code(batch_code)?;
    validate_stock_movement(quantity)?;
    check_receipt(ctx, code, quantity).await?;

    let product = ctx
        .db
        .drugs()
        .add_batch(&DrugBatch {
            batch_code: batch_code.trim().to_string(),
            product_code: code,
            quantity,
            expiration_date: expires,
        })
        .await?;

    info!(
        code = %product.display_code(),
        batch = batch_code,
        received = quantity,
        quantity = product.quantity,
        "Batch received"
    );

    load_view(ctx, code).await
}

pub async fn set_quality(ctx: &Context, code: &str, passed: bool) -> CliResult<Message> {
    ctx.authorize(MenuAction::AddProduct).await?;

    let code = parse(CodeKind::Product, code)?;
    ctx.db.drugs().update_quality(code, passed).await?;

    Ok(Message::new(format!(
        "{}: quality control {}",
        format_code(CodeKind::Product, code),
        if passed { "passed" } else { "not passed" }
    )))
}

/// Batches expiring strictly before `before`, soonest first.
pub async fn expiring(ctx: &Context, before: NaiveDate) -> CliResult<BatchList> {
    ctx.authorize(MenuAction::Notifications).await?;

    let batches = ctx.db.drugs().expiring_before(before).await?;
    let names: HashMap<i64, String> = ctx
        .db
        .products()
        .get_all()
        .await?
        .into_iter()
        .map(|p| (p.code, p.name))
        .collect();

    let today = ctx.today();
    Ok(BatchList(
        batches
            .iter()
            .map(|b| BatchRow::new(b, names.get(&b.product_code).cloned(), today))
            .collect(),
    ))
}

/// The day after the warning window ends. The window is capped at
/// [`MAX_EXPIRY_WARNING_DAYS`].
pub fn default_expiry_cutoff(today: NaiveDate, warning_days: u32) -> NaiveDate {
    let days = warning_days.min(MAX_EXPIRY_WARNING_DAYS);
    today
        .checked_add_days(Days::new(u64::from(days) + 1))
        .unwrap_or(today)
}

async fn load_view(ctx: &Context, code: i64) -> CliResult<DrugView> {
    let drug = ctx
        .db
        .drugs()
        .get(code)
        .await?
        .ok_or_else(|| CliError::not_found("Drug", &format_code(CodeKind::Product, code)))?;
    let listing = load_listing(ctx, code).await?;

    let today = ctx.today();
    Ok(DrugView {
        product: ProductRow::from_listing(&listing, &ctx.config),
        quality: drug.quality,
        batch_quantity: drug.batch_quantity(),
        batches: drug
            .batches
            .iter()
            .map(|b| BatchRow::new(b, Some(drug.product.name.clone()), today))
            .collect(),
    })
}
