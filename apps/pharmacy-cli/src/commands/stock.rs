//! # Stock Commands
//!
//! Receipts (`stock receive`) and low-stock notifications (`stock alerts`).

use tracing::info;

use super::product::{check_receipt, load_listing, ProductList, ProductRow};
use super::{parse, Context};
use crate::cli::StockCommand;
use crate::error::CliResult;
use crate::output::Output;
use pharmacy_core::codes::CodeKind;
use pharmacy_core::validation::validate_stock_movement;
use pharmacy_core::MenuAction;

pub async fn execute(ctx: &Context, cmd: StockCommand, out: &Output) -> CliResult<()> {
    match cmd {
        StockCommand::Receive { code, quantity } => out.emit(&receive(ctx, &code, quantity).await?),
        StockCommand::Alerts => out.emit(&alerts(ctx).await?),
    }
}

/// Adds `quantity` units to a product and returns it with the new level.
pub async fn receive(ctx: &Context, code: &str, quantity: i64) -> CliResult<ProductRow> {
    let session = ctx.authorize(MenuAction::ReceiveStock).await?;

    let code = parse(CodeKind::Product, code)?;
    validate_stock_movement(quantity)?;
    check_receipt(ctx, code, quantity).await?;

    let product = ctx.db.products().add_stock(code, quantity).await?;
    info!(
        code = %product.display_code(),
        received = quantity,
        quantity = product.quantity,
        by = %session.user().username,
        "Stock received"
    );

    let listing = load_listing(ctx, code).await?;
    Ok(ProductRow::from_listing(&listing, &ctx.config))
}

/// Products at or below their quantity limit, lowest stock first.
pub async fn alerts(ctx: &Context) -> CliResult<ProductList> {
    ctx.authorize(MenuAction::Notifications).await?;

    let low = ctx.db.products().below_limit().await?;
    Ok(ProductList(
        low.iter()
            .map(|l| ProductRow::from_listing(l, &ctx.config))
            .collect(),
    ))
}
