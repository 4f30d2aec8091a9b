//! # Product Commands
//!
//! Listing, inspecting, adding and editing products.
//!
//! ## Listing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products list --search asp --category Painkillers                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.products().list_with_refs()    company/category names resolved      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductFilter::apply()            name contains "asp" (any case)       │
//! │       │                            category == "Painkillers"            │
//! │       ▼                                                                 │
//! │  Vec<ProductRow>                   codes formatted, money with symbol   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::info;

use super::{parse, parse_money, parse_reference, Context};
use crate::cli::{NewProductArgs, ProductChanges, ProductCommand};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::{table, Output, Render};
use pharmacy_core::codes::{format_code, CodeKind};
use pharmacy_core::filter::ProductFilter;
use pharmacy_core::validation::{validate_name, validate_price_cents, validate_quantity};
use pharmacy_core::{MenuAction, Product, ProductListing};

/// Product DTO for display.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    pub code: String,
    pub name: String,
    pub company: Option<String>,
    pub category: Option<String>,
    pub purchase_cost: String,
    pub selling_price: String,
    pub quantity: i64,
    pub quantity_limit: i64,
    pub is_drug: bool,
    /// At or below the quantity limit.
    pub low_stock: bool,
}

impl ProductRow {
    pub fn from_listing(listing: &ProductListing, config: &AppConfig) -> Self {
        let p = &listing.product;
        ProductRow {
            code: p.display_code(),
            name: p.name.clone(),
            company: listing.company_name.clone(),
            category: listing.category_name.clone(),
            purchase_cost: config.format_currency(p.purchase_cost()),
            selling_price: config.format_currency(p.selling_price()),
            quantity: p.quantity,
            quantity_limit: p.quantity_limit,
            is_drug: listing.is_drug,
            low_stock: p.is_below_limit(),
        }
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            if self.is_drug {
                format!("{} [drug]", self.name)
            } else {
                self.name.clone()
            },
            self.company.clone().unwrap_or_default(),
            self.category.clone().unwrap_or_default(),
            self.purchase_cost.clone(),
            self.selling_price.clone(),
            self.quantity.to_string(),
            format!(
                "{}{}",
                self.quantity_limit,
                if self.low_stock { " !" } else { "" }
            ),
        ]
    }
}

const HEADERS: [&str; 8] = [
    "Code", "Name", "Company", "Category", "Cost", "Price", "Qty", "Limit",
];

impl Render for ProductRow {
    fn render(&self) -> String {
        table(&HEADERS, &[self.cells()])
    }
}

/// A list of products.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ProductList(pub Vec<ProductRow>);

impl Render for ProductList {
    fn render(&self) -> String {
        let rows: Vec<_> = self.0.iter().map(ProductRow::cells).collect();
        table(&HEADERS, &rows)
    }
}

/// One product with derived figures.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub row: ProductRow,
    pub margin: String,
    pub stock_value: String,
}

impl Render for ProductDetail {
    fn render(&self) -> String {
        format!(
            "{}\n\nMargin per unit: {}\nStock value:     {}",
            self.row.render(),
            self.margin,
            self.stock_value
        )
    }
}

pub async fn execute(ctx: &Context, cmd: ProductCommand, out: &Output) -> CliResult<()> {
    match cmd {
        ProductCommand::List {
            search,
            category,
            company,
        } => {
            let filter = ProductFilter {
                search,
                category,
                company,
            };
            out.emit(&list(ctx, &filter).await?)
        }
        ProductCommand::Show { code } => out.emit(&show(ctx, &code).await?),
        ProductCommand::Add(args) => out.emit(&add(ctx, &args).await?),
        ProductCommand::Edit { code, changes } => out.emit(&edit(ctx, &code, &changes).await?),
    }
}

pub async fn list(ctx: &Context, filter: &ProductFilter) -> CliResult<ProductList> {
    ctx.authorize(MenuAction::ViewProducts).await?;

    let listings = ctx.db.products().list_with_refs().await?;
    let rows = filter
        .apply(&listings)
        .iter()
        .map(|l| ProductRow::from_listing(l, &ctx.config))
        .collect();

    Ok(ProductList(rows))
}

pub async fn show(ctx: &Context, code: &str) -> CliResult<ProductDetail> {
    ctx.authorize(MenuAction::ViewProducts).await?;

    let code = parse(CodeKind::Product, code)?;
    let listing = load_listing(ctx, code).await?;
    let p = &listing.product;

    Ok(ProductDetail {
        margin: ctx.config.format_currency(p.margin()),
        stock_value: ctx.config.format_currency(p.stock_value()?),
        row: ProductRow::from_listing(&listing, &ctx.config),
    })
}

pub async fn add(ctx: &Context, args: &NewProductArgs) -> CliResult<ProductRow> {
    ctx.authorize(MenuAction::AddProduct).await?;

    let code = ctx.db.products().next_code().await?;
    let product = build_product(ctx, code, args).await?;
    ctx.db.products().insert(&product).await?;

    info!(code = %product.display_code(), name = %product.name, "Product added");

    let listing = load_listing(ctx, code).await?;
    Ok(ProductRow::from_listing(&listing, &ctx.config))
}

/// Overwrites the given fields; the rest keep their stored values.
pub async fn edit(ctx: &Context, code: &str, changes: &ProductChanges) -> CliResult<ProductRow> {
    ctx.authorize(MenuAction::AddProduct).await?;

    let code = parse(CodeKind::Product, code)?;
    let mut product = ctx
        .db
        .products()
        .get(code)
        .await?
        .ok_or_else(|| CliError::not_found("Product", &format_code(CodeKind::Product, code)))?;

    if let Some(name) = &changes.name {
        validate_name("product name", name)?;
        product.name = name.trim().to_string();
    }
    if let Some(cost) = &changes.cost {
        product.purchase_cost_cents = parse_money("cost", cost)?;
        validate_price_cents("cost", product.purchase_cost_cents)?;
    }
    if let Some(price) = &changes.price {
        product.selling_price_cents = parse_money("price", price)?;
        validate_price_cents("price", product.selling_price_cents)?;
    }
    if let Some(quantity) = changes.quantity {
        validate_quantity("quantity", quantity)?;
        product.quantity = quantity;
    }
    if let Some(limit) = changes.limit {
        validate_quantity("limit", limit)?;
        product.quantity_limit = limit;
    }
    if let Some(company) = &changes.company {
        product.company_code = resolve_company(ctx, Some(company)).await?;
    }
    if let Some(category) = &changes.category {
        product.category_code = resolve_category(ctx, Some(category)).await?;
    }

    ctx.db.products().update(&product).await?;

    let listing = load_listing(ctx, code).await?;
    Ok(ProductRow::from_listing(&listing, &ctx.config))
}

// =============================================================================
// Helpers shared with the drug commands
// =============================================================================

pub(crate) async fn load_listing(ctx: &Context, code: i64) -> CliResult<ProductListing> {
    ctx.db
        .products()
        .get_listing(code)
        .await?
        .ok_or_else(|| CliError::not_found("Product", &format_code(CodeKind::Product, code)))
}

/// Refuses a receipt that would lift the stock above the quantity cap.
pub(crate) async fn check_receipt(ctx: &Context, code: i64, received: i64) -> CliResult<()> {
    let product = ctx
        .db
        .products()
        .get(code)
        .await?
        .ok_or_else(|| CliError::not_found("Product", &format_code(CodeKind::Product, code)))?;
    validate_quantity(
        "quantity after receipt",
        product.quantity.saturating_add(received),
    )?;
    Ok(())
}

/// Validates the arguments and resolves the references into a record.
pub(crate) async fn build_product(
    ctx: &Context,
    code: i64,
    args: &NewProductArgs,
) -> CliResult<Product> {
    validate_name("product name", &args.name)?;

    let purchase_cost_cents = parse_money("cost", &args.cost)?;
    validate_price_cents("cost", purchase_cost_cents)?;
    let selling_price_cents = parse_money("price", &args.price)?;
    validate_price_cents("price", selling_price_cents)?;

    validate_quantity("quantity", args.quantity)?;
    validate_quantity("limit", args.limit)?;

    Ok(Product {
        code,
        name: args.name.trim().to_string(),
        purchase_cost_cents,
        selling_price_cents,
        quantity: args.quantity,
        quantity_limit: args.limit,
        company_code: resolve_company(ctx, args.company.as_deref()).await?,
        category_code: resolve_category(ctx, args.category.as_deref()).await?,
    })
}

async fn resolve_company(ctx: &Context, input: Option<&str>) -> CliResult<Option<i64>> {
    let Some(code) = input.map(|s| parse_reference(CodeKind::Company, s)).transpose()?.flatten()
    else {
        return Ok(None);
    };
    match ctx.db.companies().get(code).await? {
        Some(company) => Ok(Some(company.code)),
        None => Err(CliError::not_found(
            "Company",
            &format_code(CodeKind::Company, code),
        )),
    }
}

async fn resolve_category(ctx: &Context, input: Option<&str>) -> CliResult<Option<i64>> {
    let Some(code) = input.map(|s| parse_reference(CodeKind::Category, s)).transpose()?.flatten()
    else {
        return Ok(None);
    };
    match ctx.db.categories().get(code).await? {
        Some(category) => Ok(Some(category.code)),
        None => Err(CliError::not_found(
            "Category",
            &format_code(CodeKind::Category, code),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::error::ErrorCode;
    use pharmacy_core::{Category, Company, Permission};

    pub(crate) fn args(name: &str) -> NewProductArgs {
        NewProductArgs {
            name: name.to_string(),
            cost: "2.50".to_string(),
            price: "4.20".to_string(),
            quantity: 10,
            limit: 3,
            company: Some("S0001".to_string()),
            category: Some("C0001".to_string()),
        }
    }

    pub(crate) async fn catalogue(ctx: &Context) {
        ctx.db
            .companies()
            .insert(&Company::new(1, "Bayer"))
            .await
            .unwrap();
        ctx.db
            .categories()
            .insert(&Category::new(1, "Painkillers"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_then_list_and_filter() {
        let db = database().await;
        let ctx = admin(&db).await;
        catalogue(&ctx).await;

        let added = add(&ctx, &args("Aspirin")).await.unwrap();
        assert_eq!(added.code, "P000001");
        assert_eq!(added.company.as_deref(), Some("Bayer"));
        assert_eq!(added.selling_price, "€4.20");

        add(&ctx, &NewProductArgs {
            category: None,
            ..args("Cotton wool")
        })
        .await
        .unwrap();

        let all = list(&ctx, &ProductFilter::default()).await.unwrap();
        assert_eq!(all.0.len(), 2);

        let filter = ProductFilter {
            category: Some("Painkillers".to_string()),
            ..ProductFilter::default()
        };
        let hits = list(&ctx, &filter).await.unwrap();
        assert_eq!(hits.0.len(), 1);
        assert_eq!(hits.0[0].name, "Aspirin");
        assert!(hits.render().contains("P000001"));
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_company() {
        let db = database().await;
        let ctx = admin(&db).await;

        let err = add(&ctx, &args("Aspirin")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Company not found: S0001");
    }

    #[tokio::test]
    async fn test_add_validates_money() {
        let db = database().await;
        let ctx = admin(&db).await;
        catalogue(&ctx).await;

        let bad = NewProductArgs {
            price: "4.205".to_string(),
            ..args("Aspirin")
        };
        let err = add(&ctx, &bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_edit_overwrites_selected_fields() {
        let db = database().await;
        let ctx = admin(&db).await;
        catalogue(&ctx).await;
        add(&ctx, &args("Aspirin")).await.unwrap();

        let changes = ProductChanges {
            price: Some("5".to_string()),
            company: Some("none".to_string()),
            ..ProductChanges::default()
        };
        let edited = edit(&ctx, "P000001", &changes).await.unwrap();
        assert_eq!(edited.selling_price, "€5.00");
        assert_eq!(edited.company, None);
        assert_eq!(edited.category.as_deref(), Some("Painkillers"));
        assert_eq!(edited.quantity, 10);
    }

    #[tokio::test]
    async fn test_show_includes_margin() {
        let db = database().await;
        let ctx = admin(&db).await;
        catalogue(&ctx).await;
        add(&ctx, &args("Aspirin")).await.unwrap();

        let detail = show(&ctx, "p000001").await.unwrap();
        assert_eq!(detail.margin, "€1.70");
        assert_eq!(detail.stock_value, "€25.00");

        let err = show(&ctx, "P000009").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_edit_rejects_quantity_above_cap() {
        let db = database().await;
        let ctx = admin(&db).await;
        catalogue(&ctx).await;
        add(&ctx, &args("Aspirin")).await.unwrap();

        let changes = ProductChanges {
            quantity: Some(92_233_720_368_547_758),
            ..ProductChanges::default()
        };
        let err = edit(&ctx, "P000001", &changes).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let changes = ProductChanges {
            quantity: Some(pharmacy_core::MAX_QUANTITY),
            ..ProductChanges::default()
        };
        assert!(edit(&ctx, "P000001", &changes).await.is_ok());
        assert!(show(&ctx, "P000001").await.is_ok());
    }

    #[tokio::test]
    async fn test_show_reports_overflowing_stock_value() {
        let db = database().await;
        let ctx = admin(&db).await;
        catalogue(&ctx).await;
        add(&ctx, &args("Aspirin")).await.unwrap();

        // Rows written before the quantity cap existed
        let mut product = db.products().get(1).await.unwrap().unwrap();
        product.quantity = i64::MAX / 100;
        db.products().update(&product).await.unwrap();

        let err = show(&ctx, "P000001").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("stock value of P000001"));
    }

    #[tokio::test]
    async fn test_viewer_cannot_add() {
        let db = database().await;
        let ctx = context_with(&db, "viewer", &[Permission::ViewStock]).await;

        assert!(list(&ctx, &ProductFilter::default()).await.is_ok());
        let err = add(&ctx, &args("Aspirin")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
