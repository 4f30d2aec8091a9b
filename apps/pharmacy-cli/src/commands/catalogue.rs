//! # Catalogue Commands
//!
//! Categories (`C0001`) and companies (`S0001`) share one command shape:
//! list, show, add under the next free code, rename.

use serde::Serialize;
use tracing::info;

use super::{parse, Context};
use crate::cli::CatalogueCommand;
use crate::error::{CliError, CliResult};
use crate::output::{table, Output, Render};
use pharmacy_core::codes::{format_code, CodeKind};
use pharmacy_core::validation::validate_name;
use pharmacy_core::{Category, Company, MenuAction};

#[derive(Debug, Serialize)]
pub struct CatalogueEntry {
    pub code: String,
    pub name: String,
    /// Products filed under the entry, where counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<i64>,
}

impl CatalogueEntry {
    fn cells(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.name.clone(),
            self.products.map(|n| n.to_string()).unwrap_or_default(),
        ]
    }
}

impl From<Category> for CatalogueEntry {
    fn from(c: Category) -> Self {
        CatalogueEntry {
            code: c.display_code(),
            name: c.name,
            products: None,
        }
    }
}

impl From<Company> for CatalogueEntry {
    fn from(c: Company) -> Self {
        CatalogueEntry {
            code: c.display_code(),
            name: c.name,
            products: None,
        }
    }
}

const HEADERS: [&str; 3] = ["Code", "Name", "Products"];

impl Render for CatalogueEntry {
    fn render(&self) -> String {
        table(&HEADERS, &[self.cells()])
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CatalogueList(pub Vec<CatalogueEntry>);

impl Render for CatalogueList {
    fn render(&self) -> String {
        let rows: Vec<_> = self.0.iter().map(CatalogueEntry::cells).collect();
        table(&HEADERS, &rows)
    }
}

// =============================================================================
// Categories
// =============================================================================

pub async fn execute_categories(
    ctx: &Context,
    cmd: CatalogueCommand,
    out: &Output,
) -> CliResult<()> {
    match cmd {
        CatalogueCommand::List => out.emit(&list_categories(ctx).await?),
        CatalogueCommand::Show { code } => out.emit(&show_category(ctx, &code).await?),
        CatalogueCommand::Add { name } => out.emit(&add_category(ctx, &name).await?),
        CatalogueCommand::Rename { code, name } => {
            out.emit(&rename_category(ctx, &code, &name).await?)
        }
    }
}

/// Every category with its product count.
pub async fn list_categories(ctx: &Context) -> CliResult<CatalogueList> {
    ctx.authorize(MenuAction::ViewProducts).await?;

    let rows = ctx.db.categories().get_all_with_counts().await?;
    Ok(CatalogueList(
        rows.into_iter()
            .map(|(category, count)| CatalogueEntry {
                products: Some(count),
                ..CatalogueEntry::from(category)
            })
            .collect(),
    ))
}

pub async fn show_category(ctx: &Context, code: &str) -> CliResult<CatalogueEntry> {
    ctx.authorize(MenuAction::ViewProducts).await?;

    let code = parse(CodeKind::Category, code)?;
    ctx.db
        .categories()
        .get(code)
        .await?
        .map(CatalogueEntry::from)
        .ok_or_else(|| CliError::not_found("Category", &format_code(CodeKind::Category, code)))
}

pub async fn add_category(ctx: &Context, name: &str) -> CliResult<CatalogueEntry> {
    ctx.authorize(MenuAction::EditCategories).await?;
    validate_name("category name", name)?;

    let category = ctx.db.categories().create(name).await?;
    info!(code = %category.display_code(), name = %category.name, "Category added");

    Ok(category.into())
}

pub async fn rename_category(ctx: &Context, code: &str, name: &str) -> CliResult<CatalogueEntry> {
    ctx.authorize(MenuAction::EditCategories).await?;

    let code = parse(CodeKind::Category, code)?;
    validate_name("category name", name)?;

    let category = Category::new(code, name.trim());
    ctx.db.categories().update(&category).await?;

    Ok(category.into())
}

// =============================================================================
// Companies
// =============================================================================

pub async fn execute_companies(
    ctx: &Context,
    cmd: CatalogueCommand,
    out: &Output,
) -> CliResult<()> {
    match cmd {
        CatalogueCommand::List => out.emit(&list_companies(ctx).await?),
        CatalogueCommand::Show { code } => out.emit(&show_company(ctx, &code).await?),
        CatalogueCommand::Add { name } => out.emit(&add_company(ctx, &name).await?),
        CatalogueCommand::Rename { code, name } => {
            out.emit(&rename_company(ctx, &code, &name).await?)
        }
    }
}

pub async fn list_companies(ctx: &Context) -> CliResult<CatalogueList> {
    ctx.authorize(MenuAction::ViewProducts).await?;

    let companies = ctx.db.companies().get_all().await?;
    Ok(CatalogueList(
        companies.into_iter().map(CatalogueEntry::from).collect(),
    ))
}

pub async fn show_company(ctx: &Context, code: &str) -> CliResult<CatalogueEntry> {
    ctx.authorize(MenuAction::ViewProducts).await?;

    let code = parse(CodeKind::Company, code)?;
    ctx.db
        .companies()
        .get(code)
        .await?
        .map(CatalogueEntry::from)
        .ok_or_else(|| CliError::not_found("Company", &format_code(CodeKind::Company, code)))
}

pub async fn add_company(ctx: &Context, name: &str) -> CliResult<CatalogueEntry> {
    ctx.authorize(MenuAction::EditCompanies).await?;
    validate_name("company name", name)?;

    let company = ctx.db.companies().create(name).await?;
    info!(code = %company.display_code(), name = %company.name, "Company added");

    Ok(company.into())
}

pub async fn rename_company(ctx: &Context, code: &str, name: &str) -> CliResult<CatalogueEntry> {
    ctx.authorize(MenuAction::EditCompanies).await?;

    let code = parse(CodeKind::Company, code)?;
    validate_name("company name", name)?;

    let company = Company::new(code, name.trim());
    ctx.db.companies().update(&company).await?;

    Ok(company.into())
}
