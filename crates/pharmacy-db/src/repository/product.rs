//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD on the `products` table (updates fully overwrite the row)
//! - Listing with company/category names resolved
//! - Stock receipts and low-stock notifications
//!
//! ## Resolving References
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                companies           categories                 │
//! │  ┌────────────────────┐  ┌──────────────┐    ┌──────────────┐           │
//! │  │ 12 Aspirin  co=1 ──┼─►│ 1 Bayer      │    │ 2 Painkillers│◄─┐        │
//! │  │             ca=2 ──┼──┼──────────────┼────┼──────────────┼──┘        │
//! │  └────────────────────┘  └──────────────┘    └──────────────┘           │
//! │                                                                         │
//! │  list_with_refs() ──► ProductListing { Aspirin, "Bayer", "Painkillers" }│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharmacy_core::{Product, ProductListing};

const SELECT_PRODUCT: &str = r#"
    SELECT
        code,
        name,
        purchase_cost_cents,
        selling_price_cents,
        quantity,
        quantity_limit,
        company_code,
        category_code
    FROM products
"#;

const SELECT_LISTING: &str = r#"
    SELECT
        p.code,
        p.name,
        p.purchase_cost_cents,
        p.selling_price_cents,
        p.quantity,
        p.quantity_limit,
        p.company_code,
        p.category_code,
        co.name AS company_name,
        ca.name AS category_name,
        (d.product_code IS NOT NULL) AS is_drug
    FROM products p
    LEFT JOIN companies co ON co.code = p.company_code
    LEFT JOIN categories ca ON ca.code = p.category_code
    LEFT JOIN drugs d ON d.product_code = p.code
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let code = repo.next_code().await?;
/// repo.insert(&Product { code, ..product }).await?;
/// repo.add_stock(code, 24).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product (drugs included), ordered by code.
    pub async fn get_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} ORDER BY code"))
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, code: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE code = ?1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists every product with its company and category names resolved.
    /// Dangling or empty references come back as `None`.
    pub async fn list_with_refs(&self) -> DbResult<Vec<ProductListing>> {
        let listings =
            sqlx::query_as::<_, ProductListing>(&format!("{SELECT_LISTING} ORDER BY p.code"))
                .fetch_all(&self.pool)
                .await?;

        debug!(count = listings.len(), "Listed products with references");
        Ok(listings)
    }

    /// Single product with references resolved.
    pub async fn get_listing(&self, code: i64) -> DbResult<Option<ProductListing>> {
        let listing =
            sqlx::query_as::<_, ProductListing>(&format!("{SELECT_LISTING} WHERE p.code = ?1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(listing)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown company or category
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(code = product.code, name = %product.name, "Inserting product");

        insert_product(&self.pool, product).await
    }

    /// Overwrites every column of an existing product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(code = product.code, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                purchase_cost_cents = ?3,
                selling_price_cents = ?4,
                quantity = ?5,
                quantity_limit = ?6,
                company_code = ?7,
                category_code = ?8
            WHERE code = ?1
            "#,
        )
        .bind(product.code)
        .bind(&product.name)
        .bind(product.purchase_cost_cents)
        .bind(product.selling_price_cents)
        .bind(product.quantity)
        .bind(product.quantity_limit)
        .bind(product.company_code)
        .bind(product.category_code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.display_code()));
        }

        Ok(())
    }

    /// Receives stock: adds `quantity` units to the product.
    ///
    /// Applied as a delta in SQL so two receipts recorded at the same time
    /// both land.
    ///
    /// ## Returns
    /// The product after the receipt.
    pub async fn add_stock(&self, code: i64, quantity: i64) -> DbResult<Product> {
        debug!(code, quantity, "Receiving stock");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET quantity = quantity + ?2
            WHERE code = ?1
            RETURNING
                code,
                name,
                purchase_cost_cents,
                selling_price_cents,
                quantity,
                quantity_limit,
                company_code,
                category_code
            "#,
        )
        .bind(code)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", code))
    }

    /// Products at or below their quantity limit (notification list).
    pub async fn below_limit(&self) -> DbResult<Vec<ProductListing>> {
        let listings = sqlx::query_as::<_, ProductListing>(&format!(
            "{SELECT_LISTING} WHERE p.quantity <= p.quantity_limit ORDER BY p.quantity, p.code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    /// One past the highest product code in use, or 1 for an empty table.
    pub async fn next_code(&self) -> DbResult<i64> {
        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(code), 0) + 1 FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(next)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Shared by the product and drug repositories; the drug insert runs it
/// inside its transaction.
pub(crate) async fn insert_product<'e, E>(executor: E, product: &Product) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO products (
            code, name, purchase_cost_cents, selling_price_cents,
            quantity, quantity_limit, company_code, category_code
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8
        )
        "#,
    )
    .bind(product.code)
    .bind(&product.name)
    .bind(product.purchase_cost_cents)
    .bind(product.selling_price_cents)
    .bind(product.quantity)
    .bind(product.quantity_limit)
    .bind(product.company_code)
    .bind(product.category_code)
    .execute(executor)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value(product.display_code()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use pharmacy_core::{Category, Company, Product};

    async fn db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.companies()
            .insert(&Company::new(1, "Bayer"))
            .await
            .unwrap();
        db.categories()
            .insert(&Category::new(2, "Painkillers"))
            .await
            .unwrap();
        db
    }

    fn product(code: i64, name: &str) -> Product {
        Product {
            code,
            name: name.to_string(),
            purchase_cost_cents: 250,
            selling_price_cents: 420,
            quantity: 10,
            quantity_limit: 3,
            company_code: Some(1),
            category_code: Some(2),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();
        let aspirin = product(1, "Aspirin");
        repo.insert(&aspirin).await.unwrap();

        assert_eq!(repo.get(1).await.unwrap(), Some(aspirin));
        assert_eq!(repo.get(2).await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_overwrites_every_field() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&product(1, "Aspirin")).await.unwrap();

        let changed = Product {
            name: "Aspirin 100mg".to_string(),
            purchase_cost_cents: 300,
            selling_price_cents: 500,
            quantity: 0,
            quantity_limit: 8,
            company_code: None,
            category_code: None,
            ..product(1, "")
        };
        repo.update(&changed).await.unwrap();
        assert_eq!(repo.get(1).await.unwrap(), Some(changed));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = db().await;
        let err = db.products().update(&product(5, "Ghost")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unknown_company_is_foreign_key_violation() {
        let db = db().await;
        let bad = Product {
            company_code: Some(99),
            ..product(1, "Aspirin")
        };
        let err = db.products().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_with_refs_resolves_names() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&product(1, "Aspirin")).await.unwrap();
        repo.insert(&Product {
            company_code: None,
            category_code: None,
            ..product(2, "Cotton")
        })
        .await
        .unwrap();

        let listings = repo.list_with_refs().await.unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].company_name.as_deref(), Some("Bayer"));
        assert_eq!(listings[0].category_name.as_deref(), Some("Painkillers"));
        assert!(!listings[0].is_drug);
        assert_eq!(listings[1].company_name, None);

        let single = repo.get_listing(2).await.unwrap().unwrap();
        assert_eq!(single.product.name, "Cotton");
    }

    #[tokio::test]
    async fn test_add_stock() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&product(1, "Aspirin")).await.unwrap();

        let after = repo.add_stock(1, 24).await.unwrap();
        assert_eq!(after.quantity, 34);

        let err = repo.add_stock(42, 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_below_limit() {
        let db = db().await;
        let repo = db.products();
        repo.insert(&product(1, "Aspirin")).await.unwrap();
        repo.insert(&Product {
            quantity: 3,
            ..product(2, "Ibuprofen")
        })
        .await
        .unwrap();

        let low = repo.below_limit().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product.code, 2);
    }

    #[tokio::test]
    async fn test_next_code() {
        let db = db().await;
        let repo = db.products();
        assert_eq!(repo.next_code().await.unwrap(), 1);
        repo.insert(&product(7, "Aspirin")).await.unwrap();
        assert_eq!(repo.next_code().await.unwrap(), 8);
    }
}
