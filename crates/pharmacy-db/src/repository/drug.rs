//! # Drug Repository
//!
//! Database operations for drugs and their batches.
//!
//! A drug is stored as a regular `products` row plus a `drugs` row carrying
//! the quality-control flag. Batches hang off the drug row.
//!
//! ## Receiving a Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_batch(B-7781, 24 units, expires 2027-03-01)                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT drug_batches (B-7781, P000012, 24, 2027-03-01)                │
//! │    UPDATE products SET quantity = quantity + 24 WHERE code = 12         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Either both land or neither does.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::insert_product;
use pharmacy_core::{Drug, DrugBatch, Product};

const SELECT_DRUG: &str = r#"
    SELECT
        p.code,
        p.name,
        p.purchase_cost_cents,
        p.selling_price_cents,
        p.quantity,
        p.quantity_limit,
        p.company_code,
        p.category_code,
        d.quality
    FROM drugs d
    JOIN products p ON p.code = d.product_code
"#;

const SELECT_BATCH: &str = r#"
    SELECT batch_code, product_code, quantity, expiration_date
    FROM drug_batches
"#;

/// Product columns plus the drug's quality flag.
#[derive(Debug, sqlx::FromRow)]
struct DrugRow {
    #[sqlx(flatten)]
    product: Product,
    quality: bool,
}

impl DrugRow {
    fn into_drug(self, batches: Vec<DrugBatch>) -> Drug {
        Drug {
            product: self.product,
            quality: self.quality,
            batches,
        }
    }
}

/// Repository for drug database operations.
#[derive(Debug, Clone)]
pub struct DrugRepository {
    pool: SqlitePool,
}

impl DrugRepository {
    /// Creates a new DrugRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DrugRepository { pool }
    }

    /// Inserts the product row, the drug row and every batch in one
    /// transaction. The product's quantity is stored as given.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Product code or a batch code already exists
    pub async fn insert(&self, drug: &Drug) -> DbResult<()> {
        debug!(
            code = drug.product.code,
            name = %drug.product.name,
            batches = drug.batches.len(),
            "Inserting drug"
        );

        let mut tx = self.pool.begin().await?;

        insert_product(&mut *tx, &drug.product).await?;

        sqlx::query("INSERT INTO drugs (product_code, quality) VALUES (?1, ?2)")
            .bind(drug.product.code)
            .bind(drug.quality)
            .execute(&mut *tx)
            .await?;

        for batch in &drug.batches {
            insert_batch(&mut *tx, drug.product.code, batch).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Gets a drug with its batches (ordered by expiration date).
    pub async fn get(&self, code: i64) -> DbResult<Option<Drug>> {
        let row = sqlx::query_as::<_, DrugRow>(&format!("{SELECT_DRUG} WHERE d.product_code = ?1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let batches = self.batches(code).await?;
                Ok(Some(row.into_drug(batches)))
            }
            None => Ok(None),
        }
    }

    /// Lists every drug with its batches, ordered by product code.
    pub async fn get_all(&self) -> DbResult<Vec<Drug>> {
        let rows = sqlx::query_as::<_, DrugRow>(&format!("{SELECT_DRUG} ORDER BY p.code"))
            .fetch_all(&self.pool)
            .await?;

        let all_batches = sqlx::query_as::<_, DrugBatch>(&format!(
            "{SELECT_BATCH} ORDER BY expiration_date, batch_code"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<i64, Vec<DrugBatch>> = HashMap::new();
        for batch in all_batches {
            by_product.entry(batch.product_code).or_default().push(batch);
        }

        let drugs = rows
            .into_iter()
            .map(|row| {
                let batches = by_product.remove(&row.product.code).unwrap_or_default();
                row.into_drug(batches)
            })
            .collect();

        Ok(drugs)
    }

    /// Records the outcome of quality control.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No drug with this code
    pub async fn update_quality(&self, code: i64, quality: bool) -> DbResult<()> {
        debug!(code, quality, "Updating drug quality");

        let result = sqlx::query("UPDATE drugs SET quality = ?2 WHERE product_code = ?1")
            .bind(code)
            .bind(quality)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Drug", code));
        }

        Ok(())
    }

    /// Receives a batch: inserts it and adds its quantity to the product's
    /// stock in one transaction.
    ///
    /// ## Returns
    /// The drug's product row after the receipt.
    ///
    /// * `Err(DbError::NotFound)` - The product is not a drug
    /// * `Err(DbError::UniqueViolation)` - Batch code already recorded
    pub async fn add_batch(&self, batch: &DrugBatch) -> DbResult<Product> {
        debug!(
            code = batch.product_code,
            batch = %batch.batch_code,
            quantity = batch.quantity,
            expires = %batch.expiration_date,
            "Receiving drug batch"
        );

        let mut tx = self.pool.begin().await?;

        let is_drug: Option<i64> =
            sqlx::query_scalar("SELECT product_code FROM drugs WHERE product_code = ?1")
                .bind(batch.product_code)
                .fetch_optional(&mut *tx)
                .await?;
        if is_drug.is_none() {
            return Err(DbError::not_found("Drug", batch.product_code));
        }

        insert_batch(&mut *tx, batch.product_code, batch).await?;

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
        .bind(batch.product_code)
        .bind(batch.quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(product)
    }

    /// Batches of one drug, soonest expiry first.
    pub async fn batches(&self, code: i64) -> DbResult<Vec<DrugBatch>> {
        let batches = sqlx::query_as::<_, DrugBatch>(&format!(
            "{SELECT_BATCH} WHERE product_code = ?1 ORDER BY expiration_date, batch_code"
        ))
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Batches of any drug expiring strictly before `date`, soonest first.
    pub async fn expiring_before(&self, date: NaiveDate) -> DbResult<Vec<DrugBatch>> {
        let batches = sqlx::query_as::<_, DrugBatch>(&format!(
            "{SELECT_BATCH} WHERE expiration_date < ?1 ORDER BY expiration_date, batch_code"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        debug!(before = %date, count = batches.len(), "Listed expiring batches");
        Ok(batches)
    }
}

async fn insert_batch<'e, E>(executor: E, product_code: i64, batch: &DrugBatch) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO drug_batches (batch_code, product_code, quantity, expiration_date)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&batch.batch_code)
    .bind(product_code)
    .bind(batch.quantity)
    .bind(batch.expiration_date)
    .execute(executor)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value(batch.batch_code.clone()))?;

    Ok(())
}
