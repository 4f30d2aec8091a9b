//! # Category Repository
//!
//! Database operations for product categories.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharmacy_core::Category;

/// Repository for category database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CategoryRepository::new(pool);
///
/// let created = repo.create("Vitamins").await?; // C0001
/// let all = repo.get_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists every category, ordered by code.
    pub async fn get_all(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT code, name
            FROM categories
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Category))` - Category found
    /// * `Ok(None)` - Category not found
    pub async fn get(&self, code: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT code, name
            FROM categories
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a category with a caller-chosen code.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already taken
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(code = category.code, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (code, name)
            VALUES (?1, ?2)
            "#,
        )
        .bind(category.code)
        .bind(&category.name)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(category.display_code()))?;

        Ok(())
    }

    /// Overwrites a category's name.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No category with this code
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(code = category.code, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories SET name = ?2
            WHERE code = ?1
            "#,
        )
        .bind(category.code)
        .bind(&category.name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", category.display_code()));
        }

        Ok(())
    }

    /// One past the highest code in use, or 1 for an empty table.
    pub async fn next_code(&self) -> DbResult<i64> {
        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(code), 0) + 1 FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(next)
    }

    /// Allocates the next code and inserts a category under it.
    pub async fn create(&self, name: &str) -> DbResult<Category> {
        let category = Category::new(self.next_code().await?, name.trim());
        self.insert(&category).await?;
        Ok(category)
    }

    /// Every category with the number of products filed under it.
    /// Empty categories are included with a count of zero.
    pub async fn get_all_with_counts(&self) -> DbResult<Vec<(Category, i64)>> {
        let rows: Vec<(i64, String, i64)> = sqlx::query_as(
            r#"
            SELECT c.code, c.name, COUNT(p.code)
            FROM categories c
            LEFT JOIN products p ON p.category_code = c.code
            GROUP BY c.code, c.name
            ORDER BY c.code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(code, name, count)| (Category::new(code, name), count))
            .collect())
    }
}
