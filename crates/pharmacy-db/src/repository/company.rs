//! # Company Repository
//!
//! Database operations for companies (manufacturers/suppliers).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharmacy_core::Company;

/// Repository for company database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CompanyRepository::new(pool);
///
/// let created = repo.create("Bayer").await?;   // S0001
/// let all = repo.get_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Lists every company, ordered by code.
    pub async fn get_all(&self) -> DbResult<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT code, name
            FROM companies
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    /// Gets a company by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Company))` - Company found
    /// * `Ok(None)` - Company not found
    pub async fn get(&self, code: i64) -> DbResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT code, name
            FROM companies
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// Inserts a company with a caller-chosen code.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already taken
    pub async fn insert(&self, company: &Company) -> DbResult<()> {
        debug!(code = company.code, name = %company.name, "Inserting company");

        sqlx::query(
            r#"
            INSERT INTO companies (code, name)
            VALUES (?1, ?2)
            "#,
        )
        .bind(company.code)
        .bind(&company.name)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(company.display_code()))?;

        Ok(())
    }

    /// Overwrites a company's name.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No company with this code
    pub async fn update(&self, company: &Company) -> DbResult<()> {
        debug!(code = company.code, "Updating company");

        let result = sqlx::query(
            r#"
            UPDATE companies SET name = ?2
            WHERE code = ?1
            "#,
        )
        .bind(company.code)
        .bind(&company.name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Company", company.display_code()));
        }

        Ok(())
    }

    /// One past the highest code in use, or 1 for an empty table.
    pub async fn next_code(&self) -> DbResult<i64> {
        let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(code), 0) + 1 FROM companies")
            .fetch_one(&self.pool)
            .await?;

        Ok(next)
    }

    /// Allocates the next code and inserts a company under it.
    pub async fn create(&self, name: &str) -> DbResult<Company> {
        let company = Company::new(self.next_code().await?, name.trim());
        self.insert(&company).await?;
        Ok(company)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use pharmacy_core::Company;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_all() {
        let db = db().await;
        let repo = db.companies();
        let companies = [
            Company::new(121, "Drugs"),
            Company::new(122, "Food"),
            Company::new(123, "Clothes"),
        ];
        for c in &companies {
            repo.insert(c).await.unwrap();
        }

        let all = repo.get_all().await.unwrap();
        assert_eq!(all, companies.to_vec());
    }

    #[tokio::test]
    async fn test_update_overwrites_name() {
        let db = db().await;
        let repo = db.companies();
        repo.insert(&Company::new(1, "Bayer")).await.unwrap();

        repo.update(&Company::new(1, "Bayer AG")).await.unwrap();
        assert_eq!(repo.get(1).await.unwrap().unwrap().name, "Bayer AG");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = db().await;
        let err = db
            .companies()
            .update(&Company::new(9, "Nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let db = db().await;
        let repo = db.companies();
        repo.insert(&Company::new(1, "Bayer")).await.unwrap();

        let err = repo.insert(&Company::new(1, "Pfizer")).await.unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "S0001"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_allocates_sequential_codes() {
        let db = db().await;
        let repo = db.companies();
        assert_eq!(repo.next_code().await.unwrap(), 1);

        let first = repo.create(" Bayer ").await.unwrap();
        let second = repo.create("Pfizer").await.unwrap();
        assert_eq!(first.code, 1);
        assert_eq!(first.name, "Bayer");
        assert_eq!(second.code, 2);
        assert!(repo.get(3).await.unwrap().is_none());
    }
}
