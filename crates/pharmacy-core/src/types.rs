//! # Domain Types
//!
//! Entity records used throughout the back-office. Each record maps to one
//! table row; foreign keys are held as plain codes and resolved on demand.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Entity Records                                  │
//! │                                                                         │
//! │  ┌─────────────┐   ┌─────────────┐        ┌──────────────────┐          │
//! │  │  Company    │   │  Category   │        │      User        │          │
//! │  │  code, name │   │  code, name │        │  id, username    │          │
//! │  └──────┬──────┘   └──────┬──────┘        │  full_name       │          │
//! │         │ 1:N             │ 1:N           │  permissions ────┼─► 12 flags│
//! │         ▼                 ▼               └────────┬─────────┘          │
//! │  ┌───────────────────────────────┐                 │ N:M "favourites"   │
//! │  │ Product                       │                 ▼                    │
//! │  │ code, name, costs, quantity,  │        ┌──────────────────┐          │
//! │  │ quantity_limit                │        │     Client       │          │
//! │  └──────────────┬────────────────┘        │ id, fullname,    │          │
//! │                 │ extends                 │ address, phone   │          │
//! │  ┌──────────────▼────────────────┐        └──────────────────┘          │
//! │  │ Drug: quality + DrugBatch[]   │                                      │
//! │  └───────────────────────────────┘                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::codes::{format_code, CodeKind};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::permissions::UserPermissions;

// =============================================================================
// Company / Category
// =============================================================================

/// A manufacturer or supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    pub code: i64,
    pub name: String,
}

impl Company {
    pub fn new(code: i64, name: impl Into<String>) -> Self {
        Company {
            code,
            name: name.into(),
        }
    }

    /// Formatted code, e.g. `S0001`.
    pub fn display_code(&self) -> String {
        format_code(CodeKind::Company, self.code)
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub code: i64,
    pub name: String,
}

impl Category {
    pub fn new(code: i64, name: impl Into<String>) -> Self {
        Category {
            code,
            name: name.into(),
        }
    }

    /// Formatted code, e.g. `C0003`.
    pub fn display_code(&self) -> String {
        format_code(CodeKind::Category, self.code)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub code: i64,
    pub name: String,
    pub purchase_cost_cents: i64,
    pub selling_price_cents: i64,
    /// Units on hand.
    pub quantity: i64,
    /// Alert threshold: at or below this level the product shows up in
    /// notifications.
    pub quantity_limit: i64,
    pub company_code: Option<i64>,
    pub category_code: Option<i64>,
}

impl Product {
    /// Formatted code, e.g. `P000012`.
    pub fn display_code(&self) -> String {
        format_code(CodeKind::Product, self.code)
    }

    #[inline]
    pub fn purchase_cost(&self) -> Money {
        Money::from_cents(self.purchase_cost_cents)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Per-unit gross margin.
    pub fn margin(&self) -> Money {
        self.selling_price() - self.purchase_cost()
    }

    /// Value of the units on hand at purchase cost.
    ///
    /// ## Returns
    /// * `Err(CoreError::AmountOverflow)` - Cost times quantity exceeds `i64` cents
    pub fn stock_value(&self) -> CoreResult<Money> {
        self.purchase_cost()
            .checked_mul(self.quantity)
            .ok_or_else(|| CoreError::AmountOverflow {
                what: format!("stock value of {}", self.display_code()),
            })
    }

    pub fn is_below_limit(&self) -> bool {
        self.quantity <= self.quantity_limit
    }

    /// Copy with `received` units added to stock.
    pub fn with_added_stock(mut self, received: i64) -> Self {
        self.quantity += received;
        self
    }
}

/// A product joined with the names of the company and category it
/// references. This is what product tables display and filter on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductListing {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub product: Product,
    pub company_name: Option<String>,
    pub category_name: Option<String>,
    pub is_drug: bool,
}

// =============================================================================
// Drug
// =============================================================================

/// One delivered lot of a drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DrugBatch {
    pub batch_code: String,
    pub product_code: i64,
    pub quantity: i64,
    pub expiration_date: NaiveDate,
}

impl DrugBatch {
    /// Expired when the expiration date lies strictly before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date < today
    }
}

/// A product with pharmaceutical quality control and batch tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drug {
    #[serde(flatten)]
    pub product: Product,
    /// Passed quality control.
    pub quality: bool,
    pub batches: Vec<DrugBatch>,
}

impl Drug {
    pub fn new(product: Product, quality: bool) -> Self {
        Drug {
            product,
            quality,
            batches: Vec::new(),
        }
    }

    /// Units accounted for by batches.
    pub fn batch_quantity(&self) -> i64 {
        self.batches.iter().map(|b| b.quantity).sum()
    }

    pub fn expired_batches(&self, today: NaiveDate) -> Vec<&DrugBatch> {
        self.batches.iter().filter(|b| b.is_expired(today)).collect()
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string; never the clear-text password.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub permissions: UserPermissions,
}

/// Input for creating a user. Carries the clear-text password until the
/// database layer hashes it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub permissions: UserPermissions,
}

// =============================================================================
// Client
// =============================================================================

/// A pharmacy customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub fullname: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub fullname: String,
    pub address: String,
    pub phone: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn aspirin() -> Product {
        Product {
            code: 12,
            name: "Aspirin 500mg".to_string(),
            purchase_cost_cents: 250,
            selling_price_cents: 420,
            quantity: 10,
            quantity_limit: 5,
            company_code: Some(1),
            category_code: None,
        }
    }

    fn batch(code: &str, qty: i64, expires: (i32, u32, u32)) -> DrugBatch {
        DrugBatch {
            batch_code: code.to_string(),
            product_code: 12,
            quantity: qty,
            expiration_date: NaiveDate::from_ymd_opt(expires.0, expires.1, expires.2).unwrap(),
        }
    }

    #[test]
    fn test_display_codes() {
        assert_eq!(aspirin().display_code(), "P000012");
        assert_eq!(Company::new(121, "Drugs").display_code(), "S0121");
        assert_eq!(Category::new(3, "Vitamins").display_code(), "C0003");
    }

    #[test]
    fn test_product_money() {
        let p = aspirin();
        assert_eq!(p.margin().cents(), 170);
        assert_eq!(p.stock_value().unwrap().cents(), 2500);
    }

    #[test]
    fn test_stock_value_overflow_is_an_error() {
        let p = Product {
            purchase_cost_cents: 250,
            quantity: i64::MAX / 100,
            ..aspirin()
        };
        assert!(matches!(
            p.stock_value(),
            Err(CoreError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_below_limit_is_inclusive() {
        let p = aspirin();
        assert!(!p.is_below_limit());

        let low = Product { quantity: 5, ..p };
        assert!(low.is_below_limit());
    }

    #[test]
    fn test_with_added_stock() {
        assert_eq!(aspirin().with_added_stock(7).quantity, 17);
    }

    #[test]
    fn test_drug_batches() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut drug = Drug::new(aspirin(), true);
        drug.batches.push(batch("A1", 4, (2026, 5, 31)));
        drug.batches.push(batch("A2", 6, (2026, 6, 1)));

        assert_eq!(drug.batch_quantity(), 10);
        let expired = drug.expired_batches(today);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].batch_code, "A1");
    }

    #[test]
    fn test_user_serialization_omits_password_hash() {
        let user = User {
            id: 1,
            username: "admin".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: "Admin".to_string(),
            permissions: UserPermissions::default(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"username\":\"admin\""));
    }
}
