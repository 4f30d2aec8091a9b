//! # pharmacy-core: Pure Domain Logic for the Pharmacy Back-Office
//!
//! This crate holds the entity records and the rules around them as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Pharmacy Back-Office Architecture                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pharmacy-cli (front end)                     │   │
//! │  │    login ──► menu ──► products / clients / users commands       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ pharmacy-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   codes   │  │ permissions │  │ session  │  │   │
//! │  │   │  Product  │  │  P000012  │  │  12 flags   │  │  menu    │  │   │
//! │  │   │  Drug     │  │  C0003    │  │  nesting    │  │  gating  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  pharmacy-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity records (Company, Category, Product, Drug, User, Client)
//! - [`codes`] - Formatted display codes (`P000012`, `C0003`, `S0001`)
//! - [`permissions`] - The twelve permission flags and their nesting rules
//! - [`session`] - Authenticated session and main-menu gating
//! - [`filter`] - Product list filtering
//! - [`money`] - Integer-cents money type
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pharmacy_core::codes::{format_code, parse_code, CodeKind};
//!
//! assert_eq!(format_code(CodeKind::Product, 12), "P000012");
//! assert_eq!(parse_code(CodeKind::Product, "P000012").unwrap(), 12);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codes;
pub mod error;
pub mod filter;
pub mod money;
pub mod permissions;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use permissions::{Permission, UserPermissions};
pub use session::{MenuAction, Session};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted for a single stock movement.
///
/// Guards against typing 10000 instead of 100 at the receiving desk.
pub const MAX_STOCK_MOVEMENT: i64 = 9_999;

/// Largest stock level a product may hold.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest price accepted, in cents (100 million).
///
/// With [`MAX_QUANTITY`] this keeps stock values well inside `i64` cents.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 4;
