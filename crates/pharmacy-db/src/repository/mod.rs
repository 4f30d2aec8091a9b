//! # Repository Module
//!
//! One repository per entity, each holding a clone of the pool.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                            │
//! │       │                                                                 │
//! │       │  db.products().add_stock(12, 24)                                │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── get_all / get / insert / update                                    │
//! │  ├── list_with_refs / below_limit                                       │
//! │  └── add_stock / next_code                                              │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CompanyRepository`](company::CompanyRepository) - Manufacturers/suppliers
//! - [`CategoryRepository`](category::CategoryRepository) - Product categories
//! - [`ProductRepository`](product::ProductRepository) - Products and stock
//! - [`DrugRepository`](drug::DrugRepository) - Drugs, quality and batches
//! - [`UserRepository`](user::UserRepository) - Accounts, permissions, login
//! - [`ClientRepository`](client::ClientRepository) - Clients and personal lists

pub mod category;
pub mod client;
pub mod company;
pub mod drug;
pub mod product;
pub mod user;
