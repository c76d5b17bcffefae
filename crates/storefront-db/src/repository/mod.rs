//! # Repository Module
//!
//! Database repository implementations for Storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Coordinator (storefront-engine)                                       │
//! │       │                                                                 │
//! │       │  db.products().get_by_sku("A1")                                │
//! │       │  ProductRepository::try_decrement_stock(&mut tx, "A1", 3)      │
//! │       ▼                                                                 │
//! │  Repository                                                            │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Two flavors of method:                                                 │
//! │  • `&self` methods run on the pool (single-statement reads/writes)     │
//! │  • Associated fns taking `&mut SqliteConnection` run inside a caller-  │
//! │    owned transaction, so multiple statements commit or roll back as    │
//! │    one unit                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - the inventory store
//! - [`order::OrderRepository`] - the order ledger

pub mod order;
pub mod product;
