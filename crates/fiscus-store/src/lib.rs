//! # fiscus-store
//!
//! `SQLite` persistence for the fiscus ledger.
//!
//! - Connection pooling via `r2d2` with WAL mode and foreign keys enabled
//! - Versioned schema migrations
//! - Stateless repositories for ledger entries, categories, and
//!   conversations/messages — all methods take a `&Connection` and are pure
//!   functions translating between Rust types and SQL
//!
//! Ownership scoping is enforced in every query: no row of another owner is
//! ever readable through this crate's APIs.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;
pub mod types;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection};
pub use errors::{Result, StoreError};
pub use repositories::categories::CategoryRepository;
pub use repositories::conversations::ConversationRepository;
pub use repositories::ledger::LedgerRepository;
