//! # fiscus-core
//!
//! Foundation types for the fiscus personal-finance assistant.
//!
//! This crate provides the shared vocabulary that all other fiscus crates
//! depend on:
//!
//! - **Branded IDs**: `OwnerId`, `EntryId`, `ConversationId`, ... as newtypes
//!   for type safety
//! - **Money**: [`money::Amount`] — fixed-point integer cents with pt-BR
//!   currency formatting
//! - **Kinds**: [`kind::EntryKind`] (income/expense) and
//!   [`kind::MessageRole`] with their SQL string mappings
//! - **Dates**: calendar-month helpers (bounds, clamped month arithmetic,
//!   pt-BR formatting)

#![deny(unsafe_code)]

pub mod dates;
pub mod ids;
pub mod kind;
pub mod money;

pub use ids::{CategoryId, ConversationId, EntryId, GroupId, MessageId, OwnerId};
pub use kind::{EntryKind, MessageRole};
pub use money::Amount;
