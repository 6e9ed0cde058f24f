//! # fiscus-chat
//!
//! The retrieval-augmented conversational pipeline.
//!
//! One inbound utterance flows through:
//! 1. [`intent::IntentRouter`] — is this "create a ledger entry" or a question?
//! 2a. Create: [`creator::AutoCreator`] expands the intent into installment
//!     entries, persists them atomically, and schedules their indexing.
//! 2b. Query: [`retriever::SemanticRetriever`] + month aggregates +
//!     [`context`] build the grounding document; the generation provider
//!     streams the answer.
//!
//! [`pipeline::ChatPipeline`] orchestrates an exchange and emits
//! [`types::ExchangeEvent`]s into a bounded channel the session relays to
//! the client. Every exchange ends with exactly one `Done` event.

#![deny(unsafe_code)]

pub mod context;
pub mod creator;
pub mod errors;
pub mod intent;
pub mod ledger;
pub mod pipeline;
pub mod retriever;
pub mod types;

pub use errors::{ChatError, Result};
pub use ledger::LedgerService;
pub use pipeline::{ChatPipeline, ExchangeResult};
pub use types::{CreationIntent, ExchangeEvent, Intent, MonthRef, SourceCitation};
