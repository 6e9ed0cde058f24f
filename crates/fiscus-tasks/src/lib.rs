//! # fiscus-tasks
//!
//! `SQLite`-backed at-least-once job queue.
//!
//! Enqueuing inserts a row and wakes the worker pool — it never blocks on
//! execution. Workers claim the oldest queued job, run the registered
//! handler, delete the row on success, and requeue on failure. Jobs stuck
//! `running` past a visibility timeout are redelivered, so handlers must be
//! idempotent — the indexing job in [`jobs`] upserts by entry ID.

#![deny(unsafe_code)]

pub mod errors;
pub mod jobs;
pub mod repository;
pub mod types;
pub mod worker;

pub use errors::{Result, TaskError};
pub use jobs::{index_entry_args, IndexEntryJob, INDEX_ENTRY_JOB};
pub use repository::JobRepository;
pub use types::{Job, JobStatus};
pub use worker::{HandlerRegistry, JobHandler, TaskQueue, WorkerPool, WorkerPoolConfig};
