//! # fiscus-llm
//!
//! Generation provider trait and shared streaming utilities.
//!
//! Defines the [`provider::GenerationProvider`] trait the conversational
//! pipeline consumes:
//! - Streaming text generation as a boxed token stream
//! - Non-streaming JSON-mode generation for structured extraction
//! - Shared NDJSON line parser (Ollama streams one JSON object per line)
//! - [`provider::MockGenerationProvider`] for deterministic tests

#![deny(unsafe_code)]

pub mod errors;
pub mod lines;
pub mod ollama;
pub mod provider;

pub use errors::{LlmError, Result, TokenStream};
pub use ollama::OllamaProvider;
pub use provider::{GenerationProvider, MockGenerationProvider};
