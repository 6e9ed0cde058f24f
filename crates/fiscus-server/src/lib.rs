//! # fiscus-server
//!
//! Axum HTTP + WebSocket server.
//!
//! One WebSocket connection = one chat session over one conversation:
//! `GET /ws/{conversation_id}?token=...`. The session validates the
//! credential and conversation ownership before any frame flows, relays
//! pipeline events as tagged wire frames, and keeps message handling
//! strictly sequential within the connection.

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod errors;
pub mod server;
pub mod websocket;

pub use config::ServerConfig;
pub use errors::{Result, ServerError};
pub use server::{AppState, FiscusServer};
