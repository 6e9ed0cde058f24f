//! WebSocket chat sessions.

pub mod frames;
pub mod session;

pub use frames::Frame;
pub use session::run_chat_session;
