//! WebSocket session lifecycle — handles a single connected client from
//! upgrade through disconnect.
//!
//! State machine:
//! `Unauthenticated → Authenticated → AwaitingInput ⇄ Processing → Closed`.
//!
//! - Establishment validates the credential and conversation ownership;
//!   failure closes the channel with close code 1008 and no frames.
//! - Blank or unparseable inbound payloads are dropped in `AwaitingInput`.
//! - Message handling is strictly sequential: a second inbound message is
//!   not read while an exchange is processing.
//! - The user message is persisted before processing; the assistant message
//!   is persisted once, as the full reconstruction, after the done frame
//!   logic has run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use fiscus_chat::{ExchangeEvent, MonthRef};
use fiscus_core::{ConversationId, MessageRole, OwnerId};
use fiscus_store::ConversationRepository;

use crate::auth::verify_token;
use crate::server::AppState;
use crate::websocket::frames::{parse_inbound, Frame};

/// Close code for authentication/authorization failure (policy violation).
const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Close code sent when the session ceiling is reached (try again later).
const CLOSE_TRY_AGAIN_LATER: u16 = 1013;

/// Session lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Credential not yet validated.
    Unauthenticated,
    /// Credential and conversation ownership validated.
    Authenticated,
    /// Idle, waiting for an inbound message.
    AwaitingInput,
    /// An exchange is running; no further input is read.
    Processing,
    /// Terminal; all per-connection resources released.
    Closed,
}

/// Decrements the active-session gauge on drop.
struct SessionSlot {
    active: Arc<AtomicUsize>,
}

impl SessionSlot {
    /// Try to occupy a session slot under the configured ceiling.
    fn acquire(active: &Arc<AtomicUsize>, max_sessions: usize) -> Option<Self> {
        let acquired = active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < max_sessions).then_some(current + 1)
            })
            .is_ok();
        acquired.then(|| Self {
            active: active.clone(),
        })
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        let _ = self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Run a WebSocket chat session for a connected client.
#[instrument(skip_all, fields(conversation_id = %conversation_id))]
pub async fn run_chat_session(
    ws: WebSocket,
    conversation_id: String,
    token: Option<String>,
    state: AppState,
) {
    let mut session_state = SessionState::Unauthenticated;

    // Unauthenticated → Authenticated, or immediate policy close.
    let Some(owner) = token
        .as_deref()
        .and_then(|t| verify_token(&state.auth_secret, t))
    else {
        debug!(state = ?session_state, "credential rejected, closing channel");
        close_policy(ws, "Token inválido").await;
        return;
    };

    let conversation = ConversationId::from_string(conversation_id);
    if !conversation_is_owned(&state, &conversation, &owner) {
        // Not-found semantics: a foreign conversation closes exactly like a
        // missing one, with no detail.
        debug!(owner = %owner, "conversation absent or foreign, closing channel");
        close_policy(ws, "Conversa não encontrada").await;
        return;
    }
    session_state = SessionState::Authenticated;
    debug!(owner = %owner, state = ?session_state, "credential and ownership validated");

    let Some(_slot) = SessionSlot::acquire(&state.active_sessions, state.config.max_sessions)
    else {
        warn!("session ceiling reached, refusing connection");
        close_with(ws, CLOSE_TRY_AGAIN_LATER, "Tente novamente mais tarde").await;
        return;
    };

    info!(owner = %owner, "chat session established");
    let (mut ws_tx, mut ws_rx) = ws.split();

    // Outbound forwarder: one ordered, backpressured channel per session.
    let (send_tx, mut send_rx) = mpsc::channel::<String>(state.config.send_buffer);
    let outbound = tokio::spawn(async move {
        while let Some(text) = send_rx.recv().await {
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    session_state = SessionState::AwaitingInput;
    debug!(owner = %owner, state = ?session_state, "ready for input");
    while let Some(Ok(message)) = ws_rx.next().await {
        let text = match message {
            Message::Text(text) => text.to_string(),
            Message::Close(_) => {
                debug!(owner = %owner, "client sent close frame");
                break;
            }
            // Pings are answered by axum; binary input is not part of the
            // protocol and is dropped.
            _ => continue,
        };

        let Some(utterance) = parse_inbound(&text) else {
            debug!(owner = %owner, "dropping blank or unparseable inbound payload");
            continue;
        };

        session_state = SessionState::Processing;
        debug!(owner = %owner, state = ?session_state, "exchange started");
        // The user message lands before any processing.
        if let Err(e) = persist_message(&state, &conversation, MessageRole::User, &utterance, None)
        {
            error!(owner = %owner, error = %e, "failed to persist user message, closing session");
            break;
        }

        let result = run_exchange(&state, &owner, &utterance, &send_tx).await;

        // Full reconstruction, persisted once after the done-frame logic.
        if !result.reply.is_empty() {
            if let Err(e) = persist_message(
                &state,
                &conversation,
                MessageRole::Assistant,
                &result.reply,
                result.sources.as_ref(),
            ) {
                error!(owner = %owner, error = %e, "failed to persist assistant message");
            }
        }
        session_state = SessionState::AwaitingInput;
        debug!(owner = %owner, state = ?session_state, "exchange finished");
    }

    session_state = SessionState::Closed;
    debug!(owner = %owner, state = ?session_state, "chat session closed");
    outbound.abort();
}

/// Run one exchange, bridging pipeline events onto the outbound channel.
async fn run_exchange(
    state: &AppState,
    owner: &OwnerId,
    utterance: &str,
    send_tx: &mpsc::Sender<String>,
) -> fiscus_chat::ExchangeResult {
    let (event_tx, forwarder) = spawn_event_forwarder(send_tx.clone());
    let result = state
        .pipeline
        .handle_exchange(owner, utterance, MonthRef::current(), &event_tx)
        .await;
    drop(event_tx);
    let _ = forwarder.await;
    result
}

/// Bridge [`ExchangeEvent`]s to wire frames on the outbound channel.
///
/// Returns the event sender and the forwarder task; the task ends when the
/// sender is dropped and the channel drains.
fn spawn_event_forwarder(
    send_tx: mpsc::Sender<String>,
) -> (mpsc::Sender<ExchangeEvent>, JoinHandle<()>) {
    let (event_tx, mut event_rx) = mpsc::channel::<ExchangeEvent>(64);
    let handle = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let frame = Frame::from(event);
            if send_tx.send(frame.to_wire()).await.is_err() {
                break;
            }
        }
    });
    (event_tx, handle)
}

fn conversation_is_owned(
    state: &AppState,
    conversation: &ConversationId,
    owner: &OwnerId,
) -> bool {
    state
        .pool
        .get()
        .ok()
        .and_then(|conn| {
            ConversationRepository::get(&conn, conversation, owner)
                .ok()
                .flatten()
        })
        .is_some()
}

fn persist_message(
    state: &AppState,
    conversation: &ConversationId,
    role: MessageRole,
    content: &str,
    sources: Option<&serde_json::Value>,
) -> fiscus_store::Result<()> {
    let conn = state
        .pool
        .get()
        .map_err(|e| fiscus_store::StoreError::Pool(e.to_string()))?;
    let _ = ConversationRepository::append_message(&conn, conversation, role, content, sources)?;
    Ok(())
}

async fn close_policy(ws: WebSocket, reason: &str) {
    close_with(ws, CLOSE_POLICY_VIOLATION, reason).await;
}

async fn close_with(mut ws: WebSocket, code: u16, reason: &str) {
    let _ = ws
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.to_string().into(),
        })))
        .await;
}
