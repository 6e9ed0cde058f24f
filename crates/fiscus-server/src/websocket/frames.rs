//! Wire frame protocol.
//!
//! Inbound: `{"message": "..."}`. Outbound: tagged frames
//! `{"type": "status" | "token" | "sources" | "done", "content": ...}`.

use serde::{Deserialize, Serialize};

use fiscus_chat::{ExchangeEvent, SourceCitation};

/// Content of the `done` frame.
pub const DONE_CONTENT: &str = "Resumo concluído";

/// An inbound client message.
#[derive(Debug, Deserialize)]
pub struct Inbound {
    /// The utterance.
    #[serde(default)]
    pub message: String,
}

/// An outbound tagged frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Frame {
    /// Progress note.
    Status(String),
    /// One generated text fragment.
    Token(String),
    /// Cited sources for the streamed answer.
    Sources(Vec<SourceCitation>),
    /// Terminal frame of an exchange.
    Done(String),
}

impl Frame {
    /// Serialize to the wire string. Infallible shapes only.
    #[must_use]
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // Frame variants contain only serializable data.
            "{\"type\":\"done\",\"content\":\"\"}".to_string()
        })
    }
}

impl From<ExchangeEvent> for Frame {
    fn from(event: ExchangeEvent) -> Self {
        match event {
            ExchangeEvent::Status(text) => Self::Status(text),
            ExchangeEvent::Token(text) => Self::Token(text),
            ExchangeEvent::Sources(citations) => Self::Sources(citations),
            ExchangeEvent::Done => Self::Done(DONE_CONTENT.to_string()),
        }
    }
}

/// Parse an inbound payload into a non-blank utterance.
///
/// Blank or unparseable payloads return `None` and are dropped by the
/// session — the state machine stays in `AwaitingInput`.
#[must_use]
pub fn parse_inbound(text: &str) -> Option<String> {
    let inbound: Inbound = serde_json::from_str(text).ok()?;
    let message = inbound.message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_frame_wire_shape() {
        let wire = Frame::Status("Analisando contexto...".into()).to_wire();
        let value: serde_json::Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["type"], "status");
        assert_eq!(value["content"], "Analisando contexto...");
    }

    #[test]
    fn token_frame_wire_shape() {
        let wire = Frame::Token("R$ 50,00".into()).to_wire();
        let value: serde_json::Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["type"], "token");
        assert_eq!(value["content"], "R$ 50,00");
    }

    #[test]
    fn sources_frame_wire_shape() {
        let citations = vec![SourceCitation {
            entry_id: "e1".into(),
            content: "Lançamento ...".into(),
            registered_at: "07/03/2025".into(),
        }];
        let wire = Frame::Sources(citations).to_wire();
        let value: serde_json::Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["type"], "sources");
        assert_eq!(value["content"][0]["entryId"], "e1");
    }

    #[test]
    fn done_frame_from_event() {
        let frame = Frame::from(ExchangeEvent::Done);
        let value: serde_json::Value = serde_json::from_str(&frame.to_wire()).unwrap();
        assert_eq!(value["type"], "done");
        assert_eq!(value["content"], DONE_CONTENT);
    }

    #[test]
    fn parse_inbound_valid() {
        assert_eq!(
            parse_inbound(r#"{"message": "quanto gastei?"}"#).as_deref(),
            Some("quanto gastei?")
        );
    }

    #[test]
    fn parse_inbound_trims() {
        assert_eq!(
            parse_inbound(r#"{"message": "  oi  "}"#).as_deref(),
            Some("oi")
        );
    }

    #[test]
    fn blank_message_dropped() {
        assert!(parse_inbound(r#"{"message": ""}"#).is_none());
        assert!(parse_inbound(r#"{"message": "   "}"#).is_none());
        assert!(parse_inbound(r#"{}"#).is_none());
    }

    #[test]
    fn unparseable_payload_dropped() {
        assert!(parse_inbound("not json").is_none());
        assert!(parse_inbound(r#"{"message": 42}"#).is_none());
    }
}
