//! Conversation and message repository.
//!
//! Conversations are owner-scoped; messages hang off a conversation and are
//! only reachable through it. Appending a message also bumps the
//! conversation's `updated_at` so listings sort by recent activity.

use rusqlite::{params, Connection, OptionalExtension, Row};

use fiscus_core::{ConversationId, MessageId, MessageRole, OwnerId};

use crate::errors::{Result, StoreError};
use crate::repositories::now_iso;
use crate::types::{Conversation, Message};

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: ConversationId::from_string(row.get(0)?),
        owner_id: row.get::<_, String>(1)?.into(),
        title: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let sources: Option<String> = row.get(4)?;
    Ok(Message {
        id: MessageId::from_string(row.get(0)?),
        conversation_id: ConversationId::from_string(row.get(1)?),
        // CHECK constraint guarantees a valid role
        role: MessageRole::from_sql(&role).unwrap_or(MessageRole::User),
        content: row.get(3)?,
        sources: sources.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get(5)?,
    })
}

/// Conversation repository for SQL CRUD operations.
pub struct ConversationRepository;

impl ConversationRepository {
    /// Create a conversation.
    pub fn create(conn: &Connection, owner: &OwnerId, title: &str) -> Result<Conversation> {
        let id = ConversationId::new();
        let now = now_iso();
        let _ = conn.execute(
            "INSERT INTO conversations (id, owner_id, title, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id.as_str(), owner.as_str(), title, now],
        )?;
        Self::get(conn, &id, owner)?.ok_or_else(|| {
            StoreError::InvalidData(format!("conversation {id} vanished after insert"))
        })
    }

    /// Get a conversation scoped to its owner. Foreign rows read as absent.
    pub fn get(
        conn: &Connection,
        id: &ConversationId,
        owner: &OwnerId,
    ) -> Result<Option<Conversation>> {
        let conversation = conn
            .query_row(
                "SELECT id, owner_id, title, created_at, updated_at FROM conversations \
                 WHERE id = ?1 AND owner_id = ?2",
                params![id.as_str(), owner.as_str()],
                conversation_from_row,
            )
            .optional()?;
        Ok(conversation)
    }

    /// List an owner's conversations, most recently active first.
    pub fn list(conn: &Connection, owner: &OwnerId) -> Result<Vec<Conversation>> {
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, title, created_at, updated_at FROM conversations \
             WHERE owner_id = ?1 ORDER BY updated_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![owner.as_str()], conversation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Delete a conversation and its messages. Returns whether a row existed.
    pub fn delete(conn: &Connection, id: &ConversationId, owner: &OwnerId) -> Result<bool> {
        let affected = conn.execute(
            "DELETE FROM conversations WHERE id = ?1 AND owner_id = ?2",
            params![id.as_str(), owner.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Append a message to a conversation and bump its activity timestamp.
    ///
    /// Ownership of the conversation is checked by the caller at session
    /// establishment; this method takes the conversation ID on trust.
    pub fn append_message(
        conn: &Connection,
        conversation: &ConversationId,
        role: MessageRole,
        content: &str,
        sources: Option<&serde_json::Value>,
    ) -> Result<Message> {
        let id = MessageId::new();
        let now = now_iso();
        let sources_json = sources.map(ToString::to_string);
        let _ = conn.execute(
            "INSERT INTO messages (id, conversation_id, role, content, sources, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.as_str(),
                conversation.as_str(),
                role.as_sql(),
                content,
                sources_json,
                now,
            ],
        )?;
        let _ = conn.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![now, conversation.as_str()],
        )?;

        conn.query_row(
            "SELECT id, conversation_id, role, content, sources, created_at FROM messages \
             WHERE id = ?1",
            params![id.as_str()],
            message_from_row,
        )
        .map_err(StoreError::from)
    }

    /// All messages of a conversation in chronological order.
    pub fn messages(conn: &Connection, conversation: &ConversationId) -> Result<Vec<Message>> {
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, sources, created_at FROM messages \
             WHERE conversation_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![conversation.as_str()], message_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use serde_json::json;

    fn open_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get() {
        let conn = open_db();
        let created = ConversationRepository::create(&conn, &"u1".into(), "Resumo de Março")
            .unwrap();
        let fetched = ConversationRepository::get(&conn, &created.id, &"u1".into())
            .unwrap()
            .unwrap();
        assert_eq!(fetched.title, "Resumo de Março");
    }

    #[test]
    fn get_scoped_to_owner() {
        let conn = open_db();
        let created = ConversationRepository::create(&conn, &"u1".into(), "t").unwrap();
        assert!(ConversationRepository::get(&conn, &created.id, &"u2".into())
            .unwrap()
            .is_none());
    }

    #[test]
    fn append_and_read_messages_in_order() {
        let conn = open_db();
        let conversation = ConversationRepository::create(&conn, &"u1".into(), "t").unwrap();

        let _ = ConversationRepository::append_message(
            &conn,
            &conversation.id,
            MessageRole::User,
            "quanto gastei?",
            None,
        )
        .unwrap();
        let _ = ConversationRepository::append_message(
            &conn,
            &conversation.id,
            MessageRole::Assistant,
            "Você gastou R$ 1.500,00.",
            Some(&json!([{"id": "e1"}])),
        )
        .unwrap();

        let messages = ConversationRepository::messages(&conn, &conversation.id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].sources, Some(json!([{"id": "e1"}])));
    }

    #[test]
    fn user_message_has_no_sources() {
        let conn = open_db();
        let conversation = ConversationRepository::create(&conn, &"u1".into(), "t").unwrap();
        let message = ConversationRepository::append_message(
            &conn,
            &conversation.id,
            MessageRole::User,
            "oi",
            None,
        )
        .unwrap();
        assert!(message.sources.is_none());
    }

    #[test]
    fn delete_cascades_messages() {
        let conn = open_db();
        let conversation = ConversationRepository::create(&conn, &"u1".into(), "t").unwrap();
        let _ = ConversationRepository::append_message(
            &conn,
            &conversation.id,
            MessageRole::User,
            "oi",
            None,
        )
        .unwrap();

        assert!(ConversationRepository::delete(&conn, &conversation.id, &"u1".into()).unwrap());
        let remaining: i64 = conn
            .query_row("SELECT count(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn delete_foreign_owner_is_false() {
        let conn = open_db();
        let conversation = ConversationRepository::create(&conn, &"u1".into(), "t").unwrap();
        assert!(!ConversationRepository::delete(&conn, &conversation.id, &"u2".into()).unwrap());
    }

    #[test]
    fn list_owner_only() {
        let conn = open_db();
        let _ = ConversationRepository::create(&conn, &"u1".into(), "mine").unwrap();
        let _ = ConversationRepository::create(&conn, &"u2".into(), "theirs").unwrap();

        let conversations = ConversationRepository::list(&conn, &"u1".into()).unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].title, "mine");
    }
}
