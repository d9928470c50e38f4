//! Persistence for users, conversations, and messages.
//!
//! All three entity types live in SQLite and are create-only: nothing here
//! updates or deletes a row once written. Functions take a plain
//! [`rusqlite::Connection`] borrowed from the pool; multi-step writes run
//! inside a transaction so concurrent requests cannot observe or produce a
//! half-applied turn.
//!
//! Message ordering is deterministic: every message gets a per-conversation
//! monotonic `seq` assigned at insert time, and reads order by
//! `(create_time, seq)` so equal timestamps fall back to insertion order.

use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("username already exists: {0}")]
    UsernameTaken(String),
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("conversation {0} is not owned by the requesting user")]
    NotOwner(String),
}

/// A registered user. The password hash never leaves the server boundary.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

/// A conversation summary row.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub conversation_id: String,
    pub user_id: String,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

/// A message supplied by the client for persistence.
///
/// Fields are stored as-is; the role string is not validated beyond presence,
/// matching the submission contract.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    pub create_time: String,
}

/// A message as stored, including synthesized audio when present.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: String,
    pub conversation_id: String,
    pub seq: i64,
    pub role: String,
    pub content: String,
    pub audio: Option<Vec<u8>>,
    pub create_time: String,
}

/// A minimal (role, content) pair used as generation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTurn {
    pub role: String,
    pub content: String,
}

/// Creates a new user row.
///
/// Returns [`StoreError::UsernameTaken`] when the username collides with an
/// existing row (detected via the UNIQUE constraint rather than a prior
/// read, so two concurrent signups cannot both succeed).
pub fn create_user(
    conn: &Connection,
    user_id: &str,
    username: &str,
    password_hash: &str,
    created_at: &str,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO users (user_id, username, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, username, password_hash, created_at],
    )
    .map_err(|e| {
        if let rusqlite::Error::SqliteFailure(code, _) = e {
            if code.code == rusqlite::ffi::ErrorCode::ConstraintViolation {
                return StoreError::UsernameTaken(username.to_string());
            }
        }
        StoreError::Database(e)
    })?;
    Ok(())
}

/// Looks up a user by username (case-sensitive, exact match).
pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRecord>, StoreError> {
    let user = conn
        .query_row(
            "SELECT user_id, username, password_hash, created_at
             FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(UserRecord {
                    user_id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Appends client-supplied messages to a conversation, creating the
/// conversation bound to `user_id` if it has not been seen before.
///
/// The upsert, ownership check, and inserts run in one transaction, so two
/// concurrent first messages on the same new conversation id cannot race:
/// one creates the row, both append. Returns [`StoreError::NotOwner`] when
/// the conversation exists under a different user; nothing is written in
/// that case.
pub fn append_turn(
    conn: &Connection,
    conversation_id: &str,
    user_id: &str,
    created_at: &str,
    messages: &[NewMessage],
) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO conversations (conversation_id, user_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (conversation_id) DO NOTHING",
        params![conversation_id, user_id, created_at],
    )?;

    let owner: String = tx.query_row(
        "SELECT user_id FROM conversations WHERE conversation_id = ?1",
        [conversation_id],
        |row| row.get(0),
    )?;
    if owner != user_id {
        return Err(StoreError::NotOwner(conversation_id.to_string()));
    }

    let mut seq = next_seq(&tx, conversation_id)?;
    for message in messages {
        tx.execute(
            "INSERT INTO messages (id, conversation_id, seq, role, content, audio, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
            params![
                message.id,
                conversation_id,
                seq,
                message.role,
                message.content,
                message.create_time,
            ],
        )?;
        seq += 1;
    }

    tx.commit()?;
    Ok(())
}

/// Inserts one assistant message carrying completion text and synthesized
/// audio. Runs in a transaction for the same seq-assignment reason as
/// [`append_turn`].
pub fn insert_assistant_message(
    conn: &Connection,
    conversation_id: &str,
    message_id: &str,
    content: &str,
    audio: &[u8],
    create_time: &str,
) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    let seq = next_seq(&tx, conversation_id)?;
    tx.execute(
        "INSERT INTO messages (id, conversation_id, seq, role, content, audio, create_time)
         VALUES (?1, ?2, ?3, 'assistant', ?4, ?5, ?6)",
        params![message_id, conversation_id, seq, content, audio, create_time],
    )?;
    tx.commit()?;
    Ok(())
}

fn next_seq(conn: &Connection, conversation_id: &str) -> Result<i64, StoreError> {
    let seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE conversation_id = ?1",
        [conversation_id],
        |row| row.get(0),
    )?;
    Ok(seq)
}

/// Returns the `limit` most recent (role, content) pairs for a conversation,
/// oldest first, for use as generation context.
pub fn recent_context(
    conn: &Connection,
    conversation_id: &str,
    limit: usize,
) -> Result<Vec<ContextTurn>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT role, content FROM messages
         WHERE conversation_id = ?1
         ORDER BY create_time DESC, seq DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![conversation_id, limit as i64], |row| {
        Ok(ContextTurn {
            role: row.get(0)?,
            content: row.get(1)?,
        })
    })?;

    let mut turns = Vec::new();
    for row in rows {
        turns.push(row?);
    }
    // The query walks newest-first to apply the window; the model wants
    // oldest-first.
    turns.reverse();
    Ok(turns)
}

/// Retrieves a conversation only if it is owned by `user_id`.
///
/// An absent conversation and a foreign-owned one both return
/// [`StoreError::ConversationNotFound`] so callers cannot distinguish the
/// two cases.
pub fn get_owned_conversation(
    conn: &Connection,
    conversation_id: &str,
    user_id: &str,
) -> Result<Conversation, StoreError> {
    conn.query_row(
        "SELECT conversation_id, user_id, created_at
         FROM conversations
         WHERE conversation_id = ?1 AND user_id = ?2",
        params![conversation_id, user_id],
        map_row_to_conversation,
    )
    .optional()?
    .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))
}

/// Lists every message in a conversation, ascending by `(create_time, seq)`.
pub fn list_messages(
    conn: &Connection,
    conversation_id: &str,
) -> Result<Vec<StoredMessage>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, seq, role, content, audio, create_time
         FROM messages
         WHERE conversation_id = ?1
         ORDER BY create_time ASC, seq ASC",
    )?;

    let rows = stmt.query_map([conversation_id], map_row_to_message)?;
    let mut messages = Vec::new();
    for row in rows {
        messages.push(row?);
    }
    Ok(messages)
}

/// Lists all conversations owned by a user, newest first.
pub fn list_conversations(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<Conversation>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT conversation_id, user_id, created_at
         FROM conversations
         WHERE user_id = ?1
         ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([user_id], map_row_to_conversation)?;
    let mut conversations = Vec::new();
    for row in rows {
        conversations.push(row?);
    }
    Ok(conversations)
}

fn map_row_to_conversation(row: &Row) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        conversation_id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn map_row_to_message(row: &Row) -> rusqlite::Result<StoredMessage> {
    Ok(StoredMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        seq: row.get(2)?,
        role: row.get(3)?,
        content: row.get(4)?,
        audio: row.get(5)?,
        create_time: row.get(6)?,
    })
}
