//! Message operations: sending and full-text search.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Importance, Message};
use crate::validation;

/// Default number of search hits returned when the caller gives no limit.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// A search hit with its parent thread attached.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SearchHit {
    pub id: i64,
    pub thread_id: i64,
    pub thread_title: String,
    pub created_by: String,
    pub body: String,
    pub importance: Importance,
    pub created_at: String,
}

/// Send a message to a thread.
///
/// Assigns the server timestamp and touches the parent thread's `updated_at`
/// in the same transaction.
pub async fn send_message(
    pool: &SqlitePool,
    thread_id: i64,
    from: &str,
    body: &str,
    importance: Importance,
    session_id: Option<&str>,
) -> Result<Message> {
    validation::validate_agent_id("from", from)?;
    validation::validate_body(body)?;
    if let Some(session) = session_id {
        validation::validate_reference("session", session)?;
    }

    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT 1 FROM threads WHERE id = ?
        "#,
    )
    .bind(thread_id)
    .fetch_optional(&mut *tx)
    .await?;

    if exists.is_none() {
        return Err(DatabaseError::NotFound {
            entity: "Thread",
            id: thread_id.to_string(),
        });
    }

    let result = sqlx::query(
        r#"
        INSERT INTO messages (thread_id, created_by, body, importance, session_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(thread_id)
    .bind(from)
    .bind(body)
    .bind(importance)
    .bind(session_id)
    .execute(&mut *tx)
    .await?;

    let message_id = result.last_insert_rowid();

    sqlx::query(
        r#"
        UPDATE threads SET updated_at = datetime('now') WHERE id = ?
        "#,
    )
    .bind(thread_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(message_id, thread_id, from, "Sent message");

    let message = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, thread_id, created_by, body, importance, session_id, created_at
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(message_id)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// Search message bodies, ranked by relevance.
///
/// An empty or unsearchable query returns an empty result set.
pub async fn search_messages(pool: &SqlitePool, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
    let expr = match fts_match_expr(query) {
        Some(expr) => expr,
        None => return Ok(Vec::new()),
    };

    let hits = sqlx::query_as::<_, SearchHit>(
        r#"
        SELECT m.id, m.thread_id, t.title AS thread_title,
               m.created_by, m.body, m.importance, m.created_at
        FROM messages_fts
        JOIN messages m ON m.id = messages_fts.rowid
        JOIN threads t ON t.id = m.thread_id
        WHERE messages_fts MATCH ?
        ORDER BY bm25(messages_fts), m.id
        LIMIT ?
        "#,
    )
    .bind(expr)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(hits)
}

/// Build an FTS5 MATCH expression from free-form input.
///
/// Each whitespace-separated token is double-quoted so punctuation is never
/// parsed as FTS5 operator syntax; quoted terms combine as an implicit AND.
/// Returns `None` when nothing searchable remains.
fn fts_match_expr(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}
