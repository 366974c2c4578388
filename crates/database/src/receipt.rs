//! Read receipts and the unread inbox.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Importance, ReadReceipt, ThreadStatus};
use crate::validation;

/// A thread with unread messages for one agent.
#[derive(Debug, Clone, Serialize)]
pub struct InboxThread {
    pub thread_id: i64,
    pub title: String,
    pub status: ThreadStatus,
    pub last_activity: Option<String>,
    pub unread_count: i64,
    /// The unread messages themselves, in ascending time order.
    pub messages: Vec<UnreadMessage>,
}

/// An unread message as it appears in the inbox.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UnreadMessage {
    pub id: i64,
    pub body: String,
    pub created_by: String,
    pub importance: Importance,
    pub created_at: String,
}

/// Advance an agent's read receipt in a thread.
///
/// The receipt only ever moves forward: marking an older message read keeps
/// the existing high-water mark, and repeating a call changes nothing.
pub async fn mark_read(
    pool: &SqlitePool,
    thread_id: i64,
    agent_id: &str,
    message_id: i64,
) -> Result<ReadReceipt> {
    validation::validate_agent_id("agent", agent_id)?;

    let exists = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT 1 FROM threads WHERE id = ?
        "#,
    )
    .bind(thread_id)
    .fetch_optional(pool)
    .await?;

    if exists.is_none() {
        return Err(DatabaseError::NotFound {
            entity: "Thread",
            id: thread_id.to_string(),
        });
    }

    sqlx::query(
        r#"
        INSERT INTO read_receipts (thread_id, agent_id, last_read_message_id)
        VALUES (?, ?, ?)
        ON CONFLICT(thread_id, agent_id) DO UPDATE SET
            last_read_message_id = MAX(last_read_message_id, excluded.last_read_message_id)
        "#,
    )
    .bind(thread_id)
    .bind(agent_id)
    .bind(message_id)
    .execute(pool)
    .await?;

    let receipt = sqlx::query_as::<_, ReadReceipt>(
        r#"
        SELECT thread_id, agent_id, last_read_message_id
        FROM read_receipts
        WHERE thread_id = ? AND agent_id = ?
        "#,
    )
    .bind(thread_id)
    .bind(agent_id)
    .fetch_one(pool)
    .await?;

    Ok(receipt)
}

/// Get an agent's read receipt in a thread, if one exists.
pub async fn get_receipt(
    pool: &SqlitePool,
    thread_id: i64,
    agent_id: &str,
) -> Result<Option<ReadReceipt>> {
    let receipt = sqlx::query_as::<_, ReadReceipt>(
        r#"
        SELECT thread_id, agent_id, last_read_message_id
        FROM read_receipts
        WHERE thread_id = ? AND agent_id = ?
        "#,
    )
    .bind(thread_id)
    .bind(agent_id)
    .fetch_optional(pool)
    .await?;

    Ok(receipt)
}

/// Count messages in a thread past the agent's receipt. Without a receipt,
/// every message is unread.
pub async fn unread_count(pool: &SqlitePool, thread_id: i64, agent_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM messages m
        WHERE m.thread_id = ?
          AND m.id > COALESCE(
              (SELECT r.last_read_message_id FROM read_receipts r
               WHERE r.thread_id = ? AND r.agent_id = ?), 0)
        "#,
    )
    .bind(thread_id)
    .bind(thread_id)
    .bind(agent_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Unread messages across every thread the agent is a member of.
///
/// Threads with nothing unread are omitted; the rest are ordered by most
/// recent activity first.
pub async fn inbox(pool: &SqlitePool, agent_id: &str) -> Result<Vec<InboxThread>> {
    validation::validate_agent_id("agent", agent_id)?;

    let rows = sqlx::query_as::<_, (i64, String, ThreadStatus, Option<String>, i64)>(
        r#"
        SELECT t.id, t.title, t.status,
               (SELECT m.created_at FROM messages m WHERE m.thread_id = t.id
                ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_activity,
               (SELECT COUNT(*) FROM messages m
                WHERE m.thread_id = t.id
                  AND m.id > COALESCE(
                      (SELECT r.last_read_message_id FROM read_receipts r
                       WHERE r.thread_id = t.id AND r.agent_id = tm.agent_id), 0)) AS unread_count
        FROM threads t
        JOIN thread_members tm ON tm.thread_id = t.id
        WHERE tm.agent_id = ?
        ORDER BY last_activity IS NULL, last_activity DESC, t.id DESC
        "#,
    )
    .bind(agent_id)
    .fetch_all(pool)
    .await?;

    let mut threads = Vec::new();
    for (thread_id, title, status, last_activity, unread) in rows {
        if unread == 0 {
            continue;
        }

        let messages = sqlx::query_as::<_, UnreadMessage>(
            r#"
            SELECT m.id, m.body, m.created_by, m.importance, m.created_at
            FROM messages m
            WHERE m.thread_id = ?
              AND m.id > COALESCE(
                  (SELECT r.last_read_message_id FROM read_receipts r
                   WHERE r.thread_id = ? AND r.agent_id = ?), 0)
            ORDER BY m.created_at, m.id
            "#,
        )
        .bind(thread_id)
        .bind(thread_id)
        .bind(agent_id)
        .fetch_all(pool)
        .await?;

        threads.push(InboxThread {
            thread_id,
            title,
            status,
            last_activity,
            unread_count: unread,
            messages,
        });
    }

    Ok(threads)
}
