//! Thread operations.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Message, Thread, ThreadStatus};
use crate::validation;

/// A thread annotated with activity information for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ThreadSummary {
    pub id: i64,
    pub channel_id: Option<i64>,
    pub title: String,
    pub status: ThreadStatus,
    pub task_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Total number of messages in the thread.
    pub message_count: i64,
    /// Body of the most recent message, if any.
    pub last_message: Option<String>,
    /// Author of the most recent message, if any.
    pub last_sender: Option<String>,
    /// Timestamp of the most recent message, if any.
    pub last_activity: Option<String>,
}

/// A thread with its messages and member roster.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadDetail {
    pub thread: Thread,
    /// Messages in ascending time order.
    pub messages: Vec<Message>,
    /// Member agent IDs, sorted.
    pub members: Vec<String>,
}

/// Create a new thread with the given members.
///
/// The creator is always added to the member roster; duplicate member IDs are
/// collapsed. The new thread starts out active.
pub async fn create_thread(
    pool: &SqlitePool,
    title: &str,
    created_by: &str,
    members: &[String],
    task_id: Option<&str>,
    channel_id: Option<i64>,
) -> Result<Thread> {
    validation::validate_title("title", title)?;
    validation::validate_agent_id("creator", created_by)?;
    for member in members {
        validation::validate_agent_id("member", member)?;
    }
    if let Some(task) = task_id {
        validation::validate_reference("task", task)?;
    }

    let mut roster: Vec<&str> = Vec::with_capacity(members.len() + 1);
    for member in members {
        if !roster.contains(&member.as_str()) {
            roster.push(member.as_str());
        }
    }
    if !roster.contains(&created_by) {
        roster.push(created_by);
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO threads (channel_id, title, task_id)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(channel_id)
    .bind(title)
    .bind(task_id)
    .execute(&mut *tx)
    .await?;

    let thread_id = result.last_insert_rowid();

    for agent_id in &roster {
        sqlx::query(
            r#"
            INSERT INTO thread_members (thread_id, agent_id)
            VALUES (?, ?)
            "#,
        )
        .bind(thread_id)
        .bind(*agent_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(thread_id, members = roster.len(), "Created thread");

    fetch_thread(pool, thread_id).await
}

/// Get a thread with its messages (ascending) and member roster.
pub async fn get_thread(pool: &SqlitePool, id: i64) -> Result<ThreadDetail> {
    let thread = fetch_thread(pool, id).await?;

    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, thread_id, created_by, body, importance, session_id, created_at
        FROM messages
        WHERE thread_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let members = sqlx::query_scalar::<_, String>(
        r#"
        SELECT agent_id
        FROM thread_members
        WHERE thread_id = ?
        ORDER BY agent_id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(ThreadDetail {
        thread,
        messages,
        members,
    })
}

/// Apply status and membership changes to a thread.
///
/// Always touches the thread's `updated_at`, even when the change set is
/// empty. Membership additions are idempotent; removals of non-members are
/// silently skipped.
pub async fn update_thread(
    pool: &SqlitePool,
    id: i64,
    status: Option<ThreadStatus>,
    add_members: &[String],
    remove_members: &[String],
) -> Result<Thread> {
    for member in add_members {
        validation::validate_agent_id("member", member)?;
    }

    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT 1 FROM threads WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    if exists.is_none() {
        return Err(DatabaseError::NotFound {
            entity: "Thread",
            id: id.to_string(),
        });
    }

    if let Some(status) = status {
        sqlx::query(
            r#"
            UPDATE threads SET status = ? WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    for agent_id in add_members {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO thread_members (thread_id, agent_id)
            VALUES (?, ?)
            "#,
        )
        .bind(id)
        .bind(agent_id)
        .execute(&mut *tx)
        .await?;
    }

    for agent_id in remove_members {
        sqlx::query(
            r#"
            DELETE FROM thread_members
            WHERE thread_id = ? AND agent_id = ?
            "#,
        )
        .bind(id)
        .bind(agent_id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        UPDATE threads SET updated_at = datetime('now') WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    fetch_thread(pool, id).await
}

/// List threads annotated with activity info, most recently active first.
/// Threads with no messages sort last. With `agent` given, only threads the
/// agent is a member of are returned.
pub async fn list_threads(pool: &SqlitePool, agent: Option<&str>) -> Result<Vec<ThreadSummary>> {
    let summaries = match agent {
        Some(agent_id) => {
            sqlx::query_as::<_, ThreadSummary>(
                r#"
                SELECT t.id, t.channel_id, t.title, t.status, t.task_id, t.created_at, t.updated_at,
                       (SELECT COUNT(*) FROM messages m WHERE m.thread_id = t.id) AS message_count,
                       (SELECT m.body FROM messages m WHERE m.thread_id = t.id
                        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message,
                       (SELECT m.created_by FROM messages m WHERE m.thread_id = t.id
                        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_sender,
                       (SELECT m.created_at FROM messages m WHERE m.thread_id = t.id
                        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_activity
                FROM threads t
                WHERE t.id IN (SELECT thread_id FROM thread_members WHERE agent_id = ?)
                ORDER BY last_activity IS NULL, last_activity DESC, t.id DESC
                "#,
            )
            .bind(agent_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ThreadSummary>(
                r#"
                SELECT t.id, t.channel_id, t.title, t.status, t.task_id, t.created_at, t.updated_at,
                       (SELECT COUNT(*) FROM messages m WHERE m.thread_id = t.id) AS message_count,
                       (SELECT m.body FROM messages m WHERE m.thread_id = t.id
                        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message,
                       (SELECT m.created_by FROM messages m WHERE m.thread_id = t.id
                        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_sender,
                       (SELECT m.created_at FROM messages m WHERE m.thread_id = t.id
                        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_activity
                FROM threads t
                ORDER BY last_activity IS NULL, last_activity DESC, t.id DESC
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(summaries)
}

/// Delete a thread. Messages, members, and read receipts cascade.
pub async fn delete_thread(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM threads WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Thread",
            id: id.to_string(),
        });
    }

    Ok(())
}

async fn fetch_thread(pool: &SqlitePool, id: i64) -> Result<Thread> {
    sqlx::query_as::<_, Thread>(
        r#"
        SELECT id, channel_id, title, status, task_id, created_at, updated_at
        FROM threads
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Thread",
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Importance;
    use crate::testing::test_db;
    use crate::{message, receipt};

    #[tokio::test]
    async fn test_create_thread_dedups_members() {
        let db = test_db().await;
        let pool = db.pool();

        let members = vec![
            "devin".to_string(),
            "ralph".to_string(),
            "devin".to_string(),
        ];
        let thread = create_thread(pool, "Build X", "ralph", &members, None, None)
            .await
            .unwrap();
        assert_eq!(thread.status, ThreadStatus::Active);

        let detail = get_thread(pool, thread.id).await.unwrap();
        assert_eq!(detail.members, vec!["devin".to_string(), "ralph".to_string()]);
    }

    #[tokio::test]
    async fn test_creator_always_member() {
        let db = test_db().await;
        let pool = db.pool();

        let members = vec!["devin".to_string()];
        let thread = create_thread(pool, "Build X", "ralph", &members, None, None)
            .await
            .unwrap();

        let detail = get_thread(pool, thread.id).await.unwrap();
        assert!(detail.members.contains(&"ralph".to_string()));
    }

    #[tokio::test]
    async fn test_create_thread_validation() {
        let db = test_db().await;
        let pool = db.pool();

        let members = vec!["devin".to_string()];
        let result = create_thread(pool, "", "ralph", &members, None, None).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let result = create_thread(pool, "Build X", "", &members, None, None).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let blank = vec!["".to_string()];
        let result = create_thread(pool, "Build X", "ralph", &blank, None, None).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_missing_thread() {
        let db = test_db().await;
        let result = get_thread(db.pool(), 99).await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Thread", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_thread_status_and_members() {
        let db = test_db().await;
        let pool = db.pool();

        let members = vec!["devin".to_string()];
        let thread = create_thread(pool, "Build X", "ralph", &members, None, None)
            .await
            .unwrap();

        let updated = update_thread(
            pool,
            thread.id,
            Some(ThreadStatus::Paused),
            &["codex".to_string()],
            &["devin".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(updated.status, ThreadStatus::Paused);
        assert!(updated.updated_at >= thread.updated_at);

        let detail = get_thread(pool, thread.id).await.unwrap();
        assert_eq!(detail.members, vec!["codex".to_string(), "ralph".to_string()]);

        // The new status shows up in listings
        let listed = list_threads(pool, None).await.unwrap();
        assert_eq!(listed[0].status, ThreadStatus::Paused);

        // Closed threads may be reopened
        let reopened = update_thread(pool, thread.id, Some(ThreadStatus::Active), &[], &[])
            .await
            .unwrap();
        assert_eq!(reopened.status, ThreadStatus::Active);
    }

    #[tokio::test]
    async fn test_update_missing_thread() {
        let db = test_db().await;
        let result = update_thread(db.pool(), 99, Some(ThreadStatus::Paused), &[], &[]).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_threads_ordering_and_annotations() {
        let db = test_db().await;
        let pool = db.pool();

        let members = vec!["devin".to_string()];
        let quiet = create_thread(pool, "Quiet", "ralph", &members, None, None)
            .await
            .unwrap();
        let busy = create_thread(pool, "Busy", "ralph", &members, None, None)
            .await
            .unwrap();

        message::send_message(pool, busy.id, "ralph", "first", Importance::Normal, None)
            .await
            .unwrap();
        message::send_message(pool, busy.id, "devin", "second", Importance::Normal, None)
            .await
            .unwrap();

        let threads = list_threads(pool, None).await.unwrap();
        assert_eq!(threads.len(), 2);

        // Thread with messages first, silent thread last
        assert_eq!(threads[0].id, busy.id);
        assert_eq!(threads[0].message_count, 2);
        assert_eq!(threads[0].last_message.as_deref(), Some("second"));
        assert_eq!(threads[0].last_sender.as_deref(), Some("devin"));
        assert!(threads[0].last_activity.is_some());

        assert_eq!(threads[1].id, quiet.id);
        assert_eq!(threads[1].message_count, 0);
        assert!(threads[1].last_activity.is_none());
    }

    #[tokio::test]
    async fn test_list_threads_member_filter() {
        let db = test_db().await;
        let pool = db.pool();

        let members = vec!["devin".to_string()];
        create_thread(pool, "Shared", "ralph", &members, None, None)
            .await
            .unwrap();
        create_thread(pool, "Private", "ralph", &[], None, None)
            .await
            .unwrap();

        let threads = list_threads(pool, Some("devin")).await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].title, "Shared");

        let threads = list_threads(pool, Some("ralph")).await.unwrap();
        assert_eq!(threads.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_thread_cascades() {
        let db = test_db().await;
        let pool = db.pool();

        let members = vec!["devin".to_string()];
        let thread = create_thread(pool, "Build X", "ralph", &members, None, None)
            .await
            .unwrap();
        let message =
            message::send_message(pool, thread.id, "ralph", "start", Importance::Normal, None)
                .await
                .unwrap();
        receipt::mark_read(pool, thread.id, "devin", message.id)
            .await
            .unwrap();

        delete_thread(pool, thread.id).await.unwrap();

        for table in ["messages", "thread_members", "read_receipts"] {
            let count = sqlx::query_scalar::<_, i64>(&format!(
                "SELECT COUNT(*) FROM {} WHERE thread_id = ?",
                table
            ))
            .bind(thread.id)
            .fetch_one(pool)
            .await
            .unwrap();
            assert_eq!(count, 0, "{} not cascaded", table);
        }

        let result = delete_thread(pool, thread.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
