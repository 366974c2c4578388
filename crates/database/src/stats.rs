//! Aggregate counters for the dashboard.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::Result;

/// System-wide counters. Pure read, no side effects.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Threads with status `active`.
    pub active_threads: i64,
    /// Messages across all threads.
    pub total_messages: i64,
    /// Messages created in the trailing 24 hours.
    pub messages_last_24h: i64,
}

/// Fetch system-wide counters.
pub async fn get_stats(pool: &SqlitePool) -> Result<Stats> {
    let active_threads = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM threads WHERE status = 'active'
        "#,
    )
    .fetch_one(pool)
    .await?;

    let total_messages = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages
        "#,
    )
    .fetch_one(pool)
    .await?;

    let messages_last_24h = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages WHERE created_at >= datetime('now', '-1 day')
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(Stats {
        active_threads,
        total_messages,
        messages_last_24h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Importance, ThreadStatus};
    use crate::testing::test_db;
    use crate::{message, thread};

    #[tokio::test]
    async fn test_stats_counts() {
        let db = test_db().await;
        let pool = db.pool();

        let empty = get_stats(pool).await.unwrap();
        assert_eq!(empty.active_threads, 0);
        assert_eq!(empty.total_messages, 0);
        assert_eq!(empty.messages_last_24h, 0);

        let members = vec!["devin".to_string()];
        let open = thread::create_thread(pool, "Open", "ralph", &members, None, None)
            .await
            .unwrap();
        let parked = thread::create_thread(pool, "Parked", "ralph", &members, None, None)
            .await
            .unwrap();
        thread::update_thread(pool, parked.id, Some(ThreadStatus::Paused), &[], &[])
            .await
            .unwrap();

        message::send_message(pool, open.id, "ralph", "one", Importance::Normal, None)
            .await
            .unwrap();
        message::send_message(pool, open.id, "devin", "two", Importance::Normal, None)
            .await
            .unwrap();

        let stats = get_stats(pool).await.unwrap();
        assert_eq!(stats.active_threads, 1);
        assert_eq!(stats.total_messages, 2);
        // Everything just written falls inside the trailing day
        assert_eq!(stats.messages_last_24h, 2);
    }
}
