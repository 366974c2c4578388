//! Agent presence tracking.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::AgentPresence;
use crate::validation;

/// Create or refresh an agent's presence row. `last_seen` is always set to
/// the current time.
pub async fn update_presence(
    pool: &SqlitePool,
    agent_id: &str,
    status: &str,
    current_task: Option<&str>,
) -> Result<AgentPresence> {
    validation::validate_agent_id("agent", agent_id)?;

    sqlx::query(
        r#"
        INSERT INTO agent_presence (agent_id, status, current_task)
        VALUES (?, ?, ?)
        ON CONFLICT(agent_id) DO UPDATE SET
            status = excluded.status,
            current_task = excluded.current_task,
            last_seen = datetime('now')
        "#,
    )
    .bind(agent_id)
    .bind(status)
    .bind(current_task)
    .execute(pool)
    .await?;

    get_presence(pool, agent_id).await
}

/// Get one agent's presence.
pub async fn get_presence(pool: &SqlitePool, agent_id: &str) -> Result<AgentPresence> {
    sqlx::query_as::<_, AgentPresence>(
        r#"
        SELECT agent_id, status, current_task, last_seen
        FROM agent_presence
        WHERE agent_id = ?
        "#,
    )
    .bind(agent_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Agent",
        id: agent_id.to_string(),
    })
}

/// List presence for all agents, ordered by agent ID.
pub async fn list_presence(pool: &SqlitePool) -> Result<Vec<AgentPresence>> {
    let rows = sqlx::query_as::<_, AgentPresence>(
        r#"
        SELECT agent_id, status, current_task, last_seen
        FROM agent_presence
        ORDER BY agent_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;

    #[tokio::test]
    async fn test_presence_upsert() {
        let db = test_db().await;
        let pool = db.pool();

        let presence = update_presence(pool, "ralph", "online", None).await.unwrap();
        assert_eq!(presence.status, "online");
        assert!(presence.current_task.is_none());

        let presence = update_presence(pool, "ralph", "working", Some("task-42"))
            .await
            .unwrap();
        assert_eq!(presence.status, "working");
        assert_eq!(presence.current_task.as_deref(), Some("task-42"));

        // Still a single row
        assert_eq!(list_presence(pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_presence_validation() {
        let db = test_db().await;
        let result = update_presence(db.pool(), "  ", "online", None).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_presence_ordered() {
        let db = test_db().await;
        let pool = db.pool();

        update_presence(pool, "ralph", "online", None).await.unwrap();
        update_presence(pool, "codex", "idle", None).await.unwrap();
        update_presence(pool, "devin", "offline", None).await.unwrap();

        let rows = list_presence(pool).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|p| p.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["codex", "devin", "ralph"]);
    }

    #[tokio::test]
    async fn test_get_missing_presence() {
        let db = test_db().await;
        let result = get_presence(db.pool(), "ghost").await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Agent", .. })
        ));
    }
}
