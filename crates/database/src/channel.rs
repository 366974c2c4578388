//! Channel CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Channel, ChannelKind};
use crate::validation;

/// Create a new channel.
pub async fn create_channel(pool: &SqlitePool, name: &str, kind: ChannelKind) -> Result<Channel> {
    validation::validate_title("name", name)?;

    let result = sqlx::query(
        r#"
        INSERT INTO channels (name, kind)
        VALUES (?, ?)
        "#,
    )
    .bind(name)
    .bind(kind)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Channel",
                    id: name.to_string(),
                };
            }
        }
        DatabaseError::from(e)
    })?;

    let channel = sqlx::query_as::<_, Channel>(
        r#"
        SELECT id, name, kind, created_at
        FROM channels
        WHERE id = ?
        "#,
    )
    .bind(result.last_insert_rowid())
    .fetch_one(pool)
    .await?;

    Ok(channel)
}

/// Get a channel by name.
pub async fn get_channel(pool: &SqlitePool, name: &str) -> Result<Channel> {
    sqlx::query_as::<_, Channel>(
        r#"
        SELECT id, name, kind, created_at
        FROM channels
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Channel",
        id: name.to_string(),
    })
}

/// List all channels.
pub async fn list_channels(pool: &SqlitePool) -> Result<Vec<Channel>> {
    let channels = sqlx::query_as::<_, Channel>(
        r#"
        SELECT id, name, kind, created_at
        FROM channels
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;

    #[tokio::test]
    async fn test_channel_crud() {
        let db = test_db().await;
        let pool = db.pool();

        let channel = create_channel(pool, "general", ChannelKind::Public)
            .await
            .unwrap();
        assert_eq!(channel.name, "general");
        assert_eq!(channel.kind, ChannelKind::Public);

        let fetched = get_channel(pool, "general").await.unwrap();
        assert_eq!(fetched.id, channel.id);

        create_channel(pool, "backend", ChannelKind::Dm).await.unwrap();
        let channels = list_channels(pool).await.unwrap();
        assert_eq!(channels.len(), 2);
        // Ordered by name
        assert_eq!(channels[0].name, "backend");
        assert_eq!(channels[1].name, "general");
    }

    #[tokio::test]
    async fn test_duplicate_channel_name() {
        let db = test_db().await;
        let pool = db.pool();

        create_channel(pool, "general", ChannelKind::Public)
            .await
            .unwrap();
        let result = create_channel(pool, "general", ChannelKind::Public).await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "Channel", .. })
        ));
    }

    #[tokio::test]
    async fn test_get_missing_channel() {
        let db = test_db().await;
        let result = get_channel(db.pool(), "nope").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_channel_name() {
        let db = test_db().await;
        let result = create_channel(db.pool(), "  ", ChannelKind::Public).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }
}
