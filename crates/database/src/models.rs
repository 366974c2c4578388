//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::ValidationError;

/// Lifecycle state of a thread. All transitions between states are permitted
/// by explicit update; closed threads may be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ThreadStatus {
    Active,
    Paused,
    Closed,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadStatus::Active => "active",
            ThreadStatus::Paused => "paused",
            ThreadStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ThreadStatus::Active),
            "paused" => Ok(ThreadStatus::Paused),
            "closed" => Ok(ThreadStatus::Closed),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Urgency level attached to a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
            Importance::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Importance::Low),
            "normal" => Ok(Importance::Normal),
            "high" => Ok(Importance::High),
            "urgent" => Ok(Importance::Urgent),
            other => Err(ValidationError::InvalidImportance(other.to_string())),
        }
    }
}

/// Scope of a channel: a standing public topic or a direct-message pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Public,
    Dm,
}

impl FromStr for ChannelKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(ChannelKind::Public),
            "dm" => Ok(ChannelKind::Dm),
            other => Err(ValidationError::InvalidChannelKind(other.to_string())),
        }
    }
}

/// A standing topic or direct-message scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Channel {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Unique channel name.
    pub name: String,
    /// Channel scope.
    pub kind: ChannelKind,
    /// Creation timestamp.
    pub created_at: String,
}

/// A task-linked conversation among a set of agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Thread {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Channel the thread belongs to, if any.
    pub channel_id: Option<i64>,
    /// Thread title.
    pub title: String,
    /// Lifecycle state.
    pub status: ThreadStatus,
    /// External task reference, if any.
    pub task_id: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Timestamp of the last change (status, membership, or message).
    pub updated_at: String,
}

/// A single authored note in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Auto-incrementing ID; also the ordering tie-breaker within a thread.
    pub id: i64,
    /// Parent thread.
    pub thread_id: i64,
    /// Authoring agent ID.
    pub created_by: String,
    /// Message text.
    pub body: String,
    /// Urgency level.
    pub importance: Importance,
    /// Agent session reference, if any.
    pub session_id: Option<String>,
    /// Server-assigned creation timestamp.
    pub created_at: String,
}

/// Per-agent marker of the last message seen in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReadReceipt {
    /// Thread the receipt belongs to.
    pub thread_id: i64,
    /// Agent the receipt belongs to.
    pub agent_id: String,
    /// Highest message ID the agent has marked read. Never decreases.
    pub last_read_message_id: i64,
}

/// Current status of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AgentPresence {
    /// Stable agent identifier.
    pub agent_id: String,
    /// Free-form status string (e.g. "online", "working").
    pub status: String,
    /// What the agent is currently working on, if reported.
    pub current_task: Option<String>,
    /// Refreshed on every presence update.
    pub last_seen: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [ThreadStatus::Active, ThreadStatus::Paused, ThreadStatus::Closed] {
            assert_eq!(ThreadStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(matches!(
            ThreadStatus::from_str("archived"),
            Err(ValidationError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_importance_round_trip() {
        for level in [
            Importance::Low,
            Importance::Normal,
            Importance::High,
            Importance::Urgent,
        ] {
            assert_eq!(Importance::from_str(level.as_str()).unwrap(), level);
        }
        assert_eq!(Importance::default(), Importance::Normal);
        assert!(matches!(
            Importance::from_str("loud"),
            Err(ValidationError::InvalidImportance(_))
        ));
    }
}
