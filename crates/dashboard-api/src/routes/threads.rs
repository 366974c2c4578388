//! Thread listing, detail, and status update routes.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use database::thread::{ThreadDetail, ThreadSummary};
use database::{DatabaseError, Thread, ThreadStatus};

use crate::error::Result;
use crate::state::AppState;

/// Query parameters for the thread list.
#[derive(Deserialize)]
pub struct ListParams {
    /// Only threads this agent is a member of.
    pub agent: Option<String>,
}

/// List threads, most recently active first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ThreadSummary>>> {
    let threads =
        database::thread::list_threads(state.db.pool(), params.agent.as_deref()).await?;
    Ok(Json(threads))
}

/// Thread detail with messages and members.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ThreadDetail>> {
    let detail = database::thread::get_thread(state.db.pool(), id).await?;
    Ok(Json(detail))
}

/// Request to change a thread's status.
#[derive(Deserialize)]
pub struct UpdateRequest {
    pub status: String,
}

/// Update a thread's status.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Thread>> {
    let status = ThreadStatus::from_str(&req.status).map_err(DatabaseError::from)?;
    let thread =
        database::thread::update_thread(state.db.pool(), id, Some(status), &[], &[]).await?;
    Ok(Json(thread))
}
