//! Agent presence route.

use axum::extract::State;
use axum::Json;

use database::AgentPresence;

use crate::error::Result;
use crate::state::AppState;

/// Presence for all agents, ordered by agent ID.
pub async fn agents(State(state): State<AppState>) -> Result<Json<Vec<AgentPresence>>> {
    let presence = database::presence::list_presence(state.db.pool()).await?;
    Ok(Json(presence))
}
