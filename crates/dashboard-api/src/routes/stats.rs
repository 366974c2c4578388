//! Stats route.

use axum::extract::State;
use axum::Json;

use database::stats::Stats;

use crate::error::Result;
use crate::state::AppState;

/// System-wide counters as JSON.
pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>> {
    let stats = database::stats::get_stats(state.db.pool()).await?;
    Ok(Json(stats))
}
