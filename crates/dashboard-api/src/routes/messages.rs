//! Message send route.

use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use database::{DatabaseError, Importance};

use crate::error::Result;
use crate::state::AppState;

/// Request to create a message.
#[derive(Deserialize)]
pub struct SendRequest {
    pub thread_id: i64,
    pub from: String,
    pub body: String,
    #[serde(default)]
    pub importance: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

/// Response carrying the new message ID.
#[derive(Serialize)]
pub struct SendResponse {
    pub id: i64,
}

/// Create a message in a thread.
pub async fn send(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<(StatusCode, Json<SendResponse>)> {
    let importance = match req.importance.as_deref() {
        Some(raw) => Importance::from_str(raw).map_err(DatabaseError::from)?,
        None => Importance::default(),
    };

    let message = database::message::send_message(
        state.db.pool(),
        req.thread_id,
        &req.from,
        &req.body,
        importance,
        req.session.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(SendResponse { id: message.id })))
}
