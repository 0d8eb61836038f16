//! Message edit route.

use axum::extract::{Path, State};
use axum::Json;
use database::Message;
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;

/// Request to edit a message's text.
#[derive(Deserialize)]
pub struct EditRequest {
    pub text: String,
}

/// Edit a sent message.
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<EditRequest>,
) -> Result<Json<Message>> {
    let message = state.outbound.edit(id, &req.text).await?;
    Ok(Json(message))
}
