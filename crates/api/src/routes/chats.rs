//! Chat message routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::{Chat, Message};
use gateway::Attachment;
use pipeline::{
    DeliveryStatus, InboxStore, MessageSyncReport, OutboundDraft, PendingMessage,
    PipelineError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

/// Message listing options.
#[derive(Deserialize)]
pub struct MessageQuery {
    pub limit: Option<i64>,
}

/// Request to send a message.
///
/// Either files or a voice note may be attached, not both.
#[derive(Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub voice: Option<Attachment>,
}

impl SendRequest {
    fn into_draft(self) -> Result<OutboundDraft> {
        let draft = match (self.voice, self.attachments.is_empty()) {
            (Some(_), false) => {
                return Err(ApiError::BadRequest(
                    "a message carries files or a voice note, not both".to_string(),
                ))
            }
            (Some(voice), true) => OutboundDraft::voice(voice),
            (None, false) => OutboundDraft::files(self.attachments),
            (None, true) => OutboundDraft::default(),
        };

        Ok(match self.text {
            Some(text) => draft.with_text(text),
            None => draft,
        })
    }
}

/// Send result.
///
/// `message` is absent when the provider accepted the send but it could not
/// be stored yet; the next chat sync stores it.
#[derive(Serialize)]
pub struct SendResponse {
    pub local_id: Uuid,
    pub status: DeliveryStatus,
    pub external_id: Option<String>,
    pub message: Option<Message>,
}

async fn find_chat(state: &AppState, external_id: &str) -> Result<Chat> {
    state
        .store
        .find_chat(external_id)
        .await?
        .ok_or_else(|| ApiError::Pipeline(PipelineError::UnknownChat(external_id.to_string())))
}

/// Sync the newest page of a chat's messages.
pub async fn sync(
    State(state): State<AppState>,
    Path(chat): Path<String>,
) -> Result<Json<MessageSyncReport>> {
    let report = state.sync.sync_messages_for_chat(&chat).await?;
    Ok(Json(report))
}

/// List a chat's newest messages in display order.
pub async fn messages(
    State(state): State<AppState>,
    Path(chat): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Vec<Message>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let chat = find_chat(&state, &chat).await?;
    let messages = state.store.list_messages(chat.id, limit).await?;
    Ok(Json(messages))
}

/// Send a message to a chat.
pub async fn send(
    State(state): State<AppState>,
    Path(chat): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<(StatusCode, Json<SendResponse>)> {
    let draft = req.into_draft()?;
    let chat = find_chat(&state, &chat).await?;

    let mut pending = PendingMessage::new(chat.id, draft);
    match state.outbound.dispatch(&mut pending).await {
        Ok(()) | Err(PipelineError::Unrecorded { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    let code = if pending.message().is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };

    Ok((
        code,
        Json(SendResponse {
            local_id: pending.local_id,
            status: pending.status(),
            external_id: pending.external_id().map(str::to_string),
            message: pending.message().cloned(),
        }),
    ))
}
