use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::messages::{MessageView, SendMessage};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Sends a message as the authenticated user.
///
/// # Errors
/// Returns `AppError::BadRequest` if the content is blank or too long.
/// Returns `AppError::Forbidden` if the caller is not a participant.
pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<SendMessage>,
) -> Result<impl IntoResponse> {
    let content = payload.into_content(state.config.messaging.max_content_length).map_err(AppError::BadRequest)?;

    let message =
        state.message_service.send(auth_user.user_id, conversation_id, auth_user.user_id, content).await?;

    Ok((StatusCode::CREATED, Json(MessageView::from(message))))
}

/// Lists a conversation's messages, newest first.
///
/// # Errors
/// Returns `AppError::NotFound` if the conversation is not visible to the caller.
pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let messages = state.message_service.list(auth_user.user_id, conversation_id).await?;
    let views: Vec<MessageView> = messages.into_iter().map(Into::into).collect();
    Ok(Json(views))
}

/// # Errors
/// Returns `AppError::NotFound` if the message is not visible to the caller.
/// Returns `AppError::Forbidden` if the caller may not mark it read.
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let message = state.message_service.mark_read(auth_user.user_id, message_id).await?;
    Ok(Json(MessageView::from(message)))
}
