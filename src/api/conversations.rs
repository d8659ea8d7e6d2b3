use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::conversations::{ConversationView, InboxEntry, ResolveConversation};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

/// Finds or opens the conversation with another user about an optional item.
///
/// # Errors
/// Returns `AppError::BadRequest` for self-conversations or when both a listing and a request are named.
pub async fn resolve_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ResolveConversation>,
) -> Result<impl IntoResponse> {
    payload.validate(auth_user.user_id).map_err(AppError::BadRequest)?;

    let conversation = state
        .conversation_service
        .resolve_conversation(auth_user.user_id, payload.other_user_id, payload.listing_id, payload.request_id)
        .await?;

    Ok(Json(ConversationView::from(conversation)))
}

pub async fn list_conversations(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let summaries = state.conversation_service.list_for_user(auth_user.user_id).await?;
    let inbox: Vec<InboxEntry> =
        summaries.into_iter().map(|s| InboxEntry::for_caller(s, auth_user.user_id)).collect();
    Ok(Json(inbox))
}

/// # Errors
/// Returns `AppError::NotFound` if the conversation is absent or belongs to other users.
pub async fn get_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let conversation = state.conversation_service.get(auth_user.user_id, conversation_id).await?;
    Ok(Json(ConversationView::from(conversation)))
}
