use crate::domain::conversation::{Conversation, ConversationSummary};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConversation {
    pub other_user_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
}

impl ResolveConversation {
    /// Checks the request on behalf of the resolver, which accepts anything.
    ///
    /// # Errors
    /// Returns an error if the caller targets themselves or names both a listing and a request.
    pub fn validate(&self, caller: Uuid) -> Result<(), String> {
        if self.other_user_id == caller {
            return Err("Cannot start a conversation with yourself".into());
        }
        if self.listing_id.is_some() && self.request_id.is_some() {
            return Err("A conversation can reference a listing or a request, not both".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: Uuid,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub listing_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Conversation> for ConversationView {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            participant_a: conversation.participant_a,
            participant_b: conversation.participant_b,
            listing_id: conversation.listing_ref,
            request_id: conversation.request_ref,
            last_activity_at: conversation.last_activity_at,
            created_at: conversation.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    #[serde(flatten)]
    pub conversation: ConversationView,
    pub other_user_id: Option<Uuid>,
    pub unread_count: i64,
}

impl InboxEntry {
    #[must_use]
    pub fn for_caller(summary: ConversationSummary, caller: Uuid) -> Self {
        let other_user_id = summary.conversation.counterpart(caller);
        Self { conversation: summary.conversation.into(), other_user_id, unread_count: summary.unread_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_success() {
        let req = ResolveConversation { other_user_id: Uuid::new_v4(), listing_id: Some(Uuid::new_v4()), request_id: None };
        assert!(req.validate(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_validate_direct_message_without_item() {
        let req = ResolveConversation { other_user_id: Uuid::new_v4(), listing_id: None, request_id: None };
        assert!(req.validate(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_validate_self_conversation() {
        let caller = Uuid::new_v4();
        let req = ResolveConversation { other_user_id: caller, listing_id: None, request_id: None };
        assert_eq!(req.validate(caller).unwrap_err(), "Cannot start a conversation with yourself");
    }

    #[test]
    fn test_validate_both_refs() {
        let req = ResolveConversation {
            other_user_id: Uuid::new_v4(),
            listing_id: Some(Uuid::new_v4()),
            request_id: Some(Uuid::new_v4()),
        };
        assert!(req.validate(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let other = Uuid::new_v4();
        let json = format!(r#"{{"otherUserId":"{other}","listingId":null}}"#);
        let req: ResolveConversation = serde_json::from_str(&json).unwrap();
        assert_eq!(req.other_user_id, other);
        assert!(req.listing_id.is_none());
        assert!(req.request_id.is_none());
    }
}
