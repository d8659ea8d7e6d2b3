use clap::ValueEnum;
use time::OffsetDateTime;
use uuid::Uuid;

/// A thread between exactly two users, optionally about one listing or request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub listing_ref: Option<Uuid>,
    pub request_ref: Option<Uuid>,
    pub last_activity_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl Conversation {
    #[must_use]
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    /// The other side of the conversation, if `user_id` is on it.
    #[must_use]
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        if self.participant_a == user_id {
            Some(self.participant_b)
        } else if self.participant_b == user_id {
            Some(self.participant_a)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ParticipantOrder {
    /// Store and look up the pair exactly as the initiator supplied it.
    #[default]
    AsGiven,
    /// Sort the pair first, so either initiator resolves to the same row.
    Normalized,
}

/// The uniqueness tuple of a conversation. Participant order is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub listing_ref: Option<Uuid>,
    pub request_ref: Option<Uuid>,
}

impl ConversationKey {
    #[must_use]
    pub const fn new(
        user_id: Uuid,
        other_user_id: Uuid,
        listing_ref: Option<Uuid>,
        request_ref: Option<Uuid>,
    ) -> Self {
        Self { participant_a: user_id, participant_b: other_user_id, listing_ref, request_ref }
    }

    #[must_use]
    pub fn ordered(self, order: ParticipantOrder) -> Self {
        match order {
            ParticipantOrder::AsGiven => self,
            ParticipantOrder::Normalized if self.participant_b < self.participant_a => Self {
                participant_a: self.participant_b,
                participant_b: self.participant_a,
                ..self
            },
            ParticipantOrder::Normalized => self,
        }
    }

    #[must_use]
    pub fn matches(&self, conversation: &Conversation) -> bool {
        conversation.participant_a == self.participant_a
            && conversation.participant_b == self.participant_b
            && conversation.listing_ref == self.listing_ref
            && conversation.request_ref == self.request_ref
    }

    #[must_use]
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }
}

/// A conversation as seen from one participant's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub unread_count: i64,
}
