//! Row access rules for conversations and messages.
//!
//! Every predicate takes the caller's identity and the owner fields of the row
//! being touched. The service layer evaluates these before each operation and
//! the in-memory store evaluates them again on its own reads and writes, mirroring the
//! row-level policies installed in Postgres.

use crate::domain::conversation::{Conversation, ConversationKey};
use crate::domain::message::Message;
use clap::ValueEnum;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReadRule {
    /// Only the conversation's second participant, and never the sender.
    #[default]
    SecondParticipant,
    /// Whichever participant did not send the message.
    Recipient,
}

impl ReadRule {
    /// Value published to the row-level policies as `nearlink.read_rule`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecondParticipant => "second-participant",
            Self::Recipient => "recipient",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Conversation,
    Message,
}

impl Resource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Message => "message",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

#[must_use]
pub fn can_read_conversation(caller: Uuid, conversation: &Conversation) -> bool {
    conversation.has_participant(caller)
}

#[must_use]
pub fn can_create_conversation(caller: Uuid, key: &ConversationKey) -> bool {
    key.has_participant(caller)
}

/// Covers the `last_activity_at` bump; allowed by the same ownership as read.
#[must_use]
pub fn can_update_conversation(caller: Uuid, conversation: &Conversation) -> bool {
    conversation.has_participant(caller)
}

#[must_use]
pub fn can_read_message(caller: Uuid, conversation: &Conversation) -> bool {
    conversation.has_participant(caller)
}

#[must_use]
pub fn can_create_message(caller: Uuid, conversation: &Conversation, sender_id: Uuid) -> bool {
    caller == sender_id && conversation.has_participant(sender_id)
}

/// Whether `caller` may set `read_at` on `message`.
///
/// Under [`ReadRule::SecondParticipant`] a message sent by `participant_b`
/// cannot be marked read by anyone.
#[must_use]
pub fn can_mark_read(caller: Uuid, conversation: &Conversation, message: &Message, rule: ReadRule) -> bool {
    if caller == message.sender_id || message.conversation_id != conversation.id {
        return false;
    }
    match rule {
        ReadRule::SecondParticipant => caller == conversation.participant_b,
        ReadRule::Recipient => conversation.has_participant(caller),
    }
}
