pub mod conversation;
pub mod message;

pub use conversation::{ConversationRecord, ConversationSummaryRecord};
pub use message::MessageRecord;
