pub mod chat_store;
pub mod conversation_service;
mod denials;
pub mod health_service;
pub mod message_service;
