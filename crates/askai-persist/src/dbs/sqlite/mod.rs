mod client;
mod models;

pub use client::SqliteConversationStore;
pub use models::ConversationRow;
