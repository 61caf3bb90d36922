pub mod builder;
pub mod dbs;
pub mod error;
pub mod models;
pub mod trait_client;
pub mod usage;

pub use builder::StoreBuilder;
pub use dbs::sqlite::SqliteConversationStore;
pub use error::PersistError;
pub use models::{ConversationRecord, NewConversation};
pub use trait_client::ConversationStore;
pub use usage::{UsageSnapshot, UsageStats, WriteHealth, WriteHealthSnapshot};
