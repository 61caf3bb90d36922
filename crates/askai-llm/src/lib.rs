pub mod config;
pub mod error;
pub mod openai;
pub mod traits;
pub mod types;

pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};

pub use config::{ClientFactory, OpenAIConfig};
pub use error::UpstreamError;
pub use openai::OpenAIClient;
pub use types::Message;
