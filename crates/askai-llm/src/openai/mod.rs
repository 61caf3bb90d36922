pub mod client;

pub use client::{OpenAIClient, OPENAI_API_BASE};
