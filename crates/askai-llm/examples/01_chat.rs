use anyhow::Result;
use askai_llm::{ChatClient, ChatOptions, ChatRequest, Message, OpenAIClient};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENAI_API_KEY")?;
    let client = OpenAIClient::new(api_key)?;

    let request = ChatRequest::new(
        "gpt-3.5-turbo",
        vec![Message::human("What is the capital of France?")],
    )
    .with_options(
        ChatOptions::new()
            .max_tokens(200)
            .temperature(0.7)
            .timeout(Duration::from_secs(30)),
    );

    match client.chat(request).await {
        Ok(response) => {
            println!("Response: {}", response.content);
            println!("Tokens used: {}", response.total_tokens());
        }
        Err(e) => eprintln!("Request failed: {}", e),
    }

    Ok(())
}
