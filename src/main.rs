use std::io::{self, Write};

use anyhow::Result;

use nimbus_chat::{ChatMessage, ChatOutcome, ChatRequest, Pipeline};
use nimbus_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    nimbus_core::init()?;

    let (config, _) = Config::load_validated()?;
    let pipeline = Pipeline::from_config(&config);
    tracing::info!("nimbus started");

    println!("Nimbus Weather Chat");
    println!("Ask about current conditions, forecasts, or alerts for any place.");
    println!("Type \"exit\" to quit.\n");

    let mut history: Vec<ChatMessage> = Vec::new();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        let mut request = ChatRequest::new(message);
        request.conversation_history = history.clone();

        match pipeline.handle(&request).await {
            ChatOutcome::Reply(reply) => {
                println!("\n{}\n", reply.response);
                history.push(ChatMessage::user(message));
                history.push(ChatMessage::assistant(reply.response));
            }
            ChatOutcome::BadRequest { error } => {
                println!("\n{error}\n");
            }
            ChatOutcome::BackendUnavailable { error, fallback } => {
                tracing::warn!("generation unavailable: {error}");
                println!("\n{fallback}\n");
            }
        }
    }

    tracing::info!("nimbus shutting down");
    Ok(())
}
