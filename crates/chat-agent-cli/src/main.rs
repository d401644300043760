//! chat-agent CLI - Send a prompt to an OpenRouter-style chat-completion API
//!
//! Usage:
//!     chat-agent [OPTIONS] [PROMPT]
//!
//! Environment Variables:
//!     OPENROUTER_API_KEY: API key (required)
//!     CHAT_AGENT_MODEL: Model identifier (default: google/gemini-2.0-flash-exp:free)
//!     CHAT_AGENT_SYSTEM_PROMPT: System prompt for every request
//!     CHAT_AGENT_BASE_URL: Chat-completions endpoint URL
//!
//! Variables are also read from a `.env` file in the working directory.

use anyhow::{Context, Result};
use chat_agent::{
    api_key_from_env, mask_api_key, ChatCompletionClient, ClientConfig, Completion, TelemetrySink,
    TracingSink, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, OPENROUTER_API_URL,
};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Chat Agent - one-shot chat completions from the terminal
#[derive(Parser, Debug)]
#[command(name = "chat-agent")]
#[command(about = "Chat Agent - one-shot chat completions from the terminal")]
#[command(after_help = r#"Examples:
    # Ask a single question
    chat-agent "What can you tell me about yourself?"

    # Pick a model
    chat-agent --model openai/gpt-4o-mini "Summarize RFC 2616 in one line"

    # Point at a different endpoint
    chat-agent --base-url http://localhost:8080/v1/chat/completions "Hi"

    # Interactive mode
    chat-agent
"#)]
struct Cli {
    /// Model identifier
    #[arg(long, env = "CHAT_AGENT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// System prompt sent with every request
    #[arg(long, env = "CHAT_AGENT_SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,

    /// Chat-completions endpoint URL
    #[arg(long, env = "CHAT_AGENT_BASE_URL", default_value = OPENROUTER_API_URL)]
    base_url: String,

    /// Suppress the token/latency summary
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Prompt to send (interactive mode if not provided)
    prompt: Option<String>,
}

/// Print one completion result.
fn print_completion(completion: &Completion, quiet: bool) {
    println!("\nAgent response: {}", completion.text);
    if !quiet {
        println!(
            "({} tokens, {} ms)",
            completion.usage.total_tokens,
            completion.latency.as_millis()
        );
    }
}

/// Send a single prompt and print the reply.
async fn run_once(client: &ChatCompletionClient, prompt: &str, quiet: bool) -> Result<()> {
    if !quiet {
        println!("\nSending request to OpenRouter...");
    }

    let completion = client
        .complete(prompt)
        .await
        .context("completion request failed")?;

    print_completion(&completion, quiet);
    Ok(())
}

/// Read prompts from stdin until the user quits.
async fn run_interactive(client: &ChatCompletionClient, quiet: bool) -> Result<()> {
    println!("\nEntering interactive mode. Type 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("Enter your prompt: ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(_) => {
                println!("\n\nInterrupted. Goodbye!");
                break;
            }
        }

        let prompt = input.trim();

        if prompt.eq_ignore_ascii_case("quit")
            || prompt.eq_ignore_ascii_case("exit")
            || prompt.eq_ignore_ascii_case("q")
        {
            println!("Goodbye!");
            break;
        }

        if prompt.is_empty() {
            continue;
        }

        match client.complete(prompt).await {
            Ok(completion) => print_completion(&completion, quiet),
            Err(e) => eprintln!("\nError: {}\n", e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Cli::parse();

    let sink: Arc<dyn TelemetrySink> = Arc::new(TracingSink);

    let api_key = match api_key_from_env(sink.as_ref()) {
        Ok(key) => {
            println!("API key found: {}", mask_api_key(&key));
            key
        }
        Err(_) => {
            eprintln!("No API key found! Set OPENROUTER_API_KEY in the environment or a .env file.");
            std::process::exit(1);
        }
    };

    let config = ClientConfig::new(&args.model, &args.system_prompt, api_key)
        .with_base_url(&args.base_url);

    let client = ChatCompletionClient::new(config, sink)?;

    if let Some(prompt) = &args.prompt {
        run_once(&client, prompt, args.quiet).await?;
    } else {
        run_interactive(&client, args.quiet).await?;
    }

    Ok(())
}
