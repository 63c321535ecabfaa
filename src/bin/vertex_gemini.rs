//! vertex-gemini: command-line entry point.
//!
//! ```text
//! vertex-gemini chat --prompt "Explain lifetimes in one paragraph"
//! vertex-gemini stream
//! vertex-gemini vision --image-uri gs://my-bucket/cat.jpg
//! vertex-gemini models --config probe.yaml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use vertex_gemini::config::{GeminiConfig, ProbeConfig};
use vertex_gemini::render;
use vertex_gemini::{CancelToken, ChatSession, Error, GeminiClient, ModelProber};

const DEFAULT_CHAT_PROMPT: &str = "Tell me three things that make programming fun.";
const DEFAULT_VISION_PROMPT: &str = "Describe what is in this image in detail.";

#[derive(Parser)]
#[command(name = "vertex-gemini")]
#[command(about = "Gemini on Vertex AI: chat, streaming chat, image analysis and model checks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the reply
    Chat {
        /// Prompt text
        #[arg(short, long, default_value = DEFAULT_CHAT_PROMPT)]
        prompt: String,
    },

    /// Interactive chat with streamed replies
    Stream,

    /// Ask a question about an image
    Vision {
        /// gs:// or https:// URI, or a local file path
        #[arg(long)]
        image_uri: String,

        /// Question about the image
        #[arg(short, long, default_value = DEFAULT_VISION_PROMPT)]
        prompt: String,
    },

    /// Check which Gemini models this project can call
    Models {
        /// YAML file with candidates and priority
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Trial prompt sent to every candidate
        #[arg(long)]
        prompt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat { prompt } => chat(&prompt).await,
        Commands::Stream => stream_chat().await,
        Commands::Vision { image_uri, prompt } => vision(&image_uri, &prompt).await,
        Commands::Models { config, prompt } => models(config, prompt).await,
    }
}

fn load_config() -> anyhow::Result<GeminiConfig> {
    GeminiConfig::from_env().context("add the missing setting to .env and try again")
}

/// Client for the commands that need `GEMINI_MODEL`.
fn client_with_model() -> anyhow::Result<GeminiClient> {
    let config = load_config()?;
    if let Err(e) = config.require_model() {
        eprintln!("{}", e);
        eprintln!("Run `vertex-gemini models` to see which models are available.");
        anyhow::bail!("GEMINI_MODEL is not set");
    }
    Ok(GeminiClient::new(config)?)
}

fn is_not_found(err: &Error) -> bool {
    err.http_status() == Some(404) || err.to_string().to_lowercase().contains("not found")
}

async fn chat(prompt: &str) -> anyhow::Result<()> {
    let client = client_with_model()?;
    println!("Model: {}\n", client.model().unwrap_or_default());
    println!("{}", render::panel("Prompt", prompt));

    match client.generate_text(prompt).await {
        Ok(reply) => {
            println!("{}", render::panel("Gemini", reply.text_or_empty()));
            Ok(())
        }
        Err(e) => {
            if is_not_found(&e) {
                eprintln!("The model was not found in this project or region.");
                eprintln!("Run `vertex-gemini models` to see which models are available.");
            }
            Err(e.into())
        }
    }
}

async fn stream_chat() -> anyhow::Result<()> {
    let client = client_with_model()?;
    println!(
        "Chatting with Gemini ({}). Type 'exit' or 'quit' to leave.\n",
        client.model().unwrap_or_default()
    );

    let mut session = ChatSession::new(client);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nInterrupted");
                return Ok(());
            }
        };
        // EOF
        let Some(line) = line else {
            println!();
            return Ok(());
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            println!("\nBye.");
            return Ok(());
        }

        print!("\nGemini: ");
        std::io::stdout().flush()?;
        let send = session.send_message_stream(input, |delta| {
            print!("{}", delta);
            let _ = std::io::stdout().flush();
        });
        tokio::select! {
            res = send => match res {
                Ok(_) => println!("\n"),
                Err(e) => eprintln!("\nError: {}\n", e),
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nInterrupted");
                return Ok(());
            }
        }
    }
}

async fn vision(image_uri: &str, prompt: &str) -> anyhow::Result<()> {
    let client = client_with_model()?;
    println!("Image: {}", image_uri);
    println!("{}", render::panel("Question", prompt));

    match client.analyze_image(image_uri, prompt).await {
        Ok(reply) => {
            println!("Gemini's analysis:");
            println!("{}", render::panel("", reply.text_or_empty()));
            Ok(())
        }
        Err(e) => {
            eprintln!("Hints:");
            eprintln!("  - remote images must be uploaded to Cloud Storage (gs://...)");
            eprintln!("  - the caller needs the Storage Object Viewer role on the bucket");
            Err(e.into())
        }
    }
}

async fn models(config_path: Option<PathBuf>, prompt: Option<String>) -> anyhow::Result<()> {
    let gemini = load_config()?;
    let mut probe_config = match &config_path {
        Some(path) => ProbeConfig::from_file(path)?,
        None => ProbeConfig::default(),
    };
    if let Some(prompt) = prompt {
        probe_config.prompt = prompt;
    }

    println!("{}", render::panel("", "Vertex AI Gemini model availability"));
    println!("Project: {}", gemini.project_id);
    println!("Location: {}\n", gemini.location);

    let client = GeminiClient::new(gemini)?;
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let report = ModelProber::from_config(&probe_config)
        .run(&client, &probe_config, Some(&cancel))
        .await;
    watcher.abort();
    let report = report?;

    print!("{}", render::probe_table(&report.outcomes));
    println!();
    print!("{}", render::probe_summary(&report));
    Ok(())
}
