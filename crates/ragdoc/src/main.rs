//! # ragdoc CLI
//!
//! Ask questions about a text or PDF document using a local language model.
//!
//! The document is split into chunks, embedded, and indexed in memory; each
//! question retrieves the most relevant chunks and sends them, with the
//! question, to an Ollama server.
//!
//! ## Commands
//!
//! - `ragdoc ask <SOURCE> <QUESTION>` - Load a document and answer one question
//! - `ragdoc chat [SOURCE]` - Interactive session
//! - `ragdoc config show|init|path` - Inspect configuration
//!
//! ## Examples
//!
//! ```bash
//! # One-off question
//! ragdoc ask notes.txt "What color is the sky?"
//!
//! # Interactive session
//! ragdoc chat paper.pdf
//!
//! # JSON output
//! ragdoc ask https://example.com/report.pdf "Summarize the findings" --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragdoc_chat::{ChatSession, IngestSummary};
use ragdoc_core::Embedder;
use ragdoc_embed::HashingEmbedder;
use ragdoc_llm::OllamaClient;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::{Config, EmbeddingBackend};

#[derive(Parser)]
#[command(name = "ragdoc")]
#[command(about = "Ask questions about a text or PDF document")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/ragdoc/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and answer a single question
    Ask {
        /// Path or URL of a text or PDF document
        source: String,

        /// Question to answer
        question: String,
    },

    /// Interactive question answering session
    Chat {
        /// Document to load before the first question
        source: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for an answered question.
#[derive(Serialize)]
struct AnswerOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    question: &'a str,
    answer: &'a str,
}

/// A line typed into the chat loop.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Load(&'a str),
    Clear,
    Quit,
    Help,
    Question(&'a str),
    Empty,
}

fn parse_chat_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }

    match line.split_once(char::is_whitespace) {
        Some((":load", source)) => ChatInput::Load(source.trim()),
        _ => match line {
            ":clear" => ChatInput::Clear,
            ":quit" | ":q" | ":exit" => ChatInput::Quit,
            ":help" | ":load" => ChatInput::Help,
            question => ChatInput::Question(question),
        },
    }
}

const CHAT_HELP: &str = "Commands:
  :load <path or url>  Load a document, replacing the current one
  :clear               Forget the current document
  :quit                Leave
Anything else is a question about the loaded document.";

/// Build the embedder selected in the configuration.
async fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedding.backend {
        EmbeddingBackend::Hashing => {
            info!("Using hashing embedder");
            Ok(Arc::new(HashingEmbedder::new()))
        }
        EmbeddingBackend::Candle => candle_embedder(config).await,
    }
}

#[cfg(feature = "candle")]
async fn candle_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    use ragdoc_embed::CandleEmbedder;

    let cache_dir = crate::config::data_dir()
        .context("Failed to get data directory")?
        .join("models");
    let embedder = if config.embedding.use_gpu {
        CandleEmbedder::new(cache_dir)
    } else {
        CandleEmbedder::cpu(cache_dir)
    };

    // Downloads the model if needed
    info!("Initializing embedder (this may download the model on first run)...");
    embedder
        .init()
        .await
        .context("Failed to initialize embedder")?;

    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "candle"))]
async fn candle_embedder(_config: &Config) -> Result<Arc<dyn Embedder>> {
    tracing::warn!("Built without the candle feature, falling back to the hashing embedder");
    Ok(Arc::new(HashingEmbedder::new()))
}

/// Create a session wired to the configured embedder and Ollama server.
async fn create_session(config: &Config) -> Result<ChatSession> {
    let embedder = create_embedder(config).await?;

    let ollama = config.ollama_config();
    info!("Using Ollama model {} at {}", ollama.model, ollama.base_url);
    let llm = OllamaClient::new(ollama).context("Failed to create Ollama client")?;

    Ok(ChatSession::new(
        embedder,
        Arc::new(llm),
        config.session_config(),
    ))
}

fn print_ingest(summary: &IngestSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(summary)?),
        OutputFormat::Text => println!(
            "Loaded {} ({} documents, {} chunks)",
            summary.source, summary.documents, summary.chunks
        ),
    }
    Ok(())
}

fn print_answer(output: &AnswerOutput<'_>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(output)?),
        OutputFormat::Text => println!("{}", output.answer),
    }
    Ok(())
}

async fn run_chat(session: &ChatSession, source: Option<String>, format: OutputFormat) -> Result<()> {
    if let Some(source) = source {
        let summary = session
            .ingest(&source)
            .await
            .with_context(|| format!("Failed to load {source}"))?;
        print_ingest(&summary, format)?;
    }

    println!("{CHAT_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_chat_input(&line) {
            ChatInput::Empty => {}
            ChatInput::Quit => break,
            ChatInput::Help => println!("{CHAT_HELP}"),
            ChatInput::Clear => match session.clear().await {
                Ok(()) => println!("Cleared"),
                Err(e) => eprintln!("Failed to clear: {e}"),
            },
            ChatInput::Load(source) => match session.ingest(source).await {
                Ok(summary) => print_ingest(&summary, format)?,
                Err(e) => eprintln!("Failed to load {source}: {e}"),
            },
            ChatInput::Question(question) => match session.ask(question).await {
                Ok(answer) => {
                    let current = session.current_source().await;
                    print_answer(
                        &AnswerOutput {
                            source: current.as_deref(),
                            question,
                            answer: &answer,
                        },
                        format,
                    )?;
                }
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config from file or CLI-specified path
    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .context(format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };

    // Setup logging
    let configured = config.log_level();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        configured.as_ref().copied().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    if let Err(e) = configured {
        warn!("{e:#}; ignoring logging.level");
    }

    match cli.command {
        Commands::Ask { source, question } => {
            if question.trim().is_empty() {
                anyhow::bail!("Question must not be empty");
            }

            let session = create_session(&config).await?;
            session
                .ingest(&source)
                .await
                .with_context(|| format!("Failed to load {source}"))?;

            let answer = session
                .ask(&question)
                .await
                .context("Failed to answer question")?;

            print_answer(
                &AnswerOutput {
                    source: Some(&source),
                    question: &question,
                    answer: &answer,
                },
                cli.format,
            )?;
        }

        Commands::Chat { source } => {
            let session = create_session(&config).await?;
            run_chat(&session, source, cli.format).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                print!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}
