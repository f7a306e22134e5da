use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use docchat_cli::ui::{self, Mode};
use docchat_cli::{
    AppConfig, ChatSession, Document, DocumentChat, EmbedderBackend, EmbedderKind, Error,
    Summarizer,
};
use docchat_ollama::OllamaClient;
use docchat_rag::{FileVectorStore, IngestionPipeline, LocalRAGEngine, decode};

type Documents = DocumentChat<
    LocalRAGEngine<FileVectorStore, EmbedderBackend>,
    IngestionPipeline<FileVectorStore, EmbedderBackend>,
    OllamaClient,
>;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Chat with your documents using a local Ollama model", long_about = None)]
struct Cli {
    /// Vector store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Chat model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Embedding model
    #[arg(long, global = true)]
    embed_model: Option<String>,

    /// Embedder backend: ollama or hash
    #[arg(long, global = true)]
    embedder: Option<EmbedderKind>,

    /// Ollama base URL
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Maximum chunk size in characters
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model without documents
    Chat,
    /// Index files, then chat about them
    Rag {
        files: Vec<PathBuf>,
    },
    /// Index files into the store
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Answer one question from the indexed documents
    Ask {
        question: String,
        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Show the passages closest to a query
    Search {
        query: String,
        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Summarize a text file
    Summarize {
        file: PathBuf,
    },
    /// Show vector store statistics
    Stats,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) -> docchat_cli::Result<()> {
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if let Some(model) = &self.model {
            config.ollama.chat_model = model.clone();
        }
        if let Some(embed_model) = &self.embed_model {
            config.ollama.embed_model = embed_model.clone();
        }
        if let Some(embedder) = self.embedder {
            config.embedder = embedder;
        }
        if let Some(url) = &self.ollama_url {
            config.ollama.base_url = url.clone();
        }
        if let Some(size) = self.chunk_size {
            config.chunk.max_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunk.overlap = overlap;
        }
        if let Some(
            Commands::Ask { top_k: Some(k), .. } | Commands::Search { top_k: Some(k), .. },
        ) = &self.command
        {
            config.top_k = *k;
        }
        config.validate()
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli).await;
    if let Some(hint) = result
        .as_ref()
        .err()
        .and_then(|e| e.downcast_ref::<Error>())
        .and_then(ui::failure_hint)
    {
        eprintln!("{}", hint.dimmed());
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    cli.apply(&mut config)?;
    debug!("Configuration: {:?}", config);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&config).await,
        Commands::Rag { files } => {
            let mut chat = open_documents(&config).await?;
            if !files.is_empty() {
                upload(&mut chat, &files).await;
            }
            run_documents(chat, &config.ollama.chat_model).await
        }
        Commands::Ingest { files } => {
            let mut chat = open_documents(&config).await?;
            if upload(&mut chat, &files).await {
                Ok(())
            } else {
                bail!("not every file was indexed")
            }
        }
        Commands::Ask { question, .. } => {
            let mut chat = open_documents(&config).await?;
            let answer = chat.ask_streaming(&question, print_fragment).await?;
            println!();
            println!();
            ui::print_passages(&answer.passages);
            Ok(())
        }
        Commands::Search { query, .. } => {
            let chat = open_documents(&config).await?;
            let passages = chat.search(&query, config.top_k).await?;
            ui::print_passages(&passages);
            Ok(())
        }
        Commands::Summarize { file } => {
            let document = Document::from_file(&file).await?;
            let decoded = decode(&document.content, document.encoding.as_deref())?;
            let summarizer = Summarizer::new(OllamaClient::new(config.ollama.clone())?);
            let summary = summarizer
                .summarize(&decoded.text)
                .await
                .with_context(|| format!("failed to summarize {}", file.display()))?;
            println!("{}", summary);
            Ok(())
        }
        Commands::Stats => {
            let chat = open_documents(&config).await?;
            println!("{}", serde_json::to_string_pretty(&chat.stats().await?)?);
            Ok(())
        }
    }
}

fn print_fragment(fragment: &str) {
    print!("{}", fragment);
    io::stdout().flush().ok();
}

async fn open_documents(config: &AppConfig) -> Result<Documents> {
    let store = FileVectorStore::open(&config.store_path)
        .await
        .with_context(|| format!("failed to open store {}", config.store_path.display()))?;
    let store = Arc::new(store);
    let embedder = Arc::new(EmbedderBackend::from_config(config)?);

    let rag = LocalRAGEngine::new(Arc::clone(&store), Arc::clone(&embedder));
    let indexer = IngestionPipeline::with_config(store, embedder, config.chunk)?;
    let llm = OllamaClient::new(config.ollama.clone())?;

    Ok(DocumentChat::new(rag, indexer, llm, config.top_k)?)
}

/// Index files and report each one; true when all of them were committed
async fn upload(chat: &mut Documents, files: &[PathBuf]) -> bool {
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        match Document::from_file(file).await {
            Ok(document) => documents.push(document),
            Err(e) => {
                ui::print_error(&format!("cannot read {}: {}", file.display(), e));
                return false;
            }
        }
    }

    let outcome = chat.upload(documents).await;
    ui::print_ingestion(&outcome.committed);
    match outcome.error {
        Some(e) => {
            ui::print_failure(&e);
            false
        }
        None => true,
    }
}

async fn run_chat(config: &AppConfig) -> Result<()> {
    let mut session = ChatSession::new(OllamaClient::new(config.ollama.clone())?);
    ui::display_banner(Mode::Chat, session.model_id());

    let mut history = Vec::new();
    while let Some(input) = ui::read_line_with_history("you>", &mut history)? {
        match input.as_str() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/help" => ui::print_help(Mode::Chat),
            "/history" => ui::print_history(session.conversation().all()),
            _ => {
                print!("{} ", "assistant>".green().bold());
                match session.send_streaming(&input, print_fragment).await {
                    Ok(_) => println!(),
                    Err(e) => {
                        println!();
                        ui::print_failure(&e);
                    }
                }
            }
        }
    }
    println!("{}", "Goodbye!".green());
    Ok(())
}

async fn run_documents(mut chat: Documents, model_id: &str) -> Result<()> {
    ui::display_banner(Mode::Documents, model_id);

    let mut history = Vec::new();
    while let Some(input) = ui::read_line_with_history("ask>", &mut history)? {
        let mut words = input.split_whitespace();
        match words.next() {
            None => continue,
            Some("/exit" | "/quit") => break,
            Some("/help") => ui::print_help(Mode::Documents),
            Some("/history") => ui::print_history(chat.conversation().all()),
            Some("/stats") => match chat.stats().await {
                Ok(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
                Err(e) => ui::print_failure(&e),
            },
            Some("/upload") => {
                let files: Vec<PathBuf> = words.map(PathBuf::from).collect();
                if files.is_empty() {
                    ui::print_error(&"usage: /upload <path>...");
                } else {
                    upload(&mut chat, &files).await;
                }
            }
            Some(command) if command.starts_with('/') => {
                ui::print_error(&format!("unknown command {}, try /help", command));
            }
            Some(_) => {
                print!("{} ", "assistant>".green().bold());
                match chat.ask_streaming(&input, print_fragment).await {
                    Ok(answer) => {
                        println!();
                        ui::print_passages(&answer.passages);
                    }
                    Err(e) => {
                        println!();
                        ui::print_failure(&e);
                    }
                }
            }
        }
    }
    println!("{}", "Goodbye!".green());
    Ok(())
}
