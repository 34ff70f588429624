//! Lore CLI - Command-line interface
//!
//! Usage:
//!   lore ingest <path> [--overlap 0.2]
//!   lore add <text>
//!   lore query <question> [--top-k 3]
//!   lore chat <path>

use anyhow::Context;
use clap::{Parser, Subcommand};
use lore_core::{AppConfig, LoggingConfig, LoreError, RagAnswer};
use lore_rag::{create_llm_client, RagPipeline};
use lore_vector::{create_embedding_client, create_vector_store};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const EXIT_COMMAND: &str = "/bye";

#[derive(Parser)]
#[command(name = "lore")]
#[command(about = "Paragraph RAG over a vector store")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true, env = "LORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a text file into paragraphs and index them
    Ingest {
        /// Path to a UTF-8 text file
        path: PathBuf,
        /// Fraction of words shared between neighbouring paragraphs, in [0, 1)
        #[arg(long)]
        overlap: Option<f64>,
    },
    /// Index one document as a single chunk
    Add {
        /// Document text
        text: String,
    },
    /// Answer a question from the indexed documents
    Query {
        /// Question to ask
        question: String,
        /// Number of passages to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Ingest a file, then answer questions until /bye
    Chat {
        /// Path to a UTF-8 text file
        path: PathBuf,
        #[arg(long)]
        overlap: Option<f64>,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let config = AppConfig::from_file(path)?.with_env_override()?;
            config.validate()?;
            config
        }
        None => AppConfig::load()?,
    };
    Ok(config)
}

/// Logs go to stderr so answers on stdout stay clean
fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.level.as_str().into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_pipeline(config: &AppConfig) -> anyhow::Result<RagPipeline> {
    let store = create_vector_store(&config.store)
        .await
        .context("Failed to open vector store")?;
    let embedder = create_embedding_client(config)?;
    let llm = create_llm_client(config)?;
    Ok(RagPipeline::new(embedder, store, llm, config.rag.clone()))
}

async fn ingest(pipeline: &RagPipeline, path: &Path, overlap: Option<f64>) -> anyhow::Result<()> {
    let overlap = overlap.unwrap_or(pipeline.config().default_overlap_ratio);
    let report = pipeline.ingest_file(path, overlap).await?;
    println!(
        "Ingested {}: {} paragraphs, {} chunks, {} inserted",
        path.display(),
        report.paragraphs,
        report.chunks,
        report.inserted
    );
    Ok(())
}

fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Numbered passages followed by the answer
fn render_with_passages(result: &RagAnswer) -> String {
    let mut out = String::from("Retrieved passages:\n");
    for (i, doc) in result.docs.iter().enumerate() {
        out.push_str(&format!("[{}] {}\n", i + 1, doc));
    }
    out.push_str("Answer:\n");
    out.push_str(&result.answer);
    out
}

/// Print an answer; a query with no matching context is not an error here
async fn ask(
    pipeline: &RagPipeline,
    question: &str,
    top_k: usize,
    show_passages: bool,
) -> anyhow::Result<()> {
    match pipeline.answer(question, top_k).await {
        Ok(result) if show_passages => {
            println!("{}", render_with_passages(&result));
            Ok(())
        }
        Ok(result) => {
            println!("{}", result.answer);
            Ok(())
        }
        Err(LoreError::NotFound(_)) => {
            println!("No relevant documents found.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn chat(pipeline: &RagPipeline, top_k: usize) -> anyhow::Result<()> {
    println!("Ask a question, or type {EXIT_COMMAND} to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        if is_exit_command(question) {
            break;
        }
        if question.is_empty() {
            continue;
        }

        if let Err(e) = ask(pipeline, question, top_k, true).await {
            eprintln!("Error: {e}");
        }
    }

    println!("Bye.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    let pipeline = build_pipeline(&config).await?;

    match cli.command {
        Commands::Ingest { path, overlap } => {
            ingest(&pipeline, &path, overlap).await?;
        }
        Commands::Add { text } => {
            pipeline.add_document(&text).await?;
            println!("Document added");
        }
        Commands::Query { question, top_k } => {
            let top_k = top_k.unwrap_or(config.rag.default_top_k);
            ask(&pipeline, &question, top_k, false).await?;
        }
        Commands::Chat {
            path,
            overlap,
            top_k,
        } => {
            ingest(&pipeline, &path, overlap).await?;
            let top_k = top_k.unwrap_or(config.rag.default_top_k);
            chat(&pipeline, top_k).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest_with_overlap() {
        let cli = Cli::try_parse_from(["lore", "ingest", "notes.md", "--overlap", "0.25"]).unwrap();
        match cli.command {
            Commands::Ingest { path, overlap } => {
                assert_eq!(path, PathBuf::from("notes.md"));
                assert_eq!(overlap, Some(0.25));
            }
            _ => panic!("expected ingest"),
        }
    }

    #[test]
    fn test_parse_query_defaults() {
        let cli = Cli::try_parse_from(["lore", "query", "what is lore?"]).unwrap();
        match cli.command {
            Commands::Query { question, top_k } => {
                assert_eq!(question, "what is lore?");
                assert_eq!(top_k, None);
            }
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rag]\ndefault_top_k = 7").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.rag.default_top_k, 7);
    }

    #[test]
    fn test_exit_command_ignores_case() {
        assert!(is_exit_command("/bye"));
        assert!(is_exit_command("  /BYE "));
        assert!(is_exit_command("/Bye"));
        assert!(!is_exit_command("bye"));
        assert!(!is_exit_command("/bye now"));
    }

    #[test]
    fn test_render_with_passages_numbers_docs() {
        let result = RagAnswer {
            answer: "At 9am.".to_string(),
            docs: vec!["Opens at 9am.".to_string(), "Closes at 6pm.".to_string()],
        };

        assert_eq!(
            render_with_passages(&result),
            "Retrieved passages:\n[1] Opens at 9am.\n[2] Closes at 6pm.\nAnswer:\nAt 9am."
        );
    }
}
