use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyrag::cli;
use studyrag::config::RagConfig;

#[derive(Parser)]
#[command(name = "studyrag")]
#[command(about = "Retrieval-augmented study assistant over personal notes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read, chunk, embed, and index a folder of notes
    Ingest {
        /// Folder (or single file) containing .md/.txt/.pdf notes
        #[arg(short, long)]
        path: PathBuf,

        /// Chunk size in words
        #[arg(long, default_value = "900")]
        chunk_size: usize,

        /// Chunk overlap in words
        #[arg(long, default_value = "120")]
        chunk_overlap: usize,
    },

    /// Retrieve the top-k chunks for a query
    Query {
        /// Query text
        query: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long, default_value = "6")]
        top_k: usize,
    },

    /// Answer a question grounded in your notes
    Ask {
        /// The question to answer
        question: String,

        /// Number of chunks to retrieve as context
        #[arg(short = 'k', long, default_value = "6")]
        top_k: usize,
    },

    /// Produce a short guided summary of a topic
    Summarize {
        /// Topic to summarize
        topic: String,

        /// Number of chunks to retrieve as context
        #[arg(short = 'k', long, default_value = "6")]
        top_k: usize,
    },

    /// Generate a multiple-choice quiz on a topic
    Quiz {
        /// Topic to quiz on
        topic: String,

        /// Number of chunks to retrieve as context
        #[arg(short = 'k', long, default_value = "6")]
        top_k: usize,
    },

    /// Evaluate retrieval (and optionally answers) on a JSONL dataset
    Eval {
        /// Path to the evaluation dataset (JSONL)
        #[arg(long)]
        data: PathBuf,

        /// Default top-k for retrieval
        #[arg(short, long, default_value = "6")]
        k: usize,

        /// Skip answer generation and faithfulness judging
        #[arg(long)]
        no_answer: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyrag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::from_env();

    match cli.command {
        Commands::Ingest {
            path,
            chunk_size,
            chunk_overlap,
        } => {
            cli::ingest(&config, &path, chunk_size, chunk_overlap)?;
        }

        Commands::Query { query, top_k } => {
            cli::query(&config, &query, top_k)?;
        }

        Commands::Ask { question, top_k } => {
            cli::ask(&config, &question, top_k)?;
        }

        Commands::Summarize { topic, top_k } => {
            cli::summarize(&config, &topic, top_k)?;
        }

        Commands::Quiz { topic, top_k } => {
            cli::quiz(&config, &topic, top_k)?;
        }

        Commands::Eval { data, k, no_answer } => {
            cli::eval(&config, &data, k, !no_answer)?;
        }
    }

    Ok(())
}
