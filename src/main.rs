//! # normativa-rag CLI (`nrag`)
//!
//! Builds the retrieval engine from a TOML configuration and answers
//! queries against the normativas and resolved-ticket corpora.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nrag search "<query>"` | Nearest normativa passages |
//! | `nrag similar "<query>"` | Most similar resolved tickets |
//! | `nrag answer "<query>"` | Search, then synthesize a response |
//! | `nrag stats` | Build the indices and print their sizes |
//! | `nrag chunk <file>` | Show how a document would be chunked |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use normativa_rag::chunk::split_text;
use normativa_rag::config::{self, Config, TicketStrategy};
use normativa_rag::models::{PassageHit, TicketMatch};
use normativa_rag::synth::{create_synthesizer, excerpt};
use normativa_rag::RetrievalEngine;

/// Semantic search over building regulations and resolved support tickets.
#[derive(Parser)]
#[command(name = "nrag", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/nrag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search normativa passages nearest to a query.
    Search {
        query: String,

        /// Maximum number of passages (defaults to `retrieval.default_k`).
        #[arg(long)]
        k: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Find resolved tickets similar to a query.
    Similar {
        query: String,

        /// Maximum number of tickets (defaults to `retrieval.ticket_k`).
        #[arg(long)]
        k: Option<usize>,

        /// `embedding` or `lexical` (defaults to `retrieval.ticket_strategy`).
        #[arg(long)]
        strategy: Option<TicketStrategy>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search normativas and synthesize an answer from the top passages.
    Answer {
        query: String,

        #[arg(long)]
        k: Option<usize>,
    },

    /// Build both indices and print corpus sizes.
    Stats,

    /// Dry-run the chunker on a single file.
    Chunk {
        file: PathBuf,

        /// Override `chunking.max_chunk_size`.
        #[arg(long)]
        max_chunk_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search { query, k, json } => {
            let engine = RetrievalEngine::from_config(cfg).await?;
            let k = k.unwrap_or(engine.config().retrieval.default_k);
            let hits = engine.search_normativas(&query, k).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print_passages(&hits);
            }
        }
        Commands::Similar {
            query,
            k,
            strategy,
            json,
        } => {
            let engine = RetrievalEngine::from_config(cfg).await?;
            let retrieval = &engine.config().retrieval;
            let k = k.unwrap_or(retrieval.ticket_k);
            let strategy = strategy.unwrap_or(retrieval.ticket_strategy);
            let matches = engine.find_similar_tickets_with(&query, k, strategy).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                print_tickets(&matches);
            }
        }
        Commands::Answer { query, k } => {
            let synthesizer = create_synthesizer(&cfg.synthesis)?;
            let engine = RetrievalEngine::from_config(cfg).await?;
            let k = k.unwrap_or(engine.config().retrieval.default_k);
            let context = engine.search_normativas(&query, k).await?;
            println!("{}", synthesizer.generate_response(&query, &context).await);
        }
        Commands::Stats => {
            let engine = RetrievalEngine::from_config(cfg).await?;
            let stats = engine.stats();
            println!("documents:        {}", stats.documents);
            println!("normativa chunks: {}", stats.normativa_chunks);
            println!("resolved tickets: {}", stats.resolved_tickets);
            println!("indexed tickets:  {}", stats.indexed_tickets);
            println!("built at:         {}", stats.built_at.to_rfc3339());
        }
        Commands::Chunk {
            file,
            max_chunk_size,
        } => {
            run_chunk(&cfg, &file, max_chunk_size)?;
        }
    }

    Ok(())
}

fn print_passages(hits: &[PassageHit]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.1}%] {} (distance {:.4})",
            i + 1,
            hit.similarity * 100.0,
            hit.document,
            hit.score
        );
        println!(
            "    excerpt: \"{}\"",
            excerpt(&hit.content, 200).replace('\n', " ")
        );
        println!();
    }
}

fn print_tickets(matches: &[TicketMatch]) {
    if matches.is_empty() {
        println!("No similar tickets.");
        return;
    }
    for m in matches {
        let t = &m.ticket;
        println!("Ticket #{} [{:.1}%] {}", t.id, m.similarity * 100.0, t.client);
        println!("    query:  {}", excerpt(&t.query, 100));
        if let Some(answer) = &t.answer {
            println!("    answer: {}", excerpt(answer, 200).replace('\n', " "));
        }
        if let Some(elapsed) = t.response_time() {
            println!(
                "    answered in: {}h {}m",
                elapsed.num_hours(),
                elapsed.num_minutes() % 60
            );
        }
        println!();
    }
}

fn run_chunk(cfg: &Config, file: &Path, max_chunk_size: Option<usize>) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let max = max_chunk_size.unwrap_or(cfg.chunking.max_chunk_size);
    let chunks = split_text(&text, max);
    for (i, chunk) in chunks.iter().enumerate() {
        let len = chunk.chars().count();
        let flag = if len < cfg.chunking.min_chunk_chars {
            " (discarded: too short)"
        } else if len >= max {
            " (oversized paragraph)"
        } else {
            ""
        };
        println!("--- chunk {} ({} chars){}", i, len, flag);
        println!("{}", chunk);
    }
    println!("{} chunks", chunks.len());
    Ok(())
}
