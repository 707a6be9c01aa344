//! Development tool for inspecting stored outlines
//!
//! Opens the repository selected by the environment (see
//! [`StorageConfig::from_env`]) and lists, prints or exports documents.
//!
//! # Usage
//!
//! ```bash
//! # List documents, newest first (soft-deleted ones are marked)
//! cargo run --bin outline-dev -- list
//!
//! # Print a document as an indented outline
//! cargo run --bin outline-dev -- show <id>
//!
//! # Export to stdout, or to a file when a path is given
//! cargo run --bin outline-dev -- export-json <id> [out.json]
//! cargo run --bin outline-dev -- export-html <id> [out.html]
//! ```
//!
//! # Configuration
//!
//! - `OUTLINE_DB_URL` / `OUTLINE_DB_AUTH_TOKEN`: remote libsql database
//! - `OUTLINE_DB_PATH`: local database file, `:memory:` for a throwaway one
//! - `RUST_LOG`: log filter, defaults to `info`

use anyhow::Context;
use clap::{Parser, Subcommand};
use outline_core::db::{DatabaseService, DocumentStore, TursoStore};
use outline_core::export::{export_html, export_json};
use outline_core::models::{Document, EditorSettings};
use outline_core::utils::strip_markdown;
use outline_core::StorageConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "outline-dev")]
#[command(about = "Inspect and export stored outlines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
    /// List documents, newest first
    List,

    /// Print a document as an indented outline
    Show {
        /// Document id
        id: String,
    },

    /// Export a document as JSON
    #[command(name = "export-json")]
    ExportJson {
        /// Document id
        id: String,
        /// Output file; stdout when omitted
        out: Option<PathBuf>,
    },

    /// Export a document as standalone HTML
    #[command(name = "export-html")]
    ExportHtml {
        /// Document id
        id: String,
        /// Output file; stdout when omitted
        out: Option<PathBuf>,
    },
}

async fn load(store: &dyn DocumentStore, id: &str) -> anyhow::Result<Document> {
    store
        .load(id)
        .await?
        .with_context(|| format!("document '{}' not found", id))
}

fn write_output(out: Option<PathBuf>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn print_outline(document: &Document) {
    println!("{}", document.title);
    let mut stack: Vec<_> = document.root.children.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let marker = if node.collapsed && !node.children.is_empty() {
            "▸"
        } else {
            "•"
        };
        let mut line = format!("{}{} {}", "  ".repeat(depth), marker, strip_markdown(&node.content));
        for tag in &node.tags {
            line.push_str(&format!(" #{}", tag));
        }
        println!("{}", line);
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StorageConfig::from_env()?;
    let db = match DatabaseService::from_config(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("❌ Failed to open database: {}", e);
            eprintln!("   Set OUTLINE_DB_PATH or OUTLINE_DB_URL to choose another database");
            return Err(e.into());
        }
    };
    tracing::debug!("Connected to {}", db.location());
    let store = TursoStore::new(db);
    let settings = EditorSettings {
        render_markdown: true,
        ..EditorSettings::default()
    };

    match cli.command {
        Command::List => {
            let documents = store.list().await?;
            if documents.is_empty() {
                println!("No documents");
            }
            for summary in documents {
                let deleted = if summary.deleted_at.is_some() {
                    " (deleted)"
                } else {
                    ""
                };
                println!(
                    "{}  {}  {}{}",
                    summary.id,
                    summary.updated_at.format("%Y-%m-%d %H:%M"),
                    summary.title,
                    deleted
                );
            }
        }
        Command::Show { id } => print_outline(&load(&store, &id).await?),
        Command::ExportJson { id, out } => {
            let document = load(&store, &id).await?;
            write_output(out, &export_json(&document, &settings)?)?;
        }
        Command::ExportHtml { id, out } => {
            let document = load(&store, &id).await?;
            write_output(out, &export_html(&document, &settings))?;
        }
    }

    store.close().await
}
