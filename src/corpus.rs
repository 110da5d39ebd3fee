//! Corpus loading for the two retrievable collections.
//!
//! - **Normativas**: every file under the documents directory that matches
//!   the include globs is read, chunked, and tagged with its display name.
//! - **Tickets**: the full collection is read from a [`TicketSource`] and
//!   filtered to resolved tickets carrying an answer.
//!
//! The `load_*` functions never fail. A missing directory or ticket file
//! yields an empty corpus, and a single unreadable file or malformed ticket
//! record is skipped. Both cases are logged.

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunk::chunk_document;
use crate::config::{ChunkingConfig, CorpusConfig};
use crate::error::EngineError;
use crate::models::{Chunk, Document, Ticket};

/// Read access to the ticket storage collaborator.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Returns every ticket in storage order.
    async fn load_all_tickets(&self) -> Result<Vec<Ticket>, EngineError>;
}

/// Tickets stored as a JSON array in a flat file.
///
/// Records are decoded one at a time so a single malformed record does not
/// hide the rest of the file.
pub struct JsonTicketFile {
    path: PathBuf,
}

impl JsonTicketFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TicketSource for JsonTicketFile {
    async fn load_all_tickets(&self) -> Result<Vec<Ticket>, EngineError> {
        let unavailable = |reason: String| EngineError::SourceUnavailable {
            path: self.path.display().to_string(),
            reason,
        };

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let records: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| EngineError::MalformedSource {
                unit: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut tickets = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Ticket>(record) {
                Ok(t) => tickets.push(t),
                Err(e) => {
                    let err = EngineError::MalformedSource {
                        unit: format!("ticket record #{}", i),
                        reason: e.to_string(),
                    };
                    warn!("Skipping {}", err);
                }
            }
        }
        Ok(tickets)
    }
}

/// Load and chunk every normativa document.
///
/// Documents are visited in path order so chunk ordinals are stable across
/// loads of unchanged data.
pub fn load_normativas(corpus: &CorpusConfig, chunking: &ChunkingConfig) -> Vec<Chunk> {
    let documents = match scan_documents(corpus) {
        Ok(docs) => docs,
        Err(e) => {
            warn!("Normativas corpus degraded to empty: {}", e);
            return Vec::new();
        }
    };

    let mut chunks = Vec::new();
    for doc in &documents {
        let doc_chunks =
            chunk_document(doc, chunking.max_chunk_size, chunking.min_chunk_chars);
        debug!(
            document = %doc.name,
            chunks = doc_chunks.len(),
            "Chunked document"
        );
        chunks.extend(doc_chunks);
    }

    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        "Loaded normativas corpus"
    );
    chunks
}

/// Read all non-empty documents under the configured directory.
pub fn scan_documents(corpus: &CorpusConfig) -> Result<Vec<Document>, EngineError> {
    let root = &corpus.normativas_dir;
    if !root.is_dir() {
        return Err(EngineError::SourceUnavailable {
            path: root.display().to_string(),
            reason: "directory does not exist".to_string(),
        });
    }

    let include_set = build_globset(&corpus.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/target/**".to_string()];
    default_excludes.extend(corpus.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut documents = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let body = match std::fs::read_to_string(path) {
            Ok(b) => b,
            Err(e) => {
                let err = EngineError::MalformedSource {
                    unit: rel_str,
                    reason: e.to_string(),
                };
                warn!("Skipping {}", err);
                continue;
            }
        };

        if body.trim().is_empty() {
            debug!(path = %rel_str, "Skipping empty document");
            continue;
        }

        documents.push(Document {
            name: display_name(path),
            source_path: rel_str,
            body,
        });
    }

    Ok(documents)
}

/// Load the resolved tickets that are eligible for retrieval.
pub async fn load_resolved_tickets(source: &dyn TicketSource) -> Vec<Ticket> {
    let all = match source.load_all_tickets().await {
        Ok(t) => t,
        Err(e) => {
            warn!("Tickets corpus degraded to empty: {}", e);
            return Vec::new();
        }
    };

    let total = all.len();
    let resolved: Vec<Ticket> = all.into_iter().filter(Ticket::is_indexable).collect();
    info!(
        total,
        resolved = resolved.len(),
        "Loaded tickets corpus"
    );
    resolved
}

/// Document display name: the file stem with `_` and `-` shown as spaces.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, EngineError> {
    let invalid = |reason: String| EngineError::MalformedSource {
        unit: "corpus globs".to_string(),
        reason,
    };
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|e| invalid(e.to_string()))?);
    }
    builder.build().map_err(|e| invalid(e.to_string()))
}
