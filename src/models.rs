//! Core data models used throughout the retrieval engine.
//!
//! These types represent the documents, chunks, tickets, and search hits that
//! flow through corpus loading, indexing, and query answering.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A normativa document read from the documents directory.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name: file stem with separators replaced by spaces.
    pub name: String,
    /// Path relative to the documents directory.
    pub source_path: String,
    pub body: String,
}

/// A passage of a document, the unit that is embedded and retrieved.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// Display name of the owning document.
    pub document: String,
    /// Path of the owning document, relative to the normativas directory.
    pub source_path: String,
    /// Position within the owning document's chunk sequence, from 0.
    pub chunk_index: usize,
    pub text: String,
    /// SHA-256 hex digest of `text`.
    pub hash: String,
}

/// Ticket lifecycle state as stored by the ticket collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    #[serde(rename = "pendiente", alias = "pending")]
    Pending,
    #[serde(rename = "resuelto", alias = "resolved")]
    Resolved,
}

/// A support ticket. Field names follow the ticket file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "consulta")]
    pub query: String,
    pub status: TicketStatus,
    #[serde(rename = "respuesta", default)]
    pub answer: Option<String>,
    #[serde(rename = "fecha_creacion")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "fecha_respuesta", default)]
    pub answered_at: Option<NaiveDateTime>,
}

impl Ticket {
    /// True when the ticket can serve as reference material: resolved and
    /// carrying a non-blank answer.
    pub fn is_indexable(&self) -> bool {
        self.status == TicketStatus::Resolved
            && self
                .answer
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty())
    }

    /// Time between creation and answer, when the ticket has been answered.
    pub fn response_time(&self) -> Option<Duration> {
        self.answered_at.map(|answered| answered - self.created_at)
    }
}

/// A passage returned by [`search_normativas`](crate::engine::RetrievalEngine::search_normativas).
#[derive(Debug, Clone, Serialize)]
pub struct PassageHit {
    pub document: String,
    pub content: String,
    /// Raw squared Euclidean distance; smaller is closer.
    pub score: f32,
    /// Normalized, higher-is-better similarity.
    pub similarity: f32,
}

/// A resolved ticket returned by
/// [`find_similar_tickets`](crate::engine::RetrievalEngine::find_similar_tickets).
#[derive(Debug, Clone, Serialize)]
pub struct TicketMatch {
    #[serde(flatten)]
    pub ticket: Ticket,
    /// Raw distance for the embedding strategy; absent for the lexical one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(rename = "similarity_score")]
    pub similarity: f32,
}
