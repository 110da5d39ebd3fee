//! # normativa-rag
//!
//! Dual-corpus semantic retrieval: for a free-text query, find the most
//! relevant passages among building-regulation documents ("normativas") and
//! the most similar previously resolved support tickets.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────┐   ┌──────────┐   ┌─────────────┐
//! │ Corpus loader│──▶│ Chunker │──▶│ Embedder │──▶│ Vector index │
//! │ docs/tickets │   └─────────┘   └──────────┘   └──────┬──────┘
//! └──────────────┘                                       │
//!                     query ──▶ RetrievalEngine ◀────────┘
//!                                     │
//!                                     ▼
//!                           ResponseSynthesizer
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! nrag stats                                    # build indices, print sizes
//! nrag search "requisitos de ventilación"
//! nrag similar "aislamiento térmico en fachadas" --strategy lexical
//! nrag answer "¿qué caudal de ventilación necesita un garaje?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Documents, chunks, tickets, search hits |
//! | [`chunk`] | Paragraph-packing chunker |
//! | [`corpus`] | Document and ticket loading |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Flat vector index |
//! | [`lexical`] | Lexical ticket similarity |
//! | [`score`] | Distance to similarity transforms |
//! | [`engine`] | Retrieval engine and index lifecycle |
//! | [`generation`] | Text-generation collaborator |
//! | [`synth`] | Response synthesis |
//! | [`error`] | Engine error taxonomy |

pub mod chunk;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod lexical;
pub mod models;
pub mod score;
pub mod synth;

pub use engine::{EngineStats, RetrievalEngine};
pub use error::EngineError;
