//! Dual-corpus retrieval engine.
//!
//! The engine owns one [`IndexSnapshot`] holding both corpora, each as a
//! [`CorpusIndex`] that keeps vectors and items aligned. Searches clone the
//! current `Arc<IndexSnapshot>` and work on it without holding a lock.
//! [`refresh_indexes`](RetrievalEngine::refresh_indexes) builds a complete
//! new snapshot off to the side and publishes it with a single pointer swap,
//! so a concurrent search observes either the old or the new snapshot, never
//! a mix. Rebuilds are serialized, so snapshots are published in the order
//! their refreshes started.
//!
//! # Empty-index policy
//!
//! `search_normativas` fails with [`EngineError::EngineNotReady`] when the
//! normativas index is empty. `find_similar_tickets` returns an empty list
//! when there are no resolved tickets, for both strategies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Config, TicketStrategy};
use crate::corpus::{load_normativas, load_resolved_tickets, JsonTicketFile, TicketSource};
use crate::embedding::{create_provider, embed_query, Embedder};
use crate::error::EngineError;
use crate::index::CorpusIndex;
use crate::lexical::lexical_score;
use crate::models::{Chunk, PassageHit, Ticket, TicketMatch};
use crate::score::SimilarityTransform;

/// One consistent view of both corpora.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub normativas: CorpusIndex<Chunk>,
    /// Resolved tickets that were successfully embedded.
    pub tickets: CorpusIndex<Ticket>,
    /// Every resolved ticket, used by the lexical strategy.
    pub resolved_tickets: Vec<Ticket>,
    pub documents: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexSnapshot {
    fn empty(dims: usize) -> Self {
        Self {
            normativas: CorpusIndex::empty(dims),
            tickets: CorpusIndex::empty(dims),
            resolved_tickets: Vec::new(),
            documents: 0,
            built_at: Utc::now(),
        }
    }
}

/// Corpus and index sizes of the published snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub documents: usize,
    pub normativa_chunks: usize,
    pub resolved_tickets: usize,
    pub indexed_tickets: usize,
    pub built_at: DateTime<Utc>,
}

pub struct RetrievalEngine {
    config: Config,
    embedder: Arc<dyn Embedder>,
    ticket_source: Arc<dyn TicketSource>,
    transform: SimilarityTransform,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    /// Held for the whole build-and-publish of a refresh.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl RetrievalEngine {
    /// Construct the engine and build both indices.
    ///
    /// Never fails because of corpus problems: missing or malformed sources
    /// leave the affected corpus empty.
    pub async fn new(
        config: Config,
        embedder: Arc<dyn Embedder>,
        ticket_source: Arc<dyn TicketSource>,
    ) -> Self {
        if embedder.dims() != 0 && embedder.dims() != config.embedding.dims {
            warn!(
                provider_dims = embedder.dims(),
                configured_dims = config.embedding.dims,
                "Embedding provider dimensionality differs from configuration; \
                 mismatching vectors will be skipped"
            );
        }

        let engine = Self {
            transform: SimilarityTransform::from_config(&config.retrieval),
            snapshot: RwLock::new(Arc::new(IndexSnapshot::empty(config.embedding.dims))),
            refresh_lock: tokio::sync::Mutex::new(()),
            config,
            embedder,
            ticket_source,
        };
        engine.refresh_indexes().await;
        engine
    }

    /// Construct the engine with the configured embedding provider and the
    /// JSON ticket file named in `[corpus]`.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::from(create_provider(&config.embedding)?);
        let tickets = Arc::new(JsonTicketFile::new(&config.corpus.tickets_file));
        Ok(Self::new(config, embedder, tickets).await)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stats(&self) -> EngineStats {
        let snap = self.snapshot();
        EngineStats {
            documents: snap.documents,
            normativa_chunks: snap.normativas.len(),
            resolved_tickets: snap.resolved_tickets.len(),
            indexed_tickets: snap.tickets.len(),
            built_at: snap.built_at,
        }
    }

    /// Find the `k` passages nearest to `query`, nearest first.
    pub async fn search_normativas(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<PassageHit>, EngineError> {
        let snap = self.snapshot();
        if snap.normativas.is_empty() {
            return Err(EngineError::EngineNotReady {
                corpus: "normativas",
            });
        }
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(self.embedder.as_ref(), query)
            .await
            .map_err(EngineError::encoding)?;

        let hits: Vec<PassageHit> = snap
            .normativas
            .search(&query_vec, k)?
            .into_iter()
            .map(|(chunk, distance)| PassageHit {
                document: chunk.document.clone(),
                content: chunk.text.clone(),
                score: distance,
                similarity: self.transform.similarity(distance),
            })
            .collect();

        debug!(query, k, hits = hits.len(), "Searched normativas");
        Ok(hits)
    }

    /// Find resolved tickets similar to `query` using the configured strategy.
    pub async fn find_similar_tickets(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<TicketMatch>, EngineError> {
        self.find_similar_tickets_with(query, k, self.config.retrieval.ticket_strategy)
            .await
    }

    /// Find resolved tickets similar to `query` using an explicit strategy.
    pub async fn find_similar_tickets_with(
        &self,
        query: &str,
        k: usize,
        strategy: TicketStrategy,
    ) -> Result<Vec<TicketMatch>, EngineError> {
        let snap = self.snapshot();
        let matches = match strategy {
            TicketStrategy::Embedding => self.embedding_ticket_matches(&snap, query, k).await?,
            TicketStrategy::Lexical => self.lexical_ticket_matches(&snap, query, k),
        };
        debug!(
            query,
            k,
            ?strategy,
            matches = matches.len(),
            "Searched similar tickets"
        );
        Ok(matches)
    }

    async fn embedding_ticket_matches(
        &self,
        snap: &IndexSnapshot,
        query: &str,
        k: usize,
    ) -> Result<Vec<TicketMatch>, EngineError> {
        if snap.tickets.is_empty() || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(self.embedder.as_ref(), query)
            .await
            .map_err(EngineError::encoding)?;

        Ok(snap
            .tickets
            .search(&query_vec, k)?
            .into_iter()
            .map(|(ticket, distance)| TicketMatch {
                ticket: ticket.clone(),
                distance: Some(distance),
                similarity: self.transform.similarity(distance),
            })
            .collect())
    }

    fn lexical_ticket_matches(&self, snap: &IndexSnapshot, query: &str, k: usize) -> Vec<TicketMatch> {
        let threshold = self.config.retrieval.lexical_threshold;

        let mut scored: Vec<(&Ticket, f64)> = snap
            .resolved_tickets
            .iter()
            .map(|t| (t, lexical_score(query, &t.query)))
            .filter(|(_, score)| *score > threshold)
            .collect();

        // Stable: equal scores keep ticket file order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(ticket, score)| TicketMatch {
                ticket: ticket.clone(),
                distance: None,
                similarity: score as f32,
            })
            .collect()
    }

    /// Reload both corpora and rebuild both indices from scratch.
    ///
    /// The new snapshot is published only once it is complete. Always
    /// leaves the engine usable; an unavailable source yields an empty corpus.
    pub async fn refresh_indexes(&self) {
        let _rebuild = self.refresh_lock.lock().await;
        let started = Instant::now();
        let snapshot = self.build_snapshot().await;

        info!(
            documents = snapshot.documents,
            chunks = snapshot.normativas.len(),
            resolved_tickets = snapshot.resolved_tickets.len(),
            indexed_tickets = snapshot.tickets.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Indexes rebuilt"
        );

        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    async fn build_snapshot(&self) -> IndexSnapshot {
        let dims = self.config.embedding.dims;

        let chunks = load_normativas(&self.config.corpus, &self.config.chunking);
        let documents = chunks
            .iter()
            .map(|c| c.source_path.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let chunk_entries = self
            .embed_units(chunks, |c: &Chunk| c.text.clone(), "normativas")
            .await;

        let resolved_tickets = load_resolved_tickets(self.ticket_source.as_ref()).await;
        let ticket_entries = self
            .embed_units(
                resolved_tickets.clone(),
                |t: &Ticket| t.query.clone(),
                "tickets",
            )
            .await;

        IndexSnapshot {
            normativas: build_or_empty(dims, chunk_entries, "normativas"),
            tickets: build_or_empty(dims, ticket_entries, "tickets"),
            resolved_tickets,
            documents,
            built_at: Utc::now(),
        }
    }

    /// Embed units in batches. A failed batch is retried one unit at a time
    /// so that only the failing units are dropped. Vectors of the wrong
    /// length are dropped too.
    async fn embed_units<T, F>(&self, units: Vec<T>, text: F, corpus: &str) -> Vec<(T, Vec<f32>)>
    where
        T: Clone,
        F: Fn(&T) -> String,
    {
        if units.is_empty() {
            return Vec::new();
        }
        if self.embedder.dims() == 0 {
            warn!(
                corpus,
                units = units.len(),
                "Embedding provider is disabled; vector index left empty"
            );
            return Vec::new();
        }

        let dims = self.config.embedding.dims;
        let batch_size = self.config.embedding.batch_size.max(1);
        let mut entries = Vec::with_capacity(units.len());

        for batch in units.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(&text).collect();

            let vectors = match self.embedder.embed(&texts).await {
                Ok(v) if v.len() == batch.len() => v.into_iter().map(Ok).collect(),
                Ok(v) => {
                    warn!(
                        corpus,
                        expected = batch.len(),
                        got = v.len(),
                        "Embedding batch returned wrong count; retrying per unit"
                    );
                    self.embed_one_by_one(&texts).await
                }
                Err(e) => {
                    warn!(corpus, "Embedding batch failed, retrying per unit: {:#}", e);
                    self.embed_one_by_one(&texts).await
                }
            };

            for (unit, vector) in batch.iter().zip(vectors) {
                match vector {
                    Ok(v) if v.len() == dims => entries.push((unit.clone(), v)),
                    Ok(v) => {
                        let err = EngineError::DimensionMismatch {
                            got: v.len(),
                            want: dims,
                        };
                        warn!(corpus, "Skipping unit: {}", err);
                    }
                    Err(err) => warn!(corpus, "Skipping unit: {}", err),
                }
            }
        }

        entries
    }

    async fn embed_one_by_one(&self, texts: &[String]) -> Vec<Result<Vec<f32>, EngineError>> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(
                embed_query(self.embedder.as_ref(), t)
                    .await
                    .map_err(EngineError::encoding),
            );
        }
        out
    }
}

fn build_or_empty<T>(dims: usize, entries: Vec<(T, Vec<f32>)>, corpus: &str) -> CorpusIndex<T> {
    CorpusIndex::build(dims, entries).unwrap_or_else(|e| {
        warn!(corpus, "Index build failed, leaving corpus empty: {}", e);
        CorpusIndex::empty(dims)
    })
}
