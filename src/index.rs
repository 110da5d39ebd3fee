//! Brute-force vector index over squared Euclidean distance.
//!
//! Items are addressed by their ordinal insertion position. [`CorpusIndex`]
//! pairs an index with the list of items it was built from so the two can
//! only be constructed, and replaced, together.

use crate::error::EngineError;

/// Flat vector index. Search is exact and linear in the number of items.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dims: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            vectors: Vec::new(),
        }
    }

    /// Build an index from `vectors`, in order. Fails on the first vector
    /// whose length is not `dims`.
    pub fn build(dims: usize, vectors: Vec<Vec<f32>>) -> Result<Self, EngineError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(EngineError::DimensionMismatch {
                got: bad.len(),
                want: dims,
            });
        }
        Ok(Self { dims, vectors })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Up to `k` nearest items as `(ordinal, squared distance)`, nearest
    /// first. Equal distances keep insertion order. An empty index yields an
    /// empty list.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, EngineError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(EngineError::DimensionMismatch {
                got: query.len(),
                want: self.dims,
            });
        }

        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// A vector index together with the items its ordinals refer to.
#[derive(Debug, Clone)]
pub struct CorpusIndex<T> {
    index: VectorIndex,
    items: Vec<T>,
}

impl<T> CorpusIndex<T> {
    pub fn empty(dims: usize) -> Self {
        Self {
            index: VectorIndex::new(dims),
            items: Vec::new(),
        }
    }

    /// Build from `(item, vector)` pairs, preserving their order.
    pub fn build(dims: usize, entries: Vec<(T, Vec<f32>)>) -> Result<Self, EngineError> {
        let (items, vectors): (Vec<T>, Vec<Vec<f32>>) = entries.into_iter().unzip();
        let index = VectorIndex::build(dims, vectors)?;
        Ok(Self { index, items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Nearest items with their squared distances, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(&T, f32)>, EngineError> {
        Ok(self
            .index
            .search(query, k)?
            .into_iter()
            .filter_map(|(i, d)| self.items.get(i).map(|item| (item, d)))
            .collect())
    }
}
