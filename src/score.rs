//! Distance to similarity conversion.
//!
//! Raw squared distances are unbounded. They are mapped to a
//! higher-is-better display score in `[0, 1]`; ranking always uses the raw
//! distance, so the transform never changes result order.

use crate::config::{RetrievalConfig, SimilarityKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimilarityTransform {
    /// `1 - distance / scale`, clamped to `[0, 1]`. With `scale = 10` this is
    /// the legacy display formula.
    Linear { scale: f32 },
    /// `1 / (1 + distance)`.
    Reciprocal,
}

impl SimilarityTransform {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        match config.similarity {
            SimilarityKind::Linear => SimilarityTransform::Linear {
                scale: config.similarity_scale,
            },
            SimilarityKind::Reciprocal => SimilarityTransform::Reciprocal,
        }
    }

    pub fn similarity(&self, distance: f32) -> f32 {
        let distance = distance.max(0.0);
        match self {
            SimilarityTransform::Linear { scale } => (1.0 - distance / scale).clamp(0.0, 1.0),
            SimilarityTransform::Reciprocal => 1.0 / (1.0 + distance),
        }
    }
}

impl Default for SimilarityTransform {
    fn default() -> Self {
        SimilarityTransform::Linear { scale: 10.0 }
    }
}
