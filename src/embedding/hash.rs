//! Deterministic feature-hashing embedder.
//!
//! Each lowercase word is hashed with SHA-256 into one of `dims` buckets with
//! a sign taken from the digest, and the resulting bag-of-words vector is
//! L2-normalized. Texts that share words land close together, so the vector
//! indices behave sensibly without a model. Useful offline and in tests.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::Embedder;

pub struct HashProvider {
    dims: usize,
}

impl HashProvider {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dims];
        for word in words(text) {
            let digest = Sha256::digest(word.as_bytes());
            let bucket = u64::from_le_bytes([
                digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6],
                digest[7],
            ]) as usize
                % self.dims;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

/// Lowercase alphanumeric runs of `text`.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

#[async_trait]
impl Embedder for HashProvider {
    fn model_name(&self) -> &str {
        "hash"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::squared_l2;

    #[test]
    fn test_fixed_dims_and_deterministic() {
        let p = HashProvider::new(384);
        let a = p.embed_one("requisitos de ventilación");
        assert_eq!(a.len(), 384);
        assert_eq!(a, p.embed_one("requisitos de ventilación"));
    }

    #[test]
    fn test_ignores_punctuation_and_case() {
        let p = HashProvider::new(128);
        assert_eq!(p.embed_one("¿Ventilación, garaje?"), p.embed_one("ventilación garaje"));
    }

    #[test]
    fn test_unit_norm() {
        let v = HashProvider::new(64).embed_one("aislamiento térmico en fachadas");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_words_are_closer() {
        let p = HashProvider::new(384);
        let q = p.embed_one("ventilación de garajes");
        let near = p.embed_one("ventilación natural de garajes cerrados");
        let far = p.embed_one("resistencia al fuego de estructuras");
        assert!(squared_l2(&q, &near) < squared_l2(&q, &far));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashProvider::new(8).embed_one("  ");
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
