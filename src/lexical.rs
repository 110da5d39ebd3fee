//! Lexical ticket similarity.
//!
//! The score compares word sets of the query and a candidate ticket's
//! original query text:
//!
//! ```text
//! score = 0.6 × |Q ∩ T| / |Q|  +  0.4 × |Q_tech ∩ T_tech| / |Q_tech|
//! ```
//!
//! where `Q_tech` and `T_tech` are the words drawn from a fixed vocabulary of
//! construction-regulation terms. The second term is only added when the
//! query contains at least one technical term.

use std::collections::HashSet;

/// Domain vocabulary used for the technical-term overlap.
pub const TECHNICAL_TERMS: &[&str] = &[
    "aislamiento",
    "térmico",
    "acústico",
    "ventilación",
    "salubridad",
    "eficiencia",
    "energética",
    "resistencia",
    "fuego",
    "evacuación",
    "accesibilidad",
    "seguridad",
    "estructura",
    "cimentación",
    "instalaciones",
];

const WORD_WEIGHT: f64 = 0.6;
const TECH_WEIGHT: f64 = 0.4;

/// Lowercased `text` split on whitespace. Punctuation stays attached, so
/// `"garaje."` and `"garaje"` are different words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn word_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Score how similar `ticket_query` is to `query`, in `[0.0, 1.0]`.
pub fn lexical_score(query: &str, ticket_query: &str) -> f64 {
    let query_words = word_set(query);
    if query_words.is_empty() {
        return 0.0;
    }
    let ticket_words = word_set(ticket_query);

    let shared = query_words.intersection(&ticket_words).count();
    let mut score = WORD_WEIGHT * shared as f64 / query_words.len() as f64;

    let query_terms: Vec<&String> = query_words
        .iter()
        .filter(|w| TECHNICAL_TERMS.contains(&w.as_str()))
        .collect();
    if !query_terms.is_empty() {
        let shared_terms = query_terms
            .iter()
            .filter(|w| ticket_words.contains(w.as_str()))
            .count();
        score += TECH_WEIGHT * shared_terms as f64 / query_terms.len() as f64;
    }

    score
}
