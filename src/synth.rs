//! Response synthesis from ranked passages.
//!
//! Two interchangeable implementations of [`ResponseSynthesizer`]:
//! - [`TemplateSynthesizer`] renders a deterministic summary of the top
//!   passages with bounded excerpts.
//! - [`LlmSynthesizer`] hands the same top passages to a [`TextGenerator`]
//!   and returns its prose. Generator failures become an explanatory string.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fmt::Write;
use tracing::warn;

use crate::config::{SynthesisConfig, SynthesisMode};
use crate::generation::{create_generator, TextGenerator};
use crate::models::PassageHit;

/// Returned when there is no context to answer from.
pub const NO_CONTEXT_MESSAGE: &str =
    "No se encontró información relevante para generar una respuesta.";

const SYSTEM_PROMPT: &str = "Eres un asistente técnico especializado en normativa de \
construcción. Responde en español usando únicamente la información de los fragmentos \
proporcionados y cita el documento del que procede cada dato. Si los fragmentos no \
contienen la respuesta, dilo explícitamente.";

#[async_trait]
pub trait ResponseSynthesizer: Send + Sync {
    /// Turn ranked search results into a human-readable answer. Never fails.
    async fn generate_response(&self, query: &str, context: &[PassageHit]) -> String;
}

/// The `top_n` most similar hits, most similar first. Equal similarities keep
/// their search order.
pub fn select_top(context: &[PassageHit], top_n: usize) -> Vec<&PassageHit> {
    let mut ranked: Vec<&PassageHit> = context.iter().collect();
    ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    ranked.truncate(top_n);
    ranked
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

pub struct TemplateSynthesizer {
    top_n: usize,
    excerpt_chars: usize,
}

impl TemplateSynthesizer {
    pub fn new(top_n: usize, excerpt_chars: usize) -> Self {
        Self {
            top_n,
            excerpt_chars,
        }
    }

    pub fn render(&self, query: &str, context: &[PassageHit]) -> String {
        if context.is_empty() {
            return NO_CONTEXT_MESSAGE.to_string();
        }

        let mut out = format!("Información relevante para: \"{}\"\n", query.trim());
        for (i, hit) in select_top(context, self.top_n).into_iter().enumerate() {
            // Writing to a String cannot fail.
            let _ = write!(
                out,
                "\n{}. {} (similitud: {:.1}%)\n{}\n",
                i + 1,
                hit.document,
                hit.similarity * 100.0,
                excerpt(&hit.content, self.excerpt_chars)
            );
        }
        out.push_str("\nPara obtener más información, consulte el documento completo.");
        out
    }
}

#[async_trait]
impl ResponseSynthesizer for TemplateSynthesizer {
    async fn generate_response(&self, query: &str, context: &[PassageHit]) -> String {
        self.render(query, context)
    }
}

pub struct LlmSynthesizer {
    generator: Box<dyn TextGenerator>,
    top_n: usize,
    excerpt_chars: usize,
}

impl LlmSynthesizer {
    pub fn new(generator: Box<dyn TextGenerator>, top_n: usize, excerpt_chars: usize) -> Self {
        Self {
            generator,
            top_n,
            excerpt_chars,
        }
    }

    fn user_prompt(&self, query: &str, context: &[PassageHit]) -> String {
        let mut prompt = String::from("Fragmentos de normativa:\n");
        for hit in select_top(context, self.top_n) {
            let _ = write!(
                prompt,
                "\n[{}]\n{}\n",
                hit.document,
                excerpt(&hit.content, self.excerpt_chars)
            );
        }
        let _ = write!(prompt, "\nPregunta: {}", query.trim());
        prompt
    }
}

#[async_trait]
impl ResponseSynthesizer for LlmSynthesizer {
    async fn generate_response(&self, query: &str, context: &[PassageHit]) -> String {
        if context.is_empty() {
            return NO_CONTEXT_MESSAGE.to_string();
        }

        let prompt = self.user_prompt(query, context);
        match self.generator.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Text generation failed: {:#}", e);
                format!("Error al generar la respuesta: {:#}", e)
            }
        }
    }
}

/// Build the synthesizer selected by `[synthesis].mode`.
pub fn create_synthesizer(config: &SynthesisConfig) -> Result<Box<dyn ResponseSynthesizer>> {
    match config.mode {
        SynthesisMode::Template => Ok(Box::new(TemplateSynthesizer::new(
            config.top_n,
            config.excerpt_chars,
        ))),
        SynthesisMode::Llm => match create_generator(&config.generation)? {
            Some(generator) => Ok(Box::new(LlmSynthesizer::new(
                generator,
                config.top_n,
                config.excerpt_chars,
            ))),
            None => bail!("synthesis.mode = \"llm\" requires synthesis.generation.provider"),
        },
    }
}
