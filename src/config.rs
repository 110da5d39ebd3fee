use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

impl Config {
    /// Default configuration over the given corpus locations.
    pub fn for_dirs(normativas_dir: impl Into<PathBuf>, tickets_file: impl Into<PathBuf>) -> Self {
        Self {
            corpus: CorpusConfig {
                normativas_dir: normativas_dir.into(),
                tickets_file: tickets_file.into(),
                include_globs: default_include_globs(),
                exclude_globs: Vec::new(),
            },
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub normativas_dir: PathBuf,
    pub tickets_file: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }
}

fn default_max_chunk_size() -> usize {
    500
}
fn default_min_chunk_chars() -> usize {
    50
}

/// Which similarity strategy answers `find_similar_tickets`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketStrategy {
    #[default]
    Embedding,
    Lexical,
}

impl std::str::FromStr for TicketStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "embedding" => Ok(TicketStrategy::Embedding),
            "lexical" => Ok(TicketStrategy::Lexical),
            other => anyhow::bail!(
                "Unknown ticket strategy: '{}'. Use embedding or lexical.",
                other
            ),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityKind {
    #[default]
    Linear,
    Reciprocal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_ticket_k")]
    pub ticket_k: usize,
    #[serde(default)]
    pub ticket_strategy: TicketStrategy,
    #[serde(default = "default_lexical_threshold")]
    pub lexical_threshold: f64,
    #[serde(default)]
    pub similarity: SimilarityKind,
    #[serde(default = "default_similarity_scale")]
    pub similarity_scale: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            ticket_k: default_ticket_k(),
            ticket_strategy: TicketStrategy::default(),
            lexical_threshold: default_lexical_threshold(),
            similarity: SimilarityKind::default(),
            similarity_scale: default_similarity_scale(),
        }
    }
}

fn default_k() -> usize {
    5
}
fn default_ticket_k() -> usize {
    3
}
fn default_lexical_threshold() -> f64 {
    0.5
}
fn default_similarity_scale() -> f32 {
    10.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Base URL for the `ollama` and `openai` providers.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: default_dims(),
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "hash".to_string()
}
fn default_dims() -> usize {
    384
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    #[default]
    Template,
    Llm,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub mode: SynthesisMode,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            mode: SynthesisMode::default(),
            top_n: default_top_n(),
            excerpt_chars: default_excerpt_chars(),
            generation: GenerationConfig::default(),
        }
    }
}

fn default_top_n() -> usize {
    3
}
fn default_excerpt_chars() -> usize {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_generation_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            url: None,
            temperature: default_temperature(),
            max_retries: default_generation_retries(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_generation_provider() -> String {
    "disabled".to_string()
}
fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_generation_retries() -> u32 {
    2
}
fn default_generation_timeout() -> u64 {
    60
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.max_chunk_size == 0 {
        anyhow::bail!("chunking.max_chunk_size must be > 0");
    }

    // Validate retrieval
    if config.retrieval.default_k < 1 || config.retrieval.ticket_k < 1 {
        anyhow::bail!("retrieval.default_k and retrieval.ticket_k must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.retrieval.lexical_threshold) {
        anyhow::bail!("retrieval.lexical_threshold must be in [0.0, 1.0]");
    }

    let scale = config.retrieval.similarity_scale;
    if !(scale > 0.0 && scale.is_finite()) {
        anyhow::bail!("retrieval.similarity_scale must be a finite number > 0");
    }

    // Validate embedding
    if config.embedding.is_enabled() && config.embedding.dims == 0 {
        anyhow::bail!(
            "embedding.dims must be > 0 when provider is '{}'",
            config.embedding.provider
        );
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "hash" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, hash, openai, ollama, or local.",
            other
        ),
    }

    // Validate synthesis
    if config.synthesis.top_n == 0 {
        anyhow::bail!("synthesis.top_n must be >= 1");
    }
    match config.synthesis.generation.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}
