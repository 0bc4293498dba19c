

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{LibrisError, Result};


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerConfig {
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_true")]
    pub char_trigrams: bool,

    #[serde(default = "default_trigram_weight")]
    pub trigram_weight: f32,
}

fn default_dimensions() -> usize { crate::DEFAULT_EMBEDDING_DIMENSIONS }
fn default_true() -> bool { true }
fn default_trigram_weight() -> f32 { 0.5 }

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            char_trigrams: true,
            trigram_weight: default_trigram_weight(),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,

    #[serde(default)]
    pub enrichment_enabled: bool,

    #[serde(default = "default_enrichment_depth")]
    pub enrichment_depth: usize,

    #[serde(default = "default_enrichment_max_results")]
    pub enrichment_max_results: usize,
}

fn default_related_limit() -> usize { 5 }
fn default_enrichment_depth() -> usize { 1 }
fn default_enrichment_max_results() -> usize { 5 }

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            related_limit: default_related_limit(),
            enrichment_enabled: false,
            enrichment_depth: default_enrichment_depth(),
            enrichment_max_results: default_enrichment_max_results(),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Concepts must be longer than this to be eligible for fuzzy matching.
    #[serde(default = "default_fuzzy_min_length")]
    pub fuzzy_min_length: usize,

    /// Single-word concepts longer than this may match a plural form ("api" in "APIs").
    #[serde(default = "default_boundary_min_length")]
    pub boundary_min_length: usize,

    #[serde(default = "default_coverage_weight")]
    pub coverage_weight: f64,

    #[serde(default = "default_coverage_scale")]
    pub coverage_scale: f64,

    #[serde(default = "default_breadth_weight")]
    pub breadth_weight: f64,

    #[serde(default = "default_breadth_cap")]
    pub breadth_cap: f64,
}

fn default_fuzzy_threshold() -> f64 { 0.7 }
fn default_fuzzy_min_length() -> usize { 4 }
fn default_boundary_min_length() -> usize { 2 }
fn default_coverage_weight() -> f64 { 0.4 }
fn default_coverage_scale() -> f64 { 10.0 }
fn default_breadth_weight() -> f64 { 0.6 }
fn default_breadth_cap() -> f64 { 10.0 }

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            fuzzy_min_length: default_fuzzy_min_length(),
            boundary_min_length: default_boundary_min_length(),
            coverage_weight: default_coverage_weight(),
            coverage_scale: default_coverage_scale(),
            breadth_weight: default_breadth_weight(),
            breadth_cap: default_breadth_cap(),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    #[serde(default = "default_min_token_chars")]
    pub min_token_chars: usize,

    #[serde(default = "default_corpus_top_k")]
    pub corpus_top_k: usize,

    #[serde(default = "default_corpus_min_similarity")]
    pub corpus_min_similarity: f64,

    #[serde(default = "default_corpus_decay")]
    pub corpus_decay: f64,

    #[serde(default = "default_related_min_similarity")]
    pub related_min_similarity: f64,

    #[serde(default = "default_related_per_concept")]
    pub related_per_concept: usize,

    #[serde(default = "default_related_decay")]
    pub related_decay: f64,

    #[serde(default = "default_thesaurus_depth")]
    pub thesaurus_depth: usize,

    #[serde(default = "default_thesaurus_max_results")]
    pub thesaurus_max_results: usize,

    #[serde(default = "default_lexical_decay")]
    pub lexical_decay: f64,
}

fn default_min_token_chars() -> usize { 3 }
fn default_corpus_top_k() -> usize { 10 }
fn default_corpus_min_similarity() -> f64 { 0.3 }
fn default_corpus_decay() -> f64 { 0.8 }
fn default_related_min_similarity() -> f64 { 0.4 }
fn default_related_per_concept() -> usize { 3 }
fn default_related_decay() -> f64 { 0.5 }
fn default_thesaurus_depth() -> usize { 2 }
fn default_thesaurus_max_results() -> usize { 5 }
fn default_lexical_decay() -> f64 { 0.6 }

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            min_token_chars: default_min_token_chars(),
            corpus_top_k: default_corpus_top_k(),
            corpus_min_similarity: default_corpus_min_similarity(),
            corpus_decay: default_corpus_decay(),
            related_min_similarity: default_related_min_similarity(),
            related_per_concept: default_related_per_concept(),
            related_decay: default_related_decay(),
            thesaurus_depth: default_thesaurus_depth(),
            thesaurus_max_results: default_thesaurus_max_results(),
            lexical_decay: default_lexical_decay(),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_capacity() -> usize { crate::DEFAULT_CACHE_SIZE }

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: default_cache_capacity() }
    }
}


#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrisConfig {
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub scoring: crate::toolkit::search::hybrid::ScoringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl LibrisConfig {
    /// Layers an optional config file and `LIBRIS__SECTION__KEY` environment variables over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("LIBRIS").separator("__"));

        let config: LibrisConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }


    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dims) = env_parse::<usize>("LIBRIS_EMBEDDING_DIMENSIONS") {
            config.vectorizer.dimensions = dims;
        }
        if let Some(limit) = env_parse::<usize>("LIBRIS_RELATED_LIMIT") {
            config.graph.related_limit = limit;
        }
        if let Some(enabled) = env_parse::<bool>("LIBRIS_ENRICHMENT_ENABLED") {
            config.graph.enrichment_enabled = enabled;
        }
        if let Some(threshold) = env_parse::<f64>("LIBRIS_FUZZY_THRESHOLD") {
            config.matcher.fuzzy_threshold = threshold;
        }
        if let Some(top_k) = env_parse::<usize>("LIBRIS_CORPUS_TOP_K") {
            config.expansion.corpus_top_k = top_k;
        }
        if let Some(limit) = env_parse::<usize>("LIBRIS_SEARCH_LIMIT") {
            config.scoring.default_limit = limit;
        }
        if let Some(w) = env_parse::<f64>("LIBRIS_WEIGHT_VECTOR") {
            config.scoring.weights.vector = w;
        }
        if let Some(w) = env_parse::<f64>("LIBRIS_WEIGHT_BM25") {
            config.scoring.weights.bm25 = w;
        }
        if let Some(w) = env_parse::<f64>("LIBRIS_WEIGHT_CONCEPT") {
            config.scoring.weights.concept = w;
        }
        if let Some(w) = env_parse::<f64>("LIBRIS_WEIGHT_TITLE") {
            config.scoring.weights.title = w;
        }
        if let Some(w) = env_parse::<f64>("LIBRIS_WEIGHT_WORDNET") {
            config.scoring.weights.wordnet = w;
        }
        if let Some(capacity) = env_parse::<usize>("LIBRIS_CACHE_SIZE") {
            config.cache.capacity = capacity;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.vectorizer.dimensions == 0 {
            return Err(LibrisError::Config("vectorizer.dimensions must be positive".into()));
        }
        if self.cache.capacity == 0 {
            return Err(LibrisError::Config("cache.capacity must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.matcher.fuzzy_threshold) {
            return Err(LibrisError::Config(format!(
                "matcher.fuzzy_threshold must be within [0, 1], got {}",
                self.matcher.fuzzy_threshold
            )));
        }
        let decays = [
            ("expansion.corpus_decay", self.expansion.corpus_decay),
            ("expansion.related_decay", self.expansion.related_decay),
            ("expansion.lexical_decay", self.expansion.lexical_decay),
        ];
        for (name, value) in decays {
            if !(0.0..=1.0).contains(&value) {
                return Err(LibrisError::Config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        self.scoring.weights.validate()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = LibrisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.graph.related_limit, 5);
        assert_eq!(config.expansion.corpus_top_k, 10);
        assert!((config.expansion.lexical_decay - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let mut config = LibrisConfig::default();
        config.vectorizer.dimensions = 0;
        assert!(matches!(config.validate(), Err(LibrisError::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_decay() {
        let mut config = LibrisConfig::default();
        config.expansion.lexical_decay = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LibrisConfig =
            serde_json::from_str(r#"{"graph": {"related_limit": 3}, "scoring": {"weights": {"vector": 0.5}}}"#).unwrap();
        assert_eq!(config.graph.related_limit, 3);
        assert_eq!(config.matcher.fuzzy_min_length, 4);
        assert!((config.scoring.weights.vector - 0.5).abs() < f64::EPSILON);
        assert!((config.scoring.weights.bm25 - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_without_file_returns_defaults() {
        let config = LibrisConfig::load(None).unwrap();
        assert_eq!(config.vectorizer.dimensions, crate::DEFAULT_EMBEDDING_DIMENSIONS);
    }

    #[test]
    fn test_from_env_reads_weight_overrides() {
        // SAFETY: these variables are read only by this test.
        unsafe {
            std::env::set_var("LIBRIS_WEIGHT_WORDNET", "0.3");
            std::env::set_var("LIBRIS_WEIGHT_TITLE", "heavy");
        }
        let config = LibrisConfig::from_env();
        unsafe {
            std::env::remove_var("LIBRIS_WEIGHT_WORDNET");
            std::env::remove_var("LIBRIS_WEIGHT_TITLE");
        }

        assert!((config.scoring.weights.wordnet - 0.3).abs() < f64::EPSILON);
        assert!((config.scoring.weights.title - 0.10).abs() < f64::EPSILON);
        assert!((config.scoring.weights.vector - 0.35).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }
}
