use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use super::models::ExpandedQuery;
use super::tokenizer::tokenize_query;
use crate::core::cache::IdResolutionCache;
use crate::core::config::ExpansionConfig;
use crate::core::error::Result;
use crate::core::ids::ConceptId;
use crate::db::{ConceptStore, ThesaurusAdapter};
use crate::embeddings::HashVectorizer;


pub struct QueryExpander {
    concept_store: Arc<dyn ConceptStore>,
    thesaurus: Option<Arc<dyn ThesaurusAdapter>>,
    vectorizer: Arc<HashVectorizer>,
    cache: Arc<IdResolutionCache>,
    config: ExpansionConfig,
}

impl QueryExpander {
    pub fn new(
        concept_store: Arc<dyn ConceptStore>,
        thesaurus: Option<Arc<dyn ThesaurusAdapter>>,
        vectorizer: Arc<HashVectorizer>,
        cache: Arc<IdResolutionCache>,
        config: ExpansionConfig,
    ) -> Self {
        Self {
            concept_store,
            thesaurus,
            vectorizer,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }


    /// Never fails: a channel that errors contributes no terms.
    pub async fn expand(&self, text: &str) -> ExpandedQuery {
        let originals = tokenize_query(text, self.config.min_token_chars);
        if originals.is_empty() {
            debug!("Query '{}' has no usable terms", crate::log_snippet(text, 60));
            return ExpandedQuery::default();
        }

        let (corpus, lexical) = tokio::join!(self.corpus_channel(&originals), self.lexical_channel(&originals));

        let corpus = corpus.unwrap_or_else(|e| {
            warn!("Corpus expansion unavailable: {}", e);
            BTreeMap::new()
        });
        let lexical = lexical.unwrap_or_else(|e| {
            warn!("Lexical expansion unavailable: {}", e);
            BTreeMap::new()
        });

        let expanded = ExpandedQuery::new(originals, corpus, lexical, self.config.lexical_decay);
        info!(
            "Expanded query: {} original, {} corpus, {} lexical terms",
            expanded.original_terms.len(),
            expanded.corpus_terms.len(),
            expanded.lexical_terms.len()
        );
        expanded
    }


    async fn corpus_channel(&self, originals: &[String]) -> Result<BTreeMap<String, f64>> {
        let embedding = self.vectorizer.embed(&originals.join(" "));
        let hits = self
            .concept_store
            .vector_search(&embedding, self.config.corpus_top_k)
            .await?;

        let mut terms = BTreeMap::new();
        for (id, similarity) in hits {
            if similarity <= self.config.corpus_min_similarity {
                continue;
            }
            let Some(node) = self.concept_store.get(id).await? else {
                debug!("Concept {} vanished from store during expansion", id);
                continue;
            };
            add_term(&mut terms, originals, &node.name, similarity * self.config.corpus_decay);

            if similarity <= self.config.related_min_similarity {
                continue;
            }
            let related_weight = similarity * self.config.related_decay;
            for related_id in node.related_concept_ids.iter().take(self.config.related_per_concept) {
                if let Some(name) = self.resolve_name(*related_id).await? {
                    add_term(&mut terms, originals, &name, related_weight);
                }
            }
        }
        Ok(terms)
    }

    async fn resolve_name(&self, id: ConceptId) -> Result<Option<String>> {
        if let Some(name) = self.cache.id_to_name(id) {
            return Ok(Some(name));
        }
        Ok(self.concept_store.get(id).await?.map(|node| node.name))
    }


    async fn lexical_channel(&self, originals: &[String]) -> Result<BTreeMap<String, f64>> {
        let Some(thesaurus) = &self.thesaurus else {
            return Ok(BTreeMap::new());
        };

        let lookups = originals.iter().map(|term| {
            thesaurus.related_terms(term, self.config.thesaurus_depth, self.config.thesaurus_max_results)
        });
        let results = try_join_all(lookups).await?;

        let mut terms = BTreeMap::new();
        for (term, weight) in results.into_iter().flatten() {
            add_term(&mut terms, originals, &term, weight);
        }
        Ok(terms)
    }
}

fn add_term(terms: &mut BTreeMap<String, f64>, originals: &[String], term: &str, weight: f64) {
    let term = term.trim().to_lowercase();
    if term.is_empty() || originals.contains(&term) {
        return;
    }
    let slot = terms.entry(term).or_insert(weight);
    if weight > *slot {
        *slot = weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GraphConfig;
    use crate::core::error::LibrisError;
    use crate::db::{InMemoryConceptStore, StaticThesaurus};
    use crate::toolkit::concepts::{ConceptGraphBuilder, ConceptNode, DocumentConcepts};
    use async_trait::async_trait;

    struct DownConceptStore;

    #[async_trait]
    impl ConceptStore for DownConceptStore {
        async fn upsert(&self, _: Vec<ConceptNode>) -> Result<()> {
            Err(LibrisError::store("connection refused"))
        }

        async fn replace_all(&self, _: Vec<ConceptNode>) -> Result<()> {
            Err(LibrisError::store("connection refused"))
        }

        async fn vector_search(&self, _: &[f32], _: usize) -> Result<Vec<(ConceptId, f64)>> {
            Err(LibrisError::store("connection refused"))
        }

        async fn get(&self, _: ConceptId) -> Result<Option<ConceptNode>> {
            Err(LibrisError::store("connection refused"))
        }
    }

    struct DownThesaurus;

    #[async_trait]
    impl ThesaurusAdapter for DownThesaurus {
        async fn related_terms(&self, _: &str, _: usize, _: usize) -> Result<Vec<(String, f64)>> {
            Err(LibrisError::Thesaurus("dictionary not loaded".into()))
        }
    }

    async fn seeded_store(vectorizer: &Arc<HashVectorizer>, cache: &Arc<IdResolutionCache>) -> Arc<InMemoryConceptStore> {
        let graph = ConceptGraphBuilder::new(vectorizer.clone(), cache.clone(), GraphConfig::default()).build(&[
            DocumentConcepts::new("1", &["clean architecture", "dependency injection"]),
            DocumentConcepts::new("2", &["clean architecture"]),
            DocumentConcepts::new("3", &["sourdough"]),
        ]);
        let store = Arc::new(InMemoryConceptStore::new());
        store.upsert(graph.into_nodes()).await.unwrap();
        store
    }

    fn thesaurus() -> Arc<dyn ThesaurusAdapter> {
        Arc::new(
            StaticThesaurus::new()
                .with_related("clean", &[("pure", 0.9), ("tidy", 0.5)])
                .with_related("architecture", &[("design", 0.8)]),
        )
    }

    #[tokio::test]
    async fn test_expansion_blends_both_channels() {
        let vectorizer = Arc::new(HashVectorizer::default());
        let cache = Arc::new(IdResolutionCache::default());
        let store = seeded_store(&vectorizer, &cache).await;
        let expander = QueryExpander::new(store, Some(thesaurus()), vectorizer, cache, ExpansionConfig::default());

        let expanded = expander.expand("Clean Architecture").await;
        assert_eq!(expanded.original_terms, vec!["clean", "architecture"]);
        assert_eq!(expanded.weight("clean"), 1.0);

        assert!((expanded.weight("clean architecture") - 0.8).abs() < 1e-4);
        assert!(expanded.weight("dependency injection") >= 0.5 - 1e-4);
        assert!(!expanded.corpus_terms.contains_key("sourdough"));

        assert!((expanded.weight("pure") - 0.9 * 0.6).abs() < 1e-9);
        assert!((expanded.weight("design") - 0.8 * 0.6).abs() < 1e-9);
        assert_eq!(expanded.lexical_terms.get("tidy"), Some(&0.5));

        assert_eq!(&expanded.all_terms[..2], &["clean".to_string(), "architecture".to_string()]);
        let rest = &expanded.all_terms[2..];
        assert!(rest.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_expansion_ignores_case() {
        let vectorizer = Arc::new(HashVectorizer::default());
        let cache = Arc::new(IdResolutionCache::default());
        let store = seeded_store(&vectorizer, &cache).await;
        let expander = QueryExpander::new(store, Some(thesaurus()), vectorizer, cache, ExpansionConfig::default());

        let upper = expander.expand("Clean Architecture").await;
        let lower = expander.expand("clean architecture").await;
        assert_eq!(upper.weights, lower.weights);
        assert_eq!(upper.all_terms, lower.all_terms);
    }

    #[tokio::test]
    async fn test_related_names_fall_back_to_store() {
        let vectorizer = Arc::new(HashVectorizer::default());
        let build_cache = Arc::new(IdResolutionCache::default());
        let store = seeded_store(&vectorizer, &build_cache).await;

        let cold_cache = Arc::new(IdResolutionCache::default());
        let expander = QueryExpander::new(store, None, vectorizer, cold_cache.clone(), ExpansionConfig::default());

        let expanded = expander.expand("clean architecture").await;
        assert!(expanded.corpus_terms.contains_key("dependency injection"));
        assert!(cold_cache.stats().reverse_misses > 0);
    }

    #[tokio::test]
    async fn test_failing_channels_degrade_to_originals() {
        let expander = QueryExpander::new(
            Arc::new(DownConceptStore),
            Some(Arc::new(DownThesaurus)),
            Arc::new(HashVectorizer::default()),
            Arc::new(IdResolutionCache::default()),
            ExpansionConfig::default(),
        );

        let expanded = expander.expand("dependency injection").await;
        assert_eq!(expanded.original_terms, vec!["dependency", "injection"]);
        assert!(expanded.corpus_terms.is_empty());
        assert!(expanded.lexical_terms.is_empty());
        assert_eq!(expanded.all_terms, expanded.original_terms);
    }

    #[tokio::test]
    async fn test_empty_and_punctuation_queries() {
        let expander = QueryExpander::new(
            Arc::new(DownConceptStore),
            None,
            Arc::new(HashVectorizer::default()),
            Arc::new(IdResolutionCache::default()),
            ExpansionConfig::default(),
        );
        assert!(expander.expand("").await.is_empty());
        assert!(expander.expand("?! -- ...").await.is_empty());
    }
}
