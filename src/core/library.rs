use std::sync::Arc;

use tracing::info;

use super::cache::IdResolutionCache;
use super::config::LibrisConfig;
use super::error::Result;
use crate::db::{ConceptStore, DocumentStore, ThesaurusAdapter};
use crate::embeddings::HashVectorizer;
use crate::toolkit::concepts::{
    ChunkConceptAttribution, ConceptGraph, ConceptGraphBuilder, ConceptMatcher, ConceptNode, DocumentConcepts,
    enrich_graph,
};
use crate::toolkit::search::{ExpandedQuery, HybridSearchEngine, QueryExpander, ScoredResult, SearchOptions};


/// Composition root: one cache and one vectorizer shared by the builder, the expander and the scorer.
pub struct ConceptLibrary {
    config: Arc<LibrisConfig>,
    cache: Arc<IdResolutionCache>,
    vectorizer: Arc<HashVectorizer>,
    concept_store: Arc<dyn ConceptStore>,
    thesaurus: Option<Arc<dyn ThesaurusAdapter>>,
    builder: ConceptGraphBuilder,
    matcher: ConceptMatcher,
    expander: Arc<QueryExpander>,
    engine: HybridSearchEngine,
}

impl ConceptLibrary {
    pub fn new(
        config: LibrisConfig,
        concept_store: Arc<dyn ConceptStore>,
        document_store: Arc<dyn DocumentStore>,
        thesaurus: Option<Arc<dyn ThesaurusAdapter>>,
    ) -> Result<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let cache = Arc::new(IdResolutionCache::new(config.cache.capacity));
        let vectorizer = Arc::new(HashVectorizer::new(&config.vectorizer));

        let builder = ConceptGraphBuilder::new(vectorizer.clone(), cache.clone(), config.graph.clone());
        let matcher = ConceptMatcher::new(config.matcher.clone());
        let expander = Arc::new(QueryExpander::new(
            concept_store.clone(),
            thesaurus.clone(),
            vectorizer.clone(),
            cache.clone(),
            config.expansion.clone(),
        ));
        let engine = HybridSearchEngine::new(document_store, expander.clone(), vectorizer.clone(), config.scoring.clone());

        info!(
            "ConceptLibrary ready ({} dims, thesaurus: {})",
            vectorizer.dimensions(),
            thesaurus.is_some()
        );

        Ok(Self {
            config,
            cache,
            vectorizer,
            concept_store,
            thesaurus,
            builder,
            matcher,
            expander,
            engine,
        })
    }

    pub fn config(&self) -> &LibrisConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<IdResolutionCache> {
        &self.cache
    }

    pub fn vectorizer(&self) -> &Arc<HashVectorizer> {
        &self.vectorizer
    }


    /// Builds the graph, enriches it when configured, and publishes it to the concept store and then the cache.
    /// Each build replaces the previous graph; concepts missing from `documents` are gone afterwards.
    pub async fn build_concept_graph(&self, documents: &[DocumentConcepts]) -> Result<Vec<ConceptNode>> {
        let graph = self.builder.build(documents);
        self.publish(graph).await
    }

    pub async fn build_concept_graph_from_values(&self, values: &[serde_json::Value]) -> Result<Vec<ConceptNode>> {
        let graph = self.builder.build_from_values(values);
        self.publish(graph).await
    }

    pub async fn build_concept_graph_sharded(
        &self,
        documents: Vec<DocumentConcepts>,
        shards: usize,
    ) -> Result<Vec<ConceptNode>> {
        let graph = self.builder.build_sharded(documents, shards).await?;
        self.publish(graph).await
    }

    async fn publish(&self, mut graph: ConceptGraph) -> Result<Vec<ConceptNode>> {
        if self.config.graph.enrichment_enabled {
            if let Some(thesaurus) = &self.thesaurus {
                enrich_graph(&mut graph, thesaurus.as_ref(), &self.config.graph).await;
            }
        }

        let nodes = graph.into_nodes();
        self.concept_store.replace_all(nodes.clone()).await?;
        self.cache.initialize(&nodes);
        info!("Published {} concepts", nodes.len());
        Ok(nodes)
    }


    pub fn attribute_concepts(&self, fragment: &str, concepts: &[String]) -> ChunkConceptAttribution {
        self.matcher.attribute(fragment, concepts, &[])
    }

    pub fn attribute_chunk(
        &self,
        fragment: &str,
        concepts: &[String],
        related_terms: &[String],
        categories: &[String],
    ) -> ChunkConceptAttribution {
        self.matcher.attribute_with_related(fragment, concepts, related_terms, categories)
    }

    pub async fn expand_query(&self, text: &str) -> ExpandedQuery {
        self.expander.expand(text).await
    }

    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<ScoredResult>> {
        self.engine.search(query, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LibrisError;
    use crate::core::ids::{ConceptId, concept_id};
    use crate::db::{CollectionKind, InMemoryConceptStore, InMemoryDocumentStore, LibraryItem, StaticThesaurus};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Delegates to an in-memory store until `fail_writes` is set.
    struct FlakyConceptStore {
        inner: InMemoryConceptStore,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl ConceptStore for FlakyConceptStore {
        async fn upsert(&self, nodes: Vec<ConceptNode>) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(LibrisError::store("write rejected"));
            }
            self.inner.upsert(nodes).await
        }

        async fn replace_all(&self, nodes: Vec<ConceptNode>) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(LibrisError::store("write rejected"));
            }
            self.inner.replace_all(nodes).await
        }

        async fn vector_search(&self, embedding: &[f32], k: usize) -> Result<Vec<(ConceptId, f64)>> {
            self.inner.vector_search(embedding, k).await
        }

        async fn get(&self, id: ConceptId) -> Result<Option<ConceptNode>> {
            self.inner.get(id).await
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn library_with(config: LibrisConfig) -> (ConceptLibrary, Arc<InMemoryDocumentStore>, Arc<InMemoryConceptStore>) {
        init_tracing();
        let concepts = Arc::new(InMemoryConceptStore::with_dimensions(config.vectorizer.dimensions));
        let documents = Arc::new(InMemoryDocumentStore::new(
            CollectionKind::Chunks,
            Arc::new(HashVectorizer::new(&config.vectorizer)),
        ));
        let thesaurus: Arc<dyn ThesaurusAdapter> = Arc::new(
            StaticThesaurus::new()
                .with_related("injection", &[("insertion", 0.8)])
                .with_related("clean architecture", &[("hexagonal architecture", 0.7)])
                .with_broader("clean architecture", &["software architecture"]),
        );
        let library = ConceptLibrary::new(config, concepts.clone(), documents.clone(), Some(thesaurus)).unwrap();
        (library, documents, concepts)
    }

    fn library() -> (ConceptLibrary, Arc<InMemoryDocumentStore>, Arc<InMemoryConceptStore>) {
        library_with(LibrisConfig::default())
    }

    fn corpus() -> Vec<DocumentConcepts> {
        vec![
            DocumentConcepts::new("1", &["clean architecture", "dependency injection"]),
            DocumentConcepts::new("2", &["clean architecture"]),
        ]
    }

    #[tokio::test]
    async fn test_cooccurring_concepts_are_related() {
        let (library, _, store) = library();
        let nodes = library.build_concept_graph(&corpus()).await.unwrap();

        let clean = nodes.iter().find(|n| n.name == "clean architecture").unwrap();
        assert_eq!(clean.weight, 2);
        assert!(clean.related_concept_ids.contains(&concept_id("dependency injection")));
        assert!(!clean.related_concept_ids.contains(&clean.id));
        assert_eq!(store.len(), 2);
        assert_eq!(library.cache().id_to_name(clean.id).as_deref(), Some("clean architecture"));
    }

    #[tokio::test]
    async fn test_expansion_is_case_insensitive() {
        let (library, _, _) = library();
        library.build_concept_graph(&corpus()).await.unwrap();

        let upper = library.expand_query("Clean Architecture").await;
        let lower = library.expand_query("clean architecture").await;
        assert_eq!(upper.weights, lower.weights);
        assert!(upper.weights.contains_key("clean architecture"));
    }

    #[tokio::test]
    async fn test_search_respects_limit_and_order() {
        let (library, documents, _) = library();
        library.build_concept_graph(&corpus()).await.unwrap();

        let chunks = [
            "Dependency injection hands collaborators to a class from outside",
            "Clean architecture keeps frameworks at the edge",
            "Constructor injection is the most common dependency injection style",
            "Sourdough bread relies on wild yeast",
            "Testing is easier when dependencies are injected",
            "Ports and adapters are a close relative of clean architecture",
            "Property injection is rarely the right choice",
        ];
        let items: Vec<LibraryItem> = chunks
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let concepts = vec!["clean architecture".to_string(), "dependency injection".to_string()];
                let attribution = library.attribute_concepts(text, &concepts);
                LibraryItem::new(format!("c{}", i), "1", *text).with_concepts(&attribution.matched_concept_names)
            })
            .collect();
        documents.insert(items);

        let results = library
            .search("dependency injection", &SearchOptions::with_limit(5))
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 5);
        assert!(results.windows(2).all(|w| w[0].hybrid_score >= w[1].hybrid_score));
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.hybrid_score)));
    }

    #[tokio::test]
    async fn test_empty_query_never_fails() {
        let (library, documents, _) = library();
        documents.insert(vec![LibraryItem::new("c1", "1", "anything at all")]);
        let results = library.search("", &SearchOptions::with_limit(5)).await.unwrap();
        assert!(results.len() <= 5);
    }

    #[test]
    fn test_attribution_example() {
        let (library, _, _) = library();
        let result = library.attribute_concepts(
            "A REST API provides an interface",
            &["rest api".to_string(), "unrelated concept".to_string()],
        );
        assert_eq!(result.matched_concept_names, vec!["rest api"]);
        assert!(result.density > 0.0);

        let expanded = tokio_test::block_on(library.expand_query("REST API design"));
        assert_eq!(expanded.original_terms, vec!["rest", "api", "design"]);
    }

    #[tokio::test]
    async fn test_enrichment_runs_when_enabled() {
        let mut config = LibrisConfig::default();
        config.graph.enrichment_enabled = true;
        let (library, _, store) = library_with(config);

        let nodes = library.build_concept_graph(&corpus()).await.unwrap();
        let clean = nodes.iter().find(|n| n.name == "clean architecture").unwrap();
        assert_eq!(clean.synonyms, vec!["hexagonal architecture"]);
        assert_eq!(clean.broader_terms, vec!["software architecture"]);

        let stored = store.get(clean.id).await.unwrap().unwrap();
        assert_eq!(stored.synonyms, clean.synonyms);
    }

    #[tokio::test]
    async fn test_rebuild_from_values_skips_malformed() {
        let (library, _, _) = library();
        let values = vec![
            json!({"document_id": "1", "concepts": ["clean architecture", "dependency injection"]}),
            json!({"document_id": 2, "concepts": ["clean architecture"]}),
            json!({"concepts": ["orphan"]}),
            json!("not an object"),
        ];
        let nodes = library.build_concept_graph_from_values(&values).await.unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["clean architecture", "dependency injection"]);

        let sequential = library.build_concept_graph(&corpus()).await.unwrap();
        assert_eq!(nodes, sequential);
    }

    #[tokio::test]
    async fn test_sharded_build_matches_sequential() {
        let (library, _, _) = library();
        let sequential = library.build_concept_graph(&corpus()).await.unwrap();
        let sharded = library.build_concept_graph_sharded(corpus(), 2).await.unwrap();
        assert_eq!(sequential, sharded);
    }

    #[tokio::test]
    async fn test_rebuild_drops_concepts_missing_from_new_corpus() {
        let (library, _, store) = library();
        library
            .build_concept_graph(&[
                DocumentConcepts::new("1", &["clean architecture", "dependency injection"]),
                DocumentConcepts::new("2", &["sourdough"]),
            ])
            .await
            .unwrap();
        assert_eq!(store.len(), 3);

        let nodes = library
            .build_concept_graph(&[DocumentConcepts::new("1", &["clean architecture"])])
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(concept_id("sourdough")).await.unwrap().is_none());
        assert!(store.get(concept_id("dependency injection")).await.unwrap().is_none());
        assert_eq!(library.cache().id_to_name(concept_id("sourdough")), None);

        let expanded = library.expand_query("dependency").await;
        assert!(!expanded.corpus_terms.contains_key("dependency injection"));
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_cache_on_previous_graph() {
        init_tracing();
        let config = LibrisConfig::default();
        let concepts = Arc::new(FlakyConceptStore {
            inner: InMemoryConceptStore::with_dimensions(config.vectorizer.dimensions),
            fail_writes: AtomicBool::new(false),
        });
        let documents = Arc::new(InMemoryDocumentStore::new(
            CollectionKind::Chunks,
            Arc::new(HashVectorizer::new(&config.vectorizer)),
        ));
        let library = ConceptLibrary::new(config, concepts.clone(), documents, None).unwrap();

        library.build_concept_graph(&corpus()).await.unwrap();
        concepts.fail_writes.store(true, Ordering::SeqCst);

        let err = library
            .build_concept_graph(&[DocumentConcepts::new("9", &["sourdough"])])
            .await
            .unwrap_err();
        assert!(matches!(err, LibrisError::StoreUnavailable(_)));

        assert_eq!(concepts.inner.len(), 2);
        let clean = concept_id("clean architecture");
        assert_eq!(library.cache().id_to_name(clean).as_deref(), Some("clean architecture"));
        assert!(concepts.inner.get(clean).await.unwrap().is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = LibrisConfig::default();
        config.scoring.weights.vector = -1.0;
        let result = ConceptLibrary::new(
            config,
            Arc::new(InMemoryConceptStore::new()),
            Arc::new(InMemoryDocumentStore::new(CollectionKind::Chunks, Arc::new(HashVectorizer::default()))),
            None,
        );
        assert!(matches!(result, Err(LibrisError::Config(_))));
    }
}
