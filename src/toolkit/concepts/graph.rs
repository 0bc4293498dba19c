use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use super::models::{ConceptNode, DocumentConcepts, GraphStats};
use crate::core::cache::IdResolutionCache;
use crate::core::config::GraphConfig;
use crate::core::error::{LibrisError, Result};
use crate::core::ids::{ConceptId, concept_id, normalize_concept_name};
use crate::embeddings::HashVectorizer;


/// Symmetric pair counts stored as adjacency lists keyed by concept id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooccurrenceTable {
    adjacency: HashMap<ConceptId, HashMap<ConceptId, u32>>,
}

impl CooccurrenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ids` must already be deduplicated.
    pub fn record_document(&mut self, ids: &[ConceptId]) {
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                if a == b {
                    continue;
                }
                self.increment(*a, *b, 1);
            }
        }
    }

    fn increment(&mut self, a: ConceptId, b: ConceptId, by: u32) {
        *self.adjacency.entry(a).or_default().entry(b).or_insert(0) += by;
        *self.adjacency.entry(b).or_default().entry(a).or_insert(0) += by;
    }

    pub fn count(&self, a: ConceptId, b: ConceptId) -> u32 {
        self.adjacency
            .get(&a)
            .and_then(|n| n.get(&b))
            .copied()
            .unwrap_or(0)
    }

    pub fn neighbors(&self, id: ConceptId) -> Vec<(ConceptId, u32)> {
        self.adjacency
            .get(&id)
            .map(|n| n.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }


    /// Additive merge. Commutative and associative, so shard order never matters.
    pub fn merge(&mut self, other: CooccurrenceTable) {
        for (a, neighbors) in other.adjacency {
            let row = self.adjacency.entry(a).or_default();
            for (b, count) in neighbors {
                *row.entry(b).or_insert(0) += count;
            }
        }
    }

    pub fn pair_count(&self) -> usize {
        self.adjacency.values().map(HashMap::len).sum::<usize>() / 2
    }

    pub fn is_symmetric(&self) -> bool {
        self.adjacency
            .iter()
            .all(|(a, row)| row.iter().all(|(b, count)| self.count(*b, *a) == *count))
    }
}


#[derive(Debug, Default)]
pub struct CancellationFlag(AtomicBool);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}


#[derive(Debug, Clone)]
struct NodeAccumulator {
    name: String,
    catalog_ids: BTreeSet<String>,
    weight: u32,
}


/// Per-shard build state: document memberships and pair counts, no embeddings yet.
#[derive(Debug, Default)]
pub struct GraphAccumulator {
    nodes: HashMap<ConceptId, NodeAccumulator>,
    cooccurrence: CooccurrenceTable,
    processed: usize,
    skipped: usize,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn ingest(&mut self, doc: &DocumentConcepts) -> bool {
        let document_id = doc.document_id.trim();
        if document_id.is_empty() {
            warn!("Skipping concept metadata with empty document id");
            self.skipped += 1;
            return false;
        }

        let mut seen: HashSet<ConceptId> = HashSet::new();
        let mut ids: Vec<ConceptId> = Vec::new();

        for raw in &doc.concepts {
            let Some(name) = normalize_concept_name(raw) else { continue };
            let id = concept_id(&name);

            let node = self.nodes.entry(id).or_insert_with(|| NodeAccumulator {
                name: name.clone(),
                catalog_ids: BTreeSet::new(),
                weight: 0,
            });

            if node.catalog_ids.insert(document_id.to_string()) {
                node.weight += 1;
            }

            if seen.insert(id) {
                ids.push(id);
            }
        }

        if ids.is_empty() {
            debug!("Document {} has no usable concepts", crate::log_snippet(document_id, 24));
        }

        self.cooccurrence.record_document(&ids);
        self.processed += 1;
        true
    }


    pub fn weight_of(&self, name: &str) -> u32 {
        self.nodes.get(&concept_id(name)).map(|n| n.weight).unwrap_or(0)
    }

    pub fn cooccurrence(&self) -> &CooccurrenceTable {
        &self.cooccurrence
    }


    pub fn merge(&mut self, other: GraphAccumulator) {
        for (id, incoming) in other.nodes {
            match self.nodes.get_mut(&id) {
                Some(existing) => {
                    existing.catalog_ids.extend(incoming.catalog_ids);
                    existing.weight = existing.catalog_ids.len() as u32;
                }
                None => {
                    self.nodes.insert(id, incoming);
                }
            }
        }
        self.cooccurrence.merge(other.cooccurrence);
        self.processed += other.processed;
        self.skipped += other.skipped;
    }
}


#[derive(Debug, Clone, Default)]
pub struct ConceptGraph {
    nodes: Vec<ConceptNode>,
    index: HashMap<ConceptId, usize>,
    cooccurrence: CooccurrenceTable,
    stats: GraphStats,
}

impl ConceptGraph {
    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [ConceptNode] {
        &mut self.nodes
    }

    pub fn into_nodes(self) -> Vec<ConceptNode> {
        self.nodes
    }

    pub fn node(&self, id: ConceptId) -> Option<&ConceptNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_by_name(&self, name: &str) -> Option<&ConceptNode> {
        self.node(concept_id(name))
    }

    pub fn pair_count(&self, a: &str, b: &str) -> u32 {
        self.cooccurrence.count(concept_id(a), concept_id(b))
    }

    pub fn cooccurrence(&self) -> &CooccurrenceTable {
        &self.cooccurrence
    }

    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}


pub struct ConceptGraphBuilder {
    vectorizer: Arc<HashVectorizer>,
    cache: Arc<IdResolutionCache>,
    config: GraphConfig,
}

impl ConceptGraphBuilder {
    pub fn new(vectorizer: Arc<HashVectorizer>, cache: Arc<IdResolutionCache>, config: GraphConfig) -> Self {
        Self {
            vectorizer,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }


    pub fn build(&self, documents: &[DocumentConcepts]) -> ConceptGraph {
        let start = Instant::now();
        let mut acc = GraphAccumulator::new();
        for doc in documents {
            acc.ingest(doc);
        }
        let graph = self.finalize(acc);
        info!(
            "Concept graph built: {} concepts from {} documents ({} skipped) in {:.1}ms",
            graph.stats.total_concepts,
            graph.stats.documents_processed,
            graph.stats.documents_skipped,
            start.elapsed().as_secs_f64() * 1000.0
        );
        graph
    }


    pub fn build_from_values(&self, values: &[serde_json::Value]) -> ConceptGraph {
        let mut skipped = 0;
        let documents: Vec<DocumentConcepts> = values
            .iter()
            .enumerate()
            .filter_map(|(i, value)| match DocumentConcepts::from_value(value) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!("Skipping concept metadata entry {}: {}", i, e);
                    skipped += 1;
                    None
                }
            })
            .collect();

        let mut graph = self.build(&documents);
        graph.stats.documents_skipped += skipped;
        graph
    }


    /// Checks `cancel` before every document; a cancelled build yields no nodes at all.
    pub fn build_cancellable(
        &self,
        documents: &[DocumentConcepts],
        cancel: &CancellationFlag,
    ) -> Result<ConceptGraph> {
        let mut acc = GraphAccumulator::new();
        for (i, doc) in documents.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Concept graph build cancelled after {} documents", i);
                return Err(LibrisError::Cancelled(i));
            }
            acc.ingest(doc);
        }
        Ok(self.finalize(acc))
    }


    pub async fn build_sharded(&self, documents: Vec<DocumentConcepts>, shards: usize) -> Result<ConceptGraph> {
        let shards = shards.max(1);
        let chunk_size = documents.len().div_ceil(shards).max(1);
        debug!("Sharded build: {} documents across {} shards", documents.len(), shards);

        let mut handles = Vec::with_capacity(shards);
        let mut remaining = documents;
        while !remaining.is_empty() {
            let tail = remaining.split_off(chunk_size.min(remaining.len()));
            let shard = std::mem::replace(&mut remaining, tail);
            handles.push(tokio::task::spawn_blocking(move || {
                let mut acc = GraphAccumulator::new();
                for doc in &shard {
                    acc.ingest(doc);
                }
                acc
            }));
        }

        let partials = try_join_all(handles)
            .await
            .map_err(|e| LibrisError::Internal(format!("graph shard failed: {}", e)))?;

        let mut merged = GraphAccumulator::new();
        for partial in partials {
            merged.merge(partial);
        }
        Ok(self.finalize(merged))
    }


    fn finalize(&self, acc: GraphAccumulator) -> ConceptGraph {
        let GraphAccumulator {
            nodes,
            cooccurrence,
            processed,
            skipped,
        } = acc;

        let mut ordered: Vec<(&ConceptId, &NodeAccumulator)> = nodes.iter().collect();
        ordered.sort_by(|a, b| a.1.name.cmp(&b.1.name));

        let mut built = Vec::with_capacity(ordered.len());
        for (id, node) in ordered {
            let related = self.select_related(*id, &nodes, &cooccurrence);
            self.cache.register(&node.name);

            built.push(ConceptNode {
                id: self.cache.name_to_id(&node.name),
                name: node.name.clone(),
                embedding: self.vectorizer.embed(&node.name),
                weight: node.weight,
                catalog_ids: node.catalog_ids.clone(),
                related_concept_ids: related,
                synonyms: Vec::new(),
                broader_terms: Vec::new(),
                narrower_terms: Vec::new(),
            });
        }

        let index = built.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let stats = GraphStats {
            documents_processed: processed,
            documents_skipped: skipped,
            total_concepts: built.len(),
            cooccurring_pairs: cooccurrence.pair_count(),
        };

        ConceptGraph {
            nodes: built,
            index,
            cooccurrence,
            stats,
        }
    }


    fn select_related(
        &self,
        id: ConceptId,
        nodes: &HashMap<ConceptId, NodeAccumulator>,
        cooccurrence: &CooccurrenceTable,
    ) -> Vec<ConceptId> {
        let mut partners: Vec<(&str, u32)> = cooccurrence
            .neighbors(id)
            .into_iter()
            .filter(|(neighbor, _)| *neighbor != id)
            .filter_map(|(neighbor, count)| nodes.get(&neighbor).map(|n| (n.name.as_str(), count)))
            .collect();

        partners.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        partners
            .into_iter()
            .take(self.config.related_limit)
            .map(|(name, _)| self.cache.name_to_id(name))
            .collect()
    }
}


/// Builds with default configuration and a private cache.
pub fn build_concept_graph(documents: &[DocumentConcepts]) -> Vec<ConceptNode> {
    let builder = ConceptGraphBuilder::new(
        Arc::new(HashVectorizer::default()),
        Arc::new(IdResolutionCache::default()),
        GraphConfig::default(),
    );
    builder.build(documents).into_nodes()
}
