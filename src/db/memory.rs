use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::bm25::Bm25Index;
use super::filter::SearchFilter;
use super::models::{ChannelHit, CollectionKind, LibraryItem};
use super::{ConceptStore, DocumentStore, ThesaurusAdapter};
use crate::core::error::{LibrisError, Result};
use crate::core::ids::ConceptId;
use crate::embeddings::{HashVectorizer, cosine_similarity};
use crate::toolkit::concepts::ConceptNode;


#[derive(Debug, Default)]
struct ConceptSnapshot {
    nodes: Vec<ConceptNode>,
    index: HashMap<ConceptId, usize>,
}

impl ConceptSnapshot {
    fn from_nodes(mut nodes: Vec<ConceptNode>) -> Self {
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        let index = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        Self { nodes, index }
    }
}


/// Concept store that serves reads from an immutable snapshot and swaps it whole on upsert.
#[derive(Default)]
pub struct InMemoryConceptStore {
    snapshot: RwLock<Arc<ConceptSnapshot>>,
    dimensions: Option<usize>,
}

impl InMemoryConceptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects embeddings of any other length on upsert.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(ConceptSnapshot::default())),
            dimensions: Some(dimensions),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Arc<ConceptSnapshot> {
        self.snapshot.read().clone()
    }

    fn check_dimensions(&self, nodes: &[ConceptNode]) -> Result<()> {
        let Some(dims) = self.dimensions else {
            return Ok(());
        };
        match nodes.iter().find(|n| n.embedding.len() != dims) {
            Some(bad) => Err(LibrisError::validation(format!(
                "concept '{}' has embedding of length {}, expected {}",
                bad.name,
                bad.embedding.len(),
                dims
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConceptStore for InMemoryConceptStore {
    async fn upsert(&self, nodes: Vec<ConceptNode>) -> Result<()> {
        self.check_dimensions(&nodes)?;

        let current = self.current();
        let mut merged: HashMap<ConceptId, ConceptNode> =
            current.nodes.iter().map(|n| (n.id, n.clone())).collect();
        let incoming = nodes.len();
        for node in nodes {
            merged.insert(node.id, node);
        }

        let next = Arc::new(ConceptSnapshot::from_nodes(merged.into_values().collect()));
        *self.snapshot.write() = next;
        info!("Concept store upserted {} nodes ({} total)", incoming, self.len());
        Ok(())
    }

    async fn replace_all(&self, nodes: Vec<ConceptNode>) -> Result<()> {
        self.check_dimensions(&nodes)?;

        let next = Arc::new(ConceptSnapshot::from_nodes(nodes));
        let previous = std::mem::replace(&mut *self.snapshot.write(), next);
        info!("Concept store replaced {} nodes with {}", previous.nodes.len(), self.len());
        Ok(())
    }

    async fn vector_search(&self, embedding: &[f32], k: usize) -> Result<Vec<(ConceptId, f64)>> {
        let snapshot = self.current();
        let mut scored: Vec<(ConceptId, f64)> = snapshot
            .nodes
            .iter()
            .map(|n| (n.id, cosine_similarity(embedding, &n.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    async fn get(&self, id: ConceptId) -> Result<Option<ConceptNode>> {
        let snapshot = self.current();
        Ok(snapshot.index.get(&id).map(|&i| snapshot.nodes[i].clone()))
    }
}


struct DocumentSnapshot {
    items: Vec<LibraryItem>,
    embeddings: Vec<Vec<f32>>,
    bm25: Bm25Index,
}

impl DocumentSnapshot {
    fn build(items: Vec<LibraryItem>, vectorizer: &HashVectorizer) -> Self {
        let mut bm25 = Bm25Index::default();
        let mut embeddings = Vec::with_capacity(items.len());
        for item in &items {
            let text = match &item.title {
                Some(title) => format!("{} {}", title, item.text),
                None => item.text.clone(),
            };
            bm25.add(&text);
            embeddings.push(vectorizer.embed(&text));
        }
        Self { items, embeddings, bm25 }
    }

    fn ranked(&self, scores: impl Iterator<Item = (usize, f64)>, k: usize) -> Vec<ChannelHit> {
        let mut scored: Vec<(usize, f64)> = scores.collect();
        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.items[a.0].id.cmp(&self.items[b.0].id))
        });
        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ChannelHit {
                item: self.items[i].clone(),
                score,
            })
            .collect()
    }
}


/// Catalog or chunk collection with brute-force vector search and BM25 keyword search.
pub struct InMemoryDocumentStore {
    kind: CollectionKind,
    vectorizer: Arc<HashVectorizer>,
    snapshot: RwLock<Arc<DocumentSnapshot>>,
}

impl InMemoryDocumentStore {
    pub fn new(kind: CollectionKind, vectorizer: Arc<HashVectorizer>) -> Self {
        let empty = DocumentSnapshot::build(Vec::new(), &vectorizer);
        Self {
            kind,
            vectorizer,
            snapshot: RwLock::new(Arc::new(empty)),
        }
    }


    /// Items with an existing id replace the stored one.
    pub fn insert(&self, items: Vec<LibraryItem>) {
        let current = self.snapshot.read().clone();
        let replaced: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();

        let mut all: Vec<LibraryItem> = current
            .items
            .iter()
            .filter(|i| !replaced.contains(i.id.as_str()))
            .cloned()
            .collect();
        all.extend(items);

        let next = Arc::new(DocumentSnapshot::build(all, &self.vectorizer));
        debug!("Document store now holds {} items", next.items.len());
        *self.snapshot.write() = next;
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn kind(&self) -> CollectionKind {
        self.kind
    }

    async fn vector_search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ChannelHit>> {
        let snapshot = self.snapshot.read().clone();
        let scores = snapshot
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| filter.is_none_or(|f| f.matches(item)))
            .map(|(i, _)| (i, cosine_similarity(embedding, &snapshot.embeddings[i])));
        Ok(snapshot.ranked(scores, k))
    }

    async fn keyword_search(
        &self,
        weighted_terms: &[(String, f64)],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ChannelHit>> {
        let snapshot = self.snapshot.read().clone();
        let scores = snapshot
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| filter.is_none_or(|f| f.matches(item)))
            .map(|(i, _)| (i, snapshot.bm25.score(i, weighted_terms)))
            .filter(|(_, score)| *score > 0.0);
        Ok(snapshot.ranked(scores, k))
    }
}


/// Fixed term graph. Hops past the first halve the chained weight.
#[derive(Debug, Clone, Default)]
pub struct StaticThesaurus {
    related: HashMap<String, Vec<(String, f64)>>,
    broader: HashMap<String, Vec<String>>,
    narrower: HashMap<String, Vec<String>>,
}

impl StaticThesaurus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_related(mut self, term: &str, related: &[(&str, f64)]) -> Self {
        self.related.insert(
            term.to_lowercase(),
            related.iter().map(|(t, w)| (t.to_lowercase(), *w)).collect(),
        );
        self
    }

    pub fn with_broader(mut self, term: &str, broader: &[&str]) -> Self {
        self.broader
            .insert(term.to_lowercase(), broader.iter().map(|t| t.to_lowercase()).collect());
        self
    }

    pub fn with_narrower(mut self, term: &str, narrower: &[&str]) -> Self {
        self.narrower
            .insert(term.to_lowercase(), narrower.iter().map(|t| t.to_lowercase()).collect());
        self
    }
}

#[async_trait]
impl ThesaurusAdapter for StaticThesaurus {
    async fn related_terms(&self, term: &str, max_depth: usize, max_results: usize) -> Result<Vec<(String, f64)>> {
        let root = term.to_lowercase();
        let mut best: BTreeMap<String, f64> = BTreeMap::new();
        let mut frontier: Vec<(String, f64)> = vec![(root.clone(), 1.0)];

        for depth in 0..max_depth {
            let decay = if depth == 0 { 1.0 } else { 0.5 };
            let mut next = Vec::new();
            for (current, current_weight) in &frontier {
                let Some(entries) = self.related.get(current) else { continue };
                for (candidate, weight) in entries {
                    if *candidate == root {
                        continue;
                    }
                    let chained = current_weight * weight * decay;
                    let slot = best.entry(candidate.clone()).or_insert(0.0);
                    if chained > *slot {
                        *slot = chained;
                        next.push((candidate.clone(), chained));
                    }
                }
            }
            frontier = next;
        }

        let mut ranked: Vec<(String, f64)> = best.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_results);
        Ok(ranked)
    }

    async fn broader_terms(&self, term: &str, max_results: usize) -> Result<Vec<String>> {
        let mut terms = self.broader.get(&term.to_lowercase()).cloned().unwrap_or_default();
        terms.truncate(max_results);
        Ok(terms)
    }

    async fn narrower_terms(&self, term: &str, max_results: usize) -> Result<Vec<String>> {
        let mut terms = self.narrower.get(&term.to_lowercase()).cloned().unwrap_or_default();
        terms.truncate(max_results);
        Ok(terms)
    }
}
