

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use super::ids::{ConceptId, concept_id, normalize_concept_name};
use crate::toolkit::concepts::ConceptNode;


/// Name/id resolution shared by the graph builder and the search path.
///
/// Forward lookups are memoized in a bounded LRU and fall back to recomputing the
/// hash on a cold cache. Reverse lookups come from the table filled by `initialize`
/// and `register`; a miss there is `None` and callers ask the concept store instead.
pub struct IdResolutionCache {
    forward: Mutex<LruCache<String, ConceptId>>,
    reverse: RwLock<HashMap<ConceptId, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
    reverse_misses: AtomicU64,
}


#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResolutionStats {
    pub hits: u64,
    pub misses: u64,
    pub reverse_misses: u64,
    pub known_names: usize,
    pub hit_rate: f64,
}

impl IdResolutionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or(NonZeroUsize::new(crate::DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN));

        Self {
            forward: Mutex::new(LruCache::new(capacity)),
            reverse: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            reverse_misses: AtomicU64::new(0),
        }
    }


    pub fn initialize(&self, nodes: &[ConceptNode]) {
        let mut reverse = self.reverse.write();
        reverse.clear();
        reverse.reserve(nodes.len());

        let mut forward = self.forward.lock();
        forward.clear();

        for node in nodes {
            reverse.insert(node.id, node.name.clone());
            forward.put(node.name.clone(), node.id);
        }

        info!("IdResolutionCache initialized with {} concepts", reverse.len());
    }


    pub fn register(&self, name: &str) -> Option<ConceptId> {
        let normalized = normalize_concept_name(name)?;
        let id = self.name_to_id(&normalized);
        self.reverse.write().entry(id).or_insert(normalized);
        Some(id)
    }


    pub fn name_to_id(&self, name: &str) -> ConceptId {
        let key = normalize_concept_name(name).unwrap_or_default();

        if let Some(id) = self.forward.lock().get(&key).copied() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return id;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let id = concept_id(&key);
        debug!("Recomputed id for '{}'", crate::log_snippet(&key, 40));
        self.forward.lock().put(key, id);
        id
    }


    pub fn id_to_name(&self, id: ConceptId) -> Option<String> {
        let found = self.reverse.read().get(&id).cloned();
        if found.is_none() {
            self.reverse_misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub fn len(&self) -> usize {
        self.reverse.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ResolutionStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        ResolutionStats {
            hits,
            misses,
            reverse_misses: self.reverse_misses.load(Ordering::Relaxed),
            known_names: self.len(),
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }

    pub fn clear(&self) {
        self.forward.lock().clear();
        self.reverse.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.reverse_misses.store(0, Ordering::Relaxed);
    }
}

impl Default for IdResolutionCache {
    fn default() -> Self {
        Self::new(crate::DEFAULT_CACHE_SIZE)
    }
}
