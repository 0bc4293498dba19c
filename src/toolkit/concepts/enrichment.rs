use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::graph::ConceptGraph;
use super::models::ConceptNode;
use crate::core::config::GraphConfig;
use crate::db::ThesaurusAdapter;

const ENRICHMENT_CONCURRENCY: usize = 8;


#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnrichmentStats {
    pub enriched: usize,
    pub failed: usize,
}


/// Fills synonyms and broader/narrower terms from the thesaurus. A failing lookup leaves that node's fields empty.
pub async fn enrich_graph(
    graph: &mut ConceptGraph,
    thesaurus: &dyn ThesaurusAdapter,
    config: &GraphConfig,
) -> EnrichmentStats {
    let lookups: Vec<(String, Option<(Vec<String>, Vec<String>, Vec<String>)>)> =
        stream::iter(graph.nodes().iter().map(|n| n.name.clone()))
            .map(|name| async move {
                let terms = lookup(thesaurus, &name, config).await;
                (name, terms)
            })
            .buffered(ENRICHMENT_CONCURRENCY)
            .collect()
            .await;

    let mut stats = EnrichmentStats::default();
    for (node, (name, terms)) in graph.nodes_mut().iter_mut().zip(lookups) {
        debug_assert_eq!(node.name, name);
        match terms {
            Some((synonyms, broader, narrower)) => {
                apply(node, synonyms, broader, narrower);
                stats.enriched += 1;
            }
            None => stats.failed += 1,
        }
    }

    info!("Lexical enrichment: {} enriched, {} failed", stats.enriched, stats.failed);
    stats
}

async fn lookup(
    thesaurus: &dyn ThesaurusAdapter,
    name: &str,
    config: &GraphConfig,
) -> Option<(Vec<String>, Vec<String>, Vec<String>)> {
    let related = thesaurus.related_terms(name, config.enrichment_depth, config.enrichment_max_results);
    let broader = thesaurus.broader_terms(name, config.enrichment_max_results);
    let narrower = thesaurus.narrower_terms(name, config.enrichment_max_results);

    match tokio::try_join!(related, broader, narrower) {
        Ok((related, broader, narrower)) => {
            let synonyms = related.into_iter().map(|(term, _)| term).collect();
            Some((synonyms, broader, narrower))
        }
        Err(e) => {
            warn!("Enrichment failed for '{}': {}", crate::log_snippet(name, 40), e);
            None
        }
    }
}

fn apply(node: &mut ConceptNode, synonyms: Vec<String>, broader: Vec<String>, narrower: Vec<String>) {
    let own = node.name.clone();
    let clean = |terms: Vec<String>| -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for term in terms {
            let term = term.trim().to_lowercase();
            if !term.is_empty() && term != own && !out.contains(&term) {
                out.push(term);
            }
        }
        out
    };
    node.synonyms = clean(synonyms);
    node.broader_terms = clean(broader);
    node.narrower_terms = clean(narrower);
}
