use tracing::info;

use super::as_store_error;
use crate::core::error::Result;
use crate::db::{ChannelHit, DocumentStore, SearchFilter};


pub async fn keyword_search_phase(
    store: &dyn DocumentStore,
    weighted_terms: &[(String, f64)],
    top_k: usize,
    filter: Option<&SearchFilter>,
) -> Result<Vec<ChannelHit>> {
    if weighted_terms.is_empty() {
        return Ok(Vec::new());
    }

    let hits = store
        .keyword_search(weighted_terms, top_k, filter)
        .await
        .map_err(as_store_error)?;

    info!("Keyword search: {} results for {} terms", hits.len(), weighted_terms.len());
    Ok(hits)
}
