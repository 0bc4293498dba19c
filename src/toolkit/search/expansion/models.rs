use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpandedQuery {
    pub original_terms: Vec<String>,
    /// Corpus-derived terms with their channel weight; never contains an original term.
    pub corpus_terms: BTreeMap<String, f64>,
    /// Thesaurus terms with the adapter's weight, before the lexical decay.
    pub lexical_terms: BTreeMap<String, f64>,
    pub all_terms: Vec<String>,
    pub weights: BTreeMap<String, f64>,
}

impl ExpandedQuery {
    pub fn new(
        original_terms: Vec<String>,
        corpus_terms: BTreeMap<String, f64>,
        lexical_terms: BTreeMap<String, f64>,
        lexical_decay: f64,
    ) -> Self {
        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        for term in &original_terms {
            weights.insert(term.clone(), 1.0);
        }
        for (term, weight) in &corpus_terms {
            raise(&mut weights, term, *weight);
        }
        for (term, weight) in &lexical_terms {
            raise(&mut weights, term, weight * lexical_decay);
        }

        let extra: BTreeSet<&String> = corpus_terms.keys().chain(lexical_terms.keys()).collect();
        let mut all_terms = original_terms.clone();
        all_terms.extend(extra.into_iter().cloned());

        Self {
            original_terms,
            corpus_terms,
            lexical_terms,
            all_terms,
            weights,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all_terms.is_empty()
    }

    pub fn weight(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn is_original(&self, term: &str) -> bool {
        self.original_terms.iter().any(|t| t == term)
    }


    /// `(term, weight)` pairs in `all_terms` order, as the keyword channel consumes them.
    pub fn weighted_terms(&self) -> Vec<(String, f64)> {
        self.all_terms.iter().map(|t| (t.clone(), self.weight(t))).collect()
    }
}

fn raise(weights: &mut BTreeMap<String, f64>, term: &str, weight: f64) {
    let slot = weights.entry(term.to_string()).or_insert(weight);
    if weight > *slot {
        *slot = weight;
    }
}
