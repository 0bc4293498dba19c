use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").expect("static word regex");
}

pub const DEFAULT_K1: f64 = 1.2;
pub const DEFAULT_B: f64 = 0.75;


pub fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}


#[derive(Debug, Clone)]
struct DocStats {
    length: usize,
    term_freqs: HashMap<String, u32>,
}


/// Okapi BM25 over a growing set of documents, addressed by insertion index.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    k1: f64,
    b: f64,
    docs: Vec<DocStats>,
    doc_freq: HashMap<String, u32>,
    total_length: usize,
}

impl Bm25Index {
    pub fn new(k1: f64, b: f64) -> Self {
        Self {
            k1,
            b,
            docs: Vec::new(),
            doc_freq: HashMap::new(),
            total_length: 0,
        }
    }

    pub fn add(&mut self, text: &str) -> usize {
        let tokens = tokenize(text);
        let mut term_freqs: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *term_freqs.entry(token.clone()).or_insert(0) += 1;
        }
        for term in term_freqs.keys() {
            *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
        }

        self.total_length += tokens.len();
        self.docs.push(DocStats {
            length: tokens.len(),
            term_freqs,
        });
        self.docs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.docs.len() as f64;
        let df = f64::from(self.doc_freq.get(term).copied().unwrap_or(0));
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn token_score(&self, doc: usize, token: &str) -> f64 {
        let Some(stats) = self.docs.get(doc) else { return 0.0 };
        let tf = f64::from(stats.term_freqs.get(token).copied().unwrap_or(0));
        if tf == 0.0 {
            return 0.0;
        }

        let avg_len = self.total_length as f64 / self.docs.len() as f64;
        let norm = if avg_len > 0.0 { stats.length as f64 / avg_len } else { 0.0 };
        let denominator = tf + self.k1 * (1.0 - self.b + self.b * norm);
        self.idf(token) * tf * (self.k1 + 1.0) / denominator
    }


    /// Multi-word terms contribute the mean of their tokens' scores, scaled by the term weight.
    pub fn score(&self, doc: usize, weighted_terms: &[(String, f64)]) -> f64 {
        weighted_terms
            .iter()
            .map(|(term, weight)| {
                let tokens = tokenize(term);
                if tokens.is_empty() {
                    return 0.0;
                }
                let sum: f64 = tokens.iter().map(|t| self.token_score(doc, t)).sum();
                weight * sum / tokens.len() as f64
            })
            .sum()
    }
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new(DEFAULT_K1, DEFAULT_B)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(items: &[(&str, f64)]) -> Vec<(String, f64)> {
        items.iter().map(|(t, w)| ((*t).to_string(), *w)).collect()
    }

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("REST-API, v2!"), vec!["rest", "api", "v2"]);
    }

    #[test]
    fn test_matching_doc_scores_higher() {
        let mut index = Bm25Index::default();
        let a = index.add("dependency injection decouples construction from use");
        let b = index.add("bread needs flour water salt and time");
        let query = terms(&[("dependency", 1.0), ("injection", 1.0)]);
        assert!(index.score(a, &query) > 0.0);
        assert_eq!(index.score(b, &query), 0.0);
    }

    #[test]
    fn test_weight_scales_score() {
        let mut index = Bm25Index::default();
        let a = index.add("event sourcing stores every change");
        index.add("unrelated text about gardens");
        let full = index.score(a, &terms(&[("sourcing", 1.0)]));
        let half = index.score(a, &terms(&[("sourcing", 0.5)]));
        assert!((full - 2.0 * half).abs() < 1e-9);
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let mut index = Bm25Index::default();
        let a = index.add("architecture patterns microservices");
        index.add("architecture of cathedrals");
        index.add("architecture in nature");
        let common = index.score(a, &terms(&[("architecture", 1.0)]));
        let rare = index.score(a, &terms(&[("microservices", 1.0)]));
        assert!(rare > common);
    }

    #[test]
    fn test_unknown_doc_scores_zero() {
        let index = Bm25Index::default();
        assert_eq!(index.score(3, &terms(&[("x", 1.0)])), 0.0);
    }
}
