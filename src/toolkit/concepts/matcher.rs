use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::models::{ChunkConceptAttribution, ConceptMatch, MatchKind};
use crate::core::config::MatcherConfig;
use crate::embeddings::char_jaccard;

lazy_static! {
    static ref FRAGMENT_WORD: Regex = Regex::new(r"\w+").expect("static word regex");
}


struct Fragment {
    lower: String,
    words: Vec<String>,
    word_set: HashSet<String>,
}

impl Fragment {
    fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words: Vec<String> = FRAGMENT_WORD
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect();
        let word_set = words.iter().cloned().collect();
        Self { lower, words, word_set }
    }
}


pub struct ConceptMatcher {
    config: MatcherConfig,
}

impl ConceptMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }


    pub fn attribute(&self, fragment: &str, concepts: &[String], categories: &[String]) -> ChunkConceptAttribution {
        self.attribute_with_related(fragment, concepts, &[], categories)
    }


    /// Related terms are matched with the same rules but reported separately and do not count toward density.
    pub fn attribute_with_related(
        &self,
        fragment: &str,
        concepts: &[String],
        related_terms: &[String],
        categories: &[String],
    ) -> ChunkConceptAttribution {
        let fragment = Fragment::new(fragment);
        if fragment.words.is_empty() {
            return ChunkConceptAttribution::empty();
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut matches = Vec::new();
        for concept in concepts {
            let name = concept.trim().to_lowercase();
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            if let Some(kind) = self.match_concept(&fragment, &name) {
                matches.push(ConceptMatch {
                    name,
                    kind,
                    confidence: kind.confidence(),
                });
            }
        }

        let mut matched_related_terms: Vec<String> = Vec::new();
        for term in related_terms {
            let term = term.trim().to_lowercase();
            if term.is_empty() || seen.contains(&term) || matched_related_terms.contains(&term) {
                continue;
            }
            if self.match_concept(&fragment, &term).is_some() {
                matched_related_terms.push(term);
            }
        }

        if matches.is_empty() {
            return ChunkConceptAttribution {
                matched_related_terms,
                ..ChunkConceptAttribution::empty()
            };
        }

        let matched_concept_names: Vec<String> = matches.iter().map(|m| m.name.clone()).collect();
        let density = self.density(&matched_concept_names, fragment.words.len());

        let mut matched_categories: Vec<String> = Vec::new();
        for category in categories {
            if !category.trim().is_empty() && !matched_categories.contains(category) {
                matched_categories.push(category.clone());
            }
        }

        debug!(
            "Attributed {} concepts to fragment of {} words (density {:.3})",
            matched_concept_names.len(),
            fragment.words.len(),
            density
        );

        ChunkConceptAttribution {
            matched_concept_names,
            matched_categories,
            density,
            matches,
            matched_related_terms,
        }
    }


    fn match_concept(&self, fragment: &Fragment, name: &str) -> Option<MatchKind> {
        let words: Vec<&str> = name.split_whitespace().collect();
        let multi_word = words.len() > 1;

        if multi_word {
            if fragment.lower.contains(name) {
                return Some(MatchKind::Exact);
            }
            let significant: Vec<&&str> = words.iter().filter(|w| w.chars().count() > 2).collect();
            if !significant.is_empty() && significant.iter().all(|w| fragment.lower.contains(**w)) {
                return Some(MatchKind::AllWords);
            }
        } else {
            if fragment.word_set.contains(name) {
                return Some(MatchKind::Exact);
            }
            if name.chars().count() > self.config.boundary_min_length && boundary_match(&fragment.lower, name) {
                return Some(MatchKind::WordBoundary);
            }
        }

        if name.chars().count() > self.config.fuzzy_min_length {
            let fuzzy = fragment
                .words
                .iter()
                .any(|w| char_jaccard(w, name) >= self.config.fuzzy_threshold);
            if fuzzy {
                return Some(MatchKind::Fuzzy);
            }
        }

        None
    }


    fn density(&self, matched: &[String], fragment_words: usize) -> f64 {
        if fragment_words == 0 {
            return 0.0;
        }
        let matched_words: usize = matched.iter().map(|m| m.split_whitespace().count()).sum();
        let coverage = (self.config.coverage_scale * matched_words as f64 / fragment_words as f64).min(1.0);
        let breadth = (matched.len() as f64 / self.config.breadth_cap).min(1.0);
        (self.config.coverage_weight * coverage + self.config.breadth_weight * breadth).clamp(0.0, 1.0)
    }
}

impl Default for ConceptMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

fn boundary_match(text: &str, word: &str) -> bool {
    Regex::new(&format!(r"\b{}(?:s|es)?\b", regex::escape(word)))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}


pub fn attribute_concepts(fragment: &str, concepts: &[String]) -> ChunkConceptAttribution {
    ConceptMatcher::default().attribute(fragment, concepts, &[])
}
