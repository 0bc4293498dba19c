use crate::toolkit::search::expansion::ExpandedQuery;


/// Equal, a whole word of the concept, or the concept as a whole-word run inside the term.
pub fn term_matches_concept(term: &str, concept: &str) -> bool {
    if term == concept {
        return true;
    }
    if concept.split_whitespace().any(|w| w == term) {
        return true;
    }
    let padded_term = format!(" {} ", term.split_whitespace().collect::<Vec<_>>().join(" "));
    padded_term.contains(&format!(" {} ", concept))
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptOverlap {
    pub concept_score: f64,
    pub wordnet_score: f64,
    pub matched_concepts: Vec<String>,
    pub concept_terms: Vec<String>,
    pub lexical_terms: Vec<String>,
}


pub fn score_concept_overlap(query: &ExpandedQuery, item_concepts: &[String]) -> ConceptOverlap {
    let concepts: Vec<String> = item_concepts
        .iter()
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    if concepts.is_empty() || query.is_empty() {
        return ConceptOverlap::default();
    }

    let concept_channel: Vec<&String> = query
        .original_terms
        .iter()
        .chain(query.corpus_terms.keys())
        .collect();
    let lexical_channel: Vec<&String> = query.lexical_terms.keys().collect();

    let mut matched_concepts: Vec<String> = Vec::new();
    let mut overlap = |terms: &[&String]| -> (f64, Vec<String>) {
        let mut total = 0.0;
        let mut matched = 0.0;
        let mut matched_terms = Vec::new();
        for term in terms {
            let weight = query.weight(term);
            total += weight;
            let mut hit = false;
            for concept in &concepts {
                if term_matches_concept(term, concept) {
                    hit = true;
                    if !matched_concepts.contains(concept) {
                        matched_concepts.push(concept.clone());
                    }
                }
            }
            if hit {
                matched += weight;
                matched_terms.push((*term).clone());
            }
        }
        let score = if total > 0.0 { (matched / total).clamp(0.0, 1.0) } else { 0.0 };
        (score, matched_terms)
    };

    let (concept_score, concept_terms) = overlap(&concept_channel);
    let (wordnet_score, lexical_terms) = overlap(&lexical_channel);

    matched_concepts.sort_by_key(|c| concepts.iter().position(|x| x == c));

    ConceptOverlap {
        concept_score,
        wordnet_score,
        matched_concepts,
        concept_terms,
        lexical_terms,
    }
}
