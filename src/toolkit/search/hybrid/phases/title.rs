use crate::db::bm25::tokenize;
use crate::toolkit::search::expansion::ExpandedQuery;


/// Sum of the weights of expanded terms found as whole words in the title, per original term, capped at 1.
pub fn title_match_score(title: Option<&str>, query: &ExpandedQuery) -> (f64, Vec<String>) {
    let Some(title) = title else { return (0.0, Vec::new()) };
    if query.original_terms.is_empty() {
        return (0.0, Vec::new());
    }

    let padded_title = format!(" {} ", tokenize(title).join(" "));
    let mut total = 0.0;
    let mut matched = Vec::new();
    for term in &query.all_terms {
        let tokens = tokenize(term);
        if tokens.is_empty() {
            continue;
        }
        if padded_title.contains(&format!(" {} ", tokens.join(" "))) {
            total += query.weight(term);
            matched.push(term.clone());
        }
    }

    let score = (total / query.original_terms.len() as f64).clamp(0.0, 1.0);
    (score, matched)
}
