use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("static non-word regex");
}


/// Lowercased query tokens of at least `min_chars` characters, first occurrence order, no duplicates.
pub fn tokenize_query(text: &str, min_chars: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let spaced = NON_WORD.replace_all(&lower, " ");

    let mut tokens: Vec<String> = Vec::new();
    for token in spaced.split_whitespace() {
        if token.chars().count() < min_chars {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}
