

/// Cosine of two embeddings, accumulated in f64. Unequal lengths, empty input or a zero vector give 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |(dot, na, nb), (&x, &y)| {
        let (x, y) = (f64::from(x), f64::from(y));
        (dot + x * y, na + x * x, nb + y * y)
    });

    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 { 0.0 } else { (dot / denom).clamp(-1.0, 1.0) }
}


/// Similarity of the character sets of two strings, whitespace ignored.
pub fn char_jaccard(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;

    let set_a: HashSet<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let set_b: HashSet<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!((sim - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 0.01);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_zero_vector_and_scaling() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((sim - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_char_jaccard() {
        assert!((char_jaccard("microservice", "microservices") - 1.0).abs() < f64::EPSILON);
        assert!(char_jaccard("architecture", "party") < 0.7);
        assert_eq!(char_jaccard("", ""), 0.0);
    }
}
