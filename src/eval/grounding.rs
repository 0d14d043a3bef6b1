//! Lexical faithfulness scoring
//!
//! A cheap grounding proxy: token-set Jaccard overlap between the generated
//! answer and each retrieved chunk, averaged over the best three chunks.
//! Range [0, 1]; higher means more of the answer's vocabulary appears in the
//! retrieved context.

use std::collections::HashSet;

/// Normalize text into a token set: lowercase, strip everything outside
/// `[a-z0-9]` and whitespace, split on whitespace, collapse duplicates.
fn token_set(text: &str) -> HashSet<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().map(String::from).collect()
}

/// Jaccard similarity of the two texts' token sets; 0.0 if either is empty
fn jaccard(a: &str, b: &str) -> f64 {
    let set_a = token_set(a);
    let set_b = token_set(b);

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

/// Faithfulness of `answer_text` to the retrieved chunk texts
///
/// Scores the answer against every chunk and returns the mean of the top
/// three overlaps (fewer when fewer chunks exist). 0.0 for an empty answer
/// or empty context.
pub fn faithfulness_score(answer_text: &str, retrieved_texts: &[&str]) -> f64 {
    if answer_text.is_empty() || retrieved_texts.is_empty() {
        return 0.0;
    }

    let mut scores: Vec<f64> = retrieved_texts
        .iter()
        .map(|ctx| jaccard(answer_text, ctx))
        .collect();
    scores.sort_by(|a, b| b.total_cmp(a));

    let top = &scores[..scores.len().min(3)];
    top.iter().sum::<f64>() / top.len() as f64
}
