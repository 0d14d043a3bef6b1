//! Ranking metrics over a binary hit vector
//!
//! Provides standard IR metrics:
//! - Precision@K: proportion of the top-K that is relevant
//! - Recall@K: proportion of all relevant items found in the top-K
//! - Reciprocal Rank: 1/rank of the first relevant item
//! - Average Precision: mean precision at each relevant rank
//! - NDCG@K: DCG normalized by the ideal ordering
//!
//! All functions take the hit vector produced by gold matching; they never
//! see raw text. Degenerate inputs (no hits, empty gold, k of zero) return a
//! defined 0.0 rather than an error.

/// Precision@K: `hits in top-k' / k'` where `k' = min(k, len)`
pub fn precision_at_k(hits: &[bool], k: usize) -> f64 {
    let k = k.min(hits.len());
    if k == 0 {
        return 0.0;
    }
    count_hits(&hits[..k]) as f64 / k as f64
}

/// Recall@K: `hits in top-k / total_relevant`
///
/// `total_relevant` is the gold-list length, not the matched count; an empty
/// gold list yields 0.0.
pub fn recall_at_k(hits: &[bool], k: usize, total_relevant: usize) -> f64 {
    if total_relevant == 0 {
        return 0.0;
    }
    let k = k.min(hits.len());
    count_hits(&hits[..k]) as f64 / total_relevant as f64
}

/// Reciprocal rank of the first hit (1-indexed), 0.0 when nothing hit
pub fn reciprocal_rank(hits: &[bool]) -> f64 {
    for (i, &hit) in hits.iter().enumerate() {
        if hit {
            return 1.0 / (i + 1) as f64;
        }
    }
    0.0
}

/// Average precision: mean of precision at each rank holding a hit
pub fn average_precision(hits: &[bool]) -> f64 {
    let num_rel = count_hits(hits);
    if num_rel == 0 {
        return 0.0;
    }

    let mut cum = 0.0;
    let mut found = 0usize;
    for (i, &hit) in hits.iter().enumerate() {
        if hit {
            found += 1;
            cum += found as f64 / (i + 1) as f64;
        }
    }
    cum / num_rel as f64
}

/// DCG@K with binary gains: rank 1 contributes `gains[0] / log2(2)`
pub fn dcg_at_k(gains: &[bool], k: usize) -> f64 {
    let k = k.min(gains.len());
    gains[..k]
        .iter()
        .enumerate()
        .map(|(i, &gain)| {
            let gain = if gain { 1.0 } else { 0.0 };
            gain / ((i + 2) as f64).log2()
        })
        .sum()
}

/// NDCG@K: DCG of the hits over DCG of the ideal (descending) ordering
///
/// 0.0 when the ideal DCG is itself 0 (nothing relevant retrievable).
pub fn ndcg_at_k(hits: &[bool], k: usize) -> f64 {
    let dcg = dcg_at_k(hits, k);

    let mut ideal = hits.to_vec();
    ideal.sort_unstable_by(|a, b| b.cmp(a));

    let idcg = dcg_at_k(&ideal, k);
    if idcg == 0.0 {
        return 0.0;
    }
    dcg / idcg
}

fn count_hits(hits: &[bool]) -> usize {
    hits.iter().filter(|&&h| h).count()
}
