//! Top-chunk selection and order-preserving reassembly.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::segment::Chunk;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub text: String,
    /// Selected chunk indices, ascending.
    pub indices: Vec<usize>,
}

/// `max(1, round(total * ratio))` capped at `total`; 0 when there is nothing to pick.
///
/// Rounding is half-to-even, so `2.5` rounds to `2`.
pub fn select_count(total: usize, summary_ratio: f64) -> usize {
    if total == 0 {
        return 0;
    }
    let raw = (total as f64 * summary_ratio).round_ties_even();
    let k = if raw.is_finite() && raw > 0.0 {
        raw as usize
    } else {
        0
    };
    k.max(1).min(total)
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => b.total_cmp(&a),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Rank chunks by descending score (ties: earlier chunk first), keep the top
/// `select_count`, and join them back in document order.
pub fn select(chunks: &[Chunk], scores: &[f64], summary_ratio: f64) -> Selection {
    let k = select_count(chunks.len(), summary_ratio);
    if k == 0 {
        return Selection::default();
    }

    let score = |i: usize| scores.get(i).copied().unwrap_or(0.0);
    let mut ranked: Vec<usize> = (0..chunks.len()).collect();
    ranked.sort_by(|&a, &b| by_score_desc(score(a), score(b)).then(a.cmp(&b)));

    let mut indices = ranked.into_iter().take(k).collect::<Vec<_>>();
    indices.sort_unstable();

    let text = indices
        .iter()
        .map(|&i| chunks[i].text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Selection { text, indices }
}
