//! TF-IDF term weighting over a document's chunk set.
//!
//! - Terms: maximal runs of alphanumeric/`_` characters, at least two characters long.
//!   Independent of [`crate::tokenize`].
//! - TF: raw count of the term in the chunk.
//! - IDF: `ln((1 + n) / (1 + df)) + 1` over the `n` chunks of this document only.
//!
//! The matrix is sparse; absent (chunk, term) pairs weigh 0.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::segment::Chunk;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightingOptions {
    /// Case-fold terms before counting.
    #[serde(default)]
    pub lowercase: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TermWeights {
    rows: Vec<BTreeMap<String, f64>>,
    idf: BTreeMap<String, f64>,
}

impl TermWeights {
    /// Number of chunks weighed.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn weight(&self, chunk: usize, term: &str) -> f64 {
        self.rows
            .get(chunk)
            .and_then(|row| row.get(term))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of term weights per chunk, in chunk order.
    pub fn scores(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.values().sum()).collect()
    }
}

fn flush_term(cur: &mut String, len: &mut usize, out: &mut Vec<String>) {
    if *len >= 2 {
        out.push(std::mem::take(cur));
    } else {
        cur.clear();
    }
    *len = 0;
}

pub(crate) fn terms(text: &str, lowercase: bool) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut len = 0usize;
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            if lowercase {
                cur.extend(ch.to_lowercase());
            } else {
                cur.push(ch);
            }
            len += 1;
        } else if len > 0 {
            flush_term(&mut cur, &mut len, &mut out);
        }
    }
    if len > 0 {
        flush_term(&mut cur, &mut len, &mut out);
    }
    out
}

pub fn weigh(chunks: &[Chunk], opts: &WeightingOptions) -> TermWeights {
    let counts: Vec<BTreeMap<String, usize>> = chunks
        .iter()
        .map(|c| {
            let mut m = BTreeMap::new();
            for t in terms(&c.text, opts.lowercase) {
                *m.entry(t).or_insert(0usize) += 1;
            }
            m
        })
        .collect();

    let mut df: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &counts {
        for term in row.keys() {
            *df.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let n = chunks.len() as f64;
    let idf: BTreeMap<String, f64> = df
        .into_iter()
        .map(|(term, d)| (term.to_string(), ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0))
        .collect();

    let rows = counts
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(term, tf)| {
                    let w = tf as f64 * idf.get(&term).copied().unwrap_or(1.0);
                    (term, w)
                })
                .collect()
        })
        .collect();

    tracing::trace!(chunks = chunks.len(), vocabulary = idf.len(), "weighed chunks");
    TermWeights { rows, idf }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;
    use crate::tokenize::tokenize;
    use proptest::prelude::*;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            text: text.to_string(),
            token_count: text.split_whitespace().count(),
        }
    }

    #[test]
    fn terms_skip_single_characters_and_punctuation() {
        assert_eq!(
            terms("I saw a cat , it's 42 x_y !", false),
            vec!["saw", "cat", "it", "42", "x_y"]
        );
    }

    #[test]
    fn terms_keep_case_unless_asked() {
        assert_eq!(terms("Rust rust", false), vec!["Rust", "rust"]);
        assert_eq!(terms("Rust rust", true), vec!["rust", "rust"]);
    }

    #[test]
    fn rarer_terms_get_higher_idf() {
        let chunks = vec![
            chunk(0, "common rare"),
            chunk(1, "common other"),
            chunk(2, "common thing"),
        ];
        let w = weigh(&chunks, &WeightingOptions::default());
        let common = w.idf("common").unwrap();
        let rare = w.idf("rare").unwrap();
        assert!((common - 1.0).abs() < 1e-12, "term in every chunk has idf 1");
        assert!(rare > common);
        assert!((rare - ((4.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn weight_is_count_times_idf_and_absent_pairs_are_zero() {
        let chunks = vec![chunk(0, "alpha alpha beta"), chunk(1, "beta gamma")];
        let w = weigh(&chunks, &WeightingOptions::default());
        let idf_alpha = w.idf("alpha").unwrap();
        assert!((w.weight(0, "alpha") - 2.0 * idf_alpha).abs() < 1e-12);
        assert_eq!(w.weight(1, "alpha"), 0.0);
        assert_eq!(w.weight(7, "alpha"), 0.0);
        assert_eq!(w.vocabulary_len(), 3);
    }

    #[test]
    fn single_chunk_scores_without_failing() {
        let w = weigh(&[chunk(0, "only one chunk here")], &WeightingOptions::default());
        assert_eq!(w.idf("only"), Some(1.0));
        assert_eq!(w.scores(), vec![4.0]);
    }

    #[test]
    fn chunks_without_terms_score_zero() {
        let chunks = vec![chunk(0, ". , !"), chunk(1, "real words")];
        let scores = weigh(&chunks, &WeightingOptions::default()).scores();
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn no_chunks_no_scores() {
        let w = weigh(&[], &WeightingOptions::default());
        assert!(w.is_empty());
        assert!(w.scores().is_empty());
    }

    proptest! {
        #[test]
        fn scores_are_finite_and_non_negative(
            words in prop::collection::vec("[a-c]{1,3}", 0..120),
            chunk_size in 1usize..20,
        ) {
            let chunks = segment(&words, chunk_size).unwrap();
            let scores = weigh(&chunks, &WeightingOptions::default()).scores();
            prop_assert_eq!(scores.len(), chunks.len());
            for s in scores {
                prop_assert!(s.is_finite() && s >= 0.0);
            }
        }

        #[test]
        fn adding_an_occurrence_never_lowers_the_chunk_score(
            base in prop::collection::vec("[a-d]{2}", 1..15),
            others in prop::collection::vec(prop::collection::vec("[a-d]{2}", 1..15), 1..5),
            pick in any::<prop::sample::Index>(),
        ) {
            let term = base[pick.index(base.len())].clone();
            let mut chunks = vec![chunk(0, &base.join(" "))];
            for (i, o) in others.iter().enumerate() {
                chunks.push(chunk(i + 1, &o.join(" ")));
            }
            let before = weigh(&chunks, &WeightingOptions::default()).scores()[0];

            let mut more = base.clone();
            more.push(term);
            chunks[0] = chunk(0, &more.join(" "));
            let after = weigh(&chunks, &WeightingOptions::default()).scores()[0];

            prop_assert!(after >= before, "before={before} after={after}");
        }
    }

    #[test]
    fn weighing_real_tokens_is_deterministic() {
        let text = "The cat sat. The dog ran far away from the cat, and the cat sat still.";
        let chunks = segment(&tokenize(text), 5).unwrap();
        let a = weigh(&chunks, &WeightingOptions::default()).scores();
        let b = weigh(&chunks, &WeightingOptions::default()).scores();
        assert_eq!(a, b);
    }
}
