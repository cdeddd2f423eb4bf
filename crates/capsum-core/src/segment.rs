//! Fixed-size chunking of a token stream into pseudo-sentences.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based position in the document.
    pub index: usize,
    /// Tokens joined with single spaces.
    pub text: String,
    pub token_count: usize,
}

/// Partition `tokens` into contiguous chunks of `chunk_size` tokens (the last may be shorter).
pub fn segment(tokens: &[String], chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfig("chunk_size must be >= 1".to_string()));
    }
    Ok(tokens
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, window)| Chunk {
            index,
            text: window.join(" "),
            token_count: window.len(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn chunk_count_is_ceil_of_len_over_size() {
        assert_eq!(segment(&words(30), 15).unwrap().len(), 2);
        assert_eq!(segment(&words(31), 15).unwrap().len(), 3);
        assert_eq!(segment(&words(1), 15).unwrap().len(), 1);
    }

    #[test]
    fn last_chunk_may_be_short() {
        let chunks = segment(&words(7), 3).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text, "w6");
        assert_eq!(chunks[2].token_count, 1);
        assert_eq!(chunks[0].text, "w0 w1 w2");
    }

    #[test]
    fn empty_tokens_give_no_chunks() {
        assert!(segment(&[], 15).unwrap().is_empty());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(
            segment(&words(3), 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    proptest! {
        #[test]
        fn chunks_partition_the_token_stream(
            tokens in prop::collection::vec("[a-zA-Z0-9]{1,8}", 0..200),
            chunk_size in 1usize..40,
        ) {
            let chunks = segment(&tokens, chunk_size).unwrap();

            let total: usize = chunks.iter().map(|c| c.token_count).sum();
            prop_assert_eq!(total, tokens.len());

            let rejoined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
            prop_assert_eq!(rejoined, tokens.join(" "));

            for (i, c) in chunks.iter().enumerate() {
                prop_assert_eq!(c.index, i);
                prop_assert!(c.token_count >= 1 && c.token_count <= chunk_size);
            }
            prop_assert_eq!(chunks.len(), tokens.len().div_ceil(chunk_size));
        }
    }
}
