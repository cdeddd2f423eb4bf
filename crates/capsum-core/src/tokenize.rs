//! Word tokenization on Unicode (UAX #29) word boundaries.
//!
//! Whitespace segments are dropped; punctuation segments become their own tokens.
//! Nothing is normalized: case and accents survive untouched.

use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, Result};

pub fn tokenize(text: &str) -> Vec<String> {
    text.split_word_bounds()
        .filter(|seg| !seg.chars().all(char::is_whitespace))
        .map(str::to_string)
        .collect()
}

/// Decode raw document bytes as UTF-8.
pub fn decode_document(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::InputDecoding {
        valid_up_to: e.valid_up_to(),
    })
}

pub fn tokenize_bytes(bytes: &[u8]) -> Result<Vec<String>> {
    Ok(tokenize(decode_document(bytes)?))
}
