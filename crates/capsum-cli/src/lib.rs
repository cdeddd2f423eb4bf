//! `capsum` crate (library surface).
//!
//! The primary entrypoint for end users is the `capsum` binary. This library module exists
//! to support embedding: it re-exports the summarization engine and the local collaborators
//! without depending on internal crate layout.
//!
//! ```
//! let s = capsum::core::summarize("one two three", 15, 0.4).unwrap();
//! assert_eq!(s.summary, "one two three");
//! assert_eq!(s.selected, vec![0]);
//! ```

pub use capsum_core as core;
pub use capsum_local as local;
