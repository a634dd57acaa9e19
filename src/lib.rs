//! Fuzzy full-text search over character trigrams
//!
//! Documents are split into overlapping 3-character grams and recorded in an
//! inverted index with per-document occurrence counts. A query is scored
//! against every document it shares grams with, and the score is normalized
//! by document length.
//!
//! # Example
//!
//! ```
//! use ngram_index::{rank, NgramIndex, QueryOptions};
//!
//! let mut index = NgramIndex::new();
//! index.add(1, "mazerunner");
//! index.add(2, "amazing");
//! index.add(3, "running");
//!
//! let options = QueryOptions { limit: Some(5), ..QueryOptions::default() };
//! let hits = rank(index.search("amaz"), &options);
//!
//! assert_eq!(hits[0].text, "amazing");
//! assert_eq!(hits.len(), 2);
//! ```

mod error;
mod index;
mod ngram;
mod query;
mod scanner;
mod shared;

// Re-export public API
pub use error::{NgramError, Result};
pub use index::{DocId, IndexConfig, IndexStats, NgramIndex, Postings, SearchHit};
pub use ngram::{gram_counts, ngrams, tokenize, Ngrams, TRIGRAM};
pub use query::{rank, search_ranked, QueryOptions, QueryResult};
pub use scanner::{scan_documents, Corpus, ScanConfig};
pub use shared::SharedIndex;
