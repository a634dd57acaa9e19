use crate::error::{NgramError, Result};
use crate::ngram::{gram_counts, ngrams, TRIGRAM};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

/// Caller-assigned document identifier
pub type DocId = u32;

/// Per-document n-gram occurrence counts, keyed by n-gram
pub(crate) type GramCounts<'a> = FxHashMap<&'a str, u32>;

// ============================================================================
// Configuration
// ============================================================================

/// Index configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Number of characters per indexed gram
    pub gram_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            gram_size: TRIGRAM,
        }
    }
}

impl IndexConfig {
    /// Check that the configuration can build a usable index
    pub fn validate(&self) -> Result<()> {
        if self.gram_size == 0 {
            return Err(NgramError::InvalidConfig(
                "gram_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Postings - which documents contain a gram, and how often
// ============================================================================

/// Postings entry for a single n-gram
///
/// Maps each containing document to its occurrence count. Membership is the
/// key set of that map, so the document set and the counts cannot diverge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Postings {
    freq: FxHashMap<DocId, u32>,
}

impl Postings {
    /// Occurrence count of the gram in a document
    pub fn frequency(&self, doc_id: DocId) -> Option<u32> {
        self.freq.get(&doc_id).copied()
    }

    /// Whether a document contains the gram
    pub fn contains(&self, doc_id: DocId) -> bool {
        self.freq.contains_key(&doc_id)
    }

    /// Iterate over the ids of documents containing the gram
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.freq.keys().copied()
    }

    /// Iterate over (doc_id, frequency) pairs
    pub fn iter(&self) -> impl Iterator<Item = (DocId, u32)> + '_ {
        self.freq.iter().map(|(&doc_id, &count)| (doc_id, count))
    }

    /// Number of documents containing the gram
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }

    fn increment(&mut self, doc_id: DocId, by: u32) {
        *self.freq.entry(doc_id).or_insert(0) += by;
    }

    fn decrement(&mut self, doc_id: DocId, by: u32) {
        if let Some(count) = self.freq.get_mut(&doc_id) {
            *count = count.saturating_sub(by);
            if *count == 0 {
                self.freq.remove(&doc_id);
            }
        }
    }
}

// ============================================================================
// Search output
// ============================================================================

/// A scored document returned by a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    /// Stored document text
    pub text: String,
    /// Accumulated gram score divided by the document's character length
    pub score: f64,
}

/// Summary counters for an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub gram_size: usize,
    pub document_count: usize,
    pub gram_count: usize,
    /// Total (gram, document) pairs across all postings
    pub posting_count: usize,
}

/// Query gram counters gathered during a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GramMatches {
    /// Grams in the query, repeats included
    pub query: usize,
    /// Query grams that had postings
    pub matched: usize,
}

#[derive(Debug, Clone)]
struct Document {
    text: String,
    char_len: usize,
}

impl Document {
    fn new(text: String) -> Self {
        let char_len = text.chars().count();
        Self { text, char_len }
    }
}

// ============================================================================
// NgramIndex
// ============================================================================

/// Inverted index from character n-grams to the documents containing them
///
/// Re-adding an existing `DocId` replaces the document: postings contributed
/// by the previous text are withdrawn before the new text is indexed, so the
/// postings always describe exactly the stored texts.
#[derive(Debug, Clone)]
pub struct NgramIndex {
    config: IndexConfig,
    postings: FxHashMap<String, Postings>,
    documents: FxHashMap<DocId, Document>,
}

impl Default for NgramIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl NgramIndex {
    /// Create an empty trigram index
    pub fn new() -> Self {
        Self {
            config: IndexConfig::default(),
            postings: FxHashMap::default(),
            documents: FxHashMap::default(),
        }
    }

    /// Create an empty index with a custom configuration
    pub fn with_config(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Index a document's text under `doc_id`
    pub fn add(&mut self, doc_id: DocId, text: impl Into<String>) {
        let text = text.into();
        let counts = gram_counts(&text, self.config.gram_size);
        let replaced = self.insert_counted(doc_id, &text, &counts);

        debug!(doc_id, grams = counts.len(), replaced, "indexed document");
    }

    /// Index many documents, counting grams in parallel
    ///
    /// Produces the same state as calling [`NgramIndex::add`] for each
    /// document in order.
    pub fn add_batch(&mut self, docs: &[(DocId, String)]) {
        let counts = count_batch(docs, self.config.gram_size);
        self.merge_counted(docs, counts);
    }

    /// Score every document sharing at least one gram with `query`
    ///
    /// Each query gram found in a document adds `1 + freq / 2`, where `freq`
    /// is the gram's occurrence count in that document. The sum is divided by
    /// the document's length in characters. Hits come back in no particular
    /// order; see [`crate::rank`] for ordering and truncation.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.search_counted(query).0
    }

    /// Search, also reporting how many query grams there were and how many
    /// of them had postings
    pub(crate) fn search_counted(&self, query: &str) -> (Vec<SearchHit>, GramMatches) {
        let mut scores: FxHashMap<DocId, f64> = FxHashMap::default();
        let mut matches = GramMatches::default();

        for gram in ngrams(query, self.config.gram_size) {
            matches.query += 1;
            let Some(postings) = self.postings.get(gram) else {
                continue;
            };
            matches.matched += 1;

            for (doc_id, freq) in postings.iter() {
                *scores.entry(doc_id).or_insert(0.0) += 1.0 + freq as f64 / 2.0;
            }
        }

        let hits: Vec<SearchHit> = scores
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let doc = self.documents.get(&doc_id)?;
                if doc.char_len == 0 || score == 0.0 {
                    return None;
                }
                Some(SearchHit {
                    doc_id,
                    text: doc.text.clone(),
                    score: score / doc.char_len as f64,
                })
            })
            .collect();

        debug!(
            query,
            grams = matches.query,
            matched = matches.matched,
            hits = hits.len(),
            "search complete"
        );
        (hits, matches)
    }

    /// Stored text for a document
    pub fn document(&self, doc_id: DocId) -> Option<&str> {
        self.documents.get(&doc_id).map(|doc| doc.text.as_str())
    }

    /// Whether a document has been added
    pub fn contains(&self, doc_id: DocId) -> bool {
        self.documents.contains_key(&doc_id)
    }

    /// Postings entry for a gram
    pub fn postings(&self, gram: &str) -> Option<&Postings> {
        self.postings.get(gram)
    }

    /// Iterate over all (gram, postings) entries
    pub fn iter_postings(&self) -> impl Iterator<Item = (&str, &Postings)> + '_ {
        self.postings
            .iter()
            .map(|(gram, postings)| (gram.as_str(), postings))
    }

    pub fn gram_size(&self) -> usize {
        self.config.gram_size
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct grams with at least one posting
    pub fn gram_count(&self) -> usize {
        self.postings.len()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            gram_size: self.config.gram_size,
            document_count: self.documents.len(),
            gram_count: self.postings.len(),
            posting_count: self.postings.values().map(Postings::len).sum(),
        }
    }

    /// Apply pre-computed gram counts for a batch of documents, in order
    pub(crate) fn merge_counted(&mut self, docs: &[(DocId, String)], counts: Vec<GramCounts<'_>>) {
        for ((doc_id, text), counts) in docs.iter().zip(counts) {
            self.insert_counted(*doc_id, text, &counts);
        }
        debug!(documents = docs.len(), "merged document batch");
    }

    /// Replace any previous text for `doc_id`, then record `counts`.
    /// Returns true if an existing document was replaced.
    fn insert_counted(&mut self, doc_id: DocId, text: &str, counts: &GramCounts<'_>) -> bool {
        let replaced = match self.documents.remove(&doc_id) {
            Some(previous) => {
                self.withdraw(doc_id, &previous.text);
                true
            }
            None => false,
        };

        for (&gram, &count) in counts {
            match self.postings.get_mut(gram) {
                Some(postings) => postings.increment(doc_id, count),
                None => {
                    let mut postings = Postings::default();
                    postings.increment(doc_id, count);
                    self.postings.insert(gram.to_string(), postings);
                }
            }
        }

        self.documents.insert(doc_id, Document::new(text.to_string()));
        replaced
    }

    /// Remove the postings contributed by `text` for `doc_id`
    fn withdraw(&mut self, doc_id: DocId, text: &str) {
        for (gram, count) in gram_counts(text, self.config.gram_size) {
            if let Some(postings) = self.postings.get_mut(gram) {
                postings.decrement(doc_id, count);
                if postings.is_empty() {
                    self.postings.remove(gram);
                }
            }
        }
    }
}

/// Count grams for each document on the rayon pool
pub(crate) fn count_batch(docs: &[(DocId, String)], gram_size: usize) -> Vec<GramCounts<'_>> {
    docs.par_iter()
        .map(|(_, text)| gram_counts(text, gram_size))
        .collect()
}
