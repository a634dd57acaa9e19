use crate::index::{NgramIndex, SearchHit};
use std::cmp::Ordering;

/// Result of a ranked query
#[derive(Debug)]
pub struct QueryResult {
    /// Hits ordered by descending score
    pub hits: Vec<SearchHit>,

    /// Number of grams in the query
    pub query_gram_count: usize,

    /// Number of query grams that had postings in the index
    pub matched_gram_count: usize,
}

/// Query options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Maximum number of results to return
    pub limit: Option<usize>,

    /// Drop hits scoring below this threshold
    pub min_score: Option<f64>,
}

/// Order hits by descending score and apply the options
///
/// Equal scores fall back to ascending doc id so the output is stable.
pub fn rank(mut hits: Vec<SearchHit>, options: &QueryOptions) -> Vec<SearchHit> {
    if let Some(min_score) = options.min_score {
        hits.retain(|hit| hit.score >= min_score);
    }

    hits.sort_unstable_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.doc_id.cmp(&b.doc_id))
    });

    if let Some(limit) = options.limit {
        hits.truncate(limit);
    }

    hits
}

/// Search and rank in one step
pub fn search_ranked(index: &NgramIndex, query: &str, options: &QueryOptions) -> QueryResult {
    let (hits, matches) = index.search_counted(query);

    QueryResult {
        hits: rank(hits, options),
        query_gram_count: matches.query,
        matched_gram_count: matches.matched,
    }
}
