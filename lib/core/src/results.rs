//! Search results and resumable cursors.

use serde::{Deserialize, Serialize};
use tantivy::{DocAddress, Score};

/// Realized ordering value of a hit under an explicit sort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SortValue {
    I64(i64),
    F64(f64),
}

/// One reconstructed hit.
#[derive(Debug, Clone)]
pub struct Hit<T> {
    pub entity: T,
    /// Segment-local position the hit was read from.
    pub address: DocAddress,
    /// Relevance score; zero under an explicit sort.
    pub score: Score,
    /// Present when the search was sorted by a field.
    pub sort_key: Option<SortValue>,
}

/// Opaque resume token for the page after this one.
///
/// A sorted search resumes by re-anchoring on `last_sort`, the realized
/// key of the last raw hit: the follow-up page restricts the query to
/// keys at or past it and skips the `ties` raw hits already consumed at
/// that key, so resumption stays stable relative to sort order when
/// documents are deleted or inserted between pages. A relevance search
/// has no such key and resumes positionally via `offset`, which counts
/// every raw engine hit consumed so far, skipped blobs included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub(crate) offset: usize,
    pub(crate) last_sort: Option<SortValue>,
    /// Raw hits consumed whose sort key equals `last_sort`.
    pub(crate) ties: usize,
    /// Position and score of the last raw hit.
    pub last_doc: Option<(u32, u32)>,
    pub last_score: Option<Score>,
}

/// One page of a search, with the totals needed to keep going.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    /// Matching documents in the whole index, not just this page.
    pub total: usize,
    pub hits: Vec<Hit<T>>,
    /// Matches whose stored blob was missing or unreadable on this page.
    pub skipped: usize,
    /// `None` once every match has been consumed.
    pub next: Option<Cursor>,
}

impl<T> QueryResult<T> {
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}
