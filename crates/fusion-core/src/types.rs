//! Core domain types for the RAG fusion system.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One retrieval call's scored documents for a single query.
///
/// Entries keep the order in which they were supplied. Score scale is local
/// to this set and is not comparable across sets produced by other queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResultSet {
    entries: Vec<(String, f32)>,
}

impl RankedResultSet {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a document score.
    ///
    /// If the document is already present its score is replaced and its
    /// position is kept.
    pub fn insert(&mut self, doc_id: impl Into<String>, score: f32) {
        let doc_id = doc_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == doc_id) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((doc_id, score)),
        }
    }

    /// Build a result set from an unordered score map.
    ///
    /// Entries are ordered by ascending document identifier, so documents
    /// with equal scores later tie-break deterministically even though the
    /// source had no meaningful order.
    pub fn from_scores(scores: HashMap<String, f32>) -> Self {
        let mut entries: Vec<(String, f32)> = scores.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }

    /// Entries sorted by descending score.
    ///
    /// The sort is stable: documents with equal scores keep the order in
    /// which they were supplied. The position in the returned list is the
    /// document's zero-based rank within this result set.
    pub fn ranked(&self) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> = self
            .entries
            .iter()
            .map(|(id, score)| (id.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Iterate entries in supplied order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(id, score)| (id.as_str(), *score))
    }

    /// Number of documents in this set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f32)> for RankedResultSet {
    fn from_iter<I: IntoIterator<Item = (String, f32)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (doc_id, score) in iter {
            set.insert(doc_id, score);
        }
        set
    }
}

/// A document's position in the fused ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedDocument {
    /// Rank in the fused ordering (1-indexed).
    pub rank: u32,

    /// Document identifier.
    pub doc_id: String,

    /// Fused score: the sum of reciprocal-rank contributions across every
    /// result set the document appeared in.
    pub score: f32,
}

/// The merged ranking produced by reciprocal rank fusion.
///
/// Entries are ordered by descending fused score; documents with equal
/// scores are ordered by ascending identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedRanking {
    /// Ranked entries, best first.
    pub entries: Vec<FusedDocument>,
}

impl FusedRanking {
    /// Document identifiers in fused order, best first.
    ///
    /// This is the sequence the synthesis step consumes.
    pub fn doc_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|doc| doc.doc_id.as_str())
    }

    /// Fused score for a document, if it appears in the ranking.
    pub fn score(&self, doc_id: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|doc| doc.doc_id == doc_id)
            .map(|doc| doc.score)
    }

    /// Number of ranked documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ranking is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Metadata for one retrievable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Human-readable title (e.g. a file name).
    pub title: String,

    /// User-provided metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DocumentMeta {
    /// Create metadata with a title and no extra fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            metadata: HashMap::new(),
        }
    }
}

/// A static, named catalog of retrievable documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    /// Corpus name (unique identifier).
    pub name: String,

    /// Documents keyed by identifier.
    pub documents: BTreeMap<String, DocumentMeta>,
}

impl Corpus {
    /// Create an empty corpus.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: BTreeMap::new(),
        }
    }

    /// Add a document to the corpus.
    pub fn insert(&mut self, doc_id: impl Into<String>, meta: DocumentMeta) {
        self.documents.insert(doc_id.into(), meta);
    }

    /// Look up a document's title.
    pub fn title(&self, doc_id: &str) -> Option<&str> {
        self.documents.get(doc_id).map(|meta| meta.title.as_str())
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_insert_replaces_in_place() {
        let mut set = RankedResultSet::new();
        set.insert("doc1", 0.9);
        set.insert("doc2", 0.8);
        set.insert("doc1", 0.3);

        assert_eq!(set.len(), 2);
        let entries: Vec<_> = set.iter().collect();
        assert_eq!(entries[0], ("doc1", 0.3));
        assert_eq!(entries[1], ("doc2", 0.8));
    }

    #[test]
    fn test_result_set_ranked_descending() {
        let mut set = RankedResultSet::new();
        set.insert("doc3", 0.7);
        set.insert("doc1", 0.9);
        set.insert("doc2", 0.8);

        let ranked = set.ranked();
        assert_eq!(ranked[0].0, "doc1");
        assert_eq!(ranked[1].0, "doc2");
        assert_eq!(ranked[2].0, "doc3");
    }

    #[test]
    fn test_result_set_ranked_ties_keep_supplied_order() {
        let mut set = RankedResultSet::new();
        set.insert("doc2", 0.5);
        set.insert("doc1", 0.5);

        // Equal scores: supplied order wins, not identifier order.
        let ranked = set.ranked();
        assert_eq!(ranked[0].0, "doc2");
        assert_eq!(ranked[1].0, "doc1");
    }

    #[test]
    fn test_result_set_from_scores_orders_by_id() {
        let scores = HashMap::from([
            ("doc9".to_string(), 0.5),
            ("doc1".to_string(), 0.5),
            ("doc5".to_string(), 0.5),
        ]);

        let set = RankedResultSet::from_scores(scores);
        let ranked = set.ranked();
        assert_eq!(ranked[0].0, "doc1");
        assert_eq!(ranked[1].0, "doc5");
        assert_eq!(ranked[2].0, "doc9");
    }

    #[test]
    fn test_fused_ranking_doc_ids() {
        let ranking = FusedRanking {
            entries: vec![
                FusedDocument {
                    rank: 1,
                    doc_id: "doc2".to_string(),
                    score: 0.033,
                },
                FusedDocument {
                    rank: 2,
                    doc_id: "doc1".to_string(),
                    score: 0.016,
                },
            ],
        };

        let ids: Vec<_> = ranking.doc_ids().collect();
        assert_eq!(ids, vec!["doc2", "doc1"]);
        assert_eq!(ranking.score("doc2"), Some(0.033));
        assert_eq!(ranking.score("doc7"), None);
    }

    #[test]
    fn test_corpus_lookup() {
        let mut corpus = Corpus::new("field-manuals");
        corpus.insert("doc1", DocumentMeta::new("rangerHandbook.pdf"));

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.title("doc1"), Some("rangerHandbook.pdf"));
        assert_eq!(corpus.title("doc2"), None);
    }
}
