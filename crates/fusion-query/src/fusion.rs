//! Reciprocal Rank Fusion (RRF) for merging per-query search results.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use fusion_core::{FusedDocument, FusedRanking, FusionError, RankedResultSet, Result};

/// Default RRF constant (commonly 60).
/// Higher values flatten the score differences between ranks.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Fuse per-query result sets using Reciprocal Rank Fusion.
///
/// RRF score = Σ 1 / (rank + k) over every result set the document appears
/// in, with zero-based ranks. Raw scores only order documents within their
/// own set; their scales never mix, so differently scored retrievers can be
/// fused without normalization.
///
/// # Arguments
/// * `results` - Result sets keyed by the query that produced them
/// * `k` - Positive dampening constant (see [`DEFAULT_RRF_K`])
///
/// # Returns
/// The fused ranking, ordered by descending fused score. Documents with
/// equal fused scores are ordered by ascending identifier. An empty input
/// map yields an empty ranking.
///
/// # Errors
/// [`FusionError::InvalidInput`] if `k` is not a positive finite number.
pub fn reciprocal_rank_fusion(
    results: &BTreeMap<String, RankedResultSet>,
    k: f32,
) -> Result<FusedRanking> {
    if !k.is_finite() || k <= 0.0 {
        return Err(FusionError::invalid_input(format!(
            "rrf constant k must be a positive finite number, got {}",
            k
        )));
    }

    // Accumulate contributions. The input is a BTreeMap so queries are
    // visited in one fixed order and float accumulation is reproducible.
    let mut fused_scores: HashMap<String, f32> = HashMap::new();

    for (query, result_set) in results {
        for (rank, (doc_id, _original_score)) in result_set.ranked().into_iter().enumerate() {
            let entry = fused_scores.entry(doc_id.to_string()).or_insert(0.0);
            let previous = *entry;
            *entry += 1.0 / (rank as f32 + k);
            debug!(
                query = %query,
                doc = doc_id,
                rank,
                previous,
                updated = *entry,
                "applied reciprocal rank contribution"
            );
        }
    }

    // Sort by fused score descending, ties by ascending identifier.
    let mut entries: Vec<(String, f32)> = fused_scores.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    Ok(FusedRanking {
        entries: entries
            .into_iter()
            .enumerate()
            .map(|(i, (doc_id, score))| FusedDocument {
                rank: i as u32 + 1,
                doc_id,
                score,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_set(pairs: &[(&str, f32)]) -> RankedResultSet {
        let mut set = RankedResultSet::new();
        for (doc_id, score) in pairs {
            set.insert(*doc_id, *score);
        }
        set
    }

    fn input(sets: Vec<(&str, RankedResultSet)>) -> BTreeMap<String, RankedResultSet> {
        sets.into_iter()
            .map(|(query, set)| (query.to_string(), set))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let fused = reciprocal_rank_fusion(&BTreeMap::new(), 60.0).unwrap();
        assert!(fused.is_empty());
    }

    #[test]
    fn test_empty_result_set_contributes_nothing() {
        let results = input(vec![
            ("q1", result_set(&[("doc1", 0.9)])),
            ("q2", RankedResultSet::new()),
        ]);

        let fused = reciprocal_rank_fusion(&results, 60.0).unwrap();
        assert_eq!(fused.len(), 1);
        assert!((fused.entries[0].score - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_k() {
        let results = input(vec![("q1", result_set(&[("doc1", 0.9)]))]);

        for k in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = reciprocal_rank_fusion(&results, k).unwrap_err();
            assert!(matches!(err, FusionError::InvalidInput { .. }), "k = {}", k);
        }
    }

    #[test]
    fn test_single_list_identity() {
        let results = input(vec![("q1", result_set(&[("A", 0.9), ("B", 0.5)]))]);

        let fused = reciprocal_rank_fusion(&results, 60.0).unwrap();

        assert_eq!(fused.entries[0].doc_id, "A");
        assert_eq!(fused.entries[1].doc_id, "B");
        assert!((fused.entries[0].score - 1.0 / 60.0).abs() < 1e-6);
        assert!((fused.entries[1].score - 1.0 / 61.0).abs() < 1e-6);
    }

    #[test]
    fn test_union_of_disjoint_documents() {
        let results = input(vec![
            ("q1", result_set(&[("doc1", 0.9), ("doc2", 0.8)])),
            ("q2", result_set(&[("doc3", 0.95), ("doc4", 0.7)])),
        ]);

        let fused = reciprocal_rank_fusion(&results, 60.0).unwrap();

        assert_eq!(fused.len(), 4);
        // Each document got exactly one contribution
        for doc in &fused.entries {
            let expected = match doc.doc_id.as_str() {
                "doc1" | "doc3" => 1.0 / 60.0,
                _ => 1.0 / 61.0,
            };
            assert!((doc.score - expected).abs() < 1e-6, "{}", doc.doc_id);
        }
    }

    #[test]
    fn test_reinforcement_beats_single_ranking() {
        // doc1 is top-ranked in both queries, doc2 top-ranked in only one.
        let results = input(vec![
            ("q1", result_set(&[("doc1", 0.9), ("doc2", 0.1)])),
            ("q2", result_set(&[("doc1", 0.8)])),
            ("q3", result_set(&[("doc2", 0.99)])),
        ]);

        let fused = reciprocal_rank_fusion(&results, 60.0).unwrap();

        let doc1 = fused.score("doc1").unwrap();
        let doc2 = fused.score("doc2").unwrap();
        assert!(doc1 > doc2);
        assert_eq!(fused.entries[0].doc_id, "doc1");
    }

    #[test]
    fn test_determinism() {
        let results = input(vec![
            ("q1", result_set(&[("doc1", 0.9), ("doc2", 0.8), ("doc3", 0.8)])),
            ("q2", result_set(&[("doc2", 0.95), ("doc4", 0.7)])),
        ]);

        let first = reciprocal_rank_fusion(&results, 60.0).unwrap();
        let second = reciprocal_rank_fusion(&results, 60.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_query_insertion_order_is_irrelevant() {
        let forward = input(vec![
            ("q1", result_set(&[("doc1", 0.9), ("doc2", 0.8)])),
            ("q2", result_set(&[("doc2", 0.95), ("doc3", 0.7)])),
        ]);
        let reversed = input(vec![
            ("q2", result_set(&[("doc2", 0.95), ("doc3", 0.7)])),
            ("q1", result_set(&[("doc1", 0.9), ("doc2", 0.8)])),
        ]);

        assert_eq!(
            reciprocal_rank_fusion(&forward, 60.0).unwrap(),
            reciprocal_rank_fusion(&reversed, 60.0).unwrap()
        );
    }

    #[test]
    fn test_ties_keep_supplied_order_within_a_set() {
        // doc9 supplied before doc1 with the same score, so doc9 takes rank 0.
        let results = input(vec![("q1", result_set(&[("doc9", 0.5), ("doc1", 0.5)]))]);

        let fused = reciprocal_rank_fusion(&results, 60.0).unwrap();

        assert!((fused.score("doc9").unwrap() - 1.0 / 60.0).abs() < 1e-6);
        assert!((fused.score("doc1").unwrap() - 1.0 / 61.0).abs() < 1e-6);
    }

    #[test]
    fn test_monotonicity_in_k() {
        let results = input(vec![(
            "q1",
            result_set(&[("doc1", 0.9), ("doc2", 0.8), ("doc3", 0.7)]),
        )]);

        let small_k = reciprocal_rank_fusion(&results, 10.0).unwrap();
        let large_k = reciprocal_rank_fusion(&results, 1000.0).unwrap();

        // Every contribution strictly decreases as k grows
        for doc in &small_k.entries {
            assert!(large_k.score(&doc.doc_id).unwrap() < doc.score);
        }

        // And the spread between adjacent ranks shrinks toward equality
        let spread = |ranking: &FusedRanking| {
            ranking.entries[0].score - ranking.entries[ranking.len() - 1].score
        };
        assert!(spread(&large_k) < spread(&small_k));
    }

    #[test]
    fn test_end_to_end_scenario() {
        let results = input(vec![
            ("Q1", result_set(&[("doc1", 0.9), ("doc2", 0.8)])),
            ("Q2", result_set(&[("doc2", 0.95), ("doc3", 0.7)])),
        ]);

        let fused = reciprocal_rank_fusion(&results, 60.0).unwrap();

        assert_eq!(fused.len(), 3);
        // doc2: rank 1 in Q1, rank 0 in Q2
        assert!((fused.score("doc2").unwrap() - (1.0 / 60.0 + 1.0 / 61.0)).abs() < 1e-6);
        assert!((fused.score("doc1").unwrap() - 1.0 / 61.0).abs() < 1e-6);
        assert!((fused.score("doc3").unwrap() - 1.0 / 61.0).abs() < 1e-6);

        // doc2 first; the doc1/doc3 tie breaks by ascending identifier
        let ids: Vec<_> = fused.doc_ids().collect();
        assert_eq!(ids, vec!["doc2", "doc1", "doc3"]);
        assert_eq!(
            fused.entries.iter().map(|d| d.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }
}
