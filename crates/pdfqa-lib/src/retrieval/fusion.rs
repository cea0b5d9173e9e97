//! Weighted reciprocal rank fusion.
//!
//! `score(d) = sum over lists of weight / (rank_in_list(d) + k)` with 1-based
//! ranks. Scores from different strategies are never compared directly.

use std::collections::HashMap;

/// One strategy's ranked output and its weight.
pub struct RankedList<'a> {
    pub weight: f32,
    pub chunk_ids: &'a [usize],
}

/// Fuse ranked lists into one deduplicated ranking of `(chunk_id, score)`.
///
/// Equal fused scores keep the order in which chunks first appear when the
/// lists are walked in the order given. The result is truncated to
/// `max_results`.
pub fn fuse(lists: &[RankedList<'_>], k: f32, max_results: usize) -> Vec<(usize, f32)> {
    let mut order: Vec<usize> = Vec::new();
    let mut scores: HashMap<usize, f32> = HashMap::new();

    for list in lists {
        for (pos, &chunk_id) in list.chunk_ids.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let rank = (pos + 1) as f32;
            let entry = scores.entry(chunk_id).or_insert_with(|| {
                order.push(chunk_id);
                0.0
            });
            *entry += list.weight / (rank + k);
        }
    }

    let mut fused: Vec<(usize, f32)> = order
        .into_iter()
        .map(|id| (id, scores.get(&id).copied().unwrap_or(0.0)))
        .collect();
    fused.sort_by(|a, b| b.1.total_cmp(&a.1));
    fused.truncate(max_results);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: f32 = 60.0;

    fn ids(fused: &[(usize, f32)]) -> Vec<usize> {
        fused.iter().map(|(id, _)| *id).collect()
    }

    #[test]
    fn agreement_across_lists_wins() {
        let fused = fuse(
            &[
                RankedList { weight: 0.4, chunk_ids: &[1, 2] },
                RankedList { weight: 0.4, chunk_ids: &[3, 2] },
                RankedList { weight: 0.2, chunk_ids: &[2, 4] },
            ],
            K,
            10,
        );
        assert_eq!(fused[0].0, 2);
        assert_eq!(ids(&fused).len(), 4);
    }

    #[test]
    fn weights_scale_contributions() {
        let fused = fuse(
            &[
                RankedList { weight: 0.4, chunk_ids: &[1] },
                RankedList { weight: 0.2, chunk_ids: &[2] },
            ],
            K,
            10,
        );
        assert_eq!(ids(&fused), vec![1, 2]);
        assert!((fused[0].1 - 0.4 / 61.0).abs() < 1e-7);
        assert!((fused[1].1 - 0.2 / 61.0).abs() < 1e-7);
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let fused = fuse(
            &[
                RankedList { weight: 0.4, chunk_ids: &[7] },
                RankedList { weight: 0.4, chunk_ids: &[3] },
            ],
            K,
            10,
        );
        assert_eq!(ids(&fused), vec![7, 3]);
    }

    #[test]
    fn output_is_deduplicated_and_truncated() {
        let fused = fuse(
            &[
                RankedList { weight: 1.0, chunk_ids: &[1, 2, 3, 4] },
                RankedList { weight: 1.0, chunk_ids: &[4, 3, 2, 1] },
            ],
            K,
            3,
        );
        assert_eq!(fused.len(), 3);
        let mut seen = ids(&fused);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn zero_weight_list_only_contributes_order() {
        let fused = fuse(
            &[
                RankedList { weight: 0.0, chunk_ids: &[9] },
                RankedList { weight: 0.4, chunk_ids: &[5] },
            ],
            K,
            10,
        );
        assert_eq!(ids(&fused), vec![5, 9]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(fuse(&[], K, 5).is_empty());
    }
}
