use crate::average_ranks;

// ============================================================================
// ROC Area (Mann-Whitney formulation, ties counted as half)
// ============================================================================

/// Area under the ROC curve of `scores` against binary `labels`.
///
/// Returns `None` when the lengths differ or when only one class is present.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    if scores.len() != labels.len() {
        return None;
    }

    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let ranks = average_ranks(scores);
    let pos_rank_sum: f64 = ranks
        .iter()
        .zip(labels.iter())
        .filter(|&(_, &l)| l)
        .map(|(r, _)| r)
        .sum();

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    let u = pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0;

    Some(u / (n_pos * n_neg))
}
