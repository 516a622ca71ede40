//! Partition quality metrics.
//!
//! The pooling layer produces *soft* assignments; these helpers turn them
//! into hard labels and score the result, for evaluation and demos rather
//! than training.
//!
//! | Metric | Range | Best | Needs |
//! |--------|-------|------|-------|
//! | [`modularity`] | [-0.5, 1] | high | adjacency + labels |
//! | [`nmi`] | [0, 1] | 1 | labels + reference labels |
//!
//! # References
//!
//! - Newman & Girvan (2004). "Finding and evaluating community structure in
//!   networks."
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI).

use std::collections::HashMap;

use ndarray::Array2;
use sprs::CsMat;

use crate::graph::{degree_vector, total_edge_weight};

/// Hard labels from soft assignments: per-row argmax.
pub fn argmax_labels(assignments: &Array2<f64>) -> Vec<usize> {
    assignments
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, _)| i)
                .unwrap_or(0)
        })
        .collect()
}

/// Modularity Q of a hard partition on a weighted adjacency.
///
/// ```text
/// Q = (1/W) × Σ_{ij in same cluster} [A_ij − (d_i × d_j)/W]
/// ```
///
/// with `W = Σ degrees` (each undirected edge counted twice, the same
/// convention as the rest of the crate). Returns 0 for an edgeless graph.
pub fn modularity(adjacency: &CsMat<f64>, labels: &[usize]) -> f64 {
    let degrees = degree_vector(adjacency);
    let w = total_edge_weight(&degrees);
    if w <= 0.0 || labels.len() != adjacency.rows() {
        return 0.0;
    }

    // Observed intra-cluster weight.
    let mut intra = 0.0;
    for (i, row) in adjacency.outer_iterator().enumerate() {
        for (j, &value) in row.iter() {
            if labels[i] == labels[j] {
                intra += value;
            }
        }
    }

    // Expected intra-cluster weight under the configuration null model.
    let mut cluster_degree: HashMap<usize, f64> = HashMap::new();
    for (i, &label) in labels.iter().enumerate() {
        *cluster_degree.entry(label).or_insert(0.0) += degrees[i];
    }
    let expected: f64 = cluster_degree.values().map(|&d| d * d / w).sum();

    (intra - expected) / w
}

/// Normalized Mutual Information between two hard partitions.
///
/// `2·I(U; V) / (H(U) + H(V))`, in [0, 1]. Two trivial single-cluster
/// partitions score 1; zero mutual information scores 0.
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }
    let n = pred.len() as f64;

    let mut joint: HashMap<(usize, usize), f64> = HashMap::new();
    let mut count_pred: HashMap<usize, f64> = HashMap::new();
    let mut count_truth: HashMap<usize, f64> = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth) {
        *joint.entry((p, t)).or_insert(0.0) += 1.0;
        *count_pred.entry(p).or_insert(0.0) += 1.0;
        *count_truth.entry(t).or_insert(0.0) += 1.0;
    }

    let entropy = |counts: &HashMap<usize, f64>| -> f64 {
        counts
            .values()
            .map(|&c| {
                let p = c / n;
                -p * p.ln()
            })
            .sum()
    };
    let h_pred = entropy(&count_pred);
    let h_truth = entropy(&count_truth);
    if h_pred + h_truth == 0.0 {
        // Both partitions trivial; they agree completely.
        return 1.0;
    }

    let mut mi = 0.0;
    for (&(p, t), &c) in &joint {
        let p_joint = c / n;
        let p_marg = (count_pred[&p] / n) * (count_truth[&t] / n);
        mi += p_joint * (p_joint / p_marg).ln();
    }

    (2.0 * mi / (h_pred + h_truth)).clamp(0.0, 1.0)
}
