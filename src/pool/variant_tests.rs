//! Cross-objective behavior at the λ boundaries, plus invariants that span
//! the whole forward pass.

#[cfg(test)]
mod tests {
    use crate::graph::adjacency_from_edges;
    use crate::linear::DenseMap;
    use crate::pool::{ClusterPooling, LossKind, Objective};
    use ndarray::Array2;
    use proptest::prelude::*;
    use sprs::CsMat;

    /// Two triangles bridged by a single edge.
    fn two_triangles() -> CsMat<f64> {
        adjacency_from_edges(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (3, 5, 1.0),
                (2, 3, 1.0),
            ],
        )
        .unwrap()
    }

    /// Edges among the first triangle only, as an auxiliary group graph.
    fn first_triangle() -> CsMat<f64> {
        adjacency_from_edges(6, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]).unwrap()
    }

    /// Edges among the second triangle only.
    fn second_triangle() -> CsMat<f64> {
        adjacency_from_edges(6, &[(3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0)]).unwrap()
    }

    fn features6() -> Array2<f64> {
        Array2::from_shape_fn((6, 3), |(i, j)| ((i * 3 + j) % 7) as f64 * 0.3 - 0.9)
    }

    fn layer() -> ClusterPooling {
        ClusterPooling::new(DenseMap::orthogonal(3, 2, 17).unwrap())
    }

    fn kinds(out: &crate::pool::PoolOutput) -> Vec<LossKind> {
        out.losses.terms().iter().map(|&(k, _)| k).collect()
    }

    #[test]
    fn test_lambda_zero_matches_plain_for_every_variant() {
        let adj = two_triangles();
        let aux = first_triangle();
        let aux2 = second_triangle();
        let layer = layer();
        let plain = layer.forward(&features6(), &adj, Objective::Modularity).unwrap();

        let variants = [
            Objective::Diversity { graph: &aux, lambda: 0.0 },
            Objective::Fairness { red: &aux, blue: &aux2, lambda: 0.0 },
            Objective::Group { graph: &aux, lambda: 0.0 },
        ];
        for objective in variants {
            let out = layer.forward(&features6(), &adj, objective).unwrap();
            // Identical outputs and an identical ledger: the auxiliary term
            // is absent, not zero.
            assert_eq!(out, plain);
        }
    }

    #[test]
    fn test_lambda_one_suppresses_modularity_term() {
        let adj = two_triangles();
        let aux = first_triangle();
        let layer = layer();

        let diversity = layer
            .forward(&features6(), &adj, Objective::Diversity { graph: &aux, lambda: 1.0 })
            .unwrap();
        assert_eq!(kinds(&diversity), vec![LossKind::Diversity, LossKind::Collapse]);

        let group = layer
            .forward(&features6(), &adj, Objective::Group { graph: &aux, lambda: 1.0 })
            .unwrap();
        assert_eq!(kinds(&group), vec![LossKind::Group, LossKind::Collapse]);
    }

    #[test]
    fn test_lambda_one_fairness_keeps_only_disparity_and_collapse() {
        let adj = two_triangles();
        let out = layer()
            .forward(
                &features6(),
                &adj,
                Objective::Fairness { red: &first_triangle(), blue: &second_triangle(), lambda: 1.0 },
            )
            .unwrap();
        assert_eq!(kinds(&out), vec![LossKind::Fairness, LossKind::Collapse]);
        assert!(out.losses.get(LossKind::Fairness).unwrap() >= 0.0);
    }

    #[test]
    fn test_fairness_identical_groups_have_zero_disparity() {
        let adj = two_triangles();
        let aux = first_triangle();
        let out = layer()
            .forward(
                &features6(),
                &adj,
                Objective::Fairness { red: &aux, blue: &aux, lambda: 0.5 },
            )
            .unwrap();
        assert!(out.losses.get(LossKind::Fairness).unwrap().abs() < 1e-15);
    }

    #[test]
    fn test_interior_lambda_registers_all_terms() {
        let adj = two_triangles();
        let aux = first_triangle();
        let layer = layer();

        let out = layer
            .forward(&features6(), &adj, Objective::Group { graph: &aux, lambda: 0.25 })
            .unwrap();
        assert_eq!(
            kinds(&out),
            vec![LossKind::Group, LossKind::Spectral, LossKind::Collapse]
        );

        // The blended spectral term is (1-λ) times the plain one.
        let plain = layer.forward(&features6(), &adj, Objective::Modularity).unwrap();
        let blended = out.losses.get(LossKind::Spectral).unwrap();
        let base = plain.losses.get(LossKind::Spectral).unwrap();
        assert!((blended - 0.75 * base).abs() < 1e-12);
    }

    #[test]
    fn test_fairness_interior_lambda_keeps_modularity_unscaled() {
        let adj = two_triangles();
        let layer = layer();
        let plain = layer.forward(&features6(), &adj, Objective::Modularity).unwrap();
        let out = layer
            .forward(
                &features6(),
                &adj,
                Objective::Fairness { red: &first_triangle(), blue: &second_triangle(), lambda: 0.5 },
            )
            .unwrap();
        assert_eq!(
            out.losses.get(LossKind::Spectral),
            plain.losses.get(LossKind::Spectral)
        );
    }

    #[test]
    fn test_diversity_on_primary_at_lambda_one_equals_plain_spectral() {
        // With the primary adjacency doubling as the diversity graph, the
        // λ = 1 diversity term reduces to the plain spectral loss.
        let adj = two_triangles();
        let layer = layer();
        let plain = layer.forward(&features6(), &adj, Objective::Modularity).unwrap();
        let out = layer
            .forward(&features6(), &adj, Objective::Diversity { graph: &adj, lambda: 1.0 })
            .unwrap();
        let diversity = out.losses.get(LossKind::Diversity).unwrap();
        let spectral = plain.losses.get(LossKind::Spectral).unwrap();
        assert!((diversity - spectral).abs() < 1e-12);
    }

    #[test]
    fn test_edgeless_aux_graph_only_errors_when_term_is_live() {
        let adj = two_triangles();
        let empty: CsMat<f64> = sprs::TriMat::new((6, 6)).to_csr();
        let layer = layer();

        // λ = 0 skips the auxiliary routine entirely, so the empty graph is
        // never inspected.
        let skipped = layer.forward(&features6(), &adj, Objective::Group { graph: &empty, lambda: 0.0 });
        assert!(skipped.is_ok());

        let live = layer.forward(&features6(), &adj, Objective::Group { graph: &empty, lambda: 0.5 });
        assert_eq!(live.unwrap_err(), crate::error::Error::EdgelessGraph);
    }

    #[test]
    fn test_group_blend_is_continuous_in_total_at_midpoint() {
        // Sanity on the blend arithmetic: total(λ) should move between the
        // two pure objectives' totals, not jump outside them.
        let adj = two_triangles();
        let aux = first_triangle();
        let layer = layer();

        let at = |lambda: f64| {
            layer
                .forward(&features6(), &adj, Objective::Group { graph: &aux, lambda })
                .unwrap()
                .losses
                .total()
        };
        let lo = at(0.0).min(at(1.0));
        let hi = at(0.0).max(at(1.0));
        let mid = at(0.5);
        assert!(mid >= lo - 1e-12 && mid <= hi + 1e-12);
    }

    proptest! {
        #[test]
        fn prop_assignment_rows_always_on_simplex(
            values in proptest::collection::vec(-50.0f64..50.0, 6 * 3)
        ) {
            let features = Array2::from_shape_vec((6, 3), values).unwrap();
            let out = layer()
                .forward(&features, &two_triangles(), Objective::Modularity)
                .unwrap();
            for row in out.assignments.rows() {
                let sum: f64 = row.sum();
                prop_assert!((sum - 1.0).abs() < 1e-9);
                prop_assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
            }
            prop_assert!(out.losses.total().is_finite());
        }
    }
}
