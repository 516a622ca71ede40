use ndarray::Array2;
use partio::graph::adjacency_from_edges;
use partio::{ClusterPooling, DenseMap, Objective};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Group-aware blend sweep on two 4-cliques joined by a bridge.
    //
    // The group graph covers the first clique only. As lambda moves from 0
    // to 1 the objective shifts from pure modularity to the group term, and
    // the ledger shows terms appearing and disappearing at the boundaries.

    let clique = |offset: usize| -> Vec<(usize, usize, f64)> {
        let mut edges = Vec::new();
        for a in 0..4 {
            for b in (a + 1)..4 {
                edges.push((offset + a, offset + b, 1.0));
            }
        }
        edges
    };

    let mut edges = clique(0);
    edges.extend(clique(4));
    edges.push((3, 4, 1.0));
    let adjacency = adjacency_from_edges(8, &edges)?;
    let group = adjacency_from_edges(8, &clique(0))?;

    let features = Array2::from_shape_fn((8, 3), |(i, j)| ((i * 5 + j * 3) % 11) as f64 * 0.1);
    let layer = ClusterPooling::new(DenseMap::orthogonal(3, 2, 21)?).with_collapse_weight(0.2);

    for lambda in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let out = layer.forward(
            &features,
            &adjacency,
            Objective::Group {
                graph: &group,
                lambda,
            },
        )?;
        let terms: Vec<String> = out
            .losses
            .terms()
            .iter()
            .map(|(kind, value)| format!("{kind:?}={value:.5}"))
            .collect();
        println!("lambda={lambda:.2}  {}", terms.join("  "));
    }

    Ok(())
}
