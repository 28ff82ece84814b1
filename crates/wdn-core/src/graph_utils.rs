//! Topological analysis of the network graph.
//!
//! Connectivity is the structural gate for the optimization: pruning pipes
//! below the diameter threshold can split the graph, at which point the
//! hydraulic state is meaningless and the evaluator short-circuits.

use crate::Network;
use anyhow::Result;
use petgraph::algo::connected_components;
use std::collections::{HashSet, VecDeque};

/// Summary statistics over the link graph.
#[derive(Debug)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
}

/// Island summary for reporting (one entry per connected component).
#[derive(Debug)]
pub struct IslandSummary {
    pub island_id: usize,
    pub node_count: usize,
    pub members: Vec<String>,
}

/// True if every node can reach every other node over links of any status.
///
/// Status is deliberately ignored here: a closed pipe still physically
/// connects the graph. Pruned pipes are removed outright and do count.
pub fn is_connected(network: &Network) -> bool {
    network.graph.node_count() == 0 || connected_components(&network.graph) == 1
}

/// Calculates graph-level statistics such as degree distribution and
/// component count.
pub fn graph_stats(network: &Network) -> Result<GraphStats> {
    let node_count = network.graph.node_count();
    let edge_count = network.graph.edge_count();
    let mut degrees = Vec::with_capacity(node_count);
    for node in network.graph.node_indices() {
        degrees.push(network.graph.neighbors(node).count());
    }
    let min_degree = *degrees.iter().min().unwrap_or(&0);
    let max_degree = *degrees.iter().max().unwrap_or(&0);
    let avg_degree = if node_count == 0 {
        0.0
    } else {
        degrees.iter().copied().sum::<usize>() as f64 / node_count as f64
    };
    Ok(GraphStats {
        node_count,
        edge_count,
        connected_components: connected_components(&network.graph),
        min_degree,
        avg_degree,
        max_degree,
    })
}

/// Labels connected components (breadth-first search) with member node names,
/// for reporting which junctions end up cut off after pruning.
pub fn find_islands(network: &Network) -> Vec<IslandSummary> {
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut island_id = 0;
    for start in network.graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(network.graph[node].label().to_string());
            for neighbor in network.graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        islands.push(IslandSummary {
            island_id,
            node_count: members.len(),
            members,
        });
        island_id += 1;
    }
    islands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Junction, JunctionId, Link, Node, Pipe, PipeId, Reservoir, ReservoirId};

    fn chain_network() -> Network {
        let mut network = Network::new();
        let r = network.graph.add_node(Node::Reservoir(Reservoir {
            id: ReservoirId::new(1),
            name: "R1".into(),
            head_m: 50.0,
        }));
        let a = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(1),
            name: "A".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.01,
        }));
        let b = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(2),
            name: "B".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.01,
        }));
        network.graph.add_edge(
            r,
            a,
            Link::Pipe(
                Pipe::new(PipeId::new(1), "P1".into(), "R1".into(), "A".into())
                    .with_geometry(100.0, 0.3),
            ),
        );
        network.graph.add_edge(
            a,
            b,
            Link::Pipe(
                Pipe::new(PipeId::new(2), "P2".into(), "A".into(), "B".into())
                    .with_geometry(100.0, 0.3),
            ),
        );
        network
    }

    #[test]
    fn test_connected_chain() {
        let network = chain_network();
        assert!(is_connected(&network));
        let stats = graph_stats(&network).unwrap();
        assert_eq!(stats.connected_components, 1);
        assert_eq!(stats.max_degree, 2);
    }

    #[test]
    fn test_pruning_bridge_disconnects() {
        let mut network = chain_network();
        // Shrink the bridge pipe below the pruning threshold and remove it.
        network.set_pipe_diameters(&[0.3, 0.01]).unwrap();
        network.prune_pipes_below(0.05);
        assert!(!is_connected(&network));
        let islands = find_islands(&network);
        assert_eq!(islands.len(), 2);
        assert!(islands.iter().any(|i| i.members == vec!["B".to_string()]));
    }

    #[test]
    fn test_empty_network_is_connected() {
        let network = Network::new();
        assert!(is_connected(&network));
    }
}
