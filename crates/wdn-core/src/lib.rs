//! # wdn-core: Water Distribution Network Modeling Core
//!
//! Provides the fundamental data structures and graph-based network model for
//! water distribution analysis and design optimization.
//!
//! ## Design Philosophy
//!
//! Networks are modeled as **undirected multigraphs** where:
//! - **Nodes**: Junctions (demand nodes), Reservoirs and Tanks (fixed-grade
//!   boundary conditions)
//! - **Links**: Pipes (with diameter, length, roughness, status), plus Pumps
//!   and Valves carried through unmodified
//!
//! This graph-based approach enables:
//! - Fast topological queries (connectivity after pruning, island detection)
//! - Efficient parallel analysis using rayon (each trial clones the graph)
//! - Type-safe element access with newtype IDs
//!
//! ## Core Data Structures
//!
//! - [`Network`] - The main network container (petgraph undirected graph)
//! - [`Node`] - Enum for Junction, Reservoir, Tank elements
//! - [`Link`] - Enum for Pipe, Pump, Valve connections
//! - Type-safe IDs: [`JunctionId`], [`ReservoirId`], [`TankId`], [`PipeId`],
//!   [`PumpId`], [`ValveId`]
//!
//! Links store their endpoint node *names* alongside the graph edge so that
//! import/export round-trips preserve the original identifiers exactly.
//!
//! ## Modules
//!
//! - [`diagnostics`] - Validation and diagnostic reporting
//! - [`graph_utils`] - Topological analysis (connectivity, islands)
//! - [`solver`] - Dense linear-system backends used by the hydraulic engine
//! - [`units`] - Unit conversion helpers
//!
//! The wdn-io crate builds [`Network`] graphs from INP files; wdn-sim runs
//! hydraulics over them; wdn-algo scores candidate diameter assignments.

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod solver;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{WdnError, WdnResult};
pub use graph_utils::*;
pub use petgraph::graph::NodeIndex;
pub use solver::{GaussSolver, LinearSystemBackend, LuSolver, SolverKind};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                $name(value)
            }
            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }
    };
}

define_id!(
    /// Identifier for a junction (demand node).
    JunctionId
);
define_id!(
    /// Identifier for a reservoir (fixed-head source).
    ReservoirId
);
define_id!(
    /// Identifier for a tank (fixed-grade boundary over short horizons).
    TankId
);
define_id!(
    /// Identifier for a pipe.
    PipeId
);
define_id!(
    /// Identifier for a pump.
    PumpId
);
define_id!(
    /// Identifier for a valve.
    ValveId
);

/// Operational status of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    Open,
    Closed,
}

impl LinkStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, LinkStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Open => "Open",
            LinkStatus::Closed => "Closed",
        }
    }
}

/// Junction: a demand node with an elevation and a base demand.
#[derive(Debug, Clone)]
pub struct Junction {
    pub id: JunctionId,
    pub name: String,
    /// Ground elevation in meters
    pub elevation_m: f64,
    /// Base demand in m³/s (zero-demand junctions are valid)
    pub base_demand_m3s: f64,
}

impl Default for Junction {
    fn default() -> Self {
        Self {
            id: JunctionId(0),
            name: String::new(),
            elevation_m: 0.0,
            base_demand_m3s: 0.0,
        }
    }
}

/// Reservoir: an infinite source at a fixed hydraulic head.
#[derive(Debug, Clone)]
pub struct Reservoir {
    pub id: ReservoirId,
    pub name: String,
    /// Total head in meters
    pub head_m: f64,
}

impl Default for Reservoir {
    fn default() -> Self {
        Self {
            id: ReservoirId(0),
            name: String::new(),
            head_m: 0.0,
        }
    }
}

/// Tank: treated as a fixed-grade boundary at elevation + initial level.
#[derive(Debug, Clone)]
pub struct Tank {
    pub id: TankId,
    pub name: String,
    pub elevation_m: f64,
    pub init_level_m: f64,
}

impl Tank {
    /// Hydraulic head presented to the network.
    pub fn head_m(&self) -> f64 {
        self.elevation_m + self.init_level_m
    }
}

impl Default for Tank {
    fn default() -> Self {
        Self {
            id: TankId(0),
            name: String::new(),
            elevation_m: 0.0,
            init_level_m: 0.0,
        }
    }
}

/// Pipe: the optimization variable carrier.
#[derive(Debug, Clone)]
pub struct Pipe {
    pub id: PipeId,
    pub name: String,
    pub from_node: String,
    pub to_node: String,
    /// Length in meters
    pub length_m: f64,
    /// Internal diameter in meters
    pub diameter_m: f64,
    /// Hazen-Williams roughness coefficient
    pub roughness: f64,
    /// Minor loss coefficient (dimensionless)
    pub minor_loss: f64,
    pub status: LinkStatus,
}

impl Default for Pipe {
    fn default() -> Self {
        Self {
            id: PipeId(0),
            name: String::new(),
            from_node: String::new(),
            to_node: String::new(),
            length_m: 0.0,
            diameter_m: 0.0,
            roughness: 130.0,
            minor_loss: 0.0,
            status: LinkStatus::Open,
        }
    }
}

impl Pipe {
    pub fn new(id: PipeId, name: String, from_node: String, to_node: String) -> Self {
        Self {
            id,
            name,
            from_node,
            to_node,
            ..Self::default()
        }
    }

    /// Set length and diameter (meters).
    pub fn with_geometry(mut self, length_m: f64, diameter_m: f64) -> Self {
        self.length_m = length_m;
        self.diameter_m = diameter_m;
        self
    }

    /// Set the Hazen-Williams roughness coefficient.
    pub fn with_roughness(mut self, roughness: f64) -> Self {
        self.roughness = roughness;
        self
    }
}

/// Pump: carried through import/export; hydraulically an open connector.
#[derive(Debug, Clone)]
pub struct Pump {
    pub id: PumpId,
    pub name: String,
    pub from_node: String,
    pub to_node: String,
    pub status: LinkStatus,
    /// Raw parameter text from the source file, preserved for round-trips
    pub parameters: String,
}

/// Valve: carried through import/export; hydraulically an open connector.
#[derive(Debug, Clone)]
pub struct Valve {
    pub id: ValveId,
    pub name: String,
    pub from_node: String,
    pub to_node: String,
    pub diameter_m: f64,
    pub status: LinkStatus,
    /// Raw parameter text from the source file, preserved for round-trips
    pub parameters: String,
}

/// Node kinds in the network graph.
#[derive(Debug, Clone)]
pub enum Node {
    Junction(Junction),
    Reservoir(Reservoir),
    Tank(Tank),
}

impl Node {
    /// Human-readable node name.
    pub fn label(&self) -> &str {
        match self {
            Node::Junction(j) => &j.name,
            Node::Reservoir(r) => &r.name,
            Node::Tank(t) => &t.name,
        }
    }

    /// Fixed hydraulic head for boundary nodes, `None` for junctions.
    pub fn fixed_head_m(&self) -> Option<f64> {
        match self {
            Node::Junction(_) => None,
            Node::Reservoir(r) => Some(r.head_m),
            Node::Tank(t) => Some(t.head_m()),
        }
    }

    pub fn elevation_m(&self) -> f64 {
        match self {
            Node::Junction(j) => j.elevation_m,
            Node::Reservoir(r) => r.head_m,
            Node::Tank(t) => t.elevation_m,
        }
    }
}

/// Link kinds in the network graph.
#[derive(Debug, Clone)]
pub enum Link {
    Pipe(Pipe),
    Pump(Pump),
    Valve(Valve),
}

impl Link {
    /// Human-readable link name.
    pub fn label(&self) -> &str {
        match self {
            Link::Pipe(p) => &p.name,
            Link::Pump(p) => &p.name,
            Link::Valve(v) => &v.name,
        }
    }

    pub fn status(&self) -> LinkStatus {
        match self {
            Link::Pipe(p) => p.status,
            Link::Pump(p) => p.status,
            Link::Valve(v) => v.status,
        }
    }

    pub fn set_status(&mut self, status: LinkStatus) {
        match self {
            Link::Pipe(p) => p.status = status,
            Link::Pump(p) => p.status = status,
            Link::Valve(v) => v.status = status,
        }
    }
}

/// The core water distribution network graph.
///
/// The graph is the single source of truth for topology; `coordinates` and
/// `title` exist only so export reproduces the imported file.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: Graph<Node, Link, Undirected>,
    /// Node name -> (x, y) plotting coordinates from the source file
    pub coordinates: HashMap<String, (f64, f64)>,
    pub title: String,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            coordinates: HashMap::new(),
            title: String::new(),
        }
    }

    /// Find the graph index of a node by name.
    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].label() == name)
    }

    /// All junctions, in node insertion order.
    pub fn junctions(&self) -> Vec<&Junction> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Junction(j) => Some(j),
                _ => None,
            })
            .collect()
    }

    /// Junctions with a strictly positive base demand.
    ///
    /// Criticality analysis restricts impact accounting to these, matching
    /// the convention of ignoring zero-demand topology nodes.
    pub fn junctions_with_demand(&self) -> Vec<&Junction> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Junction(j) if j.base_demand_m3s > 0.0 => Some(j),
                _ => None,
            })
            .collect()
    }

    /// All reservoirs.
    pub fn reservoirs(&self) -> Vec<&Reservoir> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Reservoir(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// All tanks.
    pub fn tanks(&self) -> Vec<&Tank> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Tank(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// All pipes, in edge insertion order.
    ///
    /// This ordering is the canonical candidate-vector ordering used by the
    /// fitness evaluator and the search driver; it is stable for a given
    /// imported network.
    pub fn pipes(&self) -> Vec<&Pipe> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Link::Pipe(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Names of all pipes, in canonical pipe order.
    pub fn pipe_names(&self) -> Vec<String> {
        self.pipes().iter().map(|p| p.name.clone()).collect()
    }

    /// Current diameters in canonical pipe order.
    pub fn pipe_diameters(&self) -> Vec<f64> {
        self.pipes().iter().map(|p| p.diameter_m).collect()
    }

    /// Write a candidate diameter vector into the pipes, canonical order.
    pub fn set_pipe_diameters(&mut self, diameters: &[f64]) -> WdnResult<()> {
        let n_pipes = self.pipes().len();
        if diameters.len() != n_pipes {
            return Err(WdnError::Validation(format!(
                "diameter vector has {} entries but network has {} pipes",
                diameters.len(),
                n_pipes
            )));
        }
        let mut it = diameters.iter();
        for link in self.graph.edge_weights_mut() {
            if let Link::Pipe(p) = link {
                p.diameter_m = *it.next().expect("length checked above");
            }
        }
        Ok(())
    }

    /// Set the status of a named link. Returns false if no such link exists.
    pub fn set_link_status(&mut self, name: &str, status: LinkStatus) -> bool {
        for link in self.graph.edge_weights_mut() {
            if link.label() == name {
                link.set_status(status);
                return true;
            }
        }
        false
    }

    /// Pipes with diameter at least `threshold_m`, in canonical order.
    ///
    /// Typed replacement for attribute-string queries on the link table.
    pub fn pipes_with_diameter_at_least(&self, threshold_m: f64) -> Vec<&Pipe> {
        self.pipes()
            .into_iter()
            .filter(|p| p.diameter_m >= threshold_m)
            .collect()
    }

    /// Remove pipes whose diameter falls below `threshold_m`.
    ///
    /// Returns the number of pipes removed. Pumps and valves are untouched.
    pub fn prune_pipes_below(&mut self, threshold_m: f64) -> usize {
        let before = self.graph.edge_count();
        self.graph.retain_edges(|graph, e| match &graph[e] {
            Link::Pipe(p) => p.diameter_m >= threshold_m,
            _ => true,
        });
        before - self.graph.edge_count()
    }

    /// Total base demand over all junctions (m³/s).
    pub fn total_base_demand_m3s(&self) -> f64 {
        self.junctions().iter().map(|j| j.base_demand_m3s).sum()
    }

    /// Compute basic statistics about the network.
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Junction(j) => {
                    stats.num_junctions += 1;
                    stats.total_base_demand_m3s += j.base_demand_m3s;
                }
                Node::Reservoir(_) => stats.num_reservoirs += 1,
                Node::Tank(_) => stats.num_tanks += 1,
            }
        }

        for link in self.graph.edge_weights() {
            match link {
                Link::Pipe(p) => {
                    stats.num_pipes += 1;
                    stats.total_pipe_length_m += p.length_m;
                }
                Link::Pump(_) => stats.num_pumps += 1,
                Link::Valve(_) => stats.num_valves += 1,
            }
        }

        stats
    }

    /// Validate network data for issues that break hydraulic solves.
    ///
    /// Populates the provided `Diagnostics` with any warnings/errors found.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_junctions == 0 {
            diag.add_error("structure", "Network has no junctions");
            return;
        }

        if stats.num_reservoirs == 0 && stats.num_tanks == 0 {
            diag.add_error("structure", "Network has no fixed-grade source");
        }

        if stats.total_base_demand_m3s.abs() < 1e-12 {
            diag.add_warning("structure", "Network has zero total demand");
        }

        if stats.num_pipes == 0 && self.graph.node_count() > 1 {
            diag.add_error("structure", "Network has multiple nodes but no pipes");
        }

        for link in self.graph.edge_weights() {
            if let Link::Pipe(p) = link {
                if p.diameter_m <= 0.0 {
                    diag.add_error(
                        "geometry",
                        &format!("Pipe '{}' has non-positive diameter", p.name),
                    );
                }
                if p.length_m <= 0.0 {
                    diag.add_warning(
                        "geometry",
                        &format!("Pipe '{}' has non-positive length", p.name),
                    );
                }
            }
        }
    }
}

/// Statistics about a network's size and demand.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_junctions: usize,
    pub num_reservoirs: usize,
    pub num_tanks: usize,
    pub num_pipes: usize,
    pub num_pumps: usize,
    pub num_valves: usize,
    pub total_base_demand_m3s: f64,
    pub total_pipe_length_m: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} junctions, {} reservoirs, {} tanks, {} pipes ({:.0} m), demand {:.4} m³/s",
            self.num_junctions,
            self.num_reservoirs,
            self.num_tanks,
            self.num_pipes,
            self.total_pipe_length_m,
            self.total_base_demand_m3s
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_network() -> Network {
        let mut network = Network::new();
        let src = network.graph.add_node(Node::Reservoir(Reservoir {
            id: ReservoirId::new(1),
            name: "R1".to_string(),
            head_m: 100.0,
        }));
        let j = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(1),
            name: "J1".to_string(),
            elevation_m: 10.0,
            base_demand_m3s: 0.05,
        }));
        network.graph.add_edge(
            src,
            j,
            Link::Pipe(
                Pipe::new(PipeId::new(1), "P1".into(), "R1".into(), "J1".into())
                    .with_geometry(1000.0, 0.3),
            ),
        );
        network
    }

    #[test]
    fn test_network_creation() {
        let network = two_node_network();
        assert_eq!(network.graph.node_count(), 2);
        assert_eq!(network.graph.edge_count(), 1);
        assert_eq!(network.junctions().len(), 1);
        assert_eq!(network.reservoirs().len(), 1);
        assert_eq!(network.pipes().len(), 1);
        assert_eq!(network.pipes()[0].name, "P1");
    }

    #[test]
    fn test_node_index_lookup() {
        let network = two_node_network();
        assert!(network.node_index("J1").is_some());
        assert!(network.node_index("missing").is_none());
    }

    #[test]
    fn test_set_pipe_diameters() {
        let mut network = two_node_network();
        network.set_pipe_diameters(&[0.45]).unwrap();
        assert_eq!(network.pipe_diameters(), vec![0.45]);

        // wrong length is a validation error
        assert!(network.set_pipe_diameters(&[0.1, 0.2]).is_err());
    }

    #[test]
    fn test_set_link_status() {
        let mut network = two_node_network();
        assert!(network.set_link_status("P1", LinkStatus::Closed));
        assert_eq!(network.pipes()[0].status, LinkStatus::Closed);
        assert!(!network.set_link_status("missing", LinkStatus::Open));
    }

    #[test]
    fn test_prune_pipes_below() {
        let mut network = two_node_network();
        assert_eq!(network.prune_pipes_below(0.1), 0);
        assert_eq!(network.prune_pipes_below(0.5), 1);
        assert_eq!(network.pipes().len(), 0);
    }

    #[test]
    fn test_pipes_with_diameter_at_least() {
        let network = two_node_network();
        assert_eq!(network.pipes_with_diameter_at_least(0.0).len(), 1);
        assert_eq!(network.pipes_with_diameter_at_least(0.35).len(), 0);
    }

    #[test]
    fn test_junctions_with_demand_filters_zero() {
        let mut network = two_node_network();
        network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(2),
            name: "J2".to_string(),
            elevation_m: 5.0,
            base_demand_m3s: 0.0,
        }));
        assert_eq!(network.junctions().len(), 2);
        assert_eq!(network.junctions_with_demand().len(), 1);
    }

    #[test]
    fn test_stats() {
        let network = two_node_network();
        let stats = network.stats();
        assert_eq!(stats.num_junctions, 1);
        assert_eq!(stats.num_reservoirs, 1);
        assert_eq!(stats.num_pipes, 1);
        assert!((stats.total_base_demand_m3s - 0.05).abs() < 1e-12);
        assert!((stats.total_pipe_length_m - 1000.0).abs() < 1e-9);
        assert!(stats.to_string().contains("1 junctions"));
    }

    #[test]
    fn test_validation_empty() {
        let network = Network::new();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.has_errors());
        assert!(diag.errors().any(|i| i.message.contains("no junctions")));
    }

    #[test]
    fn test_validation_no_source() {
        let mut network = Network::new();
        network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(1),
            name: "J1".to_string(),
            elevation_m: 0.0,
            base_demand_m3s: 0.01,
        }));
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.errors().any(|i| i.message.contains("fixed-grade")));
    }

    #[test]
    fn test_validation_ok() {
        let network = two_node_network();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = PipeId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: PipeId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_clone_isolates_mutation() {
        let baseline = two_node_network();
        let mut copy = baseline.clone();
        copy.set_pipe_diameters(&[0.1]).unwrap();
        copy.set_link_status("P1", LinkStatus::Closed);
        assert_eq!(baseline.pipe_diameters(), vec![0.3]);
        assert_eq!(baseline.pipes()[0].status, LinkStatus::Open);
    }
}
