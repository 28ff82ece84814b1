//! Writing a search result back into a network.

use crate::constraints::{PenaltyBreakdown, PenaltyConfig};
use crate::cost::CostTable;
use crate::resilience::modified_resilience_index;
use anyhow::{Context, Result};
use serde::Serialize;
use wdn_core::graph_utils::is_connected;
use wdn_core::{Network, WdnResult};
use wdn_sim::{simulate, SimulationOptions};

/// Write `diameters` into the network, snapping survivors to the nearest
/// catalog size.
///
/// The vector is in canonical pipe order. Diameters below `prune_below_m`
/// remove the pipe instead of resizing it; pass `None` to keep every pipe.
/// The prune decision uses the searched diameter, before snapping, so the
/// as-built removals match what the fitness evaluation pruned.
pub fn apply_solution(
    network: &mut Network,
    diameters: &[f64],
    cost_table: &CostTable,
    prune_below_m: Option<f64>,
) -> WdnResult<usize> {
    network.set_pipe_diameters(diameters)?;
    let removed = match prune_below_m {
        Some(threshold) => network.prune_pipes_below(threshold),
        None => 0,
    };
    let snapped: Vec<f64> = network
        .pipe_diameters()
        .iter()
        .map(|&d| cost_table.snap(d))
        .collect();
    network.set_pipe_diameters(&snapped)?;
    Ok(removed)
}

/// Post-apply assessment of the finished design.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub cost: f64,
    pub mri: f64,
    pub min_junction_pressure_m: f64,
    pub max_junction_pressure_m: f64,
    pub connected: bool,
    pub breakdown: PenaltyBreakdown,
}

impl ValidationReport {
    pub fn is_feasible(&self) -> bool {
        self.connected && self.breakdown.is_feasible()
    }
}

/// Simulate the as-built network and check it against the design targets.
pub fn validate_solution(
    network: &Network,
    cost_table: &CostTable,
    sim_options: &SimulationOptions,
    penalties: &PenaltyConfig,
    total_impacted: Option<usize>,
) -> Result<ValidationReport> {
    let connected = is_connected(network);
    let results = simulate(network, sim_options).context("validation hydraulic run")?;
    let mri = modified_resilience_index(network, &results, sim_options.required_pressure_m);
    let breakdown = PenaltyBreakdown::compute(&results, penalties, mri, total_impacted);

    Ok(ValidationReport {
        cost: cost_table.network_cost(network),
        mri,
        min_junction_pressure_m: results.min_junction_pressure().unwrap_or(f64::NAN),
        max_junction_pressure_m: results.max_junction_pressure().unwrap_or(f64::NAN),
        connected,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::MinPressureBound;
    use wdn_core::{Junction, JunctionId, Node, Pipe, PipeId, Reservoir, ReservoirId};

    fn network() -> Network {
        let mut network = Network::new();
        let r = network.graph.add_node(Node::Reservoir(Reservoir {
            id: ReservoirId::new(1),
            name: "R1".into(),
            head_m: 60.0,
        }));
        let j = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(1),
            name: "J1".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.04,
        }));
        network.graph.add_edge(
            r,
            j,
            wdn_core::Link::Pipe(
                Pipe::new(PipeId::new(1), "P1".into(), "R1".into(), "J1".into())
                    .with_geometry(900.0, 0.3),
            ),
        );
        network
    }

    #[test]
    fn test_apply_snaps_to_catalog() {
        let mut network = network();
        let table = CostTable::default();
        let removed = apply_solution(&mut network, &[0.3], &table, None).unwrap();
        assert_eq!(removed, 0);
        // 0.3 m snaps to the 12 in entry
        assert!((network.pipe_diameters()[0] - 0.3048).abs() < 1e-9);
    }

    #[test]
    fn test_apply_prunes_small_diameters() {
        let mut network = network();
        let table = CostTable::new(vec![(0.05, 1.0), (0.5, 10.0)]);
        let removed = apply_solution(&mut network, &[0.05], &table, Some(0.1)).unwrap();
        assert_eq!(removed, 1);
        assert!(network.pipes().is_empty());
    }

    #[test]
    fn test_prune_uses_searched_diameter_not_snapped() {
        let mut network = network();
        let j1 = network.node_index("J1").unwrap();
        let j2 = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(2),
            name: "J2".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.01,
        }));
        network.graph.add_edge(
            j1,
            j2,
            wdn_core::Link::Pipe(
                Pipe::new(PipeId::new(2), "P2".into(), "J1".into(), "J2".into())
                    .with_geometry(400.0, 0.2),
            ),
        );

        let table = CostTable::default();
        // 0.099 snaps up to the 4 in entry (0.1016), but the searched value
        // sits below the threshold, so the pipe still goes
        let removed = apply_solution(&mut network, &[0.5, 0.099], &table, Some(0.1)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(network.pipes().len(), 1);
        assert!((network.pipe_diameters()[0] - 0.508).abs() < 1e-9);
    }

    #[test]
    fn test_validation_reports_feasibility() {
        let network = network();
        let penalties = PenaltyConfig {
            min_pressure: MinPressureBound::Uniform(20.0),
            max_pressure_m: 84.0,
            resilience_target: 1.0,
            criticality_target: None,
        };
        let report = validate_solution(
            &network,
            &CostTable::default(),
            &SimulationOptions::default(),
            &penalties,
            None,
        )
        .unwrap();
        assert!(report.connected);
        assert!(report.is_feasible(), "penalty {}", report.breakdown.total());
        assert!(report.min_junction_pressure_m > 20.0);
        assert!(report.cost > 0.0);
    }
}
