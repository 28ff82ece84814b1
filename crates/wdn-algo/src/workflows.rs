//! End-to-end design optimization pipeline.
//!
//! Explicit stages over an in-memory network: baseline assessment, search,
//! apply, validation. File I/O stays with the caller (the CLI loads and
//! persists), so the pipeline itself is deterministic given a seed.

use crate::apply::{apply_solution, validate_solution, ValidationReport};
use crate::constraints::PenaltyConfig;
use crate::cost::CostTable;
use crate::criticality::{run_criticality, CriticalityConfig};
use crate::fitness::FitnessEvaluator;
use crate::search::{optimize, GaConfig, GaOutcome};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use wdn_core::Network;
use wdn_sim::SimulationOptions;

/// Everything the pipeline needs besides the network itself.
#[derive(Debug, Clone, Default)]
pub struct OptimizationConfig {
    pub cost_table: CostTable,
    pub sim_options: SimulationOptions,
    pub penalties: PenaltyConfig,
    pub ga: GaConfig,
    /// Include an N-1 sweep in every fitness evaluation
    pub criticality: Option<CriticalityConfig>,
    /// Remove pipes whose optimized diameter falls below this
    pub prune_below_m: Option<f64>,
}

/// Pipeline output: the as-built network plus every stage's evidence.
#[derive(Debug, Serialize)]
pub struct OptimizationReport {
    pub baseline: ValidationReport,
    pub outcome: GaOutcome,
    /// Best diameters snapped to catalog sizes, one per original pipe
    pub solution: Vec<f64>,
    pub pipes_removed: usize,
    pub validation: ValidationReport,
    #[serde(skip)]
    pub network: Network,
}

/// Run baseline → optimize → apply → validate.
pub fn run_optimization(
    network: &Network,
    config: &OptimizationConfig,
) -> Result<OptimizationReport> {
    info!(stats = %network.stats(), "baseline assessment");
    let baseline = validate_solution(
        network,
        &config.cost_table,
        &config.sim_options,
        &config.penalties,
        None,
    )
    .context("baseline assessment")?;
    info!(
        cost = baseline.cost,
        mri = baseline.mri,
        feasible = baseline.is_feasible(),
        "baseline"
    );

    let mut evaluator = FitnessEvaluator::new(
        network.clone(),
        config.cost_table.clone(),
        config.sim_options.clone(),
        config.penalties.clone(),
    );
    if let Some(criticality) = &config.criticality {
        evaluator = evaluator.with_criticality(criticality.clone());
    }
    if let Some(threshold) = config.prune_below_m {
        evaluator = evaluator.with_prune_threshold(threshold);
    }

    info!(
        pipes = network.pipes().len(),
        population = config.ga.population,
        generations = config.ga.generations,
        "search"
    );
    let outcome = optimize(&evaluator, &config.ga).context("diameter search")?;

    let mut built = network.clone();
    let solution: Vec<f64> = outcome
        .best
        .iter()
        .map(|&d| config.cost_table.snap(d))
        .collect();
    let pipes_removed = apply_solution(
        &mut built,
        &outcome.best,
        &config.cost_table,
        config.prune_below_m,
    )
    .context("applying solution")?;

    // Validate the as-built design with the sweep it was optimized against.
    let total_impacted = match &config.criticality {
        Some(criticality) => Some(
            run_criticality(&built, criticality)
                .context("as-built criticality sweep")?
                .total_impacted(),
        ),
        None => None,
    };
    let validation = validate_solution(
        &built,
        &config.cost_table,
        &config.sim_options,
        &config.penalties,
        total_impacted,
    )
    .context("as-built validation")?;
    info!(
        cost = validation.cost,
        mri = validation.mri,
        feasible = validation.is_feasible(),
        pipes_removed,
        "as-built"
    );

    Ok(OptimizationReport {
        baseline,
        outcome,
        solution,
        pipes_removed,
        validation,
        network: built,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::MinPressureBound;
    use wdn_core::{Junction, JunctionId, Node, Pipe, PipeId, Reservoir, ReservoirId};

    fn small_network() -> Network {
        let mut network = Network::new();
        let r = network.graph.add_node(Node::Reservoir(Reservoir {
            id: ReservoirId::new(1),
            name: "R1".into(),
            head_m: 60.0,
        }));
        let j1 = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(1),
            name: "J1".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.02,
        }));
        let j2 = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(2),
            name: "J2".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.015,
        }));
        let pipe = |id: usize, name: &str, from: &str, to: &str| {
            wdn_core::Link::Pipe(
                Pipe::new(PipeId::new(id), name.into(), from.into(), to.into())
                    .with_geometry(500.0, 0.4),
            )
        };
        network.graph.add_edge(r, j1, pipe(1, "P1", "R1", "J1"));
        network.graph.add_edge(j1, j2, pipe(2, "P2", "J1", "J2"));
        network
    }

    #[test]
    fn test_pipeline_produces_feasible_cheaper_design() {
        let network = small_network();
        let config = OptimizationConfig {
            penalties: PenaltyConfig {
                min_pressure: MinPressureBound::Uniform(20.0),
                max_pressure_m: 84.0,
                resilience_target: 1.0,
                criticality_target: None,
            },
            ga: GaConfig::default()
                .with_population(16)
                .with_generations(25)
                .with_seed(11),
            ..OptimizationConfig::default()
        };
        let report = run_optimization(&network, &config).unwrap();

        assert!(report.validation.is_feasible());
        // Generous 0.4 m baseline leaves room to shrink
        assert!(report.validation.cost <= report.baseline.cost);
        // The as-built diameters are catalog sizes
        let catalog = config.cost_table.diameters_m();
        for d in report.network.pipe_diameters() {
            assert!(catalog.iter().any(|&c| (c - d).abs() < 1e-9));
        }
        assert_eq!(report.solution.len(), 2);
    }

    #[test]
    fn test_pipeline_leaves_input_untouched() {
        let network = small_network();
        let before = network.pipe_diameters();
        let config = OptimizationConfig {
            ga: GaConfig::default()
                .with_population(8)
                .with_generations(5)
                .with_seed(2),
            ..OptimizationConfig::default()
        };
        let _ = run_optimization(&network, &config).unwrap();
        assert_eq!(network.pipe_diameters(), before);
    }
}
