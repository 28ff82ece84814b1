//! Candidate evaluation: capital cost plus constraint penalties.
//!
//! The evaluator owns an immutable baseline network. Every assessment clones
//! it, writes the candidate diameters into the clone, and simulates the
//! clone, so concurrent evaluations never observe each other's mutations.

use crate::constraints::{
    PenaltyBreakdown, PenaltyConfig, CONNECTIVITY_PENALTY, SIMULATION_FAILURE_PENALTY,
};
use crate::cost::CostTable;
use crate::criticality::{run_criticality, CriticalityConfig};
use crate::resilience::modified_resilience_index;
use crate::search::Problem;
use serde::Serialize;
use tracing::warn;
use wdn_core::graph_utils::is_connected;
use wdn_core::Network;
use wdn_sim::{simulate, SimulationOptions};

/// Full assessment of one candidate diameter vector.
#[derive(Debug, Clone, Serialize)]
pub struct FitnessReport {
    /// Capital cost of the (possibly pruned) design
    pub cost: f64,
    /// Total constraint penalty; zero means feasible
    pub penalty: f64,
    pub breakdown: Option<PenaltyBreakdown>,
    pub mri: Option<f64>,
    /// Aggregate N-1 impact count, when the sweep was part of the assessment
    pub total_impacted: Option<usize>,
    /// Why the candidate could not be scored hydraulically, if it couldn't
    pub failure: Option<String>,
}

impl FitnessReport {
    fn unscored(cost: f64, penalty: f64, failure: String) -> Self {
        Self {
            cost,
            penalty,
            breakdown: None,
            mri: None,
            total_impacted: None,
            failure: Some(failure),
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.penalty == 0.0
    }
}

/// Scores diameter vectors against a fixed baseline network.
pub struct FitnessEvaluator {
    baseline: Network,
    cost_table: CostTable,
    sim_options: SimulationOptions,
    penalties: PenaltyConfig,
    criticality: Option<CriticalityConfig>,
    /// Diameters below this are treated as pipe removals
    prune_below_m: Option<f64>,
    /// Search bounds per diameter variable (m)
    bounds: (f64, f64),
}

impl FitnessEvaluator {
    pub fn new(
        baseline: Network,
        cost_table: CostTable,
        sim_options: SimulationOptions,
        penalties: PenaltyConfig,
    ) -> Self {
        let bounds = cost_table.diameter_range().unwrap_or((0.1, 0.762));
        Self {
            baseline,
            cost_table,
            sim_options,
            penalties,
            criticality: None,
            prune_below_m: None,
            bounds,
        }
    }

    /// Include an N-1 sweep in every assessment. Expensive: one extra
    /// simulation per pipe per candidate.
    pub fn with_criticality(mut self, config: CriticalityConfig) -> Self {
        self.criticality = Some(config);
        self
    }

    /// Treat candidate diameters below `threshold_m` as pipe removals.
    pub fn with_prune_threshold(mut self, threshold_m: f64) -> Self {
        self.prune_below_m = Some(threshold_m);
        self
    }

    pub fn with_bounds(mut self, lower_m: f64, upper_m: f64) -> Self {
        self.bounds = (lower_m, upper_m);
        self
    }

    pub fn baseline(&self) -> &Network {
        &self.baseline
    }

    pub fn cost_table(&self) -> &CostTable {
        &self.cost_table
    }

    /// Assess one candidate. Never panics: structural and hydraulic failures
    /// come back as flat penalties so the search can rank past them.
    pub fn assess(&self, diameters: &[f64]) -> FitnessReport {
        let mut trial = self.baseline.clone();
        if let Err(e) = trial.set_pipe_diameters(diameters) {
            return FitnessReport::unscored(0.0, SIMULATION_FAILURE_PENALTY, e.to_string());
        }

        if let Some(threshold) = self.prune_below_m {
            trial.prune_pipes_below(threshold);
        }
        let cost = self.cost_table.network_cost(&trial);

        if !is_connected(&trial) {
            return FitnessReport::unscored(
                cost,
                CONNECTIVITY_PENALTY,
                "candidate disconnects the network".to_string(),
            );
        }

        let results = match simulate(&trial, &self.sim_options) {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "candidate simulation failed");
                return FitnessReport::unscored(cost, SIMULATION_FAILURE_PENALTY, e.to_string());
            }
        };

        let mri =
            modified_resilience_index(&trial, &results, self.sim_options.required_pressure_m);

        let total_impacted = match &self.criticality {
            Some(config) => match run_criticality(&trial, config) {
                Ok(sweep) => Some(sweep.total_impacted()),
                Err(e) => {
                    warn!(error = %e, "candidate criticality sweep failed");
                    return FitnessReport::unscored(
                        cost,
                        SIMULATION_FAILURE_PENALTY,
                        e.to_string(),
                    );
                }
            },
            None => None,
        };

        let breakdown = PenaltyBreakdown::compute(&results, &self.penalties, mri, total_impacted);
        FitnessReport {
            cost,
            penalty: breakdown.total(),
            breakdown: Some(breakdown),
            mri: Some(mri),
            total_impacted,
            failure: None,
        }
    }
}

impl Problem for FitnessEvaluator {
    fn n_vars(&self) -> usize {
        self.baseline.pipes().len()
    }

    fn bounds(&self, _i: usize) -> (f64, f64) {
        self.bounds
    }

    fn evaluate(&self, x: &[f64]) -> (f64, f64) {
        let report = self.assess(x);
        (report.cost, report.penalty)
    }
}
