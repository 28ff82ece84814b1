//! Penalty terms for constrained design search.
//!
//! Constraints are folded into the search as additive penalties: a design is
//! feasible exactly when its total penalty is zero. Degenerate candidates
//! (disconnected networks, failed solves) get a large flat penalty so they
//! rank behind every candidate the solver could actually score.

use serde::Serialize;
use std::collections::HashMap;
use wdn_sim::SimulationResults;

/// Flat penalty for a candidate that disconnects demand from every source.
pub const CONNECTIVITY_PENALTY: f64 = 1e6;
/// Flat penalty for a candidate whose hydraulic solve fails.
pub const SIMULATION_FAILURE_PENALTY: f64 = 1e6;

/// Lower pressure bound, uniform or per junction.
#[derive(Debug, Clone)]
pub enum MinPressureBound {
    Uniform(f64),
    PerNode(HashMap<String, f64>),
}

impl MinPressureBound {
    fn bound_for(&self, node: &str) -> Option<f64> {
        match self {
            MinPressureBound::Uniform(p) => Some(*p),
            MinPressureBound::PerNode(map) => map.get(node).copied(),
        }
    }
}

/// Constraint targets for the penalty computation.
#[derive(Debug, Clone)]
pub struct PenaltyConfig {
    pub min_pressure: MinPressureBound,
    /// Upper pressure bound (m), applied at every junction
    pub max_pressure_m: f64,
    /// Required mean MRI; shortfall is penalized
    pub resilience_target: f64,
    /// Allowed aggregate N-1 impact count over all pipe closures; `None`
    /// disables the term
    pub criticality_target: Option<f64>,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            min_pressure: MinPressureBound::Uniform(0.0),
            max_pressure_m: 84.0,
            resilience_target: 3.7,
            criticality_target: None,
        }
    }
}

/// Per-constraint penalty contributions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PenaltyBreakdown {
    /// Σ over junctions and report instants of max(0, bound − pressure)
    pub pressure_deficit: f64,
    /// Σ over junctions and report instants of max(0, pressure − ceiling)
    pub pressure_excess: f64,
    /// max(0, target − MRI)
    pub resilience_shortfall: f64,
    /// max(0, aggregate impact count − target)
    pub criticality_excess: f64,
}

impl PenaltyBreakdown {
    /// Score one simulated candidate against the constraint targets.
    ///
    /// `total_impacted` is the aggregate N-1 impact count summed over every
    /// analyzed pipe, when the sweep ran.
    pub fn compute(
        results: &SimulationResults,
        config: &PenaltyConfig,
        mri: f64,
        total_impacted: Option<usize>,
    ) -> Self {
        let mut breakdown = PenaltyBreakdown::default();

        // Both pressure bounds integrate the exceedance over the horizon;
        // the ceiling applies at every junction, per-node bounds or not.
        for (node, series) in results.junction_pressures() {
            let floor = config.min_pressure.bound_for(node);
            for p in series {
                if let Some(bound) = floor {
                    breakdown.pressure_deficit += (bound - p).max(0.0);
                }
                if p > config.max_pressure_m {
                    breakdown.pressure_excess += p - config.max_pressure_m;
                }
            }
        }

        breakdown.resilience_shortfall = (config.resilience_target - mri).max(0.0);

        if let (Some(target), Some(impacted)) = (config.criticality_target, total_impacted) {
            breakdown.criticality_excess = (impacted as f64 - target).max(0.0);
        }

        breakdown
    }

    pub fn total(&self) -> f64 {
        self.pressure_deficit
            + self.pressure_excess
            + self.resilience_shortfall
            + self.criticality_excess
    }

    pub fn is_feasible(&self) -> bool {
        self.total() == 0.0
    }
}
