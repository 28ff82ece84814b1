//! Simulation configuration.

use serde::{Deserialize, Serialize};
use wdn_core::{LinkStatus, SolverKind};

/// How junction demand responds to pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandModel {
    /// Full base demand is withdrawn regardless of pressure.
    DemandDriven,
    /// Wagner pressure-dependent demand: zero at or below the minimum
    /// pressure, full at or above the required pressure, square-root
    /// fraction in between.
    PressureDependent,
}

/// A scheduled link-status change at a fixed simulated time.
///
/// The status applies from `at_time_s` (inclusive) to the end of the
/// horizon, matching a "close pipe at hour N" contingency action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkControl {
    pub link: String,
    pub at_time_s: u64,
    pub status: LinkStatus,
}

/// Options for one hydraulic run.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub demand_model: DemandModel,
    /// Pressure (m) at or below which PDD demand is zero
    pub minimum_pressure_m: f64,
    /// Pressure (m) at or above which PDD demand is fully served
    pub required_pressure_m: f64,
    /// Total simulated horizon in seconds; 0 runs a single snapshot
    pub duration_s: u64,
    pub hydraulic_timestep_s: u64,
    pub report_timestep_s: u64,
    pub controls: Vec<LinkControl>,
    /// Linear-system backend for the Newton step
    pub solver: SolverKind,
    pub max_iterations: usize,
    /// Convergence tolerance on the worst nodal flow imbalance (m³/s)
    pub tolerance_m3s: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            demand_model: DemandModel::PressureDependent,
            minimum_pressure_m: 0.0,
            required_pressure_m: 15.0,
            duration_s: 0,
            hydraulic_timestep_s: 3600,
            report_timestep_s: 3600,
            controls: Vec::new(),
            solver: SolverKind::default(),
            max_iterations: 200,
            tolerance_m3s: 1e-8,
        }
    }
}

impl SimulationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demand_model(mut self, model: DemandModel) -> Self {
        self.demand_model = model;
        self
    }

    /// Set minimum and required pressure for pressure-dependent demand.
    pub fn with_pressure_range(mut self, minimum_m: f64, required_m: f64) -> Self {
        self.minimum_pressure_m = minimum_m;
        self.required_pressure_m = required_m;
        self
    }

    pub fn with_duration(mut self, duration_s: u64) -> Self {
        self.duration_s = duration_s;
        self
    }

    pub fn with_timesteps(mut self, hydraulic_s: u64, report_s: u64) -> Self {
        self.hydraulic_timestep_s = hydraulic_s;
        self.report_timestep_s = report_s;
        self
    }

    pub fn with_control(mut self, control: LinkControl) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Report instants over the horizon (a single instant for duration 0).
    pub fn report_times(&self) -> Vec<u64> {
        if self.duration_s == 0 {
            return vec![0];
        }
        let step = self.report_timestep_s.max(1);
        let mut times = Vec::new();
        let mut t = 0;
        while t <= self.duration_s {
            times.push(t);
            t += step;
        }
        times
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_snapshot() {
        let options = SimulationOptions::default();
        assert_eq!(options.report_times(), vec![0]);
    }

    #[test]
    fn test_report_times_cover_horizon() {
        let options = SimulationOptions::default()
            .with_duration(4 * 3600)
            .with_timesteps(3600, 7200);
        assert_eq!(options.report_times(), vec![0, 7200, 14400]);
    }

    #[test]
    fn test_builders_compose() {
        let options = SimulationOptions::new()
            .with_demand_model(DemandModel::DemandDriven)
            .with_pressure_range(3.52, 14.06)
            .with_control(LinkControl {
                link: "P7".into(),
                at_time_s: 7200,
                status: wdn_core::LinkStatus::Closed,
            });
        assert_eq!(options.demand_model, DemandModel::DemandDriven);
        assert_eq!(options.controls.len(), 1);
        assert!((options.required_pressure_m - 14.06).abs() < 1e-12);
    }
}
