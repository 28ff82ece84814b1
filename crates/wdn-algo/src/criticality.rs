//! Single-pipe closure (N-1) criticality screening.
//!
//! Establishes a pressure baseline, then closes each pipe partway into an
//! extended-period run and records which demand junctions newly drop below
//! the service threshold. Junctions already deficient in the baseline are
//! never counted against a closure.
//!
//! Trials are independent and run in parallel; each builds its own control
//! schedule against the shared read-only network, so no trial can corrupt
//! another.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};
use wdn_core::{LinkStatus, Network, SolverKind};
use wdn_sim::{simulate, DemandModel, LinkControl, SimulationOptions};

/// What to record when a closure trial's hydraulic solve fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FailurePolicy {
    /// Drop the pipe from the impact ranking, keeping only the error.
    Exclude,
    /// Score the pipe as if every demand junction were impacted. A closure
    /// that breaks the solver outright is at least as severe as one that
    /// measurably collapses pressure.
    #[default]
    WorstCase,
}

/// Configuration for a criticality sweep.
#[derive(Debug, Clone)]
pub struct CriticalityConfig {
    /// Junctions below this pressure (m) count as deficient
    pub pressure_threshold_m: f64,
    /// PDD minimum pressure (m)
    pub minimum_pressure_m: f64,
    /// PDD required pressure (m)
    pub required_pressure_m: f64,
    /// Simulated time at which each trial closes its pipe
    pub closure_time_s: u64,
    /// Total horizon per trial
    pub duration_s: u64,
    pub timestep_s: u64,
    /// Restrict the sweep to these pipes; `None` sweeps every pipe
    pub pipes: Option<Vec<String>>,
    pub failure_policy: FailurePolicy,
    pub solver: SolverKind,
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            pressure_threshold_m: 14.06,
            minimum_pressure_m: 3.52,
            required_pressure_m: 14.06,
            closure_time_s: 2 * 3600,
            duration_s: 14 * 3600,
            timestep_s: 3600,
            pipes: None,
            failure_policy: FailurePolicy::default(),
            solver: SolverKind::default(),
        }
    }
}

impl CriticalityConfig {
    pub fn with_threshold(mut self, pressure_threshold_m: f64) -> Self {
        self.pressure_threshold_m = pressure_threshold_m;
        self
    }

    pub fn with_pipes(mut self, pipes: Vec<String>) -> Self {
        self.pipes = Some(pipes);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions::default()
            .with_demand_model(DemandModel::PressureDependent)
            .with_pressure_range(self.minimum_pressure_m, self.required_pressure_m)
            .with_duration(self.duration_s)
            .with_timesteps(self.timestep_s, self.timestep_s)
            .with_solver(self.solver)
    }
}

/// Impact of closing one pipe.
#[derive(Debug, Clone, Serialize)]
pub struct PipeImpact {
    pub pipe: String,
    /// Demand junctions newly below threshold, baseline-deficient excluded
    pub impacted: Vec<String>,
}

/// Outcome of a full criticality sweep.
#[derive(Debug, Clone, Serialize)]
pub struct CriticalityResults {
    /// Demand junctions already below threshold with no closure at all
    pub baseline_deficient: Vec<String>,
    /// One entry per analyzed pipe, in sweep order
    pub impacts: Vec<PipeImpact>,
    /// (pipe, error) for trials whose hydraulic solve failed
    pub failures: Vec<(String, String)>,
}

impl CriticalityResults {
    /// Impact count for one pipe, if it was analyzed.
    pub fn impacted_count(&self, pipe: &str) -> Option<usize> {
        self.impacts
            .iter()
            .find(|i| i.pipe == pipe)
            .map(|i| i.impacted.len())
    }

    /// Largest impact count over all analyzed pipes; 0 for an empty sweep.
    pub fn max_impacted(&self) -> usize {
        self.impacts.iter().map(|i| i.impacted.len()).max().unwrap_or(0)
    }

    /// Aggregate impact count summed over all analyzed pipes. This is the
    /// sweep-wide severity measure the design penalty is charged against.
    pub fn total_impacted(&self) -> usize {
        self.impacts.iter().map(|i| i.impacted.len()).sum()
    }

    /// Pipes ranked by descending impact count.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .impacts
            .iter()
            .map(|i| (i.pipe.as_str(), i.impacted.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Run the sweep: one baseline solve plus one closure trial per pipe.
pub fn run_criticality(
    network: &Network,
    config: &CriticalityConfig,
) -> Result<CriticalityResults> {
    let demand_junctions: HashSet<String> = network
        .junctions_with_demand()
        .into_iter()
        .map(|j| j.name.clone())
        .collect();

    let options = config.simulation_options();
    let baseline = simulate(network, &options).context("baseline hydraulic run")?;
    let baseline_deficient: HashSet<String> = baseline
        .junctions_below(config.pressure_threshold_m)
        .intersection(&demand_junctions)
        .cloned()
        .collect();

    let pipes: Vec<String> = match &config.pipes {
        Some(subset) => subset.clone(),
        None => network.pipe_names(),
    };
    info!(
        pipes = pipes.len(),
        baseline_deficient = baseline_deficient.len(),
        "criticality sweep"
    );

    enum Trial {
        Impact(PipeImpact),
        Failure(String, String),
        Both(PipeImpact, String, String),
    }

    let trials: Vec<Trial> = pipes
        .par_iter()
        .map(|pipe| {
            let trial_options = options.clone().with_control(LinkControl {
                link: pipe.clone(),
                at_time_s: config.closure_time_s,
                status: LinkStatus::Closed,
            });
            match simulate(network, &trial_options) {
                Ok(results) => {
                    let mut impacted: Vec<String> = results
                        .junctions_below(config.pressure_threshold_m)
                        .intersection(&demand_junctions)
                        .filter(|j| !baseline_deficient.contains(*j))
                        .cloned()
                        .collect();
                    impacted.sort();
                    Trial::Impact(PipeImpact {
                        pipe: pipe.clone(),
                        impacted,
                    })
                }
                Err(e) => {
                    warn!(pipe = %pipe, error = %e, "closure trial failed");
                    match config.failure_policy {
                        FailurePolicy::Exclude => Trial::Failure(pipe.clone(), e.to_string()),
                        FailurePolicy::WorstCase => {
                            let mut impacted: Vec<String> = demand_junctions
                                .difference(&baseline_deficient)
                                .cloned()
                                .collect();
                            impacted.sort();
                            Trial::Both(
                                PipeImpact {
                                    pipe: pipe.clone(),
                                    impacted,
                                },
                                pipe.clone(),
                                e.to_string(),
                            )
                        }
                    }
                }
            }
        })
        .collect();

    let mut impacts = Vec::new();
    let mut failures = Vec::new();
    for trial in trials {
        match trial {
            Trial::Impact(impact) => impacts.push(impact),
            Trial::Failure(pipe, error) => failures.push((pipe, error)),
            Trial::Both(impact, pipe, error) => {
                impacts.push(impact);
                failures.push((pipe, error));
            }
        }
    }

    let mut baseline_deficient: Vec<String> = baseline_deficient.into_iter().collect();
    baseline_deficient.sort();

    Ok(CriticalityResults {
        baseline_deficient,
        impacts,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdn_core::{Junction, JunctionId, Node, Pipe, PipeId, Reservoir, ReservoirId};

    /// R1 feeds J1 over parallel P1/P2; J2 hangs off J1 on single P3.
    fn test_network() -> Network {
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
            base_demand_m3s: 0.03,
        }));
        let j2 = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(2),
            name: "J2".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.02,
        }));
        let pipe = |id: usize, name: &str, from: &str, to: &str, d: f64| {
            wdn_core::Link::Pipe(
                Pipe::new(PipeId::new(id), name.into(), from.into(), to.into())
                    .with_geometry(600.0, d),
            )
        };
        network.graph.add_edge(r, j1, pipe(1, "P1", "R1", "J1", 0.3));
        network.graph.add_edge(r, j1, pipe(2, "P2", "R1", "J1", 0.25));
        network.graph.add_edge(j1, j2, pipe(3, "P3", "J1", "J2", 0.2));
        network
    }

    #[test]
    fn test_spur_closure_impacts_downstream_junction() {
        let network = test_network();
        let results = run_criticality(&network, &CriticalityConfig::default()).unwrap();

        assert!(results.baseline_deficient.is_empty());
        assert_eq!(results.impacts.len(), 3);
        // Closing the only feed to J2 isolates it
        let p3 = results.impacts.iter().find(|i| i.pipe == "P3").unwrap();
        assert_eq!(p3.impacted, vec!["J2".to_string()]);
        assert_eq!(results.max_impacted(), 1);
        assert!(results.failures.is_empty());
    }

    #[test]
    fn test_parallel_feed_closure_has_no_impact() {
        let network = test_network();
        let results = run_criticality(&network, &CriticalityConfig::default()).unwrap();
        // J1 keeps the other parallel pipe; ample head remains
        assert_eq!(results.impacted_count("P1"), Some(0));
        assert_eq!(results.impacted_count("P2"), Some(0));
    }

    #[test]
    fn test_baseline_deficient_junctions_never_counted() {
        let mut network = test_network();
        // Raise J2 so it is already below threshold with everything open
        for node in network.graph.node_weights_mut() {
            if let Node::Junction(j) = node {
                if j.name == "J2" {
                    j.elevation_m = 55.0;
                }
            }
        }
        let results = run_criticality(&network, &CriticalityConfig::default()).unwrap();
        assert_eq!(results.baseline_deficient, vec!["J2".to_string()]);
        for impact in &results.impacts {
            assert!(
                !impact.impacted.contains(&"J2".to_string()),
                "baseline-deficient junction charged to {}",
                impact.pipe
            );
        }
    }

    #[test]
    fn test_total_impacted_aggregates_independent_closures() {
        let mut network = test_network();
        // Second spur: J3 hangs off J1 on its own pipe
        let j1 = network.node_index("J1").unwrap();
        let j3 = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(3),
            name: "J3".into(),
            elevation_m: 0.0,
            base_demand_m3s: 0.01,
        }));
        network.graph.add_edge(
            j1,
            j3,
            wdn_core::Link::Pipe(
                Pipe::new(PipeId::new(4), "P4".into(), "J1".into(), "J3".into())
                    .with_geometry(600.0, 0.2),
            ),
        );

        let results = run_criticality(&network, &CriticalityConfig::default()).unwrap();
        // P3 strands J2 and P4 strands J3; each is the worst case for one
        // junction, and the aggregate charges both.
        assert_eq!(results.max_impacted(), 1);
        assert_eq!(results.total_impacted(), 2);
    }

    #[test]
    fn test_pipe_subset_restricts_sweep() {
        let network = test_network();
        let config = CriticalityConfig::default().with_pipes(vec!["P3".into()]);
        let results = run_criticality(&network, &config).unwrap();
        assert_eq!(results.impacts.len(), 1);
        assert_eq!(results.impacts[0].pipe, "P3");
    }

    #[test]
    fn test_ranked_orders_by_impact() {
        let network = test_network();
        let results = run_criticality(&network, &CriticalityConfig::default()).unwrap();
        let ranked = results.ranked();
        assert_eq!(ranked[0], ("P3", 1));
        assert!(ranked[1..].iter().all(|&(_, n)| n == 0));
    }
}
