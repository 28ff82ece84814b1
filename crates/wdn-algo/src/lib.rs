//! # wdn-algo: Analysis and Design Optimization
//!
//! Algorithms that score and improve a water distribution network:
//!
//! - [`cost`] - Commercial pipe catalog and capital cost of a design
//! - [`resilience`] - Modified resilience index (MRI) over a simulation
//! - [`criticality`] - Single-pipe closure (N-1) impact screening
//! - [`constraints`] - Pressure/resilience/criticality penalty terms
//! - [`fitness`] - Combines cost and penalties into one evaluation
//! - [`search`] - Genetic-algorithm driver over continuous diameter vectors
//! - [`apply`] - Writing a solution back into a network and validating it
//! - [`workflows`] - End-to-end optimization pipeline over an in-memory network
//!
//! Every trial evaluation clones the baseline [`wdn_core::Network`] and
//! mutates the clone, so analyses parallelize freely with rayon and the
//! baseline is never corrupted by a failed trial.

pub mod apply;
pub mod constraints;
pub mod cost;
pub mod criticality;
pub mod fitness;
pub mod resilience;
pub mod search;
pub mod workflows;

pub use apply::{apply_solution, validate_solution, ValidationReport};
pub use constraints::{MinPressureBound, PenaltyBreakdown, PenaltyConfig};
pub use cost::CostTable;
pub use criticality::{run_criticality, CriticalityConfig, CriticalityResults, FailurePolicy};
pub use fitness::{FitnessEvaluator, FitnessReport};
pub use resilience::modified_resilience_index;
pub use search::{optimize, GaConfig, GaOutcome, GenerationStat, Problem};
pub use workflows::{run_optimization, OptimizationConfig, OptimizationReport};
