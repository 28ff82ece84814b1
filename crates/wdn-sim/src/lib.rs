//! # wdn-sim: Hydraulic Simulation Engine
//!
//! Runs extended-period hydraulic simulations over a [`wdn_core::Network`]:
//! steady-state heads per report instant, demand-driven or
//! pressure-dependent demand, and scheduled link-status controls (a pipe
//! closing at a fixed simulated time).
//!
//! The rest of the system depends on exactly one entry point:
//!
//! ```ignore
//! let results = wdn_sim::simulate(&network, &options)?;
//! ```
//!
//! A non-convergent solve is an `Err`, never a panic: the criticality
//! analyzer and the fitness evaluator match on the `Result` and recover
//! locally. [`SimulationResults`] is immutable after production and owned by
//! the caller that requested the run.
//!
//! ## Numerics
//!
//! Per report instant, the engine solves nodal flow balance by damped
//! Newton iteration with Hazen-Williams headloss
//! (`h = 10.667 · L / (C^1.852 · D^4.871) · q^1.852`). Junctions that
//! cannot reach any fixed-grade node over open links are marked unserved
//! (head at elevation, zero pressure and delivered demand) before the
//! solve, so closures that isolate part of the network collapse pressure
//! instead of producing a singular system.

pub mod engine;
pub mod options;
pub mod results;

pub use engine::{simulate, HydraulicEngine};
pub use options::{DemandModel, LinkControl, SimulationOptions};
pub use results::SimulationResults;
