//! Dense linear-system backends.
//!
//! The hydraulic engine's Newton iteration reduces to repeated solves of a
//! small dense symmetric system. Two interchangeable backends are provided:
//! a plain Gaussian elimination and a faer LU decomposition.

pub mod backend;
pub mod registry;

pub use backend::{GaussSolver, LinearSystemBackend, LuSolver};
pub use registry::SolverKind;
