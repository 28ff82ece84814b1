use super::backend::{GaussSolver, LinearSystemBackend, LuSolver};
use anyhow::anyhow;
use std::sync::Arc;

/// Selects which linear-system backend the hydraulic engine uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverKind {
    #[default]
    Gauss,
    Lu,
}

impl SolverKind {
    pub fn build(self) -> Arc<dyn LinearSystemBackend> {
        match self {
            SolverKind::Gauss => Arc::new(GaussSolver),
            SolverKind::Lu => Arc::new(LuSolver),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["gauss", "lu"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Gauss => "gauss",
            SolverKind::Lu => "lu",
        }
    }
}

impl std::str::FromStr for SolverKind {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "gauss" | "default" => Ok(SolverKind::Gauss),
            "lu" | "faer" => Ok(SolverKind::Lu),
            other => Err(anyhow!(
                "unknown solver '{}'; supported values: gauss, lu",
                other
            )),
        }
    }
}
