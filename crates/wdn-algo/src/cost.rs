//! Commercial pipe catalog and capital cost.
//!
//! Continuous candidate diameters are priced by snapping to the nearest
//! catalog entry, so the search can stay continuous while the cost reflects
//! what can actually be bought.

use serde::{Deserialize, Serialize};
use wdn_core::units::inches_to_m;
use wdn_core::Network;

/// Nominal catalog sizes in inches.
const CATALOG_DIAMETERS_IN: [f64; 12] = [
    4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 24.0, 28.0, 30.0,
];

/// Unit cost per meter of pipe, parallel to `CATALOG_DIAMETERS_IN`.
const CATALOG_COSTS_PER_M: [f64; 12] = [
    8.31, 10.10, 12.10, 12.96, 15.22, 16.62, 19.41, 22.20, 24.66, 35.69, 40.08, 42.60,
];

/// A diameter-to-unit-cost catalog, sorted by diameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostTable {
    /// (diameter in meters, cost per meter) pairs
    entries: Vec<(f64, f64)>,
}

impl Default for CostTable {
    fn default() -> Self {
        let entries = CATALOG_DIAMETERS_IN
            .iter()
            .zip(CATALOG_COSTS_PER_M.iter())
            .map(|(&d_in, &cost)| (inches_to_m(d_in), cost))
            .collect();
        Self { entries }
    }
}

impl CostTable {
    /// Build a catalog from explicit (diameter m, cost per m) pairs.
    pub fn new(mut entries: Vec<(f64, f64)>) -> Self {
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn diameters_m(&self) -> Vec<f64> {
        self.entries.iter().map(|(d, _)| *d).collect()
    }

    /// Smallest and largest catalog diameter (m).
    pub fn diameter_range(&self) -> Option<(f64, f64)> {
        let first = self.entries.first()?.0;
        let last = self.entries.last()?.0;
        Some((first, last))
    }

    /// The catalog entry nearest to `diameter_m`.
    ///
    /// Ties break toward the earlier (smaller) entry.
    pub fn nearest(&self, diameter_m: f64) -> Option<(f64, f64)> {
        self.entries
            .iter()
            .copied()
            .min_by(|a, b| (a.0 - diameter_m).abs().total_cmp(&(b.0 - diameter_m).abs()))
    }

    /// Unit cost (per m) of the nearest catalog diameter. Empty catalog is 0.
    pub fn unit_cost(&self, diameter_m: f64) -> f64 {
        self.nearest(diameter_m).map(|(_, c)| c).unwrap_or(0.0)
    }

    /// Nearest catalog diameter (m); identity fallback for an empty catalog.
    pub fn snap(&self, diameter_m: f64) -> f64 {
        self.nearest(diameter_m).map(|(d, _)| d).unwrap_or(diameter_m)
    }

    /// Cost of one pipe of the given diameter and length.
    pub fn pipe_cost(&self, diameter_m: f64, length_m: f64) -> f64 {
        self.unit_cost(diameter_m) * length_m
    }

    /// Capital cost of every pipe in the network at its current diameter.
    pub fn network_cost(&self, network: &Network) -> f64 {
        network
            .pipes()
            .iter()
            .map(|p| self.pipe_cost(p.diameter_m, p.length_m))
            .sum()
    }

    /// Cost of a candidate diameter vector against known pipe lengths.
    ///
    /// The slices are parallel and in canonical pipe order.
    pub fn solution_cost(&self, diameters_m: &[f64], lengths_m: &[f64]) -> f64 {
        diameters_m
            .iter()
            .zip(lengths_m.iter())
            .map(|(&d, &l)| self.pipe_cost(d, l))
            .sum()
    }
}
