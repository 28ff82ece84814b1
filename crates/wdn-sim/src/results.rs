//! Simulation result tables.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Per-node, per-report-instant table of pressure, head, and delivered
/// demand. Never mutated after production.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResults {
    times: Vec<u64>,
    node_names: Vec<String>,
    /// Parallel to `node_names`: true for junctions
    junction_mask: Vec<bool>,
    #[serde(skip)]
    name_index: HashMap<String, usize>,
    /// Row per report instant, column per node (m)
    pressures: Vec<Vec<f64>>,
    /// Row per report instant, column per node (m)
    heads: Vec<Vec<f64>>,
    /// Row per report instant, column per node (m³/s delivered)
    demands: Vec<Vec<f64>>,
}

impl SimulationResults {
    pub fn new(times: Vec<u64>, node_names: Vec<String>, junction_mask: Vec<bool>) -> Self {
        let name_index = node_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            times,
            node_names,
            junction_mask,
            name_index,
            pressures: Vec::new(),
            heads: Vec::new(),
            demands: Vec::new(),
        }
    }

    /// Append one report instant. Row lengths must match the node count.
    pub fn push_row(&mut self, pressures: Vec<f64>, heads: Vec<f64>, demands: Vec<f64>) {
        debug_assert_eq!(pressures.len(), self.node_names.len());
        debug_assert_eq!(heads.len(), self.node_names.len());
        debug_assert_eq!(demands.len(), self.node_names.len());
        self.pressures.push(pressures);
        self.heads.push(heads);
        self.demands.push(demands);
    }

    pub fn times(&self) -> &[u64] {
        &self.times
    }

    pub fn node_names(&self) -> &[String] {
        &self.node_names
    }

    pub fn n_report_instants(&self) -> usize {
        self.pressures.len()
    }

    fn column(&self, table: &[Vec<f64>], node: &str) -> Option<Vec<f64>> {
        let idx = *self.name_index.get(node)?;
        Some(table.iter().map(|row| row[idx]).collect())
    }

    /// Pressure series over the horizon for one node.
    pub fn pressure_series(&self, node: &str) -> Option<Vec<f64>> {
        self.column(&self.pressures, node)
    }

    /// Delivered-demand series over the horizon for one node.
    pub fn demand_series(&self, node: &str) -> Option<Vec<f64>> {
        self.column(&self.demands, node)
    }

    /// Head series over the horizon for one node.
    pub fn head_series(&self, node: &str) -> Option<Vec<f64>> {
        self.column(&self.heads, node)
    }

    /// Minimum pressure observed at one node over the horizon.
    pub fn min_pressure(&self, node: &str) -> Option<f64> {
        let series = self.pressure_series(node)?;
        series.into_iter().reduce(f64::min)
    }

    /// Minimum pressure per junction over the horizon.
    pub fn junction_min_pressures(&self) -> Vec<(String, f64)> {
        self.node_names
            .iter()
            .enumerate()
            .filter(|(i, _)| self.junction_mask[*i])
            .map(|(i, name)| {
                let min = self
                    .pressures
                    .iter()
                    .map(|row| row[i])
                    .reduce(f64::min)
                    .unwrap_or(f64::NAN);
                (name.clone(), min)
            })
            .collect()
    }

    /// Junctions whose minimum pressure over the horizon falls strictly
    /// below `threshold_m`.
    pub fn junctions_below(&self, threshold_m: f64) -> HashSet<String> {
        self.junction_min_pressures()
            .into_iter()
            .filter(|(_, min)| *min < threshold_m)
            .map(|(name, _)| name)
            .collect()
    }

    /// Lowest junction pressure anywhere in the table.
    pub fn min_junction_pressure(&self) -> Option<f64> {
        self.junction_min_pressures()
            .into_iter()
            .map(|(_, p)| p)
            .reduce(f64::min)
    }

    /// Highest junction pressure anywhere in the table.
    pub fn max_junction_pressure(&self) -> Option<f64> {
        self.node_names
            .iter()
            .enumerate()
            .filter(|(i, _)| self.junction_mask[*i])
            .flat_map(|(i, _)| self.pressures.iter().map(move |row| row[i]))
            .reduce(f64::max)
    }

    /// Iterate (junction name, pressure series) pairs.
    pub fn junction_pressures(&self) -> impl Iterator<Item = (&str, Vec<f64>)> {
        self.node_names
            .iter()
            .enumerate()
            .filter(|(i, _)| self.junction_mask[*i])
            .map(move |(i, name)| {
                (
                    name.as_str(),
                    self.pressures.iter().map(|row| row[i]).collect(),
                )
            })
    }

    /// Iterate (junction name, delivered demand series) pairs.
    pub fn junction_demands(&self) -> impl Iterator<Item = (&str, Vec<f64>)> {
        self.node_names
            .iter()
            .enumerate()
            .filter(|(i, _)| self.junction_mask[*i])
            .map(move |(i, name)| {
                (
                    name.as_str(),
                    self.demands.iter().map(|row| row[i]).collect(),
                )
            })
    }
}
