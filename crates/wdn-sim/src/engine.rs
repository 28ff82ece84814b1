//! Extended-period hydraulic solver.
//!
//! One steady-state solve per report instant. Unknowns are junction heads;
//! reservoirs and tanks are fixed-grade. Flow balance at each junction is
//! driven to zero by Newton iteration safeguarded with a backtracking line
//! search, with the linear step delegated to a [`LinearSystemBackend`].

use crate::options::{DemandModel, SimulationOptions};
use crate::results::SimulationResults;
use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use tracing::trace;
use wdn_core::{LinearSystemBackend, Link, LinkStatus, Network};

/// Hazen-Williams headloss exponent.
const HW_EXPONENT: f64 = 1.852;
/// Hazen-Williams resistance coefficient for SI units (m, m³/s).
const HW_COEFFICIENT: f64 = 10.667;
/// Head difference below which the headloss curve is linearized (m).
const LINEARIZATION_HEAD_M: f64 = 1e-6;
/// Linear conductance for pumps/valves modeled as open connectors (m²/s).
const CONNECTOR_CONDUCTANCE: f64 = 100.0;
/// Per-iteration cap on head updates (m); keeps early steps from overshooting.
const MAX_STEP_M: f64 = 100.0;
/// Step halvings tried per Newton iteration before the small step is taken.
const MAX_BACKTRACKS: usize = 10;
/// Width of the linearized toe of the Wagner curve, as a fraction of the
/// pressure span. Bounds the demand slope near the minimum pressure.
const WAGNER_TOE_FRACTION: f64 = 0.01;

enum LinkKind {
    /// Hazen-Williams pipe with precomputed resistance r in h = r·q^1.852
    Pipe { resistance: f64 },
    /// Pump or valve: open connector with fixed linear conductance
    Connector,
}

struct LinkData {
    label: String,
    a: usize,
    b: usize,
    kind: LinkKind,
    base_status: LinkStatus,
}

struct NodeData {
    elevation_m: f64,
    fixed_head_m: Option<f64>,
    base_demand_m3s: f64,
    is_junction: bool,
}

/// Runs hydraulic simulations with a fixed set of options.
pub struct HydraulicEngine {
    options: SimulationOptions,
}

/// Run one simulation. Convenience wrapper over [`HydraulicEngine`].
pub fn simulate(network: &Network, options: &SimulationOptions) -> Result<SimulationResults> {
    HydraulicEngine::new(options.clone()).run(network)
}

impl HydraulicEngine {
    pub fn new(options: SimulationOptions) -> Self {
        Self { options }
    }

    /// Solve the full horizon and produce the result table.
    pub fn run(&self, network: &Network) -> Result<SimulationResults> {
        let nodes = collect_nodes(network);
        let links = collect_links(network)?;

        if !nodes.iter().any(|n| n.fixed_head_m.is_some()) {
            return Err(anyhow!("network has no fixed-grade node (reservoir or tank)"));
        }

        let names: Vec<String> = network
            .graph
            .node_indices()
            .map(|idx| network.graph[idx].label().to_string())
            .collect();
        let junction_mask: Vec<bool> = nodes.iter().map(|n| n.is_junction).collect();

        let times = self.options.report_times();
        let mut results = SimulationResults::new(times.clone(), names, junction_mask);

        // Warm-start heads at the highest source head.
        let top_head = nodes
            .iter()
            .filter_map(|n| n.fixed_head_m)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut heads: Vec<f64> = nodes
            .iter()
            .map(|n| n.fixed_head_m.unwrap_or(top_head))
            .collect();

        let backend = self.options.solver.build();

        for &t in &times {
            let active: Vec<bool> = links
                .iter()
                .map(|link| self.status_at(link, t).is_open())
                .collect();

            let reachable = reachable_from_sources(&nodes, &links, &active);

            // Isolated junctions are unserved: head at elevation, no demand.
            for (i, node) in nodes.iter().enumerate() {
                if node.is_junction && !reachable[i] {
                    heads[i] = node.elevation_m;
                }
            }

            self.solve_instant(&nodes, &links, &active, &reachable, &mut heads, backend.as_ref())
                .with_context(|| format!("hydraulic solve at t={t}s"))?;

            let mut pressures = Vec::with_capacity(nodes.len());
            let mut demands = Vec::with_capacity(nodes.len());
            for (i, node) in nodes.iter().enumerate() {
                pressures.push(heads[i] - node.elevation_m);
                let demand = if node.is_junction && reachable[i] {
                    self.demand_and_slope(node.base_demand_m3s, heads[i] - node.elevation_m)
                        .0
                } else {
                    0.0
                };
                demands.push(demand);
            }
            results.push_row(pressures, heads.clone(), demands);
        }

        Ok(results)
    }

    /// Link status at simulated time `t`, with scheduled controls applied.
    fn status_at(&self, link: &LinkData, t: u64) -> LinkStatus {
        let mut status = link.base_status;
        for control in &self.options.controls {
            if control.link == link.label && t >= control.at_time_s {
                status = control.status;
            }
        }
        status
    }

    /// Newton iteration on junction heads for one report instant.
    ///
    /// Each step is safeguarded by a backtracking line search on the worst
    /// nodal imbalance. The headloss and demand curves are much flatter than
    /// their local linearization in places, and an unguarded step there
    /// overshoots and oscillates instead of converging.
    fn solve_instant(
        &self,
        nodes: &[NodeData],
        links: &[LinkData],
        active: &[bool],
        reachable: &[bool],
        heads: &mut [f64],
        backend: &dyn LinearSystemBackend,
    ) -> Result<()> {
        // Unknowns: reachable junctions.
        let mut slot_of: Vec<Option<usize>> = vec![None; nodes.len()];
        let mut unknowns = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            if node.is_junction && reachable[i] {
                slot_of[i] = Some(unknowns.len());
                unknowns.push(i);
            }
        }
        let n = unknowns.len();
        if n == 0 {
            return Ok(());
        }

        let mut residual = self.residuals(nodes, links, active, reachable, &slot_of, heads);
        let mut imbalance = worst_imbalance(&residual);

        for iteration in 0..self.options.max_iterations {
            if imbalance < self.options.tolerance_m3s {
                trace!(iteration, imbalance, "hydraulics converged");
                return Ok(());
            }

            let mut matrix = vec![vec![0.0; n]; n];

            // Demand pressure sensitivity on the diagonal.
            for (slot, &i) in unknowns.iter().enumerate() {
                let pressure = heads[i] - nodes[i].elevation_m;
                let (_, slope) = self.demand_and_slope(nodes[i].base_demand_m3s, pressure);
                matrix[slot][slot] += slope;
            }

            // Link conductances: q > 0 flows from a to b.
            for (link, &is_active) in links.iter().zip(active.iter()) {
                if !is_active || !reachable[link.a] || !reachable[link.b] {
                    continue;
                }
                let dh = heads[link.a] - heads[link.b];
                let (_, g) = flow_and_conductance(&link.kind, dh);

                if let Some(sa) = slot_of[link.a] {
                    matrix[sa][sa] += g;
                    if let Some(sb) = slot_of[link.b] {
                        matrix[sa][sb] -= g;
                    }
                }
                if let Some(sb) = slot_of[link.b] {
                    matrix[sb][sb] += g;
                    if let Some(sa) = slot_of[link.a] {
                        matrix[sb][sa] -= g;
                    }
                }
            }

            let delta = backend
                .solve(&matrix, &residual)
                .context("Newton step linear solve")?;

            // Halve the step until the imbalance drops; past the last
            // halving, take the small step anyway and keep iterating.
            let mut trial = heads.to_vec();
            let mut scale = 1.0;
            for attempt in 0..MAX_BACKTRACKS {
                for (slot, &i) in unknowns.iter().enumerate() {
                    let step = (delta[slot] * scale).clamp(-MAX_STEP_M, MAX_STEP_M);
                    trial[i] = heads[i] + step;
                }
                let candidate =
                    self.residuals(nodes, links, active, reachable, &slot_of, &trial);
                let candidate_worst = worst_imbalance(&candidate);
                if candidate_worst < imbalance || attempt + 1 == MAX_BACKTRACKS {
                    residual = candidate;
                    imbalance = candidate_worst;
                    break;
                }
                scale *= 0.5;
            }
            heads.copy_from_slice(&trial);
        }

        Err(anyhow!(
            "hydraulic solve did not converge after {} iterations (worst imbalance {:.3e} m³/s)",
            self.options.max_iterations,
            imbalance
        ))
    }

    /// Nodal flow imbalance (inflow minus withdrawal) per unknown slot.
    fn residuals(
        &self,
        nodes: &[NodeData],
        links: &[LinkData],
        active: &[bool],
        reachable: &[bool],
        slot_of: &[Option<usize>],
        heads: &[f64],
    ) -> Vec<f64> {
        let n = slot_of.iter().flatten().count();
        let mut residual = vec![0.0; n];

        for (i, node) in nodes.iter().enumerate() {
            if let Some(slot) = slot_of[i] {
                let pressure = heads[i] - node.elevation_m;
                residual[slot] -= self.demand_and_slope(node.base_demand_m3s, pressure).0;
            }
        }
        for (link, &is_active) in links.iter().zip(active.iter()) {
            if !is_active || !reachable[link.a] || !reachable[link.b] {
                continue;
            }
            let (q, _) = flow_and_conductance(&link.kind, heads[link.a] - heads[link.b]);
            if let Some(sa) = slot_of[link.a] {
                residual[sa] -= q;
            }
            if let Some(sb) = slot_of[link.b] {
                residual[sb] += q;
            }
        }
        residual
    }

    /// Delivered demand and its derivative with respect to head.
    fn demand_and_slope(&self, base_m3s: f64, pressure_m: f64) -> (f64, f64) {
        if base_m3s <= 0.0 {
            return (0.0, 0.0);
        }
        match self.options.demand_model {
            DemandModel::DemandDriven => (base_m3s, 0.0),
            DemandModel::PressureDependent => {
                let pmin = self.options.minimum_pressure_m;
                let preq = self.options.required_pressure_m;
                let span = preq - pmin;
                if span <= 0.0 {
                    // Degenerate configuration: step function at pmin.
                    return if pressure_m > pmin {
                        (base_m3s, 0.0)
                    } else {
                        (0.0, 0.0)
                    };
                }
                let toe = span * WAGNER_TOE_FRACTION;
                if pressure_m <= pmin {
                    (0.0, 0.0)
                } else if pressure_m >= preq {
                    (base_m3s, 0.0)
                } else if pressure_m - pmin < toe {
                    // Linear toe joining (pmin, 0) to the sqrt curve; the
                    // exact curve has unbounded slope at pmin.
                    let slope = WAGNER_TOE_FRACTION.sqrt() / toe;
                    (base_m3s * slope * (pressure_m - pmin), base_m3s * slope)
                } else {
                    let fraction = ((pressure_m - pmin) / span).sqrt();
                    (base_m3s * fraction, base_m3s * 0.5 / (fraction * span))
                }
            }
        }
    }
}

/// Worst absolute nodal imbalance, the quantity the solver converges on.
fn worst_imbalance(residual: &[f64]) -> f64 {
    residual.iter().fold(0.0f64, |acc, r| acc.max(r.abs()))
}

/// Flow and d(flow)/d(head difference) for one link.
fn flow_and_conductance(kind: &LinkKind, dh: f64) -> (f64, f64) {
    match kind {
        LinkKind::Connector => (CONNECTOR_CONDUCTANCE * dh, CONNECTOR_CONDUCTANCE),
        LinkKind::Pipe { resistance } => {
            let magnitude = dh.abs();
            if magnitude < LINEARIZATION_HEAD_M {
                // Secant slope through the linearization point keeps the
                // Jacobian bounded as dh -> 0.
                let g = (LINEARIZATION_HEAD_M / resistance).powf(1.0 / HW_EXPONENT)
                    / LINEARIZATION_HEAD_M;
                (g * dh, g)
            } else {
                let q = (magnitude / resistance).powf(1.0 / HW_EXPONENT);
                let g = q / (HW_EXPONENT * magnitude);
                (q.copysign(dh), g)
            }
        }
    }
}

/// Hazen-Williams resistance r in h = r·q^1.852 (SI units).
pub fn hazen_williams_resistance(length_m: f64, roughness: f64, diameter_m: f64) -> f64 {
    HW_COEFFICIENT * length_m / (roughness.powf(HW_EXPONENT) * diameter_m.powf(4.871))
}

fn collect_nodes(network: &Network) -> Vec<NodeData> {
    network
        .graph
        .node_indices()
        .map(|idx| {
            let node = &network.graph[idx];
            NodeData {
                elevation_m: node.elevation_m(),
                fixed_head_m: node.fixed_head_m(),
                base_demand_m3s: match node {
                    wdn_core::Node::Junction(j) => j.base_demand_m3s,
                    _ => 0.0,
                },
                is_junction: node.fixed_head_m().is_none(),
            }
        })
        .collect()
}

fn collect_links(network: &Network) -> Result<Vec<LinkData>> {
    use petgraph::visit::EdgeRef;
    let mut links = Vec::with_capacity(network.graph.edge_count());
    for edge in network.graph.edge_references() {
        let weight = edge.weight();
        let kind = match weight {
            Link::Pipe(p) => {
                if p.diameter_m <= 0.0 || p.length_m <= 0.0 || p.roughness <= 0.0 {
                    return Err(anyhow!(
                        "pipe '{}' has non-positive geometry (L={}, D={}, C={})",
                        p.name,
                        p.length_m,
                        p.diameter_m,
                        p.roughness
                    ));
                }
                LinkKind::Pipe {
                    resistance: hazen_williams_resistance(p.length_m, p.roughness, p.diameter_m),
                }
            }
            Link::Pump(_) | Link::Valve(_) => LinkKind::Connector,
        };
        links.push(LinkData {
            label: weight.label().to_string(),
            a: edge.source().index(),
            b: edge.target().index(),
            kind,
            base_status: weight.status(),
        });
    }
    Ok(links)
}

/// Nodes reachable from any fixed-grade node over active links.
fn reachable_from_sources(nodes: &[NodeData], links: &[LinkData], active: &[bool]) -> Vec<bool> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (link, &is_active) in links.iter().zip(active.iter()) {
        if is_active {
            adjacency[link.a].push(link.b);
            adjacency[link.b].push(link.a);
        }
    }

    let mut reachable = vec![false; nodes.len()];
    let mut queue: VecDeque<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.fixed_head_m.is_some())
        .map(|(i, _)| i)
        .collect();
    for &i in &queue {
        reachable[i] = true;
    }
    while let Some(i) = queue.pop_front() {
        for &j in &adjacency[i] {
            if !reachable[j] {
                reachable[j] = true;
                queue.push_back(j);
            }
        }
    }
    reachable
}
