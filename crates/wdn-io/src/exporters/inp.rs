//! Sectioned INP writer.
//!
//! Floats are written with the shortest representation that parses back to
//! the identical value, so import(export(n)) reproduces n's numbers exactly.

use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;
use wdn_core::units::m3s_to_lps;
use wdn_core::{Link, Network, Node, WdnResult};

/// Write the network to an INP file on disk.
pub fn export_inp_file(network: &Network, path: &Path) -> WdnResult<()> {
    let text = export_inp_str(network);
    debug!(path = %path.display(), bytes = text.len(), "exporting INP");
    std::fs::write(path, text)?;
    Ok(())
}

/// Render the network as INP text.
pub fn export_inp_str(network: &Network) -> String {
    let mut out = String::new();

    if !network.title.is_empty() {
        out.push_str("[TITLE]\n");
        out.push_str(&network.title);
        out.push_str("\n\n");
    }

    out.push_str("[JUNCTIONS]\n;name elevation demand_lps\n");
    for node in network.graph.node_weights() {
        if let Node::Junction(j) = node {
            let _ = writeln!(
                out,
                "{} {} {}",
                j.name,
                j.elevation_m,
                m3s_to_lps(j.base_demand_m3s)
            );
        }
    }
    out.push('\n');

    out.push_str("[RESERVOIRS]\n;name head\n");
    for r in network.reservoirs() {
        let _ = writeln!(out, "{} {}", r.name, r.head_m);
    }
    out.push('\n');

    if !network.tanks().is_empty() {
        out.push_str("[TANKS]\n;name elevation init_level\n");
        for t in network.tanks() {
            let _ = writeln!(out, "{} {} {}", t.name, t.elevation_m, t.init_level_m);
        }
        out.push('\n');
    }

    out.push_str("[PIPES]\n;name from to length diameter roughness minor_loss status\n");
    for p in network.pipes() {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {} {}",
            p.name,
            p.from_node,
            p.to_node,
            p.length_m,
            p.diameter_m,
            p.roughness,
            p.minor_loss,
            p.status.as_str()
        );
    }
    out.push('\n');

    let pumps: Vec<_> = network
        .graph
        .edge_weights()
        .filter_map(|l| match l {
            Link::Pump(p) => Some(p),
            _ => None,
        })
        .collect();
    if !pumps.is_empty() {
        out.push_str("[PUMPS]\n;name from to parameters\n");
        for p in pumps {
            let _ = writeln!(out, "{} {} {} {}", p.name, p.from_node, p.to_node, p.parameters);
        }
        out.push('\n');
    }

    let valves: Vec<_> = network
        .graph
        .edge_weights()
        .filter_map(|l| match l {
            Link::Valve(v) => Some(v),
            _ => None,
        })
        .collect();
    if !valves.is_empty() {
        out.push_str("[VALVES]\n;name from to diameter parameters\n");
        for v in valves {
            let _ = writeln!(
                out,
                "{} {} {} {} {}",
                v.name, v.from_node, v.to_node, v.diameter_m, v.parameters
            );
        }
        out.push('\n');
    }

    if !network.coordinates.is_empty() {
        out.push_str("[COORDINATES]\n;node x y\n");
        // Deterministic output regardless of map iteration order.
        let mut entries: Vec<_> = network.coordinates.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (name, (x, y)) in entries {
            let _ = writeln!(out, "{name} {x} {y}");
        }
        out.push('\n');
    }

    out.push_str("[END]\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdn_core::{Junction, JunctionId, Pipe, PipeId, Reservoir, ReservoirId};

    #[test]
    fn test_export_layout() {
        let mut network = Network::new();
        network.title = "export test".into();
        let r = network.graph.add_node(Node::Reservoir(Reservoir {
            id: ReservoirId::new(0),
            name: "R1".into(),
            head_m: 100.0,
        }));
        let j = network.graph.add_node(Node::Junction(Junction {
            id: JunctionId::new(0),
            name: "J1".into(),
            elevation_m: 10.0,
            base_demand_m3s: 0.025,
        }));
        network.graph.add_edge(
            r,
            j,
            Link::Pipe(
                Pipe::new(PipeId::new(0), "P1".into(), "R1".into(), "J1".into())
                    .with_geometry(1000.0, 0.3048),
            ),
        );

        let text = export_inp_str(&network);
        assert!(text.starts_with("[TITLE]\nexport test\n"));
        assert!(text.contains("[JUNCTIONS]"));
        assert!(text.contains("J1 10 25"));
        assert!(text.contains("P1 R1 J1 1000 0.3048 130 0 Open"));
        assert!(text.contains("[END]"));
        // empty optional sections are omitted
        assert!(!text.contains("[TANKS]"));
        assert!(!text.contains("[PUMPS]"));
    }
}
