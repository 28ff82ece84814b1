//! Sectioned INP parser.
//!
//! Line-oriented: `;` starts a comment, `[SECTION]` switches sections,
//! whitespace separates fields. Structural problems (bad numbers, dangling
//! link endpoints, duplicate names) are fatal; cosmetic oddities go into
//! the returned diagnostics.

use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use wdn_core::units::lps_to_m3s;
use wdn_core::{
    Diagnostics, Junction, JunctionId, Link, LinkStatus, Network, Node, Pipe, PipeId, Pump,
    PumpId, Reservoir, ReservoirId, Tank, TankId, Valve, ValveId, WdnError, WdnResult,
};

/// Import outcome: the network plus everything worth telling the user.
#[derive(Debug)]
pub struct ImportResult {
    pub network: Network,
    pub diagnostics: Diagnostics,
}

/// Parse an INP file from disk.
pub fn import_inp_file(path: &Path) -> WdnResult<ImportResult> {
    let text = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "importing INP");
    import_inp_str(&text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Junctions,
    Reservoirs,
    Tanks,
    Pipes,
    Pumps,
    Valves,
    Coordinates,
    Options,
    End,
    Unknown,
}

impl Section {
    fn parse(name: &str) -> Section {
        match name.to_ascii_uppercase().as_str() {
            "TITLE" => Section::Title,
            "JUNCTIONS" => Section::Junctions,
            "RESERVOIRS" => Section::Reservoirs,
            "TANKS" => Section::Tanks,
            "PIPES" => Section::Pipes,
            "PUMPS" => Section::Pumps,
            "VALVES" => Section::Valves,
            "COORDINATES" => Section::Coordinates,
            "OPTIONS" => Section::Options,
            "END" => Section::End,
            _ => Section::Unknown,
        }
    }
}

fn parse_f64(token: &str, what: &str, line_no: usize) -> WdnResult<f64> {
    token.parse::<f64>().map_err(|_| {
        WdnError::Parse(format!("line {line_no}: invalid {what} '{token}'"))
    })
}

fn parse_status(token: &str, line_no: usize) -> WdnResult<LinkStatus> {
    match token.to_ascii_uppercase().as_str() {
        "OPEN" => Ok(LinkStatus::Open),
        "CLOSED" => Ok(LinkStatus::Closed),
        _ => Err(WdnError::Parse(format!(
            "line {line_no}: invalid status '{token}' (expected Open or Closed)"
        ))),
    }
}

/// Parse INP text into a network.
pub fn import_inp_str(text: &str) -> WdnResult<ImportResult> {
    let mut network = Network::new();
    let mut diagnostics = Diagnostics::new();

    // Links are collected first and wired to node indices at the end, so
    // section order in the file never matters.
    let mut pending_links: Vec<(Link, String, String, usize)> = Vec::new();
    let mut node_names: HashSet<String> = HashSet::new();
    let mut title_lines: Vec<String> = Vec::new();

    let mut section = Section::Unknown;
    let mut counts = (0usize, 0usize, 0usize, 0usize, 0usize, 0usize);

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = match raw.find(';') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            let name = line.trim_matches(|c| c == '[' || c == ']').trim();
            section = Section::parse(name);
            if section == Section::Unknown {
                diagnostics.add_warning(
                    "format",
                    &format!("line {line_no}: unknown section [{name}], skipped"),
                );
            }
            if section == Section::End {
                break;
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match section {
            Section::Title => title_lines.push(line.to_string()),
            Section::Junctions => {
                require_fields(&fields, 3, "junction", line_no)?;
                let name = fields[0].to_string();
                check_duplicate(&mut node_names, &name, line_no)?;
                let elevation_m = parse_f64(fields[1], "elevation", line_no)?;
                let demand_lps = parse_f64(fields[2], "demand", line_no)?;
                if demand_lps < 0.0 {
                    diagnostics.add_warning(
                        "data",
                        &format!("junction '{name}' has negative demand {demand_lps} L/s"),
                    );
                }
                network.graph.add_node(Node::Junction(Junction {
                    id: JunctionId::new(counts.0),
                    name,
                    elevation_m,
                    base_demand_m3s: lps_to_m3s(demand_lps),
                }));
                counts.0 += 1;
            }
            Section::Reservoirs => {
                require_fields(&fields, 2, "reservoir", line_no)?;
                let name = fields[0].to_string();
                check_duplicate(&mut node_names, &name, line_no)?;
                let head_m = parse_f64(fields[1], "head", line_no)?;
                network.graph.add_node(Node::Reservoir(Reservoir {
                    id: ReservoirId::new(counts.1),
                    name,
                    head_m,
                }));
                counts.1 += 1;
            }
            Section::Tanks => {
                require_fields(&fields, 3, "tank", line_no)?;
                let name = fields[0].to_string();
                check_duplicate(&mut node_names, &name, line_no)?;
                let elevation_m = parse_f64(fields[1], "elevation", line_no)?;
                let init_level_m = parse_f64(fields[2], "initial level", line_no)?;
                network.graph.add_node(Node::Tank(Tank {
                    id: TankId::new(counts.2),
                    name,
                    elevation_m,
                    init_level_m,
                }));
                counts.2 += 1;
            }
            Section::Pipes => {
                require_fields(&fields, 6, "pipe", line_no)?;
                let mut pipe = Pipe::new(
                    PipeId::new(counts.3),
                    fields[0].to_string(),
                    fields[1].to_string(),
                    fields[2].to_string(),
                )
                .with_geometry(
                    parse_f64(fields[3], "length", line_no)?,
                    parse_f64(fields[4], "diameter", line_no)?,
                )
                .with_roughness(parse_f64(fields[5], "roughness", line_no)?);
                if let Some(token) = fields.get(6) {
                    pipe.minor_loss = parse_f64(token, "minor loss", line_no)?;
                }
                if let Some(token) = fields.get(7) {
                    pipe.status = parse_status(token, line_no)?;
                }
                let (from, to) = (pipe.from_node.clone(), pipe.to_node.clone());
                pending_links.push((Link::Pipe(pipe), from, to, line_no));
                counts.3 += 1;
            }
            Section::Pumps => {
                require_fields(&fields, 3, "pump", line_no)?;
                let pump = Pump {
                    id: PumpId::new(counts.4),
                    name: fields[0].to_string(),
                    from_node: fields[1].to_string(),
                    to_node: fields[2].to_string(),
                    status: LinkStatus::Open,
                    parameters: fields[3..].join(" "),
                };
                let (from, to) = (pump.from_node.clone(), pump.to_node.clone());
                pending_links.push((Link::Pump(pump), from, to, line_no));
                counts.4 += 1;
            }
            Section::Valves => {
                require_fields(&fields, 4, "valve", line_no)?;
                let valve = Valve {
                    id: ValveId::new(counts.5),
                    name: fields[0].to_string(),
                    from_node: fields[1].to_string(),
                    to_node: fields[2].to_string(),
                    diameter_m: parse_f64(fields[3], "diameter", line_no)?,
                    status: LinkStatus::Open,
                    parameters: fields[4..].join(" "),
                };
                let (from, to) = (valve.from_node.clone(), valve.to_node.clone());
                pending_links.push((Link::Valve(valve), from, to, line_no));
                counts.5 += 1;
            }
            Section::Coordinates => {
                require_fields(&fields, 3, "coordinate", line_no)?;
                let x = parse_f64(fields[1], "x coordinate", line_no)?;
                let y = parse_f64(fields[2], "y coordinate", line_no)?;
                network.coordinates.insert(fields[0].to_string(), (x, y));
            }
            Section::Options => {
                // Solver options live in SimulationOptions, not the model.
                diagnostics.add_warning(
                    "format",
                    &format!("line {line_no}: option '{line}' ignored"),
                );
            }
            Section::End => unreachable!("loop breaks on [END]"),
            Section::Unknown => {}
        }
    }

    network.title = title_lines.join("\n");

    // Wire links now that every node exists.
    for (link, from, to, line_no) in pending_links {
        let a = network.node_index(&from).ok_or_else(|| {
            WdnError::Parse(format!(
                "line {line_no}: link '{}' references unknown node '{from}'",
                link.label()
            ))
        })?;
        let b = network.node_index(&to).ok_or_else(|| {
            WdnError::Parse(format!(
                "line {line_no}: link '{}' references unknown node '{to}'",
                link.label()
            ))
        })?;
        network.graph.add_edge(a, b, link);
    }

    network.validate_into(&mut diagnostics);
    debug!(stats = %network.stats(), "import complete");

    Ok(ImportResult {
        network,
        diagnostics,
    })
}

fn require_fields(fields: &[&str], needed: usize, what: &str, line_no: usize) -> WdnResult<()> {
    if fields.len() < needed {
        return Err(WdnError::Parse(format!(
            "line {line_no}: {what} needs at least {needed} fields, found {}",
            fields.len()
        )));
    }
    Ok(())
}

fn check_duplicate(seen: &mut HashSet<String>, name: &str, line_no: usize) -> WdnResult<()> {
    if !seen.insert(name.to_string()) {
        return Err(WdnError::Parse(format!(
            "line {line_no}: duplicate node name '{name}'"
        )));
    }
    Ok(())
}
