use crate::commands::util::{check_import, parse_demand_model};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tabwriter::TabWriter;
use tracing::info;
use wdn_algo::modified_resilience_index;
use wdn_core::SolverKind;
use wdn_io::import_inp_file;
use wdn_sim::{simulate, SimulationOptions};

#[derive(Args)]
pub struct BaselineArgs {
    /// Network file (INP)
    pub network: PathBuf,

    /// Simulated horizon in hours; 0 runs a single snapshot
    #[arg(long, default_value_t = 0)]
    pub duration_hours: u64,

    /// PDD minimum pressure (m)
    #[arg(long, default_value_t = 0.0)]
    pub min_pressure: f64,

    /// PDD required pressure (m); also the MRI service pressure
    #[arg(long, default_value_t = 15.0)]
    pub required_pressure: f64,

    /// Demand model: pdd or dd
    #[arg(long, default_value = "pdd")]
    pub demand_model: String,

    /// Linear solver backend: gauss or lu
    #[arg(long, default_value = "gauss")]
    pub solver: String,

    /// Write the result summary as JSON
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
struct BaselineReport {
    mri: f64,
    min_junction_pressure_m: Option<f64>,
    max_junction_pressure_m: Option<f64>,
    junction_min_pressures: Vec<(String, f64)>,
}

pub fn run(args: &BaselineArgs) -> Result<()> {
    let network = check_import(import_inp_file(&args.network)?)?;
    info!(stats = %network.stats(), "network loaded");

    let options = SimulationOptions::default()
        .with_demand_model(parse_demand_model(&args.demand_model)?)
        .with_pressure_range(args.min_pressure, args.required_pressure)
        .with_duration(args.duration_hours * 3600)
        .with_solver(args.solver.parse::<SolverKind>()?);

    let results = simulate(&network, &options)?;
    let mri = modified_resilience_index(&network, &results, args.required_pressure);

    let mut table = TabWriter::new(std::io::stdout());
    writeln!(table, "JUNCTION\tMIN PRESSURE (m)")?;
    let mut rows = results.junction_min_pressures();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));
    for (name, min_p) in &rows {
        writeln!(table, "{name}\t{min_p:.3}")?;
    }
    table.flush()?;

    println!();
    println!(
        "pressure range: {:.3} .. {:.3} m",
        results.min_junction_pressure().unwrap_or(f64::NAN),
        results.max_junction_pressure().unwrap_or(f64::NAN)
    );
    println!("modified resilience index: {mri:.4}");

    if let Some(out) = &args.out {
        let report = BaselineReport {
            mri,
            min_junction_pressure_m: results.min_junction_pressure(),
            max_junction_pressure_m: results.max_junction_pressure(),
            junction_min_pressures: rows,
        };
        std::fs::write(out, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", out.display()))?;
        info!(path = %out.display(), "report written");
    }

    Ok(())
}
