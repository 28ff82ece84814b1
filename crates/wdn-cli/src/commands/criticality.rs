use crate::commands::util::{check_import, parse_pipe_list};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use tabwriter::TabWriter;
use tracing::info;
use wdn_algo::{run_criticality, CriticalityConfig, FailurePolicy};
use wdn_core::SolverKind;
use wdn_io::import_inp_file;

#[derive(Args)]
pub struct CriticalityArgs {
    /// Network file (INP)
    pub network: PathBuf,

    /// Junctions below this pressure (m) count as deficient
    #[arg(long, default_value_t = 14.06)]
    pub threshold: f64,

    /// PDD minimum pressure (m)
    #[arg(long, default_value_t = 3.52)]
    pub min_pressure: f64,

    /// PDD required pressure (m)
    #[arg(long, default_value_t = 14.06)]
    pub required_pressure: f64,

    /// Hour of the run at which each trial closes its pipe
    #[arg(long, default_value_t = 2)]
    pub closure_hour: u64,

    /// Horizon per trial in hours
    #[arg(long, default_value_t = 14)]
    pub duration_hours: u64,

    /// Comma-separated pipe names to analyze (default: all)
    #[arg(long)]
    pub pipes: Option<String>,

    /// What a failed trial scores: worst-case or exclude
    #[arg(long, default_value = "worst-case")]
    pub failure_policy: String,

    /// Linear solver backend: gauss or lu
    #[arg(long, default_value = "gauss")]
    pub solver: String,

    /// Write the full sweep result as JSON
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_failure_policy(spec: &str) -> Result<FailurePolicy> {
    match spec.to_ascii_lowercase().as_str() {
        "worst-case" | "worst" => Ok(FailurePolicy::WorstCase),
        "exclude" => Ok(FailurePolicy::Exclude),
        other => Err(anyhow!(
            "unknown failure policy '{other}' (expected worst-case or exclude)"
        )),
    }
}

pub fn run(args: &CriticalityArgs) -> Result<()> {
    let network = check_import(import_inp_file(&args.network)?)?;
    info!(stats = %network.stats(), "network loaded");

    let mut config = CriticalityConfig {
        pressure_threshold_m: args.threshold,
        minimum_pressure_m: args.min_pressure,
        required_pressure_m: args.required_pressure,
        closure_time_s: args.closure_hour * 3600,
        duration_s: args.duration_hours * 3600,
        solver: args.solver.parse::<SolverKind>()?,
        ..CriticalityConfig::default()
    };
    config.failure_policy = parse_failure_policy(&args.failure_policy)?;
    config.pipes = parse_pipe_list(args.pipes.as_ref());

    let results = run_criticality(&network, &config)?;

    if !results.baseline_deficient.is_empty() {
        println!(
            "baseline-deficient junctions (excluded from impacts): {}",
            results.baseline_deficient.join(", ")
        );
        println!();
    }

    let mut table = TabWriter::new(std::io::stdout());
    writeln!(table, "PIPE\tIMPACTED\tJUNCTIONS")?;
    for (pipe, count) in results.ranked() {
        let impact = results
            .impacts
            .iter()
            .find(|i| i.pipe == pipe)
            .map(|i| i.impacted.join(", "))
            .unwrap_or_default();
        writeln!(table, "{pipe}\t{count}\t{impact}")?;
    }
    table.flush()?;

    if !results.failures.is_empty() {
        println!();
        for (pipe, error) in &results.failures {
            println!("trial failed for {pipe}: {error}");
        }
    }

    if let Some(out) = &args.out {
        std::fs::write(out, serde_json::to_string_pretty(&results)?)
            .with_context(|| format!("writing {}", out.display()))?;
        info!(path = %out.display(), "report written");
    }

    Ok(())
}
