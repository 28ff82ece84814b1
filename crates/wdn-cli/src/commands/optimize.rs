use crate::commands::util::check_import;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use wdn_algo::{
    CriticalityConfig, GaConfig, MinPressureBound, OptimizationConfig, PenaltyConfig,
    run_optimization,
};
use wdn_core::SolverKind;
use wdn_io::{export_inp_file, import_inp_file};
use wdn_sim::{DemandModel, SimulationOptions};

#[derive(Args)]
pub struct OptimizeArgs {
    /// Network file (INP)
    pub network: PathBuf,

    /// Where to write the optimized network (INP)
    #[arg(long)]
    pub out: PathBuf,

    /// Write the full optimization report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// GA population size
    #[arg(long, default_value_t = 40)]
    pub population: usize,

    /// GA generation count
    #[arg(long, default_value_t = 200)]
    pub generations: usize,

    /// Fixed RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Lower junction pressure bound (m)
    #[arg(long, default_value_t = 0.0)]
    pub min_pressure: f64,

    /// Upper junction pressure bound (m)
    #[arg(long, default_value_t = 84.0)]
    pub max_pressure: f64,

    /// Required modified resilience index
    #[arg(long, default_value_t = 3.7)]
    pub resilience_target: f64,

    /// PDD required pressure (m); also the MRI service pressure
    #[arg(long, default_value_t = 15.0)]
    pub required_pressure: f64,

    /// Allowed aggregate N-1 impact count across all pipe closures;
    /// enables the criticality term
    #[arg(long)]
    pub criticality_target: Option<f64>,

    /// Remove pipes whose optimized diameter falls below this (m)
    #[arg(long)]
    pub prune_below: Option<f64>,

    /// Simulated horizon in hours; 0 evaluates a single snapshot
    #[arg(long, default_value_t = 0)]
    pub duration_hours: u64,

    /// Linear solver backend: gauss or lu
    #[arg(long, default_value = "gauss")]
    pub solver: String,
}

pub fn run(args: &OptimizeArgs) -> Result<()> {
    let network = check_import(import_inp_file(&args.network)?)?;
    info!(stats = %network.stats(), "network loaded");

    let solver = args.solver.parse::<SolverKind>()?;
    let sim_options = SimulationOptions::default()
        .with_demand_model(DemandModel::PressureDependent)
        .with_pressure_range(args.min_pressure.max(0.0), args.required_pressure)
        .with_duration(args.duration_hours * 3600)
        .with_solver(solver);

    let mut ga = GaConfig::default()
        .with_population(args.population)
        .with_generations(args.generations);
    if let Some(seed) = args.seed {
        ga = ga.with_seed(seed);
    }

    let config = OptimizationConfig {
        cost_table: Default::default(),
        sim_options,
        penalties: PenaltyConfig {
            min_pressure: MinPressureBound::Uniform(args.min_pressure),
            max_pressure_m: args.max_pressure,
            resilience_target: args.resilience_target,
            criticality_target: args.criticality_target,
        },
        ga,
        criticality: args.criticality_target.map(|_| CriticalityConfig {
            solver,
            ..CriticalityConfig::default()
        }),
        prune_below_m: args.prune_below,
    };

    let report = run_optimization(&network, &config)?;

    export_inp_file(&report.network, &args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;

    println!(
        "baseline: cost {:.2}, MRI {:.4}, feasible {}",
        report.baseline.cost,
        report.baseline.mri,
        report.baseline.is_feasible()
    );
    println!(
        "as-built: cost {:.2}, MRI {:.4}, feasible {}, pipes removed {}",
        report.validation.cost,
        report.validation.mri,
        report.validation.is_feasible(),
        report.pipes_removed
    );
    println!("optimized network written to {}", args.out.display());

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}
