//! Genetic-algorithm search over bounded continuous vectors.
//!
//! Generic over a [`Problem`] so the driver knows nothing about hydraulics.
//! Selection is feasibility-first: any zero-penalty candidate beats any
//! penalized one, penalized candidates rank by penalty, and feasible ones by
//! objective. Population evaluation is rayon-parallel; a fixed seed makes a
//! run reproducible.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// A bounded continuous minimization problem with penalty constraints.
pub trait Problem: Sync {
    fn n_vars(&self) -> usize;
    /// Inclusive (lower, upper) bound for variable `i`.
    fn bounds(&self, i: usize) -> (f64, f64);
    /// Returns (objective, penalty); penalty zero means feasible.
    fn evaluate(&self, x: &[f64]) -> (f64, f64);
}

/// GA driver settings.
#[derive(Debug, Clone)]
pub struct GaConfig {
    pub population: usize,
    pub generations: usize,
    pub crossover_rate: f64,
    /// Per-gene mutation probability
    pub mutation_rate: f64,
    /// Mutation step as a fraction of the variable's range
    pub mutation_sigma: f64,
    pub tournament_size: usize,
    /// Best individuals carried over unchanged each generation
    pub elitism: usize,
    /// Fixed seed for reproducible runs; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population: 40,
            generations: 200,
            crossover_rate: 0.9,
            mutation_rate: 0.15,
            mutation_sigma: 0.1,
            tournament_size: 3,
            elitism: 2,
            seed: None,
        }
    }
}

impl GaConfig {
    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Progress record for one generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStat {
    pub generation: usize,
    pub best_objective: f64,
    pub best_penalty: f64,
    pub mean_objective: f64,
    pub feasible_count: usize,
}

/// Final search outcome.
#[derive(Debug, Clone, Serialize)]
pub struct GaOutcome {
    pub best: Vec<f64>,
    pub best_objective: f64,
    pub best_penalty: f64,
    pub history: Vec<GenerationStat>,
}

impl GaOutcome {
    pub fn is_feasible(&self) -> bool {
        self.best_penalty == 0.0
    }
}

/// Feasibility-first ordering: lower is better.
fn rank_key(score: (f64, f64)) -> (u8, f64) {
    let (objective, penalty) = score;
    if penalty > 0.0 {
        (1, penalty)
    } else {
        (0, objective)
    }
}

fn better(a: (f64, f64), b: (f64, f64)) -> bool {
    let (fa, va) = rank_key(a);
    let (fb, vb) = rank_key(b);
    fa.cmp(&fb).then(va.total_cmp(&vb)).is_lt()
}

/// Run the search.
pub fn optimize(problem: &impl Problem, config: &GaConfig) -> Result<GaOutcome> {
    let n = problem.n_vars();
    if n == 0 {
        return Err(anyhow!("problem has no variables to optimize"));
    }
    if config.population < 2 {
        return Err(anyhow!("population must be at least 2"));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut population: Vec<Vec<f64>> = (0..config.population)
        .map(|_| {
            (0..n)
                .map(|i| {
                    let (lo, hi) = problem.bounds(i);
                    rng.gen_range(lo..=hi)
                })
                .collect()
        })
        .collect();

    let mut scores: Vec<(f64, f64)> = population
        .par_iter()
        .map(|x| problem.evaluate(x))
        .collect();

    let mut best_idx = argbest(&scores);
    let mut best = population[best_idx].clone();
    let mut best_score = scores[best_idx];
    let mut history = Vec::with_capacity(config.generations);

    for generation in 0..config.generations {
        // Rank indices for elitism and tournament selection.
        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by(|&a, &b| {
            let ka = rank_key(scores[a]);
            let kb = rank_key(scores[b]);
            ka.0.cmp(&kb.0).then(ka.1.total_cmp(&kb.1))
        });

        let mut next: Vec<Vec<f64>> = order
            .iter()
            .take(config.elitism.min(population.len()))
            .map(|&i| population[i].clone())
            .collect();

        while next.len() < config.population {
            let p1 = tournament(&scores, config.tournament_size, &mut rng);
            let p2 = tournament(&scores, config.tournament_size, &mut rng);
            let (mut c1, mut c2) = if rng.gen::<f64>() < config.crossover_rate {
                blend_crossover(&population[p1], &population[p2], &mut rng)
            } else {
                (population[p1].clone(), population[p2].clone())
            };
            mutate(&mut c1, problem, config, &mut rng);
            mutate(&mut c2, problem, config, &mut rng);
            next.push(c1);
            if next.len() < config.population {
                next.push(c2);
            }
        }

        population = next;
        scores = population
            .par_iter()
            .map(|x| problem.evaluate(x))
            .collect();

        best_idx = argbest(&scores);
        if better(scores[best_idx], best_score) {
            best = population[best_idx].clone();
            best_score = scores[best_idx];
        }

        let feasible_count = scores.iter().filter(|&&(_, p)| p == 0.0).count();
        let mean_objective =
            scores.iter().map(|&(o, _)| o).sum::<f64>() / scores.len() as f64;
        debug!(
            generation,
            best_objective = best_score.0,
            best_penalty = best_score.1,
            feasible_count,
            "generation complete"
        );
        history.push(GenerationStat {
            generation,
            best_objective: best_score.0,
            best_penalty: best_score.1,
            mean_objective,
            feasible_count,
        });
    }

    info!(
        best_objective = best_score.0,
        best_penalty = best_score.1,
        generations = config.generations,
        "search finished"
    );
    Ok(GaOutcome {
        best,
        best_objective: best_score.0,
        best_penalty: best_score.1,
        history,
    })
}

fn argbest(scores: &[(f64, f64)]) -> usize {
    let mut best = 0;
    for i in 1..scores.len() {
        if better(scores[i], scores[best]) {
            best = i;
        }
    }
    best
}

fn tournament(scores: &[(f64, f64)], size: usize, rng: &mut StdRng) -> usize {
    let mut winner = rng.gen_range(0..scores.len());
    for _ in 1..size.max(1) {
        let challenger = rng.gen_range(0..scores.len());
        if better(scores[challenger], scores[winner]) {
            winner = challenger;
        }
    }
    winner
}

/// BLX-style blend: each gene drawn uniformly from the parents' span.
fn blend_crossover(a: &[f64], b: &[f64], rng: &mut StdRng) -> (Vec<f64>, Vec<f64>) {
    let mut c1 = Vec::with_capacity(a.len());
    let mut c2 = Vec::with_capacity(a.len());
    for (&ga, &gb) in a.iter().zip(b.iter()) {
        let lo = ga.min(gb);
        let hi = ga.max(gb);
        if hi - lo < f64::EPSILON {
            c1.push(ga);
            c2.push(gb);
        } else {
            c1.push(rng.gen_range(lo..=hi));
            c2.push(rng.gen_range(lo..=hi));
        }
    }
    (c1, c2)
}

fn mutate(x: &mut [f64], problem: &impl Problem, config: &GaConfig, rng: &mut StdRng) {
    for (i, gene) in x.iter_mut().enumerate() {
        if rng.gen::<f64>() < config.mutation_rate {
            let (lo, hi) = problem.bounds(i);
            let sigma = (hi - lo) * config.mutation_sigma;
            // Sum of uniforms approximates a gaussian step well enough here.
            let step = (rng.gen::<f64>() + rng.gen::<f64>() + rng.gen::<f64>() - 1.5) * sigma;
            *gene = (*gene + step).clamp(lo, hi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sphere function with a penalty keeping x[0] above 0.5.
    struct ConstrainedSphere;

    impl Problem for ConstrainedSphere {
        fn n_vars(&self) -> usize {
            3
        }
        fn bounds(&self, _i: usize) -> (f64, f64) {
            (-2.0, 2.0)
        }
        fn evaluate(&self, x: &[f64]) -> (f64, f64) {
            let objective: f64 = x.iter().map(|v| v * v).sum();
            let penalty = (0.5 - x[0]).max(0.0);
            (objective, penalty)
        }
    }

    #[test]
    fn test_finds_constrained_optimum() {
        let config = GaConfig::default()
            .with_population(30)
            .with_generations(60)
            .with_seed(7);
        let outcome = optimize(&ConstrainedSphere, &config).unwrap();
        assert!(outcome.is_feasible());
        // Optimum is (0.5, 0, 0) with objective 0.25
        assert!(outcome.best[0] >= 0.5);
        assert!(outcome.best_objective < 0.6, "got {}", outcome.best_objective);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let config = GaConfig::default()
            .with_population(20)
            .with_generations(15)
            .with_seed(42);
        let a = optimize(&ConstrainedSphere, &config).unwrap();
        let b = optimize(&ConstrainedSphere, &config).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.best_objective, b.best_objective);
    }

    #[test]
    fn test_best_never_regresses() {
        let config = GaConfig::default()
            .with_population(20)
            .with_generations(30)
            .with_seed(3);
        let outcome = optimize(&ConstrainedSphere, &config).unwrap();
        let keys: Vec<(u8, f64)> = outcome
            .history
            .iter()
            .map(|s| rank_key((s.best_objective, s.best_penalty)))
            .collect();
        assert!(keys.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_candidates_respect_bounds() {
        struct Recorder;
        impl Problem for Recorder {
            fn n_vars(&self) -> usize {
                2
            }
            fn bounds(&self, _i: usize) -> (f64, f64) {
                (0.1, 0.762)
            }
            fn evaluate(&self, x: &[f64]) -> (f64, f64) {
                for &v in x {
                    assert!((0.1..=0.762).contains(&v), "out of bounds: {v}");
                }
                (x.iter().sum(), 0.0)
            }
        }
        let config = GaConfig::default()
            .with_population(16)
            .with_generations(10)
            .with_seed(1);
        optimize(&Recorder, &config).unwrap();
    }

    #[test]
    fn test_empty_problem_is_an_error() {
        struct Empty;
        impl Problem for Empty {
            fn n_vars(&self) -> usize {
                0
            }
            fn bounds(&self, _i: usize) -> (f64, f64) {
                (0.0, 1.0)
            }
            fn evaluate(&self, _x: &[f64]) -> (f64, f64) {
                (0.0, 0.0)
            }
        }
        assert!(optimize(&Empty, &GaConfig::default()).is_err());
    }
}
