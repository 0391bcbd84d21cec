//! NSGA-II: elitist multi-objective genetic search over door subsets.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EngineError;
use crate::schema::NsgaConfig;

use super::factory::ChromosomeFactory;
use super::gene::{Chromosome, Gene};

/// Fraction of the gene length at which the crossover cut sits.
const CUT_FRACTION: f64 = 0.3;

/// Per-bit flip probability once an offspring is selected for mutation.
const BIT_FLIP_PROBABILITY: f64 = 0.1;

/// Outcome of a search run.
#[derive(Debug, Clone)]
pub struct NsgaOutcome {
    /// The final non-dominated front.
    pub front: Vec<Chromosome>,
    pub generations_run: u32,
    pub cancelled: bool,
}

/// The NSGA-II loop: tournament selection, cut-point crossover, two-level
/// bit-flip mutation, fast non-dominated sorting and crowding-based
/// truncation.
pub struct NsgaEngine<'a, F: ChromosomeFactory> {
    factory: &'a F,
    config: NsgaConfig,
    rng: StdRng,
    cancelled: Arc<AtomicBool>,
}

impl<'a, F: ChromosomeFactory> NsgaEngine<'a, F> {
    pub fn new(factory: &'a F, config: NsgaConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            factory,
            config,
            rng: StdRng::seed_from_u64(seed),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle that makes `run` return early with the best-known front.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Run the configured number of generations and return the final front.
    pub fn run(&mut self) -> Result<NsgaOutcome, EngineError> {
        let population_size = self.config.population_size as usize;
        let gene_length = self.factory.gene_length();

        info!(
            "starting NSGA-II: population={population_size}, generations={}, candidate doors={gene_length}",
            self.config.generations
        );

        let genes: Vec<Gene> = (0..population_size)
            .map(|_| (0..gene_length).map(|_| self.rng.gen_bool(0.5)).collect())
            .collect();
        let mut population = self.build_chromosomes(0, genes)?;
        sort_and_assign(&mut population);

        let mut generations_run = 0;
        let mut cancelled = false;
        let mut front_signature: Option<Vec<Vec<u64>>> = None;
        let mut stable_generations = 0u32;

        for generation in 1..=self.config.generations {
            if self.cancelled.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }

            let offspring_genes = self.make_offspring(&population, population_size, gene_length);
            let offspring = self.build_chromosomes(generation, offspring_genes)?;

            let mut union = population;
            union.extend(offspring);
            population = environmental_selection(union, population_size);
            generations_run = generation;

            let front_size = population.iter().filter(|c| c.rank == 0).count();
            info!(
                "generation {generation} complete: population={}, front={front_size}",
                population.len()
            );

            if let Some(patience) = self.config.patience {
                let signature = signature_of_front(&population);
                if front_signature.as_ref() == Some(&signature) {
                    stable_generations += 1;
                    if stable_generations >= patience {
                        debug!("front stable for {stable_generations} generations, stopping early");
                        break;
                    }
                } else {
                    stable_generations = 0;
                    front_signature = Some(signature);
                }
            }
        }

        let mut front: Vec<Chromosome> = population.into_iter().filter(|c| c.rank == 0).collect();
        sort_front(&mut front);
        info!("search finished: {} solutions in the Pareto front", front.len());

        Ok(NsgaOutcome {
            front,
            generations_run,
            cancelled,
        })
    }

    fn build_chromosomes(
        &self,
        generation: u32,
        genes: Vec<Gene>,
    ) -> Result<Vec<Chromosome>, EngineError> {
        let objectives = self.factory.evaluate_many(&genes)?;
        Ok(genes
            .into_iter()
            .zip(objectives)
            .map(|(gene, obj)| Chromosome::new(generation, gene, obj))
            .collect())
    }

    fn make_offspring(
        &mut self,
        population: &[Chromosome],
        count: usize,
        gene_length: usize,
    ) -> Vec<Gene> {
        let cut = cut_index(gene_length);
        let mut offspring = Vec::with_capacity(count + 1);

        while offspring.len() < count {
            let parent_a = self.tournament(population);
            let parent_b = self.tournament(population);

            let (mut child_a, mut child_b) =
                if self.rng.r#gen::<f64>() < self.config.crossover_rate {
                    crossover(&population[parent_a].gene, &population[parent_b].gene, cut)
                } else {
                    (
                        population[parent_a].gene.clone(),
                        population[parent_b].gene.clone(),
                    )
                };

            self.maybe_mutate(&mut child_a);
            self.maybe_mutate(&mut child_b);

            offspring.push(child_a);
            offspring.push(child_b);
        }

        offspring.truncate(count);
        offspring
    }

    /// Binary tournament on the crowded-comparison operator.
    fn tournament(&mut self, population: &[Chromosome]) -> usize {
        let a = self.rng.gen_range(0..population.len());
        let b = self.rng.gen_range(0..population.len());
        if population[a].crowded_less(&population[b]) {
            a
        } else {
            b
        }
    }

    /// Two-level mutation: the offspring mutates with the configured
    /// probability, and a mutating offspring flips each bit independently.
    fn maybe_mutate(&mut self, gene: &mut Gene) {
        if self.rng.r#gen::<f64>() >= self.config.mutation_rate {
            return;
        }
        for bit in gene.iter_mut() {
            if self.rng.r#gen::<f64>() < BIT_FLIP_PROBABILITY {
                *bit = !*bit;
            }
        }
    }
}

/// Crossover cut index: fixed per gene length, not drawn per call.
pub fn cut_index(gene_length: usize) -> usize {
    (CUT_FRACTION * gene_length as f64).floor() as usize
}

/// Cut-point crossover: swap the suffixes beyond the cut.
pub fn crossover(parent_a: &Gene, parent_b: &Gene, cut: usize) -> (Gene, Gene) {
    let mut child_a: Gene = parent_a[..cut].to_vec();
    child_a.extend_from_slice(&parent_b[cut..]);
    let mut child_b: Gene = parent_b[..cut].to_vec();
    child_b.extend_from_slice(&parent_a[cut..]);
    (child_a, child_b)
}

/// Fast non-dominated sort; assigns ranks and returns the fronts as index
/// lists. Ties resolve by chromosome index because iteration is in index
/// order throughout.
pub fn fast_non_dominated_sort(population: &mut [Chromosome]) -> Vec<Vec<usize>> {
    let n = population.len();
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = vec![Vec::new()];

    for p in 0..n {
        for q in 0..n {
            if p == q {
                continue;
            }
            if population[p].dominates(&population[q]) {
                dominated[p].push(q);
            } else if population[q].dominates(&population[p]) {
                domination_count[p] += 1;
            }
        }
        if domination_count[p] == 0 {
            population[p].rank = 0;
            fronts[0].push(p);
        }
    }

    let mut i = 0;
    while !fronts[i].is_empty() {
        let mut next = Vec::new();
        for &p in &fronts[i] {
            for &q in &dominated[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    population[q].rank = i as u32 + 1;
                    next.push(q);
                }
            }
        }
        fronts.push(next);
        i += 1;
    }

    fronts.pop();
    fronts
}

/// Crowding-distance assignment within one front.
///
/// Boundary solutions get infinite distance; interior solutions accumulate
/// the normalized gap between their neighbors per objective, with a
/// degenerate objective (max == min) contributing nothing.
pub fn crowding_distance_assignment(population: &mut [Chromosome], front: &[usize]) {
    if front.is_empty() {
        return;
    }
    for &index in front {
        population[index].crowding = 0.0;
    }
    let objective_count = population[front[0]].obj.len();

    for objective in 0..objective_count {
        let mut sorted: Vec<usize> = front.to_vec();
        sorted.sort_by(|&a, &b| {
            population[a].obj[objective]
                .total_cmp(&population[b].obj[objective])
                .then_with(|| a.cmp(&b))
        });

        let first = sorted[0];
        let last = sorted[sorted.len() - 1];
        let delta = population[last].obj[objective] - population[first].obj[objective];
        population[first].crowding = f64::INFINITY;
        population[last].crowding = f64::INFINITY;
        if delta == 0.0 {
            continue;
        }
        for window in 0..sorted.len().saturating_sub(2) {
            let index = sorted[window + 1];
            let gap = population[sorted[window + 2]].obj[objective]
                - population[sorted[window]].obj[objective];
            if population[index].crowding.is_finite() {
                population[index].crowding += gap / delta;
            }
        }
    }
}

/// Sort the whole population into fronts and refresh rank and crowding.
fn sort_and_assign(population: &mut [Chromosome]) {
    let fronts = fast_non_dominated_sort(population);
    for front in &fronts {
        crowding_distance_assignment(population, front);
    }
}

/// Build the next population of the target size: whole fronts while they
/// fit, then the best-crowded remainder of the partial front.
fn environmental_selection(mut union: Vec<Chromosome>, target: usize) -> Vec<Chromosome> {
    let fronts = fast_non_dominated_sort(&mut union);
    for front in &fronts {
        crowding_distance_assignment(&mut union, front);
    }

    let mut keep: Vec<usize> = Vec::with_capacity(target);
    for front in &fronts {
        if keep.len() + front.len() <= target {
            keep.extend_from_slice(front);
            if keep.len() == target {
                break;
            }
        } else {
            let mut partial = front.clone();
            partial.sort_by(|&a, &b| {
                union[b]
                    .crowding
                    .total_cmp(&union[a].crowding)
                    .then_with(|| a.cmp(&b))
            });
            partial.truncate(target - keep.len());
            keep.extend(partial);
            break;
        }
    }

    keep.sort_unstable();
    let mut selected = Vec::with_capacity(keep.len());
    // Drain by descending index so positions stay valid.
    for &index in keep.iter().rev() {
        selected.push(union.swap_remove(index));
    }
    selected.reverse();

    // Ranks and crowding must reflect the surviving set, not the union.
    sort_and_assign(&mut selected);
    selected
}

/// Deterministic ordering for reported fronts: objectives lexicographically,
/// then the gene bits.
fn sort_front(front: &mut [Chromosome]) {
    front.sort_by(|a, b| {
        for (x, y) in a.obj.iter().zip(b.obj.iter()) {
            match x.total_cmp(y) {
                std::cmp::Ordering::Equal => continue,
                other => return other,
            }
        }
        a.gene.cmp(&b.gene)
    });
}

/// Bit pattern of the front's objective vectors, for stability detection.
fn signature_of_front(population: &[Chromosome]) -> Vec<Vec<u64>> {
    let mut signature: Vec<Vec<u64>> = population
        .iter()
        .filter(|c| c.rank == 0)
        .map(|c| c.obj.iter().map(|v| v.to_bits()).collect())
        .collect();
    signature.sort();
    signature.dedup();
    signature
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic toy factory: objectives computed from the gene alone.
    struct ToyFactory {
        length: usize,
    }

    impl ChromosomeFactory for ToyFactory {
        fn gene_length(&self) -> usize {
            self.length
        }

        fn evaluate(&self, gene: &Gene) -> Result<Vec<f64>, EngineError> {
            let ones = gene.iter().filter(|&&b| b).count() as f64;
            // Conflicting objectives: more ones vs. fewer ones.
            Ok(vec![ones, self.length as f64 - ones])
        }
    }

    fn config(seed: u64) -> NsgaConfig {
        NsgaConfig {
            population_size: 8,
            generations: 5,
            crossover_rate: 0.8,
            mutation_rate: 0.4,
            seed: Some(seed),
            ..NsgaConfig::default()
        }
    }

    #[test]
    fn crossover_swaps_suffixes_at_the_fixed_cut() {
        let a: Gene = vec![true; 10];
        let b: Gene = vec![false; 10];
        let cut = cut_index(10);
        assert_eq!(cut, 3);
        let (child_a, child_b) = crossover(&a, &b, cut);
        assert_eq!(child_a[..cut], a[..cut]);
        assert_eq!(child_a[cut..], b[cut..]);
        assert_eq!(child_b[..cut], b[..cut]);
        assert_eq!(child_b[cut..], a[cut..]);
    }

    #[test]
    fn non_dominated_sort_ranks_layers() {
        let mut population = vec![
            Chromosome::new(0, vec![], vec![1.0, 1.0]),
            Chromosome::new(0, vec![], vec![2.0, 2.0]),
            Chromosome::new(0, vec![], vec![1.0, 2.0]),
            Chromosome::new(0, vec![], vec![3.0, 3.0]),
        ];
        let fronts = fast_non_dominated_sort(&mut population);
        assert_eq!(fronts[0], vec![0]);
        assert_eq!(population[0].rank, 0);
        assert_eq!(population[2].rank, 1);
        assert_eq!(population[3].rank, 3);
        assert_eq!(fronts.len(), 4);
    }

    #[test]
    fn incomparable_solutions_share_the_front() {
        let mut population = vec![
            Chromosome::new(0, vec![], vec![1.0, 3.0]),
            Chromosome::new(0, vec![], vec![2.0, 2.0]),
            Chromosome::new(0, vec![], vec![3.0, 1.0]),
        ];
        let fronts = fast_non_dominated_sort(&mut population);
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0], vec![0, 1, 2]);
    }

    #[test]
    fn boundary_solutions_get_infinite_crowding() {
        let mut population = vec![
            Chromosome::new(0, vec![], vec![1.0, 3.0]),
            Chromosome::new(0, vec![], vec![2.0, 2.0]),
            Chromosome::new(0, vec![], vec![3.0, 1.0]),
        ];
        let front: Vec<usize> = vec![0, 1, 2];
        crowding_distance_assignment(&mut population, &front);
        assert!(population[0].crowding.is_infinite());
        assert!(population[2].crowding.is_infinite());
        assert!(population[1].crowding.is_finite());
        assert!(population[1].crowding > 0.0);
    }

    #[test]
    fn degenerate_objective_contributes_zero() {
        let mut population = vec![
            Chromosome::new(0, vec![], vec![1.0, 5.0]),
            Chromosome::new(0, vec![], vec![1.0, 4.0]),
            Chromosome::new(0, vec![], vec![1.0, 3.0]),
        ];
        let front: Vec<usize> = vec![0, 1, 2];
        crowding_distance_assignment(&mut population, &front);
        // First objective is constant; only the second spreads them.
        assert!(population[1].crowding.is_finite());
        assert!((population[1].crowding - 1.0).abs() < 1e-12);
    }

    #[test]
    fn population_size_is_preserved() {
        let factory = ToyFactory { length: 6 };
        let mut engine = NsgaEngine::new(&factory, config(3)).expect("engine");
        let outcome = engine.run().expect("runs");
        assert_eq!(outcome.generations_run, 5);
        assert!(!outcome.front.is_empty());
        assert!(outcome.front.len() <= 8);
    }

    #[test]
    fn reported_front_is_mutually_non_dominated() {
        let factory = ToyFactory { length: 6 };
        let mut engine = NsgaEngine::new(&factory, config(3)).expect("engine");
        let outcome = engine.run().expect("runs");
        for a in &outcome.front {
            for b in &outcome.front {
                assert!(!a.dominates(b));
            }
        }
    }

    #[test]
    fn identical_seeds_reproduce_the_front() {
        let factory = ToyFactory { length: 6 };
        let run = |seed| {
            let mut engine = NsgaEngine::new(&factory, config(seed)).expect("engine");
            engine.run().expect("runs")
        };
        let a = run(7);
        let b = run(7);
        assert_eq!(a.front.len(), b.front.len());
        for (x, y) in a.front.iter().zip(b.front.iter()) {
            assert_eq!(x.gene, y.gene);
            assert_eq!(x.obj, y.obj);
        }
    }

    #[test]
    fn cancellation_returns_early() {
        let factory = ToyFactory { length: 6 };
        let mut engine = NsgaEngine::new(&factory, config(3)).expect("engine");
        engine.cancel_handle().store(true, Ordering::Relaxed);
        let outcome = engine.run().expect("runs");
        assert!(outcome.cancelled);
        assert_eq!(outcome.generations_run, 0);
        // The initial population still yields a usable front.
        assert!(!outcome.front.is_empty());
    }

    /// Factory whose objectives never change; the front is stable from the
    /// first generation.
    struct FlatFactory;

    impl ChromosomeFactory for FlatFactory {
        fn gene_length(&self) -> usize {
            4
        }

        fn evaluate(&self, _gene: &Gene) -> Result<Vec<f64>, EngineError> {
            Ok(vec![1.0, 1.0])
        }
    }

    #[test]
    fn patience_stops_a_converged_run() {
        let mut cfg = config(5);
        cfg.generations = 200;
        cfg.patience = Some(3);
        let mut engine = NsgaEngine::new(&FlatFactory, cfg).expect("engine");
        let outcome = engine.run().expect("runs");
        assert!(outcome.generations_run < 200);
    }
}
