//! Gene evaluation: decoding a door subset into objectives by running the
//! simulator, with a cache keyed on the gene configuration.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::EngineError;
use crate::schema::{ExperimentConfig, IndividualSpec, SimulationParams};
use crate::sim::{DoorSlot, Scenario, Simulator, StructureMap, discover_door_slots};

use super::gene::{Chromosome, Gene, active_doors};

/// Capability the search drivers need from an evaluator.
///
/// The CA simulator implements it through [`Factory`]; the drivers depend on
/// nothing else.
pub trait ChromosomeFactory: Sync {
    /// Length of a valid gene, i.e. the number of candidate door slots.
    fn gene_length(&self) -> usize;

    /// Minimized objective vector for one gene.
    fn evaluate(&self, gene: &Gene) -> Result<Vec<f64>, EngineError>;

    /// Evaluate a batch; implementations may parallelize and coalesce.
    fn evaluate_many(&self, genes: &[Gene]) -> Result<Vec<Vec<f64>>, EngineError> {
        genes.iter().map(|gene| self.evaluate(gene)).collect()
    }

    /// Evaluate and wrap into a chromosome.
    fn create(&self, generation: u32, gene: Gene) -> Result<Chromosome, EngineError> {
        let obj = self.evaluate(&gene)?;
        Ok(Chromosome::new(generation, gene, obj))
    }
}

/// Aggregate objectives of one decoded gene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objectives {
    pub num_doors: u32,
    /// Mean iterations across scenario seeds.
    pub iterations: f64,
    /// Mean total travel distance across scenario seeds.
    pub distance: f64,
}

/// Immutable experiment inputs an evaluation depends on.
///
/// Anything that changes the meaning of a cached result is part of the
/// digest: the map text, the individual set, both seed streams, the
/// simulator parameters and the objective mode.
#[derive(Debug, Clone)]
pub struct Instance {
    base_map: StructureMap,
    specs: Vec<IndividualSpec>,
    scenario_seeds: Vec<u64>,
    simulation_seed: u64,
    params: SimulationParams,
    use_three_objectives: bool,
    slots: Vec<DoorSlot>,
}

#[derive(Serialize)]
struct InstanceDigest<'a> {
    map: String,
    specs: &'a [IndividualSpec],
    scenario_seeds: &'a [u64],
    simulation_seed: u64,
    params: &'a SimulationParams,
    use_three_objectives: bool,
}

impl Instance {
    pub fn new(
        base_map: StructureMap,
        specs: Vec<IndividualSpec>,
        experiment: &ExperimentConfig,
    ) -> Result<Self, EngineError> {
        experiment.validate()?;
        for spec in &specs {
            spec.validate()?;
        }
        let slots = discover_door_slots(&base_map);
        Ok(Self {
            base_map,
            specs,
            scenario_seeds: experiment.scenario_seed.seeds(),
            simulation_seed: experiment.simulation_seed,
            params: experiment.simulation.clone(),
            use_three_objectives: experiment.use_three_objectives,
            slots,
        })
    }

    pub fn slots(&self) -> &[DoorSlot] {
        &self.slots
    }

    pub fn base_map(&self) -> &StructureMap {
        &self.base_map
    }

    pub fn use_three_objectives(&self) -> bool {
        self.use_three_objectives
    }

    pub fn max_iterations(&self) -> u32 {
        self.params.max_iterations
    }

    /// Stable digest of the experiment inputs, used to invalidate the cache.
    pub fn digest(&self) -> Result<u64, EngineError> {
        let canonical = serde_json::to_string(&InstanceDigest {
            map: self.base_map.to_text(),
            specs: &self.specs,
            scenario_seeds: &self.scenario_seeds,
            simulation_seed: self.simulation_seed,
            params: &self.params,
            use_three_objectives: self.use_three_objectives,
        })?;
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        Ok(hasher.finish())
    }
}

#[derive(Debug, Default)]
struct EvalCache {
    hash: u64,
    map: HashMap<Gene, Objectives>,
}

/// Evaluator owning the cache and the instance digest.
///
/// No shared mutable state outside the mutex; a batch deduplicates genes
/// before dispatch so each distinct configuration simulates at most once.
pub struct Factory {
    pub instance: Instance,
    cache: Mutex<EvalCache>,
    simulations: AtomicU64,
}

impl Factory {
    pub fn new(instance: Instance) -> Result<Self, EngineError> {
        let hash = instance.digest()?;
        Ok(Self {
            instance,
            cache: Mutex::new(EvalCache {
                hash,
                map: HashMap::new(),
            }),
            simulations: AtomicU64::new(0),
        })
    }

    /// The door slots selected by the gene's set bits.
    pub fn active_slots(&self, gene: &Gene) -> Vec<DoorSlot> {
        self.instance
            .slots
            .iter()
            .zip(gene.iter())
            .filter_map(|(slot, &bit)| bit.then_some(*slot))
            .collect()
    }

    /// Decode a gene into objectives, consulting the cache first.
    pub fn decode(&self, gene: &Gene) -> Result<Objectives, EngineError> {
        self.check_gene(gene)?;
        let digest = self.instance.digest()?;

        {
            let mut cache = self.lock_cache();
            if cache.hash != digest {
                debug!("instance digest changed, clearing {} cached entries", cache.map.len());
                cache.map.clear();
                cache.hash = digest;
            }
            if let Some(cached) = cache.map.get(gene) {
                return Ok(*cached);
            }
        }

        let objectives = self.evaluate_uncached(gene)?;
        self.lock_cache().map.insert(gene.clone(), objectives);
        Ok(objectives)
    }

    /// Decode a batch of genes, deduplicating and evaluating misses in
    /// parallel.
    pub fn decode_many(&self, genes: &[Gene]) -> Result<Vec<Objectives>, EngineError> {
        for gene in genes {
            self.check_gene(gene)?;
        }
        let digest = self.instance.digest()?;

        let mut misses: Vec<Gene> = Vec::new();
        {
            let mut cache = self.lock_cache();
            if cache.hash != digest {
                cache.map.clear();
                cache.hash = digest;
            }
            for gene in genes {
                if !cache.map.contains_key(gene) && !misses.contains(gene) {
                    misses.push(gene.clone());
                }
            }
        }

        if !misses.is_empty() {
            let evaluated: Vec<(Gene, Objectives)> = misses
                .par_iter()
                .map(|gene| self.evaluate_uncached(gene).map(|obj| (gene.clone(), obj)))
                .collect::<Result<_, EngineError>>()?;
            let mut cache = self.lock_cache();
            for (gene, objectives) in evaluated {
                cache.map.insert(gene, objectives);
            }
        }

        let cache = self.lock_cache();
        Ok(genes
            .iter()
            .map(|gene| cache.map[gene])
            .collect())
    }

    /// Reported objective array in the configured mode.
    ///
    /// The search itself always ranks on the full triple; this projection
    /// only shapes what gets saved.
    pub fn objectives_vec(&self, objectives: &Objectives) -> Vec<f64> {
        if self.instance.use_three_objectives {
            vec![
                objectives.num_doors as f64,
                objectives.iterations,
                objectives.distance,
            ]
        } else {
            vec![objectives.num_doors as f64, objectives.distance]
        }
    }

    /// Number of simulator runs performed so far.
    pub fn simulations_run(&self) -> u64 {
        self.simulations.load(Ordering::Relaxed)
    }

    /// Number of distinct gene configurations cached.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().map.len()
    }

    fn check_gene(&self, gene: &Gene) -> Result<(), EngineError> {
        if gene.len() != self.instance.slots.len() {
            return Err(EngineError::InvalidConfig(format!(
                "gene length {} does not match the {} candidate door slots",
                gene.len(),
                self.instance.slots.len()
            )));
        }
        Ok(())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, EvalCache> {
        // Cache entries are plain values; a poisoned lock still holds
        // consistent data.
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn evaluate_uncached(&self, gene: &Gene) -> Result<Objectives, EngineError> {
        let num_doors = active_doors(gene);
        if num_doors == 0 {
            // Nobody can leave: worst iterations, no travel.
            return Ok(Objectives {
                num_doors: 0,
                iterations: self.instance.params.max_iterations as f64,
                distance: 0.0,
            });
        }

        let active = self.active_slots(gene);
        let mut iterations_sum = 0.0;
        let mut distance_sum = 0.0;
        for &scenario_seed in &self.instance.scenario_seeds {
            let mut scenario = Scenario::build(
                &self.instance.base_map,
                &active,
                &self.instance.specs,
                scenario_seed,
                &self.instance.params,
            )?;
            let result = Simulator::new(self.instance.simulation_seed).run(&mut scenario);
            self.simulations.fetch_add(1, Ordering::Relaxed);
            iterations_sum += result.iterations as f64;
            distance_sum += result.total_distance;
        }

        let runs = self.instance.scenario_seeds.len() as f64;
        Ok(Objectives {
            num_doors,
            iterations: iterations_sum / runs,
            distance: distance_sum / runs,
        })
    }
}

impl ChromosomeFactory for Factory {
    fn gene_length(&self) -> usize {
        self.instance.slots.len()
    }

    /// The search always minimizes the full `(num_doors, iterations,
    /// distance)` triple; an all-false gene carries the iteration cap, which
    /// keeps its zero travel distance from dominating real solutions.
    fn evaluate(&self, gene: &Gene) -> Result<Vec<f64>, EngineError> {
        let objectives = self.decode(gene)?;
        Ok(vec![
            objectives.num_doors as f64,
            objectives.iterations,
            objectives.distance,
        ])
    }

    fn evaluate_many(&self, genes: &[Gene]) -> Result<Vec<Vec<f64>>, EngineError> {
        let objectives = self.decode_many(genes)?;
        Ok(objectives
            .iter()
            .map(|obj| {
                vec![obj.num_doors as f64, obj.iterations, obj.distance]
            })
            .collect())
    }
}
