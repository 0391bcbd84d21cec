//! Result records written for each Pareto-front member.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::search::{Chromosome, Factory};
use crate::sim::DoorSlot;

/// Algorithm tag for the 2-objective NSGA-II mode.
pub const ALGORITHM_NSGA_2OBJ: &str = "NSGA-II-Cached-2obj";
/// Algorithm tag for the 3-objective NSGA-II mode.
pub const ALGORITHM_NSGA_3OBJ: &str = "NSGA-II-Cached-3obj";
/// Algorithm tag for the brute-force enumerator.
pub const ALGORITHM_BRUTE: &str = "BruteForce";

/// Tag for the NSGA-II mode in use.
pub fn nsga_algorithm_tag(use_three_objectives: bool) -> &'static str {
    if use_three_objectives {
        ALGORITHM_NSGA_3OBJ
    } else {
        ALGORITHM_NSGA_2OBJ
    }
}

/// One Pareto solution in the output file.
///
/// `iterations` is always present as a field; it only joins `objectives`
/// in 3-objective mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub gene: Vec<bool>,
    pub door_positions_grouped: Vec<DoorSlot>,
    pub objectives: Vec<f64>,
    pub num_doors: u32,
    pub iterations: f64,
    pub distance: f64,
    pub generation: u32,
    pub algorithm: String,
}

/// Decode a front into serializable records.
///
/// Decoding goes through the factory cache, so no solution simulates again.
pub fn records_from_front(
    front: &[Chromosome],
    factory: &Factory,
    algorithm: &str,
) -> Result<Vec<SolutionRecord>, EngineError> {
    front
        .iter()
        .map(|chromosome| {
            let objectives = factory.decode(&chromosome.gene)?;
            Ok(SolutionRecord {
                gene: chromosome.gene.clone(),
                door_positions_grouped: factory.active_slots(&chromosome.gene),
                objectives: factory.objectives_vec(&objectives),
                num_doors: objectives.num_doors,
                iterations: objectives.iterations,
                distance: objectives.distance,
                generation: chromosome.generation,
                algorithm: algorithm.to_string(),
            })
        })
        .collect()
}
