//! Search drivers over door subsets: NSGA-II and brute-force enumeration,
//! both built on the cached gene evaluator.

mod brute;
mod factory;
mod gene;
mod nsga;

pub use brute::enumerate;
pub use factory::{ChromosomeFactory, Factory, Instance, Objectives};
pub use gene::{Chromosome, Gene, active_doors};
pub use nsga::{NsgaEngine, NsgaOutcome, crossover, cut_index, fast_non_dominated_sort};
