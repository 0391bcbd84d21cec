//! Schema module - configuration and result types.

mod config;
mod result;

pub use config::{
    ExperimentConfig, IndividualSpec, IndividualsFile, NsgaConfig, SeedSpec, SimulationParams,
};
pub use result::{
    ALGORITHM_BRUTE, ALGORITHM_NSGA_2OBJ, ALGORITHM_NSGA_3OBJ, SolutionRecord,
    nsga_algorithm_tag, records_from_front,
};
