//! Evacuation-optimization engine.
//!
//! A floor-field cellular automaton simulates pedestrians leaving a gridded
//! floor plan, and two multi-objective drivers — a custom NSGA-II and a
//! brute-force enumerator — search over subsets of candidate exit locations,
//! trading the number of open doors against evacuation time and total travel
//! distance.
//!
//! # Architecture
//!
//! The crate is split into three main modules:
//!
//! - `schema`: configuration and result types (serde)
//! - `sim`: the cellular-automaton simulator (maps, fields, agents, loop)
//! - `search`: the drivers and the cached gene evaluator
//!
//! # Example
//!
//! ```rust,no_run
//! use egress::schema::{ExperimentConfig, NsgaConfig};
//! use egress::search::{Factory, Instance, NsgaEngine};
//! use egress::sim::StructureMap;
//!
//! let map = StructureMap::parse("11211\n10001\n10001\n11211").unwrap();
//! let config: ExperimentConfig = serde_json::from_str(
//!     r#"{"experiment": "demo", "scenario_seed": 1, "simulation_seed": 42}"#,
//! ).unwrap();
//!
//! let instance = Instance::new(map, vec![], &config).unwrap();
//! let factory = Factory::new(instance).unwrap();
//!
//! let mut engine = NsgaEngine::new(&factory, NsgaConfig::default()).unwrap();
//! let outcome = engine.run().unwrap();
//! println!("Pareto front: {} solutions", outcome.front.len());
//! ```

pub mod error;
pub mod schema;
pub mod search;
pub mod sim;

// Re-export commonly used types
pub use error::EngineError;
pub use schema::{ExperimentConfig, NsgaConfig, SolutionRecord};
pub use search::{Chromosome, Factory, Gene, Instance, NsgaEngine};
pub use sim::{Scenario, SimResult, Simulator, StructureMap};
