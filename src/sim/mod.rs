//! Cellular-automaton evacuation simulator: terrain, derived fields,
//! occupancy, agents and the step loop.

pub mod constants;
mod crowd;
mod dynamic;
mod individual;
mod propagate;
mod scenario;
mod simulator;
mod static_field;
mod structure;
mod wall;

pub use crowd::CrowdMap;
pub use dynamic::DynamicMap;
pub use individual::{Individual, MoveContext};
pub use scenario::Scenario;
pub use simulator::{SimResult, Simulator};
pub use static_field::StaticMap;
pub use structure::{Direction, DoorSlot, MapBuilder, StructureMap, discover_door_slots};
pub use wall::WallMap;
