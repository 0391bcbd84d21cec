//! Scenario: the five maps plus the individual set for one simulation run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EngineError;
use crate::schema::{IndividualSpec, SimulationParams};

use super::crowd::CrowdMap;
use super::dynamic::DynamicMap;
use super::individual::Individual;
use super::static_field::StaticMap;
use super::structure::{DoorSlot, MapBuilder, StructureMap};
use super::wall::WallMap;

/// Everything one simulation needs: structure, derived fields, occupancy and
/// the pedestrians.
///
/// A scenario owns its buffers exclusively; it is built for one door subset
/// and one scenario seed, and must not be shared across threads. Structure,
/// wall and floor fields depend only on the active doors; crowd, trails and
/// per-individual state are reset for every simulation run.
pub struct Scenario {
    pub structure: StructureMap,
    pub wall: WallMap,
    pub static_field: StaticMap,
    pub dynamic: DynamicMap,
    pub crowd: CrowdMap,
    pub individuals: Vec<Individual>,
    pub params: SimulationParams,
    spawn_points: Vec<(usize, usize)>,
}

impl Scenario {
    /// Build a scenario with the given door subset open.
    ///
    /// The scenario RNG — seeded from `scenario_seed` — draws the starting
    /// cell of every individual without a prescribed position. It is a
    /// separate stream from the simulation RNG and the two never interleave.
    pub fn build(
        base: &StructureMap,
        active_slots: &[DoorSlot],
        specs: &[IndividualSpec],
        scenario_seed: u64,
        params: &SimulationParams,
    ) -> Result<Self, EngineError> {
        let structure = MapBuilder::new(base).with_active_slots(active_slots);
        let wall = WallMap::derive(&structure);
        let static_field = StaticMap::derive(&structure);
        let dynamic = DynamicMap::new(
            structure.rows(),
            structure.cols(),
            params.decay_alpha,
            params.diffusion_sigma,
        );

        let mut individuals = Vec::new();
        let mut fixed_positions = Vec::new();
        for spec in specs {
            spec.validate()?;
            for _ in 0..spec.amount {
                individuals.push(Individual::new(
                    spec.label.clone(),
                    spec.speed,
                    spec.ks,
                    spec.kw,
                    spec.kd,
                    spec.ki,
                ));
                fixed_positions.push(spec.row.zip(spec.col));
            }
        }

        let mut scenario_rng = StdRng::seed_from_u64(scenario_seed);
        let mut crowd = CrowdMap::new(structure.rows(), structure.cols());
        let mut spawn_points = Vec::with_capacity(individuals.len());

        // Prescribed positions claim their cells first.
        for (index, fixed) in fixed_positions.iter().enumerate() {
            if let Some((row, col)) = *fixed {
                if row >= structure.rows() || col >= structure.cols() {
                    return Err(EngineError::InvalidConfig(format!(
                        "individual {index} placed outside the grid at ({row}, {col})"
                    )));
                }
                if structure.is_blocked(row, col) || structure.is_door(row, col) {
                    return Err(EngineError::InvalidConfig(format!(
                        "individual {index} placed on a non-walkable cell at ({row}, {col})"
                    )));
                }
                crowd.place(index, row, col)?;
            }
        }

        // The rest draw uniformly from the free EMPTY cells, row-major.
        for (index, fixed) in fixed_positions.iter().enumerate() {
            let (row, col) = match *fixed {
                Some(position) => position,
                None => {
                    let free: Vec<(usize, usize)> = structure
                        .empty_cells()
                        .into_iter()
                        .filter(|&(r, c)| crowd.is_empty(r, c))
                        .collect();
                    if free.is_empty() {
                        return Err(EngineError::InvalidConfig(format!(
                            "no empty cell left to place individual {index}"
                        )));
                    }
                    let position = free[scenario_rng.gen_range(0..free.len())];
                    crowd.place(index, position.0, position.1)?;
                    position
                }
            };
            spawn_points.push((row, col));
            individuals[index].reset(row, col);
        }

        Ok(Self {
            structure,
            wall,
            static_field,
            dynamic,
            crowd,
            individuals,
            params: params.clone(),
            spawn_points,
        })
    }

    /// Number of pedestrians in the scenario.
    pub fn population(&self) -> usize {
        self.individuals.len()
    }

    /// Restore crowd, trails and individual state to the post-build state so
    /// another simulation run can start.
    pub fn reset_run_state(&mut self) -> Result<(), EngineError> {
        self.dynamic.reset();
        self.crowd = CrowdMap::new(self.structure.rows(), self.structure.cols());
        for (index, individual) in self.individuals.iter_mut().enumerate() {
            let (row, col) = self.spawn_points[index];
            individual.reset(row, col);
            self.crowd.place(index, row, col)?;
        }
        Ok(())
    }
}
