//! Simulator: drives one evacuation run over a scenario.

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::individual::MoveContext;
use super::scenario::Scenario;

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Running,
    /// Everyone evacuated.
    Done,
    /// The iteration cap was reached with people still inside.
    Capped,
}

/// Aggregate outcome of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimResult {
    pub iterations: u32,
    pub total_distance: f64,
    pub evacuated_count: u32,
}

/// Executes the step loop for one scenario.
///
/// The simulation RNG — seeded from the simulation seed — drives every
/// movement choice; scenario construction uses its own stream.
pub struct Simulator {
    rng: StdRng,
    iteration: u32,
    phase: Phase,
}

impl Simulator {
    pub fn new(simulation_seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(simulation_seed),
            iteration: 0,
            phase: Phase::Init,
        }
    }

    /// Run to completion: until everyone is out or the cap is hit.
    ///
    /// Hitting the cap is reported through the result as-is; callers must not
    /// special-case it.
    pub fn run(&mut self, scenario: &mut Scenario) -> SimResult {
        self.phase = Phase::Running;

        while self.phase == Phase::Running {
            self.step(scenario);
        }

        SimResult {
            iterations: self.iteration,
            total_distance: scenario
                .individuals
                .iter()
                .map(|individual| individual.distance)
                .sum(),
            evacuated_count: scenario
                .individuals
                .iter()
                .filter(|individual| individual.evacuated)
                .count() as u32,
        }
    }

    /// One simulator iteration: trail update, ordered movement, deposits.
    fn step(&mut self, scenario: &mut Scenario) {
        scenario.dynamic.decay_and_diffuse();

        let order = movement_order(scenario);
        let mut vacated: Vec<(usize, usize)> = Vec::new();

        for index in order {
            let speed = scenario.individuals[index].speed;
            for _ in 0..speed {
                let choice = {
                    let ctx = MoveContext {
                        structure: &scenario.structure,
                        wall: &scenario.wall,
                        static_field: &scenario.static_field,
                        dynamic: &scenario.dynamic,
                        crowd: &scenario.crowd,
                    };
                    scenario.individuals[index].choose_step(&ctx, &mut self.rng)
                };
                let Some(to) = choice else {
                    break;
                };

                let from = (
                    scenario.individuals[index].row,
                    scenario.individuals[index].col,
                );
                scenario.crowd.move_individual(index, from, to);
                vacated.push(from);

                let evacuated = {
                    let ctx = MoveContext {
                        structure: &scenario.structure,
                        wall: &scenario.wall,
                        static_field: &scenario.static_field,
                        dynamic: &scenario.dynamic,
                        crowd: &scenario.crowd,
                    };
                    scenario.individuals[index].apply_step(&ctx, to)
                };
                if evacuated {
                    scenario.crowd.remove(index, to.0, to.1);
                    break;
                }
            }
        }

        for (row, col) in vacated {
            scenario.dynamic.deposit(row, col);
        }

        self.iteration += 1;

        if scenario.individuals.iter().all(|i| i.evacuated) {
            self.phase = Phase::Done;
        } else if self.iteration >= scenario.params.max_iterations {
            self.phase = Phase::Capped;
        }
    }
}

/// Per-iteration processing order: pending individuals sorted by ascending
/// floor-field value at their current cell — whoever stands closest to an
/// exit moves first — with the individual index as the tie-break.
fn movement_order(scenario: &Scenario) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scenario.individuals.len())
        .filter(|&i| !scenario.individuals[i].evacuated)
        .collect();
    order.sort_by(|&a, &b| {
        let ia = &scenario.individuals[a];
        let ib = &scenario.individuals[b];
        scenario
            .static_field
            .value(ia.row, ia.col)
            .total_cmp(&scenario.static_field.value(ib.row, ib.col))
            .then_with(|| a.cmp(&b))
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IndividualSpec, SimulationParams};
    use crate::sim::structure::{StructureMap, discover_door_slots};

    const ROOM: &str = "11111\n10001\n10001\n10201\n11111";

    fn spec_at(row: usize, col: usize, ks: f64) -> IndividualSpec {
        IndividualSpec {
            row: Some(row),
            col: Some(col),
            ks,
            ..serde_json::from_str::<IndividualSpec>("{}").expect("default spec")
        }
    }

    fn build(text: &str, specs: &[IndividualSpec], params: &SimulationParams) -> Scenario {
        let base = StructureMap::parse(text).expect("valid map");
        let slots = discover_door_slots(&base);
        Scenario::build(&base, &slots, specs, 1, params).expect("builds")
    }

    #[test]
    fn single_individual_reaches_the_door() {
        // Two steps from the door in the corner of the room.
        let params = SimulationParams::default();
        let mut scenario = build(ROOM, &[spec_at(1, 1, 1.0)], &params);
        let result = Simulator::new(42).run(&mut scenario);
        assert_eq!(result.evacuated_count, 1);
        assert!(result.iterations <= 6, "took {} iterations", result.iterations);
        assert!(result.total_distance >= 2.0 && result.total_distance <= 6.0);
    }

    #[test]
    fn doorless_room_caps_out() {
        let params = SimulationParams {
            max_iterations: 25,
            ..SimulationParams::default()
        };
        let mut scenario = build("11111\n10001\n11111", &[spec_at(1, 2, 1.0)], &params);
        let result = Simulator::new(3).run(&mut scenario);
        assert_eq!(result.iterations, 25);
        assert_eq!(result.evacuated_count, 0);
    }

    #[test]
    fn identical_seeds_reproduce_the_run() {
        let params = SimulationParams::default();
        let specs = [spec_at(1, 1, 1.0), spec_at(2, 3, 1.0)];
        let mut a = build(ROOM, &specs, &params);
        let mut b = build(ROOM, &specs, &params);
        let ra = Simulator::new(7).run(&mut a);
        let rb = Simulator::new(7).run(&mut b);
        assert_eq!(ra, rb);
    }

    #[test]
    fn different_simulation_seeds_may_diverge_but_both_finish() {
        let params = SimulationParams::default();
        let specs = [spec_at(1, 1, 2.0), spec_at(1, 3, 2.0), spec_at(2, 2, 2.0)];
        let mut a = build(ROOM, &specs, &params);
        let mut b = build(ROOM, &specs, &params);
        let ra = Simulator::new(1).run(&mut a);
        let rb = Simulator::new(2).run(&mut b);
        assert_eq!(ra.evacuated_count, 3);
        assert_eq!(rb.evacuated_count, 3);
    }

    #[test]
    fn crowded_room_empties_without_overlaps() {
        let text = "11111\n10001\n10001\n10001\n11211";
        let specs: Vec<IndividualSpec> = (1..=3)
            .flat_map(|r| (1..=3).map(move |c| spec_at(r, c, 3.0)))
            .collect();
        let params = SimulationParams::default();
        let mut scenario = build(text, &specs, &params);
        let result = Simulator::new(11).run(&mut scenario);
        assert_eq!(result.evacuated_count, 9);
        assert!(result.iterations < params.max_iterations);
    }

    #[test]
    fn faster_individuals_cover_more_cells_per_iteration() {
        let fast = IndividualSpec {
            speed: 2,
            ..spec_at(1, 1, 50.0)
        };
        let params = SimulationParams::default();
        let mut with_fast = build(ROOM, &[fast], &params);
        let fast_result = Simulator::new(9).run(&mut with_fast);
        let mut with_slow = build(ROOM, &[spec_at(1, 1, 50.0)], &params);
        let slow_result = Simulator::new(9).run(&mut with_slow);
        assert!(fast_result.iterations <= slow_result.iterations);
    }
}
