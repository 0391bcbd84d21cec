//! Benchmarks for the simulator step loop and the search drivers.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use egress::schema::{ExperimentConfig, IndividualSpec, NsgaConfig, SeedSpec, SimulationParams};
use egress::search::{Factory, Instance, NsgaEngine};
use egress::sim::{Scenario, Simulator, StructureMap, discover_door_slots};

/// Open room with walls on the border and doors spread along the bottom.
fn room(size: usize, doors: usize) -> String {
    let mut rows = Vec::with_capacity(size);
    for r in 0..size {
        let mut row = String::with_capacity(size);
        for c in 0..size {
            let border = r == 0 || c == 0 || r == size - 1 || c == size - 1;
            let door_spacing = size / (doors + 1);
            let is_door = r == size - 1 && c % door_spacing == 0 && c > 0 && c < size - 1;
            row.push(if is_door {
                '2'
            } else if border {
                '1'
            } else {
                '0'
            });
        }
        rows.push(row);
    }
    rows.join("\n")
}

fn crowd(amount: u32) -> Vec<IndividualSpec> {
    let spec: IndividualSpec = serde_json::from_str(&format!(
        r#"{{"label": "crowd", "amount": {amount}, "ks": 2.0, "kw": 0.2, "kd": 0.1}}"#
    ))
    .expect("valid spec");
    vec![spec]
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_run");

    for size in [16, 32, 64] {
        let map = StructureMap::parse(&room(size, 3)).expect("valid map");
        let slots = discover_door_slots(&map);
        let specs = crowd((size * size / 16) as u32);
        let params = SimulationParams::default();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}x{size}")),
            &size,
            |b, _| {
                b.iter(|| {
                    let mut scenario =
                        Scenario::build(&map, &slots, &specs, 1, &params).expect("builds");
                    let result = Simulator::new(42).run(&mut scenario);
                    black_box(result)
                });
            },
        );
    }

    group.finish();
}

fn bench_nsga(c: &mut Criterion) {
    let map = StructureMap::parse(&room(24, 5)).expect("valid map");
    let config = ExperimentConfig {
        experiment: "bench".into(),
        scenario_seed: SeedSpec::One(1),
        simulation_seed: 42,
        draw: false,
        use_three_objectives: false,
        simulation: SimulationParams::default(),
    };
    let instance = Instance::new(map, crowd(20), &config).expect("instance");
    let factory = Factory::new(instance).expect("factory");

    c.bench_function("nsga_short_run", |b| {
        b.iter(|| {
            let nsga = NsgaConfig {
                population_size: 8,
                generations: 3,
                seed: Some(7),
                ..NsgaConfig::default()
            };
            let mut engine = NsgaEngine::new(&factory, nsga).expect("engine");
            black_box(engine.run().expect("runs"))
        });
    });
}

criterion_group!(benches, bench_simulation, bench_nsga);
criterion_main!(benches);
