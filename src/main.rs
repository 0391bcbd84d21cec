//! Egress CLI - run evacuations and optimize exit placements.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;

use egress::error::EngineError;
use egress::schema::{
    ALGORITHM_BRUTE, ExperimentConfig, IndividualSpec, IndividualsFile, NsgaConfig,
    nsga_algorithm_tag, records_from_front,
};
use egress::search::{self, Factory, Instance, NsgaEngine};
use egress::sim::{Scenario, Simulator, StructureMap};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let command = args[1].as_str();
    let result = match command {
        "simulate" => cmd_simulate(&args[2..]),
        "optimize-nsga" => cmd_optimize_nsga(&args[2..]),
        "optimize-brute" => cmd_optimize_brute(&args[2..]),
        "--help" | "-h" => {
            print_usage(&args[0]);
            return;
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("{command}: {err}");
        std::process::exit(err.exit_code());
    }
}

fn print_usage(program: &str) {
    eprintln!("Egress - Evacuation Optimization Engine");
    eprintln!();
    eprintln!("Usage: {program} <command> <experiment-dir> [--out <file>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  simulate <dir>         Run one evacuation on the map as authored");
    eprintln!("  optimize-nsga <dir>    Search door subsets with NSGA-II");
    eprintln!("  optimize-brute <dir>   Enumerate every door subset exhaustively");
    eprintln!();
    eprintln!("Experiment directory layout:");
    eprintln!("  map.txt            terrain grid, one ASCII digit per cell");
    eprintln!("  individuals.json   pedestrian characterizations");
    eprintln!("  experiment.json    seeds and simulator parameters");
    eprintln!("  nsga.json          NSGA-II parameters (optional)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --out <file>       Result file (default: res.json)");
    eprintln!("  --help, -h         Show this help message");
}

struct CommandArgs {
    dir: PathBuf,
    out: PathBuf,
}

fn parse_args(args: &[String], default_out: &str) -> Result<CommandArgs, EngineError> {
    let mut dir = None;
    let mut out = PathBuf::from(default_out);

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                let value = args.get(i + 1).ok_or_else(|| {
                    EngineError::InvalidConfig("--out requires a file path".into())
                })?;
                out = PathBuf::from(value);
                i += 2;
            }
            other if dir.is_none() => {
                dir = Some(PathBuf::from(other));
                i += 1;
            }
            other => {
                return Err(EngineError::InvalidConfig(format!(
                    "unexpected argument '{other}'"
                )));
            }
        }
    }

    let dir = dir.ok_or_else(|| {
        EngineError::InvalidConfig("missing experiment directory argument".into())
    })?;
    Ok(CommandArgs { dir, out })
}

struct Experiment {
    map: StructureMap,
    specs: Vec<IndividualSpec>,
    config: ExperimentConfig,
}

fn load_experiment(dir: &Path) -> Result<Experiment, EngineError> {
    let map_text = fs::read_to_string(dir.join("map.txt"))?;
    let map = StructureMap::parse(&map_text)?;

    let individuals_text = fs::read_to_string(dir.join("individuals.json"))?;
    let specs: Vec<IndividualSpec> =
        serde_json::from_str::<IndividualsFile>(&individuals_text)?.into_specs();

    let config_text = fs::read_to_string(dir.join("experiment.json"))?;
    let config: ExperimentConfig = serde_json::from_str(&config_text)?;
    config.validate()?;

    Ok(Experiment { map, specs, config })
}

fn load_nsga_config(dir: &Path) -> Result<NsgaConfig, EngineError> {
    let path = dir.join("nsga.json");
    if !path.exists() {
        info!("no nsga.json in the experiment directory, using defaults");
        return Ok(NsgaConfig::default());
    }
    let config: NsgaConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
    config.validate()?;
    Ok(config)
}

fn cmd_simulate(args: &[String]) -> Result<(), EngineError> {
    let args = parse_args(args, "simulation.json")?;
    let experiment = load_experiment(&args.dir)?;

    let slots = egress::sim::discover_door_slots(&experiment.map);
    let scenario_seed = experiment.config.scenario_seed.seeds()[0];

    println!("Egress Simulation");
    println!("=================");
    println!(
        "Grid: {}x{} ({} doors, {} individuals)",
        experiment.map.rows(),
        experiment.map.cols(),
        slots.len(),
        experiment.specs.iter().map(|s| s.amount).sum::<u32>()
    );

    let start = Instant::now();
    let mut scenario = Scenario::build(
        &experiment.map,
        &slots,
        &experiment.specs,
        scenario_seed,
        &experiment.config.simulation,
    )?;
    let result = Simulator::new(experiment.config.simulation_seed).run(&mut scenario);

    println!();
    println!("Iterations: {}", result.iterations);
    println!("Total distance: {:.2}", result.total_distance);
    println!(
        "Evacuated: {}/{}",
        result.evacuated_count,
        scenario.population()
    );
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());

    let record = serde_json::json!({
        "iterations": result.iterations,
        "distance": result.total_distance,
        "evacuated_count": result.evacuated_count,
    });
    write_json_atomic(&args.out, &record)?;
    println!("Result saved: {}", args.out.display());
    Ok(())
}

fn cmd_optimize_nsga(args: &[String]) -> Result<(), EngineError> {
    let args = parse_args(args, "res.json")?;
    let experiment = load_experiment(&args.dir)?;
    let mut nsga_config = load_nsga_config(&args.dir)?;
    // The experiment file may force the objective mode for every driver.
    nsga_config.use_three_objectives =
        nsga_config.use_three_objectives || experiment.config.use_three_objectives;

    let mut config = experiment.config.clone();
    config.use_three_objectives = nsga_config.use_three_objectives;

    let instance = Instance::new(experiment.map, experiment.specs, &config)?;
    let factory = Factory::new(instance)?;

    println!(
        "Starting NSGA-II: {} individuals over {} generations...",
        nsga_config.population_size, nsga_config.generations
    );

    let start = Instant::now();
    let tag = nsga_algorithm_tag(nsga_config.use_three_objectives);
    let mut engine = NsgaEngine::new(&factory, nsga_config)?;
    let outcome = engine.run()?;

    info!(
        "cache statistics: {} configurations cached, {} simulations run",
        factory.cache_len(),
        factory.simulations_run()
    );

    let records = records_from_front(&outcome.front, &factory, tag)?;
    write_json_atomic(&args.out, &records)?;

    println!(
        "Optimization finished{}: {} solutions saved to {} ({:.2}s)",
        if outcome.cancelled { " (cancelled)" } else { "" },
        records.len(),
        args.out.display(),
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

fn cmd_optimize_brute(args: &[String]) -> Result<(), EngineError> {
    let args = parse_args(args, "res.json")?;
    let experiment = load_experiment(&args.dir)?;

    let config = experiment.config.clone();
    let instance = Instance::new(experiment.map, experiment.specs, &config)?;
    let factory = Factory::new(instance)?;

    println!(
        "Starting brute force over {} candidate door slots...",
        factory.instance.slots().len()
    );

    let start = Instant::now();
    let front = search::enumerate(&factory)?;

    info!(
        "cache statistics: {} configurations cached, {} simulations run",
        factory.cache_len(),
        factory.simulations_run()
    );

    let records = records_from_front(&front, &factory, ALGORITHM_BRUTE)?;
    write_json_atomic(&args.out, &records)?;

    println!(
        "Enumeration finished: {} solutions saved to {} ({:.2}s)",
        records.len(),
        args.out.display(),
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

/// Write JSON through a temporary file and rename, so readers never see a
/// half-written result.
fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), EngineError> {
    let text = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
