//! Configuration types for experiments, individuals and the NSGA-II driver.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::sim::constants::{
    DEFAULT_DECAY_ALPHA, DEFAULT_DIFFUSION_SIGMA, DEFAULT_MAX_ITERATIONS,
};

/// Tunable simulator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Hard cap on simulation iterations; reaching it is a result, not an
    /// error.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Per-step trail decay rate in `[0, 1]`.
    #[serde(default = "default_decay_alpha")]
    pub decay_alpha: f64,
    /// Per-step trail diffusion rate in `[0, 1]`.
    #[serde(default = "default_diffusion_sigma")]
    pub diffusion_sigma: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            decay_alpha: default_decay_alpha(),
            diffusion_sigma: default_diffusion_sigma(),
        }
    }
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}
fn default_decay_alpha() -> f64 {
    DEFAULT_DECAY_ALPHA
}
fn default_diffusion_sigma() -> f64 {
    DEFAULT_DIFFUSION_SIGMA
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_iterations == 0 {
            return Err(EngineError::InvalidConfig(
                "max_iterations must be positive".into(),
            ));
        }
        for (name, value) in [
            ("decay_alpha", self.decay_alpha),
            ("diffusion_sigma", self.diffusion_sigma),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One characterization of pedestrians: a group sharing movement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualSpec {
    #[serde(default = "default_label")]
    pub label: String,
    /// How many individuals this characterization expands to.
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(default = "default_speed")]
    pub speed: u32,
    /// Floor-field weight: pull toward exits.
    #[serde(default = "default_ks")]
    pub ks: f64,
    /// Wall-field weight.
    #[serde(default)]
    pub kw: f64,
    /// Trail-field weight.
    #[serde(default)]
    pub kd: f64,
    /// Inertia weight.
    #[serde(default)]
    pub ki: f64,
    /// Display color, unused by the engine itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[u8; 3]>,
    /// Optional fixed starting row; random placement when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Optional fixed starting column; random placement when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
}

fn default_label() -> String {
    "individual".into()
}
fn default_amount() -> u32 {
    1
}
fn default_speed() -> u32 {
    1
}
fn default_ks() -> f64 {
    1.0
}

impl IndividualSpec {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.amount == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "characterization '{}': amount must be positive",
                self.label
            )));
        }
        if self.speed == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "characterization '{}': speed must be at least 1",
                self.label
            )));
        }
        if self.row.is_some() != self.col.is_some() {
            return Err(EngineError::InvalidConfig(format!(
                "characterization '{}': row and col must be given together",
                self.label
            )));
        }
        Ok(())
    }
}

/// The individuals file accepts either a wrapping object or a bare list;
/// both normalize to the wrapped form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndividualsFile {
    Wrapped { caracterizations: Vec<IndividualSpec> },
    Bare(Vec<IndividualSpec>),
}

impl IndividualsFile {
    pub fn into_specs(self) -> Vec<IndividualSpec> {
        match self {
            IndividualsFile::Wrapped { caracterizations } => caracterizations,
            IndividualsFile::Bare(specs) => specs,
        }
    }
}

/// A scenario seed may be a single value or a list; evaluation averages over
/// the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedSpec {
    One(u64),
    Many(Vec<u64>),
}

impl Default for SeedSpec {
    fn default() -> Self {
        SeedSpec::One(0)
    }
}

impl SeedSpec {
    /// Normalized seed list; an empty list falls back to seed 0.
    pub fn seeds(&self) -> Vec<u64> {
        match self {
            SeedSpec::One(seed) => vec![*seed],
            SeedSpec::Many(seeds) if seeds.is_empty() => vec![0],
            SeedSpec::Many(seeds) => seeds.clone(),
        }
    }
}

/// Immutable description of one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub experiment: String,
    #[serde(default)]
    pub scenario_seed: SeedSpec,
    #[serde(default)]
    pub simulation_seed: u64,
    /// Frame-drawing hook flag; the engine carries it but renders nothing.
    #[serde(default)]
    pub draw: bool,
    #[serde(default)]
    pub use_three_objectives: bool,
    #[serde(default)]
    pub simulation: SimulationParams,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.experiment.is_empty() {
            return Err(EngineError::InvalidConfig(
                "experiment name must not be empty".into(),
            ));
        }
        self.simulation.validate()
    }
}

/// Parameters of the NSGA-II driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NsgaConfig {
    #[serde(default = "default_population_size")]
    pub population_size: u32,
    #[serde(default = "default_generations")]
    pub generations: u32,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default)]
    pub use_three_objectives: bool,
    /// Seed for the driver RNG; drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Stop early after this many generations without a change in the
    /// Pareto front.
    #[serde(default)]
    pub patience: Option<u32>,
}

impl Default for NsgaConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            generations: default_generations(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            use_three_objectives: false,
            seed: None,
            patience: None,
        }
    }
}

fn default_population_size() -> u32 {
    10
}
fn default_generations() -> u32 {
    300
}
fn default_crossover_rate() -> f64 {
    0.8
}
fn default_mutation_rate() -> f64 {
    0.4
}

impl NsgaConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.population_size < 2 {
            return Err(EngineError::InvalidConfig(
                "population_size must be at least 2".into(),
            ));
        }
        if self.generations == 0 {
            return Err(EngineError::InvalidConfig(
                "generations must be positive".into(),
            ));
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {rate}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn individuals_file_accepts_both_shapes() {
        let wrapped: IndividualsFile =
            serde_json::from_str(r#"{"caracterizations": [{"label": "a", "amount": 2}]}"#)
                .expect("wrapped form");
        let bare: IndividualsFile =
            serde_json::from_str(r#"[{"label": "a", "amount": 2}]"#).expect("bare form");
        assert_eq!(wrapped.into_specs(), bare.into_specs());
    }

    #[test]
    fn spec_defaults_fill_in() {
        let spec: IndividualSpec = serde_json::from_str("{}").expect("all-default spec");
        assert_eq!(spec.amount, 1);
        assert_eq!(spec.speed, 1);
        assert_eq!(spec.ks, 1.0);
        assert_eq!(spec.kw, 0.0);
        assert!(spec.row.is_none());
    }

    #[test]
    fn seed_spec_accepts_scalar_and_list() {
        let one: SeedSpec = serde_json::from_str("7").expect("scalar seed");
        let many: SeedSpec = serde_json::from_str("[1, 2, 3]").expect("seed list");
        assert_eq!(one.seeds(), vec![7]);
        assert_eq!(many.seeds(), vec![1, 2, 3]);
        assert_eq!(SeedSpec::Many(vec![]).seeds(), vec![0]);
    }

    #[test]
    fn nsga_config_rejects_bad_rates() {
        let config = NsgaConfig {
            crossover_rate: 1.5,
            ..NsgaConfig::default()
        };
        assert!(config.validate().is_err());

        let config = NsgaConfig {
            population_size: 1,
            ..NsgaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_speed_is_rejected() {
        let spec = IndividualSpec {
            speed: 0,
            ..serde_json::from_str::<IndividualSpec>("{}").expect("default spec")
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn simulation_params_bounds() {
        let params = SimulationParams {
            decay_alpha: 1.2,
            ..SimulationParams::default()
        };
        assert!(params.validate().is_err());
        assert!(SimulationParams::default().validate().is_ok());
    }
}
