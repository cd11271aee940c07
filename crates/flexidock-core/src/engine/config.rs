use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parameters of one docking run.
///
/// The same seed against the same ligand and potential data reproduces the
/// run exactly: trial `i` draws from its own generator seeded with
/// `seed + i`, and parallelism never crosses trial boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DockingConfig {
    /// Base seed for the per-trial pseudo-random generators.
    pub seed: u64,
    /// Number of independent optimization trials.
    pub num_trials: usize,
    /// Basin-hopping generations per trial.
    pub num_generations: usize,
    /// Maximum number of ranked conformations to return.
    pub num_solutions: usize,
}

impl Default for DockingConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_trials: 64,
            num_generations: 100,
            num_solutions: 9,
        }
    }
}

impl DockingConfig {
    pub fn builder() -> DockingConfigBuilder {
        DockingConfigBuilder::default()
    }

    /// Loads and validates a configuration from a TOML file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_trials == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "num_trials",
                reason: "at least one trial is required".to_string(),
            });
        }
        if self.num_generations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "num_generations",
                reason: "at least one generation is required".to_string(),
            });
        }
        if self.num_solutions == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "num_solutions",
                reason: "at least one solution must be requested".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DockingConfigBuilder {
    seed: Option<u64>,
    num_trials: Option<usize>,
    num_generations: Option<usize>,
    num_solutions: Option<usize>,
}

impl DockingConfigBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn num_trials(mut self, n: usize) -> Self {
        self.num_trials = Some(n);
        self
    }

    pub fn num_generations(mut self, n: usize) -> Self {
        self.num_generations = Some(n);
        self
    }

    pub fn num_solutions(mut self, n: usize) -> Self {
        self.num_solutions = Some(n);
        self
    }

    /// Finishes the configuration, falling back to defaults for anything
    /// left unset.
    pub fn build(self) -> Result<DockingConfig, ConfigError> {
        let defaults = DockingConfig::default();
        let config = DockingConfig {
            seed: self.seed.unwrap_or(defaults.seed),
            num_trials: self.num_trials.unwrap_or(defaults.num_trials),
            num_generations: self.num_generations.unwrap_or(defaults.num_generations),
            num_solutions: self.num_solutions.unwrap_or(defaults.num_solutions),
        };
        config.validate()?;
        Ok(config)
    }
}
