use nalgebra::{Point3, Vector3};
use phf::phf_map;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// The scoring function the docking engine evaluates poses with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScoringFunction {
    #[default]
    Vina,
    Vinardo,
    /// AutoDock 4.2 scoring on precomputed affinity maps.
    Ad4,
}

impl ScoringFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringFunction::Vina => "vina",
            ScoringFunction::Vinardo => "vinardo",
            ScoringFunction::Ad4 => "ad4",
        }
    }

    /// Returns `true` for the AD4-style scoring family, which has its own memory profile.
    pub fn is_ad4(&self) -> bool {
        matches!(self, ScoringFunction::Ad4)
    }
}

impl fmt::Display for ScoringFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vina" => Ok(ScoringFunction::Vina),
            "vinardo" => Ok(ScoringFunction::Vinardo),
            "ad4" => Ok(ScoringFunction::Ad4),
            other => Err(ConfigError::InvalidValue {
                parameter: "scoring",
                reason: format!("unknown scoring function '{}' (expected ad4, vina or vinardo)", other),
            }),
        }
    }
}

/// Recommended exhaustiveness / step-cap pairs for the named search modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPreset {
    pub exhaustiveness: u32,
    pub max_steps: u32,
}

static SEARCH_MODES: phf::Map<&'static str, SearchPreset> = phf_map! {
    "fast" => SearchPreset { exhaustiveness: 256, max_steps: 15 },
    "balance" => SearchPreset { exhaustiveness: 1024, max_steps: 20 },
    "detail" => SearchPreset { exhaustiveness: 2048, max_steps: 20 },
};

pub fn search_preset(name: &str) -> Option<&'static SearchPreset> {
    SEARCH_MODES.get(name)
}

/// Parameters shared by every GPU invocation of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Search intensity; also drives the per-ligand term of the memory model.
    pub exhaustiveness: u32,
    pub num_modes: usize,
    pub min_rmsd: f64,
    pub energy_range: f64,
    /// Evaluations per Monte Carlo run, 0 for the engine's heuristic.
    pub max_evals: u32,
    /// Steps per Monte Carlo run, 0 for the engine's heuristic.
    pub max_steps: u32,
    pub seed: u64,
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    exhaustiveness: Option<u32>,
    num_modes: Option<usize>,
    min_rmsd: Option<f64>,
    energy_range: Option<f64>,
    max_evals: Option<u32>,
    max_steps: Option<u32>,
    seed: Option<u64>,
    search_mode: Option<String>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exhaustiveness(mut self, exhaustiveness: u32) -> Self {
        self.exhaustiveness = Some(exhaustiveness);
        self
    }
    pub fn num_modes(mut self, n: usize) -> Self {
        self.num_modes = Some(n);
        self
    }
    pub fn min_rmsd(mut self, rmsd: f64) -> Self {
        self.min_rmsd = Some(rmsd);
        self
    }
    pub fn energy_range(mut self, range: f64) -> Self {
        self.energy_range = Some(range);
        self
    }
    pub fn max_evals(mut self, evals: u32) -> Self {
        self.max_evals = Some(evals);
        self
    }
    pub fn max_steps(mut self, steps: u32) -> Self {
        self.max_steps = Some(steps);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    /// A named preset; it overrides exhaustiveness and max steps at build time.
    pub fn search_mode(mut self, mode: Option<String>) -> Self {
        self.search_mode = mode;
        self
    }

    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let mut exhaustiveness = self
            .exhaustiveness
            .ok_or(ConfigError::MissingParameter("exhaustiveness"))?;
        let mut max_steps = self
            .max_steps
            .ok_or(ConfigError::MissingParameter("max_steps"))?;

        if let Some(mode) = &self.search_mode {
            let preset = search_preset(mode).ok_or_else(|| ConfigError::InvalidValue {
                parameter: "search_mode",
                reason: format!("unknown mode '{}' (expected fast, balance or detail)", mode),
            })?;
            exhaustiveness = preset.exhaustiveness;
            max_steps = preset.max_steps;
        }

        if exhaustiveness == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "exhaustiveness",
                reason: "must be at least 1".to_string(),
            });
        }

        let num_modes = self
            .num_modes
            .ok_or(ConfigError::MissingParameter("num_modes"))?;
        if num_modes == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "num_modes",
                reason: "must be at least 1".to_string(),
            });
        }

        let min_rmsd = self
            .min_rmsd
            .ok_or(ConfigError::MissingParameter("min_rmsd"))?;
        let energy_range = self
            .energy_range
            .ok_or(ConfigError::MissingParameter("energy_range"))?;
        for (parameter, value) in [("min_rmsd", min_rmsd), ("energy_range", energy_range)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    parameter,
                    reason: format!("must be a non-negative number, got {}", value),
                });
            }
        }

        Ok(SearchConfig {
            exhaustiveness,
            num_modes,
            min_rmsd,
            energy_range,
            max_evals: self
                .max_evals
                .ok_or(ConfigError::MissingParameter("max_evals"))?,
            max_steps,
            seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
        })
    }
}

/// The docking box, in Angstroms.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    pub center: Point3<f64>,
    pub size: Vector3<f64>,
    pub spacing: f64,
}

impl SearchSpace {
    pub fn new(center: Point3<f64>, size: Vector3<f64>, spacing: f64) -> Result<Self, ConfigError> {
        if size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "size",
                reason: format!("box dimensions must be positive, got {:?}", size.as_slice()),
            });
        }
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "spacing",
                reason: format!("grid spacing must be positive, got {}", spacing),
            });
        }
        Ok(Self {
            center,
            size,
            spacing,
        })
    }
}

/// Everything the screening workflow needs besides the ligand list and the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub search: SearchConfig,
    pub scoring: ScoringFunction,
    pub output_dir: PathBuf,
    /// User-supplied device memory ceiling in MiB; it can only tighten the budget.
    pub memory_limit_mib: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
            .exhaustiveness(8)
            .num_modes(9)
            .min_rmsd(1.0)
            .energy_range(3.0)
            .max_evals(0)
            .max_steps(0)
            .seed(42)
    }

    #[test]
    fn build_with_all_parameters_succeeds() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.exhaustiveness, 8);
        assert_eq!(config.num_modes, 9);
        assert_eq!(config.max_steps, 0);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn build_reports_missing_parameter() {
        let result = SearchConfigBuilder::new().exhaustiveness(8).max_steps(0).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("num_modes")));
    }

    #[test]
    fn search_mode_overrides_exhaustiveness_and_steps() {
        let config = complete_builder()
            .search_mode(Some("balance".to_string()))
            .build()
            .unwrap();
        assert_eq!(config.exhaustiveness, 1024);
        assert_eq!(config.max_steps, 20);

        let fast = complete_builder()
            .search_mode(Some("fast".to_string()))
            .build()
            .unwrap();
        assert_eq!((fast.exhaustiveness, fast.max_steps), (256, 15));
    }

    #[test]
    fn unknown_search_mode_is_rejected() {
        let result = complete_builder()
            .search_mode(Some("thorough".to_string()))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                parameter: "search_mode",
                ..
            })
        ));
    }

    #[test]
    fn zero_exhaustiveness_is_rejected() {
        let result = complete_builder().exhaustiveness(0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                parameter: "exhaustiveness",
                ..
            })
        ));
    }

    #[test]
    fn scoring_function_parses_case_insensitively() {
        assert_eq!("vina".parse(), Ok(ScoringFunction::Vina));
        assert_eq!("Vinardo".parse(), Ok(ScoringFunction::Vinardo));
        assert_eq!("AD4".parse(), Ok(ScoringFunction::Ad4));
        assert!("dock6".parse::<ScoringFunction>().is_err());
        assert!(ScoringFunction::Ad4.is_ad4());
        assert!(!ScoringFunction::Vinardo.is_ad4());
        assert_eq!(ScoringFunction::Vinardo.to_string(), "vinardo");
    }

    #[test]
    fn search_space_rejects_non_positive_dimensions() {
        let center = Point3::new(0.0, 0.0, 0.0);
        assert!(SearchSpace::new(center, Vector3::new(20.0, 20.0, 20.0), 0.375).is_ok());
        assert!(SearchSpace::new(center, Vector3::new(20.0, 0.0, 20.0), 0.375).is_err());
        assert!(SearchSpace::new(center, Vector3::new(20.0, 20.0, 20.0), 0.0).is_err());
    }
}
