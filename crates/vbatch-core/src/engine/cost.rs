use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Coarse memory class of the GPU, used to select cost-model coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// 32GB-class devices (fit on a V100 32G).
    HighMemory,
    /// 16GB-class devices (fit on a T4 16G).
    LowMemory,
}

/// One linear peak-memory model:
/// `per_ligand·n + per_exhaustiveness_ligand·exhaustiveness·n + per_atom_pair·Σsize² + baseline`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Coefficients {
    pub per_ligand: f64,
    pub per_exhaustiveness_ligand: f64,
    pub per_atom_pair: f64,
    /// Device context cost of an empty batch, in MiB.
    pub baseline: f64,
}

impl Coefficients {
    #[inline]
    fn evaluate(&self, batch_size: usize, exhaustiveness: u32, aggregate_cost2: u64) -> f64 {
        let n = batch_size as f64;
        self.per_ligand * n
            + self.per_exhaustiveness_ligand * exhaustiveness as f64 * n
            + self.per_atom_pair * aggregate_cost2 as f64
            + self.baseline
    }
}

#[derive(Debug, Error)]
pub enum CostModelError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Predicts the peak device memory (MiB) of one GPU invocation.
///
/// Three coefficient sets exist: high tier with the default scoring family, high tier
/// with AD4 scoring, and low tier (which does not distinguish scoring kinds).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct MemoryCostModel {
    pub high_tier_default: Coefficients,
    pub high_tier_ad4: Coefficients,
    pub low_tier: Coefficients,
}

impl Default for MemoryCostModel {
    fn default() -> Self {
        Self {
            high_tier_default: Coefficients {
                per_ligand: 1.214869,
                per_exhaustiveness_ligand: 0.0038522,
                per_atom_pair: 0.011978,
                baseline: 20017.72,
            },
            high_tier_ad4: Coefficients {
                per_ligand: 1.911645,
                per_exhaustiveness_ligand: 0.0039108,
                per_atom_pair: 0.0792161,
                baseline: 20052.64,
            },
            low_tier: Coefficients {
                per_ligand: 1.166067,
                per_exhaustiveness_ligand: 0.0038676,
                per_atom_pair: 0.0119598,
                baseline: 5313.848,
            },
        }
    }
}

impl MemoryCostModel {
    /// Loads a full set of coefficients from a TOML file with `high-tier-default`,
    /// `high-tier-ad4` and `low-tier` tables.
    pub fn load(path: &Path) -> Result<Self, CostModelError> {
        let path_str = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| CostModelError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| CostModelError::Toml {
            path: path_str,
            source: e,
        })
    }

    pub fn coefficients(&self, tier: Tier, uses_ad4: bool) -> &Coefficients {
        match (tier, uses_ad4) {
            (Tier::HighMemory, false) => &self.high_tier_default,
            (Tier::HighMemory, true) => &self.high_tier_ad4,
            (Tier::LowMemory, _) => &self.low_tier,
        }
    }

    /// Predicted peak memory in MiB. Pure; never fails.
    pub fn predict(
        &self,
        batch_size: usize,
        exhaustiveness: u32,
        aggregate_cost2: u64,
        tier: Tier,
        uses_ad4: bool,
    ) -> f64 {
        self.coefficients(tier, uses_ad4)
            .evaluate(batch_size, exhaustiveness, aggregate_cost2)
    }

    /// The fixed overhead of an empty batch.
    pub fn baseline(&self, tier: Tier, uses_ad4: bool) -> f64 {
        self.coefficients(tier, uses_ad4).baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn empty_batch_costs_the_baseline() {
        let model = MemoryCostModel::default();
        for (tier, ad4) in [
            (Tier::HighMemory, false),
            (Tier::HighMemory, true),
            (Tier::LowMemory, false),
            (Tier::LowMemory, true),
        ] {
            assert!(close(
                model.predict(0, 8, 0, tier, ad4),
                model.baseline(tier, ad4)
            ));
        }
        assert!(close(model.baseline(Tier::HighMemory, false), 20017.72));
        assert!(close(model.baseline(Tier::HighMemory, true), 20052.64));
        assert!(close(model.baseline(Tier::LowMemory, false), 5313.848));
    }

    #[test]
    fn high_tier_default_prediction_matches_fitted_model() {
        let model = MemoryCostModel::default();
        let predicted = model.predict(1, 8, 1_102_500, Tier::HighMemory, false);
        let expected = 1.214869 + 0.0038522 * 8.0 + 0.011978 * 1_102_500.0 + 20017.72;
        assert!(close(predicted, expected));
        assert!(predicted > 33_224.0 && predicted < 33_225.0);
    }

    #[test]
    fn low_tier_ignores_scoring_kind() {
        let model = MemoryCostModel::default();
        assert_eq!(
            model.predict(12, 256, 5_000_000, Tier::LowMemory, false),
            model.predict(12, 256, 5_000_000, Tier::LowMemory, true)
        );
    }

    #[test]
    fn ad4_selects_its_own_high_tier_coefficients() {
        let model = MemoryCostModel::default();
        let vina = model.predict(10, 8, 1_000_000, Tier::HighMemory, false);
        let ad4 = model.predict(10, 8, 1_000_000, Tier::HighMemory, true);
        assert!(ad4 > vina);
    }

    #[test]
    fn prediction_is_monotonic_in_batch_size_and_cost() {
        let model = MemoryCostModel::default();
        let mut last = model.predict(0, 64, 0, Tier::HighMemory, false);
        let mut cost2 = 0u64;
        for n in 1..50usize {
            cost2 += (n as u64 * 37 + 1000).pow(2);
            let next = model.predict(n, 64, cost2, Tier::HighMemory, false);
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn load_reads_coefficients_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(
            &path,
            r#"
            [high-tier-default]
            per-ligand = 1.0
            per-exhaustiveness-ligand = 0.0
            per-atom-pair = 0.0
            baseline = 100.0

            [high-tier-ad4]
            per-ligand = 2.0
            per-exhaustiveness-ligand = 0.0
            per-atom-pair = 0.0
            baseline = 200.0

            [low-tier]
            per-ligand = 3.0
            per-exhaustiveness-ligand = 0.0
            per-atom-pair = 0.0
            baseline = 300.0
            "#,
        )
        .unwrap();

        let model = MemoryCostModel::load(&path).unwrap();
        assert!(close(model.predict(4, 8, 99, Tier::HighMemory, false), 104.0));
        assert!(close(model.predict(4, 8, 99, Tier::HighMemory, true), 208.0));
        assert!(close(model.predict(4, 8, 99, Tier::LowMemory, true), 312.0));
    }

    #[test]
    fn load_reports_missing_file_and_bad_toml() {
        let dir = tempdir().unwrap();
        let missing = MemoryCostModel::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(CostModelError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[low-tier]\nper-ligand = 1.0\n").unwrap();
        assert!(matches!(
            MemoryCostModel::load(&bad),
            Err(CostModelError::Toml { .. })
        ));
    }
}
