pub struct DefaultsConfig {
    pub scoring: String,
    pub exhaustiveness: u32,
    pub num_modes: usize,
    pub min_rmsd: f64,
    pub energy_range: f64,
    pub max_evals: u32,
    pub max_steps: u32,
    pub seed: u64,
    pub spacing: f64,
    pub engine: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            scoring: "vina".to_string(),
            exhaustiveness: 8,
            num_modes: 9,
            min_rmsd: 1.0,
            energy_range: 3.0,
            max_evals: 0,
            max_steps: 0,
            seed: 0,
            spacing: 0.375,
            engine: "vina-gpu".to_string(),
        }
    }
}
