use std::path::PathBuf;
use vbatch::engine::config::{ScreenConfig, SearchSpace};
use vbatch::engine::cost::MemoryCostModel;

/// Where receptor information comes from. At most one of `receptor` and `maps` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceptorSource {
    pub receptor: Option<PathBuf>,
    pub flex: Option<PathBuf>,
    pub maps: Option<String>,
}

/// Settings of the external docking program; only resolved for `screen`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cpu: Option<u32>,
    pub search_space: Option<SearchSpace>,
}

pub struct AppConfig {
    pub ligands: Vec<PathBuf>,
    pub receptor: ReceptorSource,
    pub screen: ScreenConfig,
    pub cost_model: MemoryCostModel,
    pub engine: Option<EngineSettings>,
}
