use super::defaults::DefaultsConfig;
use super::file::{FileBoxConfig, FileConfig};
use super::models::{AppConfig, EngineSettings, ReceptorSource};
use crate::cli::{CampaignArgs, ExecutionArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use nalgebra::{Point3, Vector3};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use vbatch::engine::config::{
    ScoringFunction, ScreenConfig, SearchConfigBuilder, SearchSpace,
};
use vbatch::engine::cost::MemoryCostModel;

/// Resolves the final configuration. Precedence, highest first: `-S` overrides, CLI
/// flags, the TOML file, built-in defaults.
///
/// `execution` is present for commands that run the docking engine; it makes the output
/// directory, the engine program and (with a receptor) the search box mandatory.
pub fn build_config(args: &CampaignArgs, execution: Option<&ExecutionArgs>) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let mut file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let mut overrides = apply_set_values(FileConfig::default(), &args.set_values)?;

    let scoring_name = overrides
        .scoring
        .take()
        .or_else(|| args.scoring.clone())
        .or(file_config.scoring.take())
        .unwrap_or(defaults.scoring.clone());
    let scoring =
        ScoringFunction::from_str(&scoring_name).map_err(|e| CliError::Config(e.to_string()))?;

    let receptor = ReceptorSource {
        receptor: args.receptor.clone().or(file_config.receptor.take()),
        flex: args.flex.clone().or(file_config.flex.take()),
        maps: args.maps.clone().or(file_config.maps.take()),
    };
    validate_receptor_source(scoring, &receptor)?;

    let ligands = resolve_ligands(args, &mut file_config)?;

    let search_file = file_config.search.take().unwrap_or_default();
    let search_set = overrides.search.take().unwrap_or_default();
    let search = SearchConfigBuilder::new()
        .exhaustiveness(
            search_set
                .exhaustiveness
                .or(args.exhaustiveness)
                .or(search_file.exhaustiveness)
                .unwrap_or(defaults.exhaustiveness),
        )
        .num_modes(
            search_set
                .num_modes
                .or(args.num_modes)
                .or(search_file.num_modes)
                .unwrap_or(defaults.num_modes),
        )
        .min_rmsd(
            search_set
                .min_rmsd
                .or(args.min_rmsd)
                .or(search_file.min_rmsd)
                .unwrap_or(defaults.min_rmsd),
        )
        .energy_range(
            search_set
                .energy_range
                .or(args.energy_range)
                .or(search_file.energy_range)
                .unwrap_or(defaults.energy_range),
        )
        .max_evals(
            search_set
                .max_evals
                .or(args.max_evals)
                .or(search_file.max_evals)
                .unwrap_or(defaults.max_evals),
        )
        .max_steps(
            search_set
                .max_steps
                .or(args.max_step)
                .or(search_file.max_steps)
                .unwrap_or(defaults.max_steps),
        )
        .seed(
            search_set
                .seed
                .or(args.seed)
                .or(search_file.seed)
                .unwrap_or(defaults.seed),
        )
        .search_mode(
            search_set
                .mode
                .or_else(|| args.search_mode.clone())
                .or(search_file.mode),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let memory_limit_mib = overrides
        .max_gpu_memory
        .or(args.max_gpu_memory)
        .or(file_config.max_gpu_memory);
    if let Some(limit) = memory_limit_mib {
        if !limit.is_finite() || limit < 0.0 {
            return Err(CliError::Config(format!(
                "max-gpu-memory must be a non-negative number of MiB, got {}",
                limit
            )));
        }
    }

    let cost_model = match args.cost_model.clone().or(file_config.cost_model.take()) {
        Some(path) => {
            debug!("Loading cost model coefficients from {:?}", path);
            MemoryCostModel::load(&path).map_err(|e| CliError::FileParsing {
                path,
                source: e.into(),
            })?
        }
        None => MemoryCostModel::default(),
    };

    let output_dir = overrides
        .output_dir
        .take()
        .or_else(|| execution.and_then(|e| e.dir.clone()))
        .or(file_config.output_dir.take());

    let engine = match execution {
        Some(execution) => {
            let output_dir = output_dir.as_deref().ok_or_else(|| {
                CliError::Config(
                    "An output directory is required (--dir or `output-dir`).".to_string(),
                )
            })?;
            ensure_directory(output_dir)?;

            let box_set = overrides.search_box.take().unwrap_or_default();
            let box_file = file_config.search_box.take().unwrap_or_default();
            let search_space = resolve_search_space(
                args,
                &box_set,
                &box_file,
                defaults.spacing,
                receptor.receptor.is_some(),
            )?;

            let engine_set = overrides.engine.take().unwrap_or_default();
            let engine_file = file_config.engine.take().unwrap_or_default();
            Some(EngineSettings {
                program: engine_set
                    .program
                    .or_else(|| execution.engine.clone())
                    .or(engine_file.program)
                    .unwrap_or_else(|| PathBuf::from(&defaults.engine)),
                args: engine_file.args,
                cpu: engine_set.cpu.or(execution.cpu).or(engine_file.cpu),
                search_space,
            })
        }
        None => None,
    };

    Ok(AppConfig {
        ligands,
        receptor,
        screen: ScreenConfig {
            search,
            scoring,
            output_dir: output_dir.unwrap_or_else(|| PathBuf::from(".")),
            memory_limit_mib,
        },
        cost_model,
        engine,
    })
}

fn validate_receptor_source(scoring: ScoringFunction, source: &ReceptorSource) -> Result<()> {
    if source.receptor.is_some() && source.maps.is_some() {
        return Err(CliError::Config(
            "Mixing a rigid receptor and affinity maps is not supported; use --receptor or --maps."
                .to_string(),
        ));
    }
    match scoring {
        ScoringFunction::Ad4 => {
            if source.receptor.is_some() {
                return Err(CliError::Config(
                    "ad4 scoring works on precomputed maps; --receptor is not supported.".to_string(),
                ));
            }
            if source.maps.is_none() {
                return Err(CliError::Config(
                    "ad4 scoring requires affinity maps (--maps).".to_string(),
                ));
            }
        }
        ScoringFunction::Vina | ScoringFunction::Vinardo => {
            if source.receptor.is_none() && source.maps.is_none() {
                return Err(CliError::Config(format!(
                    "{} scoring requires a receptor (--receptor) or affinity maps (--maps).",
                    scoring
                )));
            }
        }
    }
    Ok(())
}

fn resolve_ligands(args: &CampaignArgs, file_config: &mut FileConfig) -> Result<Vec<PathBuf>> {
    let mut ligands = if args.ligands.is_empty() {
        std::mem::take(&mut file_config.ligands)
    } else {
        args.ligands.clone()
    };

    if let Some(index) = args.ligand_index.clone().or(file_config.ligand_index.take()) {
        let content = std::fs::read_to_string(&index).map_err(|e| CliError::FileParsing {
            path: index.clone(),
            source: e.into(),
        })?;
        let listed = parser::parse_ligand_index(&content);
        debug!("Ligand index {:?} lists {} ligand(s).", index, listed.len());
        ligands.extend(listed);
    }

    if ligands.is_empty() {
        return Err(CliError::Config(
            "At least one ligand is required (--ligand or --ligand-index).".to_string(),
        ));
    }
    Ok(ligands)
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Output directory does not exist: {}", path.display()),
        )));
    }
    Ok(())
}

fn merge_triplet(
    name: &str,
    components: [Option<f64>; 3],
    set_val: Option<[f64; 3]>,
    file_val: Option<[f64; 3]>,
) -> Result<Option<[f64; 3]>> {
    if let Some(value) = set_val {
        return Ok(Some(value));
    }
    let merged: Vec<Option<f64>> = components
        .iter()
        .enumerate()
        .map(|(i, c)| c.or(file_val.map(|v| v[i])))
        .collect();
    match merged.as_slice() {
        [Some(x), Some(y), Some(z)] => Ok(Some([*x, *y, *z])),
        [None, None, None] => Ok(None),
        _ => Err(CliError::Config(format!(
            "Search box {} needs all three components (x, y and z).",
            name
        ))),
    }
}

fn resolve_search_space(
    args: &CampaignArgs,
    set_val: &FileBoxConfig,
    file_val: &FileBoxConfig,
    default_spacing: f64,
    required: bool,
) -> Result<Option<SearchSpace>> {
    let center = merge_triplet(
        "center",
        [args.center_x, args.center_y, args.center_z],
        set_val.center,
        file_val.center,
    )?;
    let size = merge_triplet(
        "size",
        [args.size_x, args.size_y, args.size_z],
        set_val.size,
        file_val.size,
    )?;
    let spacing = set_val
        .spacing
        .or(args.spacing)
        .or(file_val.spacing)
        .unwrap_or(default_spacing);

    match (center, size) {
        (Some(c), Some(s)) => SearchSpace::new(
            Point3::new(c[0], c[1], c[2]),
            Vector3::new(s[0], s[1], s[2]),
            spacing,
        )
        .map(Some)
        .map_err(|e| CliError::Config(e.to_string())),
        (None, None) if !required => Ok(None),
        _ => Err(CliError::Config(
            "Docking against a receptor requires a search box (--center-x/y/z and --size-x/y/z)."
                .to_string(),
        )),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn parse_triplet(key: &str, value: &str) -> Result<[f64; 3]> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|v| parse_value(key, v.trim(), "float"))
        .collect::<Result<_>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(CliError::Config(format!(
            "Invalid value for {}: '{}'. Expected X,Y,Z.",
            key, value
        ))),
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value_str) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "scoring" => config.scoring = Some(value_str.to_string()),
            "output-dir" => config.output_dir = Some(PathBuf::from(value_str)),
            "max-gpu-memory" => {
                config.max_gpu_memory = Some(parse_value(key, value_str, "float")?);
            }
            "search.exhaustiveness" => {
                config
                    .search
                    .get_or_insert_with(Default::default)
                    .exhaustiveness = Some(parse_value(key, value_str, "integer")?);
            }
            "search.num-modes" => {
                config.search.get_or_insert_with(Default::default).num_modes =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "search.min-rmsd" => {
                config.search.get_or_insert_with(Default::default).min_rmsd =
                    Some(parse_value(key, value_str, "float")?);
            }
            "search.energy-range" => {
                config.search.get_or_insert_with(Default::default).energy_range =
                    Some(parse_value(key, value_str, "float")?);
            }
            "search.max-evals" => {
                config.search.get_or_insert_with(Default::default).max_evals =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "search.max-steps" => {
                config.search.get_or_insert_with(Default::default).max_steps =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "search.seed" => {
                config.search.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "search.mode" => {
                config.search.get_or_insert_with(Default::default).mode =
                    Some(value_str.to_string());
            }
            "box.center" => {
                config.search_box.get_or_insert_with(Default::default).center =
                    Some(parse_triplet(key, value_str)?);
            }
            "box.size" => {
                config.search_box.get_or_insert_with(Default::default).size =
                    Some(parse_triplet(key, value_str)?);
            }
            "box.spacing" => {
                config.search_box.get_or_insert_with(Default::default).spacing =
                    Some(parse_value(key, value_str, "float")?);
            }
            "engine.program" => {
                config.engine.get_or_insert_with(Default::default).program =
                    Some(PathBuf::from(value_str));
            }
            "engine.cpu" => {
                config.engine.get_or_insert_with(Default::default).cpu =
                    Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn base_args() -> CampaignArgs {
        CampaignArgs {
            receptor: Some(PathBuf::from("rec.pdbqt")),
            ligands: vec![PathBuf::from("a.pdbqt")],
            ..CampaignArgs::default()
        }
    }

    fn with_box(mut args: CampaignArgs) -> CampaignArgs {
        args.center_x = Some(1.0);
        args.center_y = Some(2.0);
        args.center_z = Some(3.0);
        args.size_x = Some(20.0);
        args.size_y = Some(22.0);
        args.size_z = Some(24.0);
        args
    }

    fn execution(dir: &TempDir) -> ExecutionArgs {
        ExecutionArgs {
            dir: Some(dir.path().to_path_buf()),
            engine: None,
            cpu: None,
        }
    }

    #[test]
    fn defaults_fill_everything_not_given() {
        let app = build_config(&base_args(), None).unwrap();
        let search = &app.screen.search;
        assert_eq!(search.exhaustiveness, 8);
        assert_eq!(search.num_modes, 9);
        assert_eq!(search.min_rmsd, 1.0);
        assert_eq!(search.energy_range, 3.0);
        assert_eq!((search.max_evals, search.max_steps, search.seed), (0, 0, 0));
        assert_eq!(app.screen.scoring, ScoringFunction::Vina);
        assert_eq!(app.screen.memory_limit_mib, None);
        assert_eq!(app.cost_model, MemoryCostModel::default());
        assert!(app.engine.is_none());
    }

    #[test]
    fn set_values_beat_cli_flags_which_beat_the_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vbatch.toml");
        fs::write(
            &config_path,
            "[search]\nexhaustiveness = 16\nnum-modes = 4\nseed = 7\n",
        )
        .unwrap();

        let mut args = base_args();
        args.config = Some(config_path);
        args.exhaustiveness = Some(32);
        args.num_modes = Some(5);
        args.set_values = vec!["search.exhaustiveness=64".to_string()];

        let app = build_config(&args, None).unwrap();
        assert_eq!(app.screen.search.exhaustiveness, 64);
        assert_eq!(app.screen.search.num_modes, 5);
        assert_eq!(app.screen.search.seed, 7);
    }

    #[test]
    fn search_mode_preset_applies() {
        let mut args = base_args();
        args.search_mode = Some("detail".to_string());
        let app = build_config(&args, None).unwrap();
        assert_eq!(app.screen.search.exhaustiveness, 2048);
        assert_eq!(app.screen.search.max_steps, 20);
    }

    #[test]
    fn receptor_and_maps_are_mutually_exclusive() {
        let mut args = base_args();
        args.maps = Some("maps/rec".to_string());
        assert!(matches!(build_config(&args, None), Err(CliError::Config(_))));
    }

    #[test]
    fn vina_requires_receptor_or_maps() {
        let mut args = base_args();
        args.receptor = None;
        assert!(matches!(build_config(&args, None), Err(CliError::Config(_))));

        args.maps = Some("maps/rec".to_string());
        assert!(build_config(&args, None).is_ok());
    }

    #[test]
    fn ad4_requires_maps_and_forbids_receptor() {
        let mut args = base_args();
        args.scoring = Some("ad4".to_string());
        assert!(matches!(build_config(&args, None), Err(CliError::Config(_))));

        args.receptor = None;
        assert!(matches!(build_config(&args, None), Err(CliError::Config(_))));

        args.maps = Some("maps/rec".to_string());
        let app = build_config(&args, None).unwrap();
        assert!(app.screen.scoring.is_ad4());
    }

    #[test]
    fn ligands_are_required() {
        let mut args = base_args();
        args.ligands.clear();
        assert!(matches!(build_config(&args, None), Err(CliError::Config(_))));
    }

    #[test]
    fn ligand_index_is_appended_after_explicit_ligands() {
        let dir = tempdir().unwrap();
        let index = dir.path().join("ligands.txt");
        fs::write(&index, "b.pdbqt c.pdbqt\nd.pdbqt\n").unwrap();

        let mut args = base_args();
        args.ligand_index = Some(index);
        let app = build_config(&args, None).unwrap();
        assert_eq!(
            app.ligands,
            vec![
                PathBuf::from("a.pdbqt"),
                PathBuf::from("b.pdbqt"),
                PathBuf::from("c.pdbqt"),
                PathBuf::from("d.pdbqt"),
            ]
        );
    }

    #[test]
    fn missing_ligand_index_is_reported() {
        let mut args = base_args();
        args.ligand_index = Some(PathBuf::from("/definitely/not/here.txt"));
        assert!(matches!(
            build_config(&args, None),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn execution_requires_an_existing_output_directory() {
        let args = with_box(base_args());
        let missing = ExecutionArgs {
            dir: None,
            engine: None,
            cpu: None,
        };
        assert!(matches!(
            build_config(&args, Some(&missing)),
            Err(CliError::Config(_))
        ));

        let dir = tempdir().unwrap();
        let absent = ExecutionArgs {
            dir: Some(dir.path().join("nope")),
            engine: None,
            cpu: None,
        };
        assert!(matches!(
            build_config(&args, Some(&absent)),
            Err(CliError::Io(_))
        ));
    }

    #[test]
    fn execution_resolves_engine_and_search_box() {
        let dir = tempdir().unwrap();
        let mut exec = execution(&dir);
        exec.cpu = Some(4);
        let app = build_config(&with_box(base_args()), Some(&exec)).unwrap();

        assert_eq!(app.screen.output_dir, dir.path().to_path_buf());
        let engine = app.engine.unwrap();
        assert_eq!(engine.program, PathBuf::from("vina-gpu"));
        assert_eq!(engine.cpu, Some(4));
        let space = engine.search_space.unwrap();
        assert_eq!(space.center, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(space.size, Vector3::new(20.0, 22.0, 24.0));
        assert_eq!(space.spacing, 0.375);
    }

    #[test]
    fn receptor_docking_requires_a_complete_box() {
        let dir = tempdir().unwrap();
        let mut args = with_box(base_args());
        args.size_z = None;
        assert!(matches!(
            build_config(&args, Some(&execution(&dir))),
            Err(CliError::Config(_))
        ));

        let no_box = base_args();
        assert!(matches!(
            build_config(&no_box, Some(&execution(&dir))),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn maps_without_box_are_allowed() {
        let dir = tempdir().unwrap();
        let mut args = base_args();
        args.receptor = None;
        args.maps = Some("maps/rec".to_string());
        let app = build_config(&args, Some(&execution(&dir))).unwrap();
        assert!(app.engine.unwrap().search_space.is_none());
    }

    #[test]
    fn box_can_come_from_set_values() {
        let dir = tempdir().unwrap();
        let mut args = base_args();
        args.set_values = vec![
            "box.center=0,-1.5,2".to_string(),
            "box.size=18,18,18".to_string(),
            "box.spacing=0.5".to_string(),
        ];
        let app = build_config(&args, Some(&execution(&dir))).unwrap();
        let space = app.engine.unwrap().search_space.unwrap();
        assert_eq!(space.center, Point3::new(0.0, -1.5, 2.0));
        assert_eq!(space.spacing, 0.5);
    }

    #[test]
    fn memory_limit_and_cost_model_are_loaded() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.toml");
        let table = |name: &str, baseline: f64| {
            format!(
                "[{}]\nper-ligand = 1.0\nper-exhaustiveness-ligand = 0.0\nper-atom-pair = 0.0\nbaseline = {:.1}\n",
                name, baseline
            )
        };
        fs::write(
            &model_path,
            [
                table("high-tier-default", 10.0),
                table("high-tier-ad4", 20.0),
                table("low-tier", 30.0),
            ]
            .concat(),
        )
        .unwrap();

        let mut args = base_args();
        args.cost_model = Some(model_path);
        args.max_gpu_memory = Some(12_000.0);
        let app = build_config(&args, None).unwrap();
        assert_eq!(app.screen.memory_limit_mib, Some(12_000.0));
        assert_eq!(app.cost_model.low_tier.baseline, 30.0);
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in ["search.exhaustiveness=many", "unknown.key=1", "novalue", "box.center=1,2"] {
            let mut args = base_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_config(&args, None), Err(CliError::Config(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn negative_memory_limit_is_rejected() {
        let mut args = base_args();
        args.max_gpu_memory = Some(-1.0);
        assert!(matches!(build_config(&args, None), Err(CliError::Config(_))));
    }
}
