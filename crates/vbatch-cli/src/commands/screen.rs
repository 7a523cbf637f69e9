use crate::cli::ScreenArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use vbatch::{
    core::io::pdbqt::PdbqtFile,
    engine::{
        device::NvidiaSmi,
        output::PdbqtPoseWriter,
        process::{ProcessEngine, ProcessEngineConfig},
        progress::ProgressReporter,
        snapshot::EngineSnapshot,
    },
    workflows::{self, screen::ScreenContext},
};
use tracing::{info, warn};

pub fn run(args: ScreenArgs) -> Result<()> {
    info!("Resolving configuration from file, CLI arguments and overrides...");
    let config = build_config(&args.campaign, Some(&args.execution))?;
    let engine_settings = config.engine.ok_or_else(|| {
        CliError::Config("The docking engine could not be configured.".to_string())
    })?;

    info!(
        "Preparing docking engine {:?} for {} ligand source(s).",
        engine_settings.program,
        config.ligands.len()
    );
    let engine = ProcessEngine::prepare(&ProcessEngineConfig {
        program: engine_settings.program,
        program_args: Vec::new(),
        receptor: config.receptor.receptor,
        flex: config.receptor.flex,
        maps: config.receptor.maps,
        scoring: config.screen.scoring,
        search_space: engine_settings.search_space,
        cpu: engine_settings.cpu,
        extra_args: engine_settings.args,
    })?;
    let receptor_atoms = engine.receptor_atoms();

    let snapshot = EngineSnapshot::new(engine);
    let writer = PdbqtPoseWriter::new(
        config.screen.search.num_modes,
        config.screen.search.energy_range,
    );
    let device = NvidiaSmi::new();
    let context = ScreenContext {
        loader: &PdbqtFile,
        device: &device,
        cost_model: &config.cost_model,
        snapshot: &snapshot,
        writer: &writer,
        receptor_atoms,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting docking campaign...");
    info!("Invoking the core screening workflow...");
    let summary = workflows::screen::run(&config.ligands, &context, &config.screen, &reporter)?;

    if summary.total_jobs == 0 {
        warn!("Workflow completed but no ligands were docked.");
        println!("Warning: no ligands were docked.");
        return Ok(());
    }

    let total_ms: u128 = summary.batches.iter().map(|b| b.elapsed.as_millis()).sum();
    println!(
        "Docked {} ligand(s) in {} batch(es) ({}ms on the device, budget {:.0}MiB).",
        summary.total_jobs,
        summary.batches.len(),
        total_ms,
        summary.budget.effective_mib
    );
    println!(
        "Wrote {} output file(s) to: {}",
        summary.outputs.len(),
        config.screen.output_dir.display()
    );
    Ok(())
}
