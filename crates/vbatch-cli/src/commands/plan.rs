use crate::cli::PlanArgs;
use crate::config::{build_config, models::AppConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use vbatch::{
    core::io::pdbqt::PdbqtFile,
    engine::{
        device::{DeviceQuery, NvidiaSmi, StaticDevices},
        process::receptor_atom_count,
        progress::ProgressReporter,
    },
    workflows::{self, plan::PlanSummary},
};
use tracing::info;

pub fn run(args: PlanArgs) -> Result<()> {
    info!("Resolving configuration from file, CLI arguments and overrides...");
    let config = build_config(&args.campaign, None)?;

    let receptor_atoms = receptor_atom_count(
        config.receptor.receptor.as_deref(),
        config.receptor.flex.as_deref(),
    )?;
    info!("Receptor contributes {} atom(s) to every ligand.", receptor_atoms);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summary = match args.free_memory {
        Some(free_mib) => {
            info!("Planning against a simulated device with {} MiB free.", free_mib);
            plan_with(&StaticDevices::single(free_mib, free_mib), receptor_atoms, &config, &reporter)
        }
        None => plan_with(&NvidiaSmi::new(), receptor_atoms, &config, &reporter),
    };

    print_summary(&summary, args.show_ligands);
    Ok(())
}

fn plan_with(
    device: &impl DeviceQuery,
    receptor_atoms: usize,
    config: &AppConfig,
    reporter: &ProgressReporter,
) -> PlanSummary {
    workflows::plan::run(
        &config.ligands,
        &PdbqtFile,
        device,
        &config.cost_model,
        receptor_atoms,
        &config.screen,
        reporter,
    )
}

fn print_summary(summary: &PlanSummary, show_ligands: bool) {
    println!(
        "Memory budget: {:.0}MiB ({:?} tier), {} ligand(s) in {} batch(es).",
        summary.budget.effective_mib,
        summary.budget.tier,
        summary.total_jobs,
        summary.batches.len()
    );
    for batch in &summary.batches {
        let degenerate = if batch.degenerate > 0 {
            format!(", {} unparseable", batch.degenerate)
        } else {
            String::new()
        };
        println!(
            "Batch {} size: {} (predicted {:.1}MiB{})",
            batch.index,
            batch.ligands.len(),
            batch.predicted_memory,
            degenerate
        );
        if show_ligands {
            for ligand in &batch.ligands {
                println!("  {}", ligand.display());
            }
        }
    }
}
