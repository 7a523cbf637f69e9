use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "vbatch - Memory-aware batch scheduler for GPU molecular docking campaigns.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to ingest ligands.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dock every ligand, packing as many ligands per GPU invocation as device memory allows.
    Screen(ScreenArgs),
    /// Show how the ligands would be split into batches, without docking.
    Plan(PlanArgs),
}

/// Inputs and search settings shared by `screen` and `plan`.
#[derive(Args, Debug, Clone, Default)]
pub struct CampaignArgs {
    // --- Inputs ---
    /// Rigid part of the receptor (PDBQT).
    #[arg(long, value_name = "PATH")]
    pub receptor: Option<PathBuf>,

    /// Flexible side chains, if any (PDBQT).
    #[arg(long, value_name = "PATH")]
    pub flex: Option<PathBuf>,

    /// Affinity map prefix, used instead of a receptor (required for ad4).
    #[arg(long, value_name = "PREFIX")]
    pub maps: Option<String>,

    /// Ligand file (PDBQT). Can be given multiple times.
    #[arg(short, long = "ligand", value_name = "PATH", num_args(1..))]
    pub ligands: Vec<PathBuf>,

    /// File listing ligand paths separated by whitespace.
    #[arg(long, value_name = "PATH")]
    pub ligand_index: Option<PathBuf>,

    /// Scoring function (ad4, vina or vinardo).
    #[arg(long, value_name = "NAME")]
    pub scoring: Option<String>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Search space ---
    /// X coordinate of the box center (Angstrom).
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true)]
    pub center_x: Option<f64>,
    /// Y coordinate of the box center (Angstrom).
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true)]
    pub center_y: Option<f64>,
    /// Z coordinate of the box center (Angstrom).
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true)]
    pub center_z: Option<f64>,
    /// Box size in the X dimension (Angstrom).
    #[arg(long, value_name = "FLOAT")]
    pub size_x: Option<f64>,
    /// Box size in the Y dimension (Angstrom).
    #[arg(long, value_name = "FLOAT")]
    pub size_y: Option<f64>,
    /// Box size in the Z dimension (Angstrom).
    #[arg(long, value_name = "FLOAT")]
    pub size_z: Option<f64>,
    /// Grid spacing (Angstrom).
    #[arg(long, value_name = "FLOAT")]
    pub spacing: Option<f64>,

    // --- Search ---
    /// Exhaustiveness of the global search.
    #[arg(long, value_name = "INT")]
    pub exhaustiveness: Option<u32>,

    /// Maximum number of binding modes to write per ligand.
    #[arg(long, value_name = "INT")]
    pub num_modes: Option<usize>,

    /// Minimum RMSD between output poses.
    #[arg(long, value_name = "FLOAT")]
    pub min_rmsd: Option<f64>,

    /// Maximum energy difference between the best and the worst written pose (kcal/mol).
    #[arg(long, value_name = "FLOAT")]
    pub energy_range: Option<f64>,

    /// Evaluations per Monte Carlo run (0 for the heuristic).
    #[arg(long, value_name = "INT")]
    pub max_evals: Option<u32>,

    /// Steps per Monte Carlo run (0 for the heuristic).
    #[arg(long, value_name = "INT")]
    pub max_step: Option<u32>,

    /// Explicit random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Recommended exhaustiveness and step settings (fast, balance or detail).
    #[arg(long, value_name = "MODE")]
    pub search_mode: Option<String>,

    // --- Memory ---
    /// Maximum GPU memory to plan for (MiB). Can only lower the device-derived budget.
    #[arg(long, value_name = "MIB")]
    pub max_gpu_memory: Option<f64>,

    /// TOML file with fitted peak-memory coefficients replacing the built-in ones.
    #[arg(long, value_name = "PATH")]
    pub cost_model: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.exhaustiveness=64
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `screen` subcommand.
#[derive(Args, Debug)]
pub struct ScreenArgs {
    #[command(flatten)]
    pub campaign: CampaignArgs,

    #[command(flatten)]
    pub execution: ExecutionArgs,
}

/// Options that only matter when docking actually runs.
#[derive(Args, Debug, Clone, Default)]
pub struct ExecutionArgs {
    /// Output directory for the docked poses; must exist.
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// GPU docking program accepting `--gpu_batch`.
    #[arg(short, long, value_name = "PROGRAM")]
    pub engine: Option<PathBuf>,

    /// Number of CPU threads the docking program may use.
    #[arg(long, value_name = "INT")]
    pub cpu: Option<u32>,
}

/// Arguments for the `plan` subcommand.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub campaign: CampaignArgs,

    /// Plan for a simulated device with this much free memory (MiB) instead of querying.
    #[arg(long, value_name = "MIB")]
    pub free_memory: Option<u64>,

    /// Also list the ligands of every batch.
    #[arg(long)]
    pub show_ligands: bool,
}
