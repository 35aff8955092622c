//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use idegen::{BackendId, BuildVariant, FlagCategory};

/// idegen - classify toolchain flags into IDE project settings
#[derive(Parser)]
#[command(name = "idegen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a flag description and write the project model
    Generate(GenerateArgs),

    /// Classify a single flag line and print the result
    Classify(ClassifyArgs),

    /// List back ends and the flag categories each variant accepts
    Backends(BackendsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Flag description (TOML)
    pub description: PathBuf,

    /// Back end (overrides `[project] backend`)
    #[arg(short, long, env = "IDEGEN_BACKEND")]
    pub backend: Option<BackendId>,

    /// Build variant: application or library (overrides `[project] variant`)
    #[arg(long)]
    pub variant: Option<BuildVariant>,

    /// Output directory (defaults to the description's directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Write compact JSON
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Back end whose rules to apply
    #[arg(short, long, env = "IDEGEN_BACKEND")]
    pub backend: BackendId,

    /// Build variant: application or library
    #[arg(long, default_value = "application")]
    pub variant: BuildVariant,

    /// Flag category: as, cc, cx, ld or ar
    #[arg(short, long)]
    pub category: FlagCategory,

    /// Target the line belongs to
    #[arg(short, long, default_value = "debug")]
    pub target: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Raw flag line
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub line: Vec<String>,
}

#[derive(Args)]
pub struct BackendsArgs {
    /// Also print the rule names run for each category
    #[arg(long)]
    pub rules: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
