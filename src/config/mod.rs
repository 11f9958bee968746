pub mod file;

pub use file::ImportPlanFile;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "attendee-import")]
#[command(about = "Bulk-imports attendees from CSV, with duplicate reconciliation")]
pub struct CliArgs {
    /// CSV file with the attendees to import
    #[arg(long)]
    pub csv: PathBuf,

    /// TOML import plan (duplicate mode and column mapping)
    #[arg(long)]
    pub plan: PathBuf,

    /// JSON store snapshot; starts empty when the file does not exist yet
    #[arg(long, default_value = "./attendee-store.json")]
    pub store: PathBuf,

    /// Only print the extracted headers, as a mapping aid
    #[arg(long)]
    pub headers_only: bool,

    /// Apply the analysis to the store instead of just reviewing it
    #[arg(long)]
    pub commit: bool,

    /// Directory for the analysis result and the error report
    #[arg(long, default_value = "./output")]
    pub output_path: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}
