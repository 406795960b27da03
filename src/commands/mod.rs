use crate::repair::{DEFAULT_TARGET_EXTENSION, RepairOptions};
use clap::Parser;
use std::path::PathBuf;

/// Points cue sheets at converted audio files when the referenced one no longer exists.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory with .cue files to fix, searched recursively
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    #[arg(
        long,
        env = "CUE_REPAIR_NO_BACKUP",
        help = "do not copy each cue sheet to <name>.cue.bak before rewriting it",
        default_value_t = false
    )]
    pub no_backup: bool,

    #[arg(
        long,
        short = 'n',
        env = "CUE_REPAIR_DRY_RUN",
        help = "only report which cue sheets would be fixed",
        default_value_t = false
    )]
    pub dry_run: bool,

    #[arg(
        value_name = "EXT",
        long = "target-extension",
        short = 'e',
        env = "CUE_REPAIR_TARGET_EXTENSIONS",
        value_delimiter = ',',
        help = "extension of the converted audio files, tried in the given order",
        default_value = DEFAULT_TARGET_EXTENSION
    )]
    pub target_extensions: Vec<String>,
}

impl Cli {
    pub fn repair_options(&self) -> RepairOptions {
        RepairOptions {
            backup: !self.no_backup,
            dry_run: self.dry_run,
            target_extensions: self
                .target_extensions
                .iter()
                .map(|extension| extension.trim_start_matches('.').to_string())
                .filter(|extension| !extension.is_empty())
                .collect(),
        }
    }
}
