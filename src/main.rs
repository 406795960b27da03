use crate::commands::Cli;
use crate::repair::repair_directory;
use crate::util::fs::resolve_dir;
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::info;
use std::io::Write;

mod commands;
mod cue;
mod encoding;
mod repair;
mod util;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "{} - {}", record.level(), record.args()))
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    let cli = Cli::parse();
    let dir = resolve_dir(&cli.dir)?;

    let summary = repair_directory(pb, &dir, &cli.repair_options()).await?;

    let fixed = if cli.dry_run {
        format!("{} would be fixed (dry run)", summary.would_fix)
    } else {
        format!("{} fixed", summary.fixed)
    };

    info!(
        "Checked {} cue files: {fixed}, {} already correct, {} unfixable, {} skipped, {} without FILE directive",
        summary.scanned,
        summary.already_correct,
        summary.unfixable,
        summary.skipped,
        summary.not_cue_sheets
    );

    Ok(())
}
