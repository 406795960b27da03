use crate::cue::CueSheetFile;
use crate::cue::error::CueError;
use crate::encoding::EncodingDetector;
use crate::repair::error::{RepairError, RepairResult};
use crate::util::fs::{find_cue_files, replace_extension};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info};
use std::io;
use std::path::Path;
use tokio::fs;

pub mod error;

pub const DEFAULT_TARGET_EXTENSION: &str = "flac";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOptions {
    /// Copy every cue sheet to `<name>.bak` before rewriting it
    pub backup: bool,
    /// Report fixes without writing anything
    pub dry_run: bool,
    /// Extensions tried in order when the referenced audio file is missing
    pub target_extensions: Vec<String>,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
            target_extensions: vec![DEFAULT_TARGET_EXTENSION.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// No `FILE` directive in the sheet
    NotACueSheet,
    AlreadyCorrect,
    Unfixable { reference: String },
    Fixed { previous: String, replacement: String },
    /// Dry run found a replacement but wrote nothing
    WouldFix { previous: String, replacement: String },
    /// The sheet could not be decoded, encoded or parsed
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairSummary {
    pub scanned: usize,
    pub not_cue_sheets: usize,
    pub already_correct: usize,
    pub unfixable: usize,
    pub fixed: usize,
    pub would_fix: usize,
    pub skipped: usize,
}

impl RepairSummary {
    fn record(&mut self, outcome: &RepairOutcome) {
        self.scanned += 1;
        match outcome {
            RepairOutcome::NotACueSheet => self.not_cue_sheets += 1,
            RepairOutcome::AlreadyCorrect => self.already_correct += 1,
            RepairOutcome::Unfixable { .. } => self.unfixable += 1,
            RepairOutcome::Fixed { .. } => self.fixed += 1,
            RepairOutcome::WouldFix { .. } => self.would_fix += 1,
            RepairOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Repairs every cue sheet below `dir_path`, one file at a time.
///
/// Files that cannot be fixed are logged and counted; only I/O failures abort
/// the run.
pub async fn repair_directory(
    pb: MultiProgress,
    dir_path: &Path,
    options: &RepairOptions,
) -> RepairResult<RepairSummary> {
    match fs::metadata(dir_path).await {
        Ok(metadata) if metadata.is_dir() => {}
        _ => return Err(RepairError::NotADirectory(dir_path.to_path_buf())),
    }

    let cue_files = find_cue_files(dir_path).await?;
    debug!("Found {} cue files in {:?}", cue_files.len(), dir_path);

    let progress = pb.add(ProgressBar::new(cue_files.len() as u64));
    progress.set_style(ProgressStyle::with_template(
        "{spinner} [{bar:40}] {pos}/{len} {wide_msg}",
    )?);

    let mut detector = EncodingDetector::new();
    let mut summary = RepairSummary::default();

    for cue_path in &cue_files {
        progress.set_message(cue_path.display().to_string());

        let outcome = repair_cue_file(cue_path, options, &mut detector).await?;
        summary.record(&outcome);

        progress.inc(1);
    }

    progress.finish_and_clear();

    Ok(summary)
}

/// Points `cue_path` at a same-stem audio file when the one it references is gone.
pub async fn repair_cue_file(
    cue_path: &Path,
    options: &RepairOptions,
    detector: &mut EncodingDetector,
) -> RepairResult<RepairOutcome> {
    let sheet = CueSheetFile::new(cue_path);

    let reference = match sheet.read_reference(detector).await {
        Ok(Some(reference)) => reference,
        Ok(None) => {
            debug!("No FILE directive in {cue_path:?}, skipping");
            return Ok(RepairOutcome::NotACueSheet);
        }
        Err(err) => return skip_or_fail(cue_path, err),
    };

    let cue_dir = cue_path.parent().unwrap_or(Path::new("."));
    match audio_file_exists(&cue_dir.join(&reference)).await {
        Ok(true) => {
            debug!("{cue_path:?} already points to an existing file: {reference}");
            return Ok(RepairOutcome::AlreadyCorrect);
        }
        Ok(false) => {}
        Err(err) => {
            error!(
                "Cannot check audio file. Cue file: {}, current audio file set: {reference}, {err}",
                cue_path.display()
            );
            return Ok(RepairOutcome::Unfixable { reference });
        }
    }

    let mut replacement = None;
    for extension in &options.target_extensions {
        let candidate = replace_extension(&reference, extension);
        match audio_file_exists(&cue_dir.join(&candidate)).await {
            Ok(true) => {
                replacement = Some(candidate);
                break;
            }
            Ok(false) => {}
            Err(err) => debug!("Cannot check candidate {candidate} for {cue_path:?}: {err}"),
        }
    }

    let Some(replacement) = replacement else {
        error!(
            "Target audio file not found. Cue file: {}, current audio file set: {reference}",
            cue_path.display()
        );
        return Ok(RepairOutcome::Unfixable { reference });
    };

    if options.dry_run {
        info!(
            "Dry run. Cue file: {}, current audio file set: {reference}, would set: {replacement}",
            cue_path.display()
        );
        return Ok(RepairOutcome::WouldFix {
            previous: reference,
            replacement,
        });
    }

    if let Err(err) = sheet
        .write_reference(&replacement, options.backup, detector)
        .await
    {
        return skip_or_fail(cue_path, err);
    }

    info!(
        "Cue file: {}, previous audio file set: {reference}, new audio file set: {replacement}",
        sheet.path().display()
    );

    Ok(RepairOutcome::Fixed {
        previous: reference,
        replacement,
    })
}

/// Only a missing file counts as absent; a reference the filesystem rejects
/// (name too long, a path through a regular file) is returned as an error.
async fn audio_file_exists(path: &Path) -> io::Result<bool> {
    match fs::try_exists(path).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        result => result,
    }
}

/// Text problems only affect the sheet at hand, anything else ends the run.
fn skip_or_fail(cue_path: &Path, err: CueError) -> RepairResult<RepairOutcome> {
    match err {
        CueError::Undecodable { .. }
        | CueError::Unencodable { .. }
        | CueError::MalformedFileDirective(_) => {
            error!("Cannot process cue file: {}, {err}", cue_path.display());
            Ok(RepairOutcome::Skipped)
        }
        err => Err(err.into()),
    }
}
