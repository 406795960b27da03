use crate::cue::error::CueError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error(transparent)]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),
}

pub type RepairResult<T> = Result<T, RepairError>;
