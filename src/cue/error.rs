use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Could not decode {path:?} as {encoding}")]
    Undecodable { path: PathBuf, encoding: &'static str },

    #[error("Could not encode the new FILE line of {path:?} as {encoding}")]
    Unencodable { path: PathBuf, encoding: &'static str },

    #[error("Malformed FILE directive: {0}")]
    MalformedFileDirective(String),

    #[error("No FILE directive found in cue sheet: {0:?}")]
    NoFileDirective(PathBuf),
}

pub type CueResult<T> = Result<T, CueError>;
