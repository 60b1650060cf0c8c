use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that surface from the collector's entry points.
///
/// Only discovery of the stats root and configuration problems are fatal.
/// Per-device and per-counter failures are absorbed where they happen and
/// never show up here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to read directory {path:?}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{path:?} is not a directory")]
    NotADirectory { path: PathBuf },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("metric index {index} is out of range (have {count} metrics)")]
    MetricIndex { index: usize, count: usize },
}

/// Reasons a single counter file could not produce a value.
#[derive(Error, Debug)]
pub(crate) enum ReadError {
    #[error("unreadable: {0}")]
    Io(#[from] io::Error),
    #[error("not numeric: {0:?}")]
    Parse(String),
}
