use std::path::PathBuf;

use thiserror::Error;

use crate::parse::ParseError;
use crate::CompileError;

/// Unified error type covering parsing, compilation, discovery, and watching.
///
/// Returned by convenience methods like
/// [`RuleFile::from_source()`](crate::RuleFile::from_source) and
/// [`RuleSetLoader::load()`](crate::RuleSetLoader::load).
#[derive(Debug, Error)]
pub enum KeyrulesError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("none of the {} configured rule directories could be read", .dirs.len())]
    NoReadableDirectory { dirs: Vec<PathBuf> },

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),
}
