//! Error types for ttymount.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Result type for ttymount operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ttymount operations.
///
/// Per-device failures are absorbed by the pipeline stages and never escape
/// [`crate::Pipeline::run`]; only configuration and handoff errors reach the
/// caller.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (directory listing, permission change, exec).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// System call error reported by `nix`.
    #[error("System call failed: {0}")]
    Sys(#[from] nix::Error),

    /// The entry exists but is not a character special file.
    #[error("Not a character device: {}", .0.display())]
    NotCharDevice(PathBuf),

    /// A device name pattern failed to compile.
    #[error("Invalid device pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Compilation error from `regex`.
        source: regex::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The consumer process could not be launched.
    #[error("Handoff failed: {0}")]
    Handoff(String),
}
