//! A coarse, fatal-error taxonomy, distinguished only enough for the
//! `mrcoordinator` binary to pick an exit code. Everywhere else in the
//! crate, errors propagate as plain `anyhow::Result<T>` with `?`, matching
//! the reference engine's style.

use std::fmt;

/// A coarse classification of a fatal error, used at the CLI boundary.
#[derive(Debug)]
pub enum MrError {
    /// Missing/unreadable config file, non-integer counts, or an unknown
    /// `application` name. No job state is created.
    Config(String),
    /// The input corpus could not be read during splitting. No temporary
    /// state persists.
    InputUnreadable(String),
    /// The sibling `mrworker` binary could not be spawned.
    WorkerSpawn(String),
    /// A worker emitted a malformed wire-protocol line.
    Protocol(String),
}

impl fmt::Display for MrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MrError::Config(msg) => write!(f, "configuration error: {msg}"),
            MrError::InputUnreadable(msg) => write!(f, "input unreadable: {msg}"),
            MrError::WorkerSpawn(msg) => write!(f, "failed to spawn worker: {msg}"),
            MrError::Protocol(msg) => write!(f, "worker protocol error: {msg}"),
        }
    }
}

impl std::error::Error for MrError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let e = MrError::Config("missing input_file".to_string());
        assert_eq!(
            e.to_string(),
            "configuration error: missing input_file"
        );
    }
}
