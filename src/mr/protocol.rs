//! The worker wire protocol: newline-delimited, tagged JSON messages a
//! worker process writes to its stdout pipe. This is the realization of the
//! status channel and (for mappers) the ancillary active-reducer-list
//! channel as a single process-local, unidirectional transport, replacing
//! `original_source/src/python/map.py`'s two `multiprocessing.Queue`
//! objects (`status_queue`, `active_reducers_queue`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::mr::error::MrError;

/// One line of the wire protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// A status transition.
    Status { state: WorkerState, ts: u64 },
    /// A mapper's active-reducer list, emitted once, immediately before its
    /// terminal `Status { state: Done, .. }` line.
    ActiveReducers { reducers: Vec<usize> },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    InProgress,
    Done,
}

impl WorkerMessage {
    /// Serializes as one self-delimiting line (no embedded newline).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).expect("WorkerMessage always serializes")
    }

    /// Parses one line of the protocol. A malformed line is a protocol
    /// error, treated by the supervisor the same as a timeout.
    pub fn from_line(line: &str) -> Result<WorkerMessage> {
        serde_json::from_str(line)
            .map_err(|e| MrError::Protocol(format!("malformed wire message {line:?}: {e}")))
            .context("parsing worker wire protocol line")
    }

    pub fn in_progress(ts: u64) -> WorkerMessage {
        WorkerMessage::Status {
            state: WorkerState::InProgress,
            ts,
        }
    }

    pub fn done(ts: u64) -> WorkerMessage {
        WorkerMessage::Status {
            state: WorkerState::Done,
            ts,
        }
    }

    pub fn active_reducers(mut reducers: Vec<usize>) -> WorkerMessage {
        reducers.sort_unstable();
        reducers.dedup();
        WorkerMessage::ActiveReducers { reducers }
    }
}

/// Current Unix time in seconds, used for the `ts` field on status messages.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_a_line() {
        let msg = WorkerMessage::in_progress(100);
        let line = msg.to_line();
        assert!(!line.contains('\n'));
        assert_eq!(WorkerMessage::from_line(&line).unwrap(), msg);
    }

    #[test]
    fn active_reducers_sorted_and_deduped() {
        let msg = WorkerMessage::active_reducers(vec![3, 1, 1, 2]);
        assert_eq!(
            msg,
            WorkerMessage::ActiveReducers {
                reducers: vec![1, 2, 3]
            }
        );
    }

    #[test]
    fn malformed_line_is_a_protocol_error() {
        let err = WorkerMessage::from_line("not json").unwrap_err();
        assert!(err.to_string().contains("worker protocol error"));
    }
}
