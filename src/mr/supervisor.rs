//! The worker supervisor: spawns workers as isolated child processes, owns
//! their status channel, enforces the liveness timeout, and restarts
//! unresponsive map workers.
//!
//! Translated from `original_source/src/python/main.py`'s
//! `Master.start_process`/`monitor_mappers`/`monitor_reducers`/`retry_mapper`,
//! which use `multiprocessing.Process` and `multiprocessing.Queue.get(timeout=...)`.
//! Here, each worker's stdout pipe carries the wire protocol; a small reader
//! task per worker forwards each line onto a shared channel tagged with the
//! worker's index, and the monitoring loop watches that channel against a
//! per-worker staleness deadline instead of blocking a queue get one worker
//! at a time.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::mr::error::MrError;
use crate::mr::function::Application;
use crate::mr::job::JobLayout;
use crate::mr::protocol::{WorkerMessage, WorkerState};
use crate::mr::worker::sibling_binary_path;

/// A worker kind, used only to pick the CLI role argument passed to
/// `mrworker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    Map,
    Reduce,
}

impl WorkerKind {
    fn role_arg(self) -> &'static str {
        match self {
            WorkerKind::Map => "map",
            WorkerKind::Reduce => "reduce",
        }
    }
}

/// One message observed from a worker, tagged with the worker's index
/// within its phase.
enum Event {
    Line(usize, WorkerMessage),
    Closed(usize),
}

/// Per-worker bookkeeping the supervisor owns.
struct Slot {
    child: Child,
    done: bool,
    active_reducers: Option<Vec<usize>>,
}

pub struct Supervisor {
    layout: JobLayout,
    application: Application,
    liveness_timeout: Duration,
}

impl Supervisor {
    pub fn new(layout: JobLayout, application: Application, liveness_timeout: Duration) -> Supervisor {
        Supervisor {
            layout,
            application,
            liveness_timeout,
        }
    }

    /// Runs the map phase to completion: spawns `mapper_count` workers
    /// (optionally killing `kill_index` immediately after spawn, the fault
    /// injection hook), then monitors them until every one reports Done,
    /// restarting any worker that misses its liveness deadline.
    /// Returns each mapper's active-reducer list, indexed by mapper id.
    pub async fn run_map_phase(
        &self,
        mapper_count: usize,
        reducer_count: usize,
        kill_index: Option<usize>,
    ) -> Result<Vec<Vec<usize>>> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let mut slots: Vec<Slot> = match kill_index.filter(|&idx| idx < mapper_count) {
            Some(idx) => {
                // Spawn and kill the fault-injection target before spawning
                // any other mapper, so it never gets the chance to finish
                // and report Done first (§4.G: killed immediately after
                // spawn, not after the whole phase has been spawned).
                let mut target = self
                    .spawn_and_watch(WorkerKind::Map, idx, reducer_count, tx.clone())
                    .await?;
                target
                    .child
                    .start_kill()
                    .context("terminating fault-injected mapper")?;

                let others = (0..mapper_count).filter(|&m| m != idx).map(|m| {
                    self.spawn_and_watch(WorkerKind::Map, m, reducer_count, tx.clone())
                });
                let mut spawned: Vec<Slot> = join_all(others).await.into_iter().collect::<Result<_>>()?;
                spawned.insert(idx, target);
                spawned
            }
            None => {
                let spawns = (0..mapper_count).map(|m| {
                    self.spawn_and_watch(WorkerKind::Map, m, reducer_count, tx.clone())
                });
                join_all(spawns).await.into_iter().collect::<Result<_>>()?
            }
        };

        self.monitor(&mut slots, &mut rx, tx, WorkerKind::Map, reducer_count, mapper_count)
            .await?;

        Ok(slots.into_iter().map(|s| s.active_reducers.unwrap_or_default()).collect())
    }

    /// Runs the reduce phase to completion. On a liveness timeout the
    /// supervisor logs and continues without restarting: a documented
    /// limitation inherited from the source.
    pub async fn run_reduce_phase(&self, mapper_count: usize, reducer_count: usize) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let spawns = (0..reducer_count).map(|r| {
            self.spawn_and_watch(WorkerKind::Reduce, r, mapper_count, tx.clone())
        });
        let mut slots: Vec<Slot> = join_all(spawns)
            .await
            .into_iter()
            .collect::<Result<_>>()?;

        self.monitor(
            &mut slots,
            &mut rx,
            tx,
            WorkerKind::Reduce,
            mapper_count,
            reducer_count,
        )
        .await?;
        Ok(())
    }

    /// Spawns one worker process and a reader task that forwards its
    /// wire-protocol lines onto `tx`, tagged with `index`.
    async fn spawn_and_watch(
        &self,
        kind: WorkerKind,
        index: usize,
        other_count: usize,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Result<Slot> {
        let mut child = self.spawn(kind, index, other_count)?;
        let stdout = child
            .stdout
            .take()
            .expect("child spawned with Stdio::piped() stdout");

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match WorkerMessage::from_line(&line) {
                        Ok(msg) => {
                            if tx.send(Event::Line(index, msg)).is_err() {
                                return;
                            }
                        }
                        Err(_) => {
                            // A malformed line is treated the same as the
                            // channel closing.
                            let _ = tx.send(Event::Closed(index));
                            return;
                        }
                    },
                    Ok(None) => {
                        let _ = tx.send(Event::Closed(index));
                        return;
                    }
                    Err(_) => {
                        let _ = tx.send(Event::Closed(index));
                        return;
                    }
                }
            }
        });

        Ok(Slot {
            child,
            done: false,
            active_reducers: None,
        })
    }

    fn spawn(&self, kind: WorkerKind, index: usize, other_count: usize) -> Result<Child> {
        let binary = sibling_binary_path("mrworker")?;
        let mut cmd = Command::new(binary);
        cmd.arg(kind.role_arg())
            .arg(self.layout.job_id.to_string())
            .arg(self.layout.tmp_root().to_string_lossy().to_string())
            .arg(self.layout.output_dir().to_string_lossy().to_string())
            .arg(index.to_string())
            .arg(other_count.to_string())
            .arg(self.application.name())
            .stdout(Stdio::piped())
            .stdin(Stdio::null());

        cmd.spawn()
            .map_err(|e| MrError::WorkerSpawn(format!("{e}")))
            .context("spawning worker process")
    }

    /// The monitoring loop shared by both phases. `restart_on_timeout`
    /// controls whether a stale worker is restarted (map phase) or merely
    /// logged (reduce phase).
    async fn monitor(
        &self,
        slots: &mut [Slot],
        rx: &mut mpsc::UnboundedReceiver<Event>,
        tx: mpsc::UnboundedSender<Event>,
        kind: WorkerKind,
        other_count: usize,
        worker_count: usize,
    ) -> Result<()> {
        let restart_on_timeout = matches!(kind, WorkerKind::Map);
        let mut last_seen: Vec<Instant> = vec![Instant::now(); worker_count];
        let tick = (self.liveness_timeout / 4).max(Duration::from_millis(50));
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while slots.iter().any(|s| !s.done) {
            tokio::select! {
                evt = rx.recv() => {
                    match evt {
                        Some(Event::Line(idx, msg)) => {
                            last_seen[idx] = Instant::now();
                            match msg {
                                WorkerMessage::ActiveReducers { reducers } => {
                                    slots[idx].active_reducers = Some(reducers);
                                }
                                WorkerMessage::Status { state: WorkerState::InProgress, .. } => {}
                                WorkerMessage::Status { state: WorkerState::Done, .. } => {
                                    let _ = slots[idx].child.wait().await;
                                    slots[idx].done = true;
                                }
                            }
                        }
                        Some(Event::Closed(idx)) => {
                            if !slots[idx].done {
                                if restart_on_timeout {
                                    println!("[{kind:?}] worker #{idx} exited without reporting completion, restarting");
                                    self.restart(slots, idx, kind, other_count, tx.clone()).await?;
                                } else {
                                    println!("[{kind:?}] worker #{idx} exited without reporting completion; not restarted (reduce-phase restart is not implemented)");
                                }
                                last_seen[idx] = Instant::now();
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    for idx in 0..worker_count {
                        if !slots[idx].done && last_seen[idx].elapsed() >= self.liveness_timeout {
                            if restart_on_timeout {
                                println!("[{kind:?}] worker #{idx} missed its liveness deadline, restarting");
                                self.restart(slots, idx, kind, other_count, tx.clone()).await?;
                            } else {
                                println!("[{kind:?}] worker #{idx} missed its liveness deadline; not restarted (reduce-phase restart is not implemented)");
                            }
                            last_seen[idx] = Instant::now();
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Terminates and respawns worker `idx` in place. The restarted worker
    /// reprocesses its shard from scratch.
    async fn restart(
        &self,
        slots: &mut [Slot],
        idx: usize,
        kind: WorkerKind,
        other_count: usize,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let _ = slots[idx].child.start_kill();
        let _ = slots[idx].child.wait().await;
        let fresh = self.spawn_and_watch(kind, idx, other_count, tx).await?;
        slots[idx] = fresh;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_args_match_cli_contract() {
        assert_eq!(WorkerKind::Map.role_arg(), "map");
        assert_eq!(WorkerKind::Reduce.role_arg(), "reduce");
    }
}
