//! Job orchestration: owns the job's identity and directory layout, drives
//! splitting, the map barrier, the reduce barrier, and cleanup.
//!
//! Grounded on `original_source/src/python/main.py::Master.start_process`
//! for the phase sequencing and fault-injection handling, and on
//! `xzhseh-MapReduce-rs/src/mr/coordinator.rs`'s `Coordinator` struct shape.
//! This `Coordinator` does not run as an RPC server polled by workers
//! dialing in over the network: it spawns and owns its workers directly, so
//! `run()` drives one job to completion in a single call, matching the
//! source's `Master.start_process`.

use std::time::Duration;

use anyhow::Result;

use crate::mr::config::JobConfig;
use crate::mr::job::{JobId, JobLayout};
use crate::mr::splitter;
use crate::mr::supervisor::Supervisor;

pub struct Coordinator {
    config: JobConfig,
    layout: JobLayout,
    /// The mapper index to terminate immediately after spawn, or `None` to
    /// leave fault injection disabled.
    kill_index: Option<usize>,
}

impl Coordinator {
    pub fn new(config: JobConfig, kill_index: Option<usize>) -> Coordinator {
        let job_id = JobId::from_now();
        let layout = JobLayout::new(job_id);
        Coordinator {
            config,
            layout,
            kill_index,
        }
    }

    /// Builds a coordinator over an explicit layout instead of the default
    /// `from_now()`/cwd-relative one, for tests that need an isolated root.
    pub fn with_layout(config: JobConfig, layout: JobLayout, kill_index: Option<usize>) -> Coordinator {
        Coordinator {
            config,
            layout,
            kill_index,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.layout.job_id
    }

    pub fn output_dir(&self) -> std::path::PathBuf {
        self.layout.output_dir()
    }

    /// Drives one job to completion: split, map barrier, reduce barrier,
    /// cleanup. The temporary root is removed only once both barriers
    /// succeed.
    pub async fn run(&self) -> Result<()> {
        self.layout.create_dirs()?;

        println!(
            "[Job {}] splitting {} into {} shard(s)",
            self.layout.job_id,
            self.config.input_file.display(),
            self.config.number_of_mapper
        );
        splitter::split(&self.config.input_file, self.config.number_of_mapper, &self.layout)?;

        let supervisor = Supervisor::new(
            self.layout.clone(),
            self.config.application,
            Duration::from_secs(self.config.liveness_timeout_secs),
        );

        if let Some(idx) = self.kill_index {
            println!(
                "[Job {}] fault injection enabled: mapper #{idx} will be killed immediately after spawn",
                self.layout.job_id
            );
        }

        println!(
            "[Job {}] starting map phase: {} mapper(s), {} reducer(s)",
            self.layout.job_id, self.config.number_of_mapper, self.config.number_of_reducer
        );
        supervisor
            .run_map_phase(
                self.config.number_of_mapper,
                self.config.number_of_reducer,
                self.kill_index,
            )
            .await?;
        println!("[Job {}] map phase complete", self.layout.job_id);

        println!(
            "[Job {}] starting reduce phase: {} reducer(s)",
            self.layout.job_id, self.config.number_of_reducer
        );
        supervisor
            .run_reduce_phase(self.config.number_of_mapper, self.config.number_of_reducer)
            .await?;
        println!("[Job {}] reduce phase complete", self.layout.job_id);

        self.layout.remove_tmp_root()?;
        println!(
            "[Job {}] output available at {}",
            self.layout.job_id,
            self.layout.output_dir().display()
        );

        Ok(())
    }
}
