//! Job identity and the temporary/output directory layout.
//!
//! Mirrors `original_source/src/python/main.py::Master.__init__`: the job
//! identifier is the integer number of seconds since the epoch at
//! construction. This leaves a known collision window for jobs launched
//! within the same second, unfixed, matching the source.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

/// Identifies one run's temporary and output directory roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl JobId {
    /// Derives a job identifier from the current wall-clock time, in whole
    /// seconds since the Unix epoch. Two jobs constructed within the same
    /// second collide; this is a known, documented limitation, not a bug to
    /// silently patch over with e.g. a random suffix.
    pub fn from_now() -> JobId {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs();
        JobId(secs)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The directory roots and file-naming conventions for one job.
#[derive(Debug, Clone)]
pub struct JobLayout {
    pub job_id: JobId,
    tmp_root: PathBuf,
    output_root: PathBuf,
}

impl JobLayout {
    pub fn new(job_id: JobId) -> JobLayout {
        JobLayout {
            job_id,
            tmp_root: PathBuf::from("tmp").join(job_id.to_string()),
            output_root: PathBuf::from("output").join(job_id.to_string()),
        }
    }

    /// Builds a layout rooted at explicit directories instead of the
    /// cwd-relative `./tmp`, `./output` convention. Used by tests that need
    /// an isolated, parallel-safe root rather than mutating the process's
    /// current directory.
    pub fn rooted(job_id: JobId, tmp_root: PathBuf, output_root: PathBuf) -> JobLayout {
        JobLayout {
            job_id,
            tmp_root,
            output_root,
        }
    }

    /// `./tmp/{job_id}/input/`
    pub fn input_dir(&self) -> PathBuf {
        self.tmp_root.join("input")
    }

    /// `./tmp/{job_id}/input/{mapper}`
    pub fn shard_path(&self, mapper: usize) -> PathBuf {
        self.input_dir().join(mapper.to_string())
    }

    /// `./tmp/{job_id}/intermediate/`
    pub fn intermediate_dir(&self) -> PathBuf {
        self.tmp_root.join("intermediate")
    }

    /// `./tmp/{job_id}/intermediate/m{mapper}r{reducer}`
    pub fn intermediate_path(&self, mapper: usize, reducer: usize) -> PathBuf {
        self.intermediate_dir()
            .join(format!("m{mapper}r{reducer}"))
    }

    /// `./output/{job_id}/`
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.clone()
    }

    /// `./output/{job_id}/{reducer}`
    pub fn output_path(&self, reducer: usize) -> PathBuf {
        self.output_dir().join(reducer.to_string())
    }

    pub fn tmp_root(&self) -> &PathBuf {
        &self.tmp_root
    }

    /// Creates the directories a job needs before splitting begins.
    pub fn create_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.input_dir())?;
        std::fs::create_dir_all(self.intermediate_dir())?;
        std::fs::create_dir_all(self.output_dir())?;
        Ok(())
    }

    /// Removes the temporary root. Invariant 5: this must only be called
    /// after the reduce barrier succeeds.
    pub fn remove_tmp_root(&self) -> Result<()> {
        if self.tmp_root.exists() {
            std::fs::remove_dir_all(&self.tmp_root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_the_documented_layout() {
        let layout = JobLayout::new(JobId(42));
        assert_eq!(layout.shard_path(3), PathBuf::from("tmp/42/input/3"));
        assert_eq!(
            layout.intermediate_path(1, 2),
            PathBuf::from("tmp/42/intermediate/m1r2")
        );
        assert_eq!(layout.output_path(5), PathBuf::from("output/42/5"));
    }

    #[test]
    fn from_now_is_whole_seconds() {
        let id = JobId::from_now();
        assert!(id.0 > 0);
    }
}
