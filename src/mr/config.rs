//! Job configuration: a typed, validated form of the JSON document that
//! describes one job, loaded once at startup.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::mr::error::MrError;
use crate::mr::function::Application;

/// The raw shape of the JSON configuration document. Mirrors
/// `original_source/src/python/main.py::read_configs`, generalized from
/// ad hoc `dict.get` calls into a `serde`-derived struct.
#[derive(Debug, Deserialize)]
struct RawConfig {
    input_file: Option<String>,
    number_of_mapper: Option<i64>,
    number_of_reducer: Option<i64>,
    #[serde(default)]
    application: Option<String>,
    #[serde(default)]
    liveness_timeout_secs: Option<u64>,
}

/// The validated, typed job configuration.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_file: PathBuf,
    pub number_of_mapper: usize,
    pub number_of_reducer: usize,
    pub application: Application,
    pub liveness_timeout_secs: u64,
}

/// The default liveness timeout, in seconds.
pub const DEFAULT_LIVENESS_TIMEOUT_SECS: u64 = 3;

impl JobConfig {
    /// Reads and validates a configuration file. Fatal on any I/O or parse
    /// error, or on a value that fails validation; no job state is created
    /// in that case.
    pub fn load(path: &Path) -> Result<JobConfig> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MrError::Config(format!("cannot read {}: {e}", path.display())))
            .context("reading configuration file")?;
        let raw: RawConfig = serde_json::from_str(&text)
            .map_err(|e| MrError::Config(format!("invalid JSON in {}: {e}", path.display())))
            .context("parsing configuration file")?;
        JobConfig::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<JobConfig> {
        let input_file = raw
            .input_file
            .ok_or_else(|| MrError::Config("missing required key `input_file`".into()))?;
        if input_file.trim().is_empty() {
            return Err(anyhow!(MrError::Config(
                "`input_file` must not be empty".into()
            )));
        }

        let number_of_mapper = raw
            .number_of_mapper
            .ok_or_else(|| MrError::Config("missing required key `number_of_mapper`".into()))?;
        let number_of_reducer = raw
            .number_of_reducer
            .ok_or_else(|| MrError::Config("missing required key `number_of_reducer`".into()))?;

        if number_of_mapper < 1 {
            return Err(anyhow!(MrError::Config(
                "`number_of_mapper` must be >= 1".into()
            )));
        }
        if number_of_reducer < 1 {
            return Err(anyhow!(MrError::Config(
                "`number_of_reducer` must be >= 1".into()
            )));
        }

        let application = match raw.application.as_deref() {
            None => Application::WordCount,
            Some(name) => Application::by_name(name)
                .ok_or_else(|| MrError::Config(format!("unknown application `{name}`")))?,
        };

        let liveness_timeout_secs = match raw.liveness_timeout_secs {
            None => DEFAULT_LIVENESS_TIMEOUT_SECS,
            Some(0) => {
                return Err(anyhow!(MrError::Config(
                    "`liveness_timeout_secs` must be >= 1".into()
                )))
            }
            Some(n) => n,
        };

        Ok(JobConfig {
            input_file: PathBuf::from(input_file),
            number_of_mapper: number_of_mapper as usize,
            number_of_reducer: number_of_reducer as usize,
            application,
            liveness_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<JobConfig> {
        let raw: RawConfig = serde_json::from_str(json).unwrap();
        JobConfig::from_raw(raw)
    }

    #[test]
    fn minimal_valid_config() {
        let cfg = parse(r#"{"input_file":"corpus.txt","number_of_mapper":2,"number_of_reducer":3}"#)
            .unwrap();
        assert_eq!(cfg.input_file, PathBuf::from("corpus.txt"));
        assert_eq!(cfg.number_of_mapper, 2);
        assert_eq!(cfg.number_of_reducer, 3);
        assert!(matches!(cfg.application, Application::WordCount));
        assert_eq!(cfg.liveness_timeout_secs, DEFAULT_LIVENESS_TIMEOUT_SECS);
    }

    #[test]
    fn rejects_missing_input_file() {
        let err = parse(r#"{"number_of_mapper":2,"number_of_reducer":3}"#).unwrap_err();
        assert!(err.to_string().contains("input_file"));
    }

    #[test]
    fn rejects_zero_mappers() {
        let err = parse(
            r#"{"input_file":"c.txt","number_of_mapper":0,"number_of_reducer":1}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("number_of_mapper"));
    }

    #[test]
    fn rejects_unknown_application() {
        let err = parse(
            r#"{"input_file":"c.txt","number_of_mapper":1,"number_of_reducer":1,"application":"bogus"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn accepts_explicit_application_and_timeout() {
        let cfg = parse(
            r#"{"input_file":"c.txt","number_of_mapper":1,"number_of_reducer":1,"application":"invertedindex","liveness_timeout_secs":7}"#,
        )
        .unwrap();
        assert!(matches!(cfg.application, Application::InvertedIndex));
        assert_eq!(cfg.liveness_timeout_secs, 7);
    }
}
