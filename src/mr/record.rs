//! On-disk formats for intermediate buckets and reducer outputs.
//!
//! Both are JSON objects keyed by string, replacing the reference engine's
//! ad hoc `"key value\n"` line format
//! (`xzhseh-MapReduce-rs/src/mr/worker.rs::write_key_value_to_file`) with a
//! self-delimiting format that round-trips a string-keyed, string-list-valued
//! map without any line-splitting assumptions about the key or value text.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// An intermediate bucket: key -> ordered list of emitted values.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntermediateBucket(pub BTreeMap<String, Vec<String>>);

impl IntermediateBucket {
    pub fn new() -> IntermediateBucket {
        IntermediateBucket(BTreeMap::new())
    }

    pub fn emit(&mut self, key: String, value: String) {
        self.0.entry(key).or_default().push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating intermediate file {}", path.display()))?;
        serde_json::to_writer(file, self)
            .with_context(|| format!("writing intermediate file {}", path.display()))
    }

    pub fn read_from(path: &Path) -> Result<IntermediateBucket> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening intermediate file {}", path.display()))?;
        let bucket = serde_json::from_reader(file)
            .with_context(|| format!("parsing intermediate file {}", path.display()))?;
        Ok(bucket)
    }
}

/// A reducer's final output: key -> final value. Last `emit_final` call for
/// a key wins.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputMap(pub BTreeMap<String, String>);

impl OutputMap {
    pub fn new() -> OutputMap {
        OutputMap(BTreeMap::new())
    }

    pub fn emit_final(&mut self, key: String, value: String) {
        self.0.insert(key, value);
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        serde_json::to_writer(file, self)
            .with_context(|| format!("writing output file {}", path.display()))
    }

    pub fn read_from(path: &Path) -> Result<OutputMap> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening output file {}", path.display()))?;
        let map = serde_json::from_reader(file)
            .with_context(|| format!("parsing output file {}", path.display()))?;
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bucket_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m0r0");

        let mut bucket = IntermediateBucket::new();
        bucket.emit("a".to_string(), "1".to_string());
        bucket.emit("a".to_string(), "1".to_string());
        bucket.emit("b".to_string(), "1".to_string());
        bucket.write_to(&path).unwrap();

        let read_back = IntermediateBucket::read_from(&path).unwrap();
        assert_eq!(read_back.0.get("a"), Some(&vec!["1".to_string(), "1".to_string()]));
        assert_eq!(read_back.0.get("b"), Some(&vec!["1".to_string()]));
    }

    #[test]
    fn output_last_write_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0");

        let mut out = OutputMap::new();
        out.emit_final("a".to_string(), "1".to_string());
        out.emit_final("a".to_string(), "2".to_string());
        out.write_to(&path).unwrap();

        let read_back = OutputMap::read_from(&path).unwrap();
        assert_eq!(read_back.0.get("a"), Some(&"2".to_string()));
    }
}
