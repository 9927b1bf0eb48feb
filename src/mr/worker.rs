//! Map and reduce task execution, run inside the `mrworker` child process.
//! Generalizes `xzhseh-MapReduce-rs/src/mr/worker.rs`'s hardcoded
//! `wc::map`/`wc::reduce` calls to the [`crate::mr::function`] registry, and
//! its ad hoc `"key value\n"` intermediate format to [`crate::mr::record`]'s
//! JSON buckets.

use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;

use crate::mr::function::{Application, Emit};
use crate::mr::job::JobLayout;
use crate::mr::partition::partition;
use crate::mr::record::{IntermediateBucket, OutputMap};

/// Runs one map task: reads the shard for `mapper_id`, invokes the
/// registered map function once per line, buckets the emissions by
/// partition, and writes one intermediate file per non-empty partition.
/// Returns the sorted active-reducer list.
pub async fn run_map(
    layout: &JobLayout,
    application: Application,
    mapper_id: usize,
    reducers: usize,
) -> Result<Vec<usize>> {
    let shard_path = layout.shard_path(mapper_id);
    let contents = tokio::fs::read_to_string(&shard_path).await?;
    // An empty shard must still be tolerated, producing zero buckets.
    let lines: Vec<&str> = if contents.is_empty() {
        Vec::new()
    } else {
        contents.lines().collect()
    };

    let map_fn = application.map_fn();
    let mut buckets: Vec<IntermediateBucket> =
        (0..reducers).map(|_| IntermediateBucket::new()).collect();

    for (i, line) in lines.iter().enumerate() {
        let mut emit = |key: String, value: String| {
            let r = partition(&key, reducers);
            buckets[r].emit(key, value);
        };
        map_fn.map_record(i, line, &mut emit);
    }

    std::fs::create_dir_all(layout.intermediate_dir())?;

    let mut active_reducers = Vec::new();
    for (r, bucket) in buckets.iter().enumerate() {
        if bucket.is_empty() {
            continue;
        }
        let path = layout.intermediate_path(mapper_id, r);
        bucket.write_to(&path)?;
        active_reducers.push(r);
    }
    active_reducers.sort_unstable();

    Ok(active_reducers)
}

/// Runs one reduce task: loads every existing intermediate bucket destined
/// for `reducer_id`, groups values by key across mappers (ascending mapper
/// index), invokes the registered reduce function once per key, and writes
/// the final output file.
pub async fn run_reduce(
    layout: &JobLayout,
    application: Application,
    reducer_id: usize,
    mappers: usize,
) -> Result<()> {
    let merged = load_reducer_input(layout, reducer_id, mappers)?;

    let reduce_fn = application.reduce_fn();
    let mut output = OutputMap::new();
    for (key, values) in merged.0 {
        let mut emit = |k: String, v: String| output.emit_final(k, v);
        reduce_fn.reduce_group(&key, &values, &mut emit);
    }

    std::fs::create_dir_all(layout.output_dir())?;
    let out_path = layout.output_path(reducer_id);
    output.write_to(&out_path)?;
    Ok(())
}

/// Loads and merges every `m{m}r{reducer_id}` bucket that exists, in
/// ascending mapper order. Values for one key are concatenated in mapper
/// order; within one mapper's bucket, emission order is preserved by
/// [`IntermediateBucket`]. When many keys are present the per-key
/// concatenation across mappers is done in parallel with `rayon`, since each
/// key's list is independent of every other key's.
fn load_reducer_input(layout: &JobLayout, reducer_id: usize, mappers: usize) -> Result<IntermediateBucket> {
    let mut per_mapper = Vec::with_capacity(mappers);
    for m in 0..mappers {
        let path = layout.intermediate_path(m, reducer_id);
        if path.exists() {
            per_mapper.push(IntermediateBucket::read_from(&path)?);
        } else {
            per_mapper.push(IntermediateBucket::default());
        }
    }

    let mut keys: Vec<String> = per_mapper
        .iter()
        .flat_map(|b| b.0.keys().cloned())
        .collect();
    keys.sort_unstable();
    keys.dedup();

    let merged_pairs: Vec<(String, Vec<String>)> = keys
        .into_par_iter()
        .map(|key| {
            let mut values = Vec::new();
            for bucket in &per_mapper {
                if let Some(vs) = bucket.0.get(&key) {
                    values.extend(vs.iter().cloned());
                }
            }
            (key, values)
        })
        .collect();

    let mut merged = IntermediateBucket::new();
    for (key, values) in merged_pairs {
        merged.0.insert(key, values);
    }
    Ok(merged)
}

/// Locates the sibling `mrworker` binary next to the currently running
/// executable, the standard way a multi-binary Cargo package's processes
/// find one another without embedding a build-time absolute path.
pub fn sibling_binary_path(name: &str) -> Result<std::path::PathBuf> {
    let mut path = std::env::current_exe()?;
    let file_name = if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    };
    path.set_file_name(file_name);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mr::job::JobId;
    use tempfile::tempdir;

    fn layout_in(dir: &Path) -> JobLayout {
        JobLayout::rooted(JobId(1), dir.join("tmp"), dir.join("output"))
    }

    #[tokio::test]
    async fn map_buckets_by_partition_and_reports_active_reducers() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        std::fs::create_dir_all(layout.input_dir()).unwrap();
        std::fs::write(layout.shard_path(0), "a b a\nb c\n").unwrap();

        let active = run_map(&layout, Application::WordCount, 0, 2).await.unwrap();
        assert!(!active.is_empty());
        for r in &active {
            assert!(layout.intermediate_path(0, *r).exists());
        }
    }

    #[tokio::test]
    async fn empty_shard_produces_no_buckets() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        std::fs::create_dir_all(layout.input_dir()).unwrap();
        std::fs::write(layout.shard_path(0), "").unwrap();

        let active = run_map(&layout, Application::WordCount, 0, 3).await.unwrap();
        assert!(active.is_empty());
        for r in 0..3 {
            assert!(!layout.intermediate_path(0, r).exists());
        }
    }

    #[tokio::test]
    async fn map_then_reduce_word_count_end_to_end() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        std::fs::create_dir_all(layout.input_dir()).unwrap();
        std::fs::write(layout.shard_path(0), "a b a\n").unwrap();
        std::fs::write(layout.shard_path(1), "b c\n").unwrap();

        run_map(&layout, Application::WordCount, 0, 2).await.unwrap();
        run_map(&layout, Application::WordCount, 1, 2).await.unwrap();

        run_reduce(&layout, Application::WordCount, 0, 2).await.unwrap();
        run_reduce(&layout, Application::WordCount, 1, 2).await.unwrap();

        let mut merged = std::collections::BTreeMap::new();
        for r in 0..2 {
            let out = crate::mr::record::OutputMap::read_from(&layout.output_path(r)).unwrap();
            merged.extend(out.0);
        }

        assert_eq!(merged.get("a"), Some(&"2".to_string()));
        assert_eq!(merged.get("b"), Some(&"2".to_string()));
        assert_eq!(merged.get("c"), Some(&"1".to_string()));
    }

    #[tokio::test]
    async fn reduce_with_no_intermediate_files_writes_empty_output() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        run_reduce(&layout, Application::WordCount, 0, 2).await.unwrap();
        let out = crate::mr::record::OutputMap::read_from(&layout.output_path(0)).unwrap();
        assert!(out.0.is_empty());
    }
}
