//! The splitter: divides an input corpus into `N` mapper shards on disk,
//! round-robin by line index.
//!
//! `original_source/src/python/main.py::split_input_data` opens each shard
//! file in append mode once per input line. We buffer all lines for one
//! shard in memory and write the shard in a single create-and-write call
//! instead.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::mr::error::MrError;
use crate::mr::job::JobLayout;

/// Splits `input_file` into `mappers` shard files under
/// `layout.input_dir()`, one per mapper, and returns their paths in mapper
/// index order. Every shard is created even if it receives no lines: the
/// map worker must tolerate an empty shard.
pub fn split(input_file: &Path, mappers: usize, layout: &JobLayout) -> Result<Vec<std::path::PathBuf>> {
    assert!(mappers > 0, "mapper count must be at least 1");

    let file = std::fs::File::open(input_file)
        .map_err(|e| MrError::InputUnreadable(format!("{}: {e}", input_file.display())))
        .context("opening input corpus")?;
    let reader = BufReader::new(file);

    let mut shard_lines: Vec<String> = vec![String::new(); mappers];
    for (idx, line) in reader.lines().enumerate() {
        let mut line =
            line.map_err(|e| MrError::InputUnreadable(format!("{}: {e}", input_file.display())))?;
        line.push('\n');
        let mapper = idx % mappers;
        shard_lines[mapper].push_str(&line);
    }

    std::fs::create_dir_all(layout.input_dir())
        .with_context(|| format!("creating {}", layout.input_dir().display()))?;

    let mut paths = Vec::with_capacity(mappers);
    for (mapper, contents) in shard_lines.into_iter().enumerate() {
        let path = layout.shard_path(mapper);
        let mut shard_file = std::fs::File::create(&path)
            .with_context(|| format!("creating shard {}", path.display()))?;
        shard_file
            .write_all(contents.as_bytes())
            .with_context(|| format!("writing shard {}", path.display()))?;
        paths.push(path);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mr::job::{JobId, JobLayout};
    use std::fs;
    use tempfile::tempdir;

    fn layout_in(dir: &Path) -> JobLayout {
        JobLayout::rooted(JobId(1), dir.join("tmp"), dir.join("output"))
    }

    #[test]
    fn round_robin_line_assignment() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("corpus.txt");
        fs::write(&input, "l0\nl1\nl2\nl3\nl4\n").unwrap();

        let layout = layout_in(dir.path());
        let paths = split(&input, 2, &layout).unwrap();

        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "l0\nl2\nl4\n");
        assert_eq!(fs::read_to_string(&paths[1]).unwrap(), "l1\nl3\n");
    }

    #[test]
    fn missing_trailing_newline_is_added() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("corpus.txt");
        // Write raw bytes without a trailing newline.
        fs::write(&input, "only-line").unwrap();

        let layout = layout_in(dir.path());
        let paths = split(&input, 1, &layout).unwrap();

        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "only-line\n");
    }

    #[test]
    fn empty_corpus_still_creates_all_shards() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("corpus.txt");
        fs::write(&input, "").unwrap();

        let layout = layout_in(dir.path());
        let paths = split(&input, 3, &layout).unwrap();

        assert_eq!(paths.len(), 3);
        for p in &paths {
            assert_eq!(fs::read_to_string(p).unwrap(), "");
        }
    }

    #[test]
    fn unreadable_input_is_fatal() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        let missing = dir.path().join("does-not-exist.txt");
        let err = split(&missing, 2, &layout).unwrap_err();
        assert!(err.to_string().contains("input unreadable") || err.to_string().contains("opening input corpus"));
    }
}
