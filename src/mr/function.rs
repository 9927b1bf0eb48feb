//! The user-function capability interface and the two bundled applications,
//! both carried over from `original_source/src/python/main.py`'s
//! `word_count_map`/`word_count_reduce` and
//! `inverted_index_map`/`inverted_index_reduce`.
//!
//! A worker process cannot receive a Rust closure across a process boundary,
//! so applications are registered here by name and the worker binary selects
//! one from its CLI arguments.

use once_cell_like::OnceRegex;
use regex::Regex;

/// Emits one intermediate `(key, value)` pair.
pub trait Emit {
    fn emit(&mut self, key: String, value: String);
}

impl<F: FnMut(String, String)> Emit for F {
    fn emit(&mut self, key: String, value: String) {
        (self)(key, value)
    }
}

/// A map function: called once per input record.
pub trait MapFn: Send + Sync {
    fn map_record(&self, record_index: usize, record_text: &str, emit: &mut dyn Emit);
}

/// A reduce function: called once per distinct key in a reducer's input.
/// `values` is a non-empty ordered sequence. `emit_final` may be called more
/// than once; the last call wins.
pub trait ReduceFn: Send + Sync {
    fn reduce_group(&self, key: &str, values: &[String], emit: &mut dyn Emit);
}

/// The name of a registered application, carried in [`crate::mr::config::JobConfig`]
/// and forwarded to every spawned worker as a CLI argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    WordCount,
    InvertedIndex,
}

impl Application {
    pub fn by_name(name: &str) -> Option<Application> {
        match name {
            "wordcount" => Some(Application::WordCount),
            "invertedindex" => Some(Application::InvertedIndex),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Application::WordCount => "wordcount",
            Application::InvertedIndex => "invertedindex",
        }
    }

    pub fn map_fn(self) -> Box<dyn MapFn> {
        match self {
            Application::WordCount => Box::new(word_count::Map),
            Application::InvertedIndex => Box::new(inverted_index::Map),
        }
    }

    pub fn reduce_fn(self) -> Box<dyn ReduceFn> {
        match self {
            Application::WordCount => Box::new(word_count::Reduce),
            Application::InvertedIndex => Box::new(inverted_index::Reduce),
        }
    }
}

/// A tiny lazily-initialized `Regex` holder, standing in for `once_cell`
/// (not among this crate's dependencies) for the one compiled pattern both
/// bundled applications share.
mod once_cell_like {
    use regex::Regex;
    use std::sync::OnceLock;

    pub struct OnceRegex(OnceLock<Regex>, &'static str);

    impl OnceRegex {
        pub const fn new(pattern: &'static str) -> OnceRegex {
            OnceRegex(OnceLock::new(), pattern)
        }

        pub fn get(&self) -> &Regex {
            self.0.get_or_init(|| Regex::new(self.1).expect("static regex is valid"))
        }
    }
}

/// Matches a run of alphanumeric characters, the same notion of "word" the
/// original Python implementation built manually with
/// `''.join(c for c in word if c.isalnum())`.
static WORD_PATTERN: OnceRegex = OnceRegex::new(r"[[:alnum:]]+");

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    let re: &Regex = WORD_PATTERN.get();
    re.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Word count: emits `(word, "1")` per occurrence; reduce sums.
pub mod word_count {
    use super::*;

    pub struct Map;
    impl MapFn for Map {
        fn map_record(&self, _record_index: usize, record_text: &str, emit: &mut dyn Emit) {
            for word in tokenize(record_text) {
                emit.emit(word, "1".to_string());
            }
        }
    }

    pub struct Reduce;
    impl ReduceFn for Reduce {
        fn reduce_group(&self, key: &str, values: &[String], emit: &mut dyn Emit) {
            let total: i64 = values.iter().filter_map(|v| v.parse::<i64>().ok()).sum();
            emit.emit(key.to_string(), total.to_string());
        }
    }
}

/// Inverted index: emits `(word, record_index)`; reduce deduplicates and
/// sorts the set of record indices, joined with commas.
pub mod inverted_index {
    use super::*;
    use std::collections::BTreeSet;

    pub struct Map;
    impl MapFn for Map {
        fn map_record(&self, record_index: usize, record_text: &str, emit: &mut dyn Emit) {
            for word in tokenize(record_text) {
                emit.emit(word, record_index.to_string());
            }
        }
    }

    pub struct Reduce;
    impl ReduceFn for Reduce {
        fn reduce_group(&self, key: &str, values: &[String], emit: &mut dyn Emit) {
            let unique: BTreeSet<&String> = values.iter().collect();
            let joined = unique
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(",");
            emit.emit(key.to_string(), joined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_map(app: Application, lines: &[&str]) -> Vec<(String, String)> {
        let map_fn = app.map_fn();
        let mut out = Vec::new();
        {
            let mut emit = |k: String, v: String| out.push((k, v));
            for (i, line) in lines.iter().enumerate() {
                map_fn.map_record(i, line, &mut emit);
            }
        }
        out
    }

    #[test]
    fn word_count_map_tokenizes_and_lowercases() {
        let out = run_map(Application::WordCount, &["Hello, hello world!"]);
        assert_eq!(
            out,
            vec![
                ("hello".to_string(), "1".to_string()),
                ("hello".to_string(), "1".to_string()),
                ("world".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn word_count_reduce_sums() {
        let reduce_fn = Application::WordCount.reduce_fn();
        let mut out = Vec::new();
        {
            let mut emit = |k: String, v: String| out.push((k, v));
            reduce_fn.reduce_group("a", &["1".to_string(), "1".to_string()], &mut emit);
        }
        assert_eq!(out, vec![("a".to_string(), "2".to_string())]);
    }

    #[test]
    fn inverted_index_round_trip() {
        let out = run_map(Application::InvertedIndex, &["cat dog", "dog bird"]);
        assert_eq!(
            out,
            vec![
                ("cat".to_string(), "0".to_string()),
                ("dog".to_string(), "0".to_string()),
                ("dog".to_string(), "1".to_string()),
                ("bird".to_string(), "1".to_string()),
            ]
        );

        let reduce_fn = Application::InvertedIndex.reduce_fn();
        let mut result = Vec::new();
        {
            let mut emit = |k: String, v: String| result.push((k, v));
            reduce_fn.reduce_group("dog", &["0".to_string(), "1".to_string()], &mut emit);
        }
        assert_eq!(result, vec![("dog".to_string(), "0,1".to_string())]);
    }

    #[test]
    fn by_name_round_trips() {
        assert_eq!(Application::by_name("wordcount"), Some(Application::WordCount));
        assert_eq!(
            Application::by_name("invertedindex"),
            Some(Application::InvertedIndex)
        );
        assert_eq!(Application::by_name("bogus"), None);
        assert_eq!(Application::WordCount.name(), "wordcount");
    }
}
