use indexmap::IndexMap;
use std::fmt;

use crate::error::{Diag, Error};

/// Location of a source line. `idx` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    pub path: String,
    pub idx: usize,
}

impl Pos {
    pub fn new(path: &str, idx: usize) -> Self {
        Pos {
            path: path.to_string(),
            idx,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.idx + 1)
    }
}

/// Input files in path order, split into lines.
#[derive(Debug, Default, Clone)]
pub struct Source {
    files: IndexMap<String, Vec<String>>,
}

impl Source {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(paths: &[String]) -> Result<Self, Diag> {
        for (idx, path) in paths.iter().enumerate() {
            if paths[..idx].contains(path) {
                return Err(Error::DuplicateInput(path.clone()).into());
            }
        }
        let mut source = Source::new();
        for path in paths {
            let text = std::fs::read_to_string(path)
                .map_err(|e| Error::FileOpen(path.clone(), e))?;
            source.push(path, &text);
        }
        Ok(source)
    }

    /// Add a file. A path already present is replaced.
    pub fn push(&mut self, path: &str, text: &str) {
        let lines = text.lines().map(str::to_string).collect();
        self.files.insert(path.to_string(), lines);
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.files
            .iter()
            .map(|(path, lines)| (path.as_str(), lines.as_slice()))
    }

    pub fn lines(&self) -> impl Iterator<Item = (Pos, &str)> {
        self.files.iter().flat_map(|(path, lines)| {
            lines
                .iter()
                .enumerate()
                .map(move |(idx, line)| (Pos::new(path, idx), line.as_str()))
        })
    }

    pub fn line(&self, pos: &Pos) -> Option<&str> {
        self.files
            .get(&pos.path)
            .and_then(|lines| lines.get(pos.idx))
            .map(|s| s.as_str())
    }
}
