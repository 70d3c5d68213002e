//! Example snippets stored beside the documentation, keyed by member id.

use crate::links::page_name;
use std::fs;
use std::path::PathBuf;

/// Keyed lookup of example code; absence is not an error.
pub trait ExampleSource {
    fn try_read_example(&self, id: &str) -> Option<String>;
}

/// No snippets configured.
pub struct NoExamples;

impl ExampleSource for NoExamples {
    fn try_read_example(&self, _id: &str) -> Option<String> {
        None
    }
}

/// Snippets in a directory: `<dir>/<sanitized id>.<any extension>`.
pub struct DirExamples {
    dir: PathBuf,
}

impl DirExamples {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn find(&self, id: &str) -> Option<PathBuf> {
        let stem = page_name(id);
        let pattern = format!(
            "{}/{}.*",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            glob::Pattern::escape(&stem)
        );
        match glob::glob(&pattern) {
            Ok(paths) => paths
                .filter_map(|r| r.ok())
                .filter(|p| p.file_stem().and_then(|s| s.to_str()) == Some(stem.as_str()))
                .find(|p| p.is_file()),
            Err(e) => {
                log::warn!("invalid example pattern {}: {}", pattern, e);
                None
            }
        }
    }
}

impl ExampleSource for DirExamples {
    fn try_read_example(&self, id: &str) -> Option<String> {
        let path = self.find(id)?;
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("failed to read example {}: {}", path.display(), e);
                None
            }
        }
    }
}
