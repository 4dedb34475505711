//! The `ParsedFile` cache: owned by a resolver for the lifetime of one graph
//! build, keyed by absolute path, written once per file and read many times.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::diagnostics::DiagnosticSink;
use crate::error::{Diagnostic, FileFault};
use crate::model::ParsedFile;
use crate::parser;
use crate::resolver::TargetSyntax;

pub struct ParsedFileCache {
    entries: HashMap<PathBuf, Option<Rc<ParsedFile>>>,
    target_syntax: TargetSyntax,
}

impl ParsedFileCache {
    pub fn new(target_syntax: TargetSyntax) -> Self {
        Self {
            entries: HashMap::new(),
            target_syntax,
        }
    }

    /// Return the cached parse of `path`, parsing it on first access. A
    /// previously failed parse stays cached as `None` so a faulty file is
    /// only reported once per build.
    pub fn get_or_parse(&mut self, path: &Path, sink: &mut dyn DiagnosticSink) -> Option<Rc<ParsedFile>> {
        if let Some(entry) = self.entries.get(path) {
            return entry.clone();
        }

        let result = self.load(path);
        let value = match result {
            Ok(parsed) => Some(Rc::new(parsed)),
            Err(fault) => {
                sink.record(Diagnostic::File(fault));
                None
            }
        };
        self.entries.insert(path.to_path_buf(), value.clone());
        value
    }

    fn load(&self, path: &Path) -> Result<ParsedFile, FileFault> {
        let bytes = std::fs::read(path).map_err(|e| FileFault::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        parser::parse_file(path, &bytes, self.target_syntax)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    #[test]
    fn caches_repeat_reads() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "export function f() {}\n").unwrap();

        let mut cache = ParsedFileCache::new(TargetSyntax::default());
        let mut sink = CollectingSink::default();
        let first = cache.get_or_parse(&file, &mut sink).unwrap();
        let second = cache.get_or_parse(&file, &mut sink).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn missing_file_records_diagnostic() {
        let mut cache = ParsedFileCache::new(TargetSyntax::default());
        let mut sink = CollectingSink::default();
        let result = cache.get_or_parse(Path::new("/does/not/exist.ts"), &mut sink);
        assert!(result.is_none());
        assert_eq!(sink.diagnostics.len(), 1);
    }
}
