//! Selector syntax: `path/to/file`, `path/to/file::name`, or
//! `path/to/file::a|b|C.method`, resolved against a repository root.

use std::path::{Path, PathBuf};

use crate::model::FunctionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub file_path: PathBuf,
    /// Empty means "every function declared in the file".
    pub qualified_names: Vec<String>,
}

impl Selector {
    pub fn parse(repo_root: &Path, raw: &str) -> Self {
        match raw.split_once("::") {
            Some((path_part, names_part)) => Selector {
                file_path: repo_root.join(path_part),
                qualified_names: names_part.split('|').map(str::to_string).collect(),
            },
            None => Selector {
                file_path: repo_root.join(raw),
                qualified_names: Vec::new(),
            },
        }
    }

    /// Expand this selector into concrete [`FunctionId`]s against a parsed file.
    /// When no qualified names were given, every function of the file is used.
    pub fn expand(&self, file: &crate::model::ParsedFile) -> Vec<FunctionId> {
        if self.qualified_names.is_empty() {
            file.functions
                .iter()
                .map(|f| FunctionId::new(self.file_path.clone(), f.qualified_name.clone()))
                .collect()
        } else {
            self.qualified_names
                .iter()
                .map(|name| FunctionId::new(self.file_path.clone(), name.clone()))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_file_selector() {
        let sel = Selector::parse(Path::new("/repo"), "src/a.ts");
        assert_eq!(sel.file_path, PathBuf::from("/repo/src/a.ts"));
        assert!(sel.qualified_names.is_empty());
    }

    #[test]
    fn parses_single_name_selector() {
        let sel = Selector::parse(Path::new("/repo"), "src/a.ts::main");
        assert_eq!(sel.qualified_names, vec!["main".to_string()]);
    }

    #[test]
    fn parses_pipe_separated_names() {
        let sel = Selector::parse(Path::new("/repo"), "src/a.ts::a|b|C.method");
        assert_eq!(
            sel.qualified_names,
            vec!["a".to_string(), "b".to_string(), "C.method".to_string()]
        );
    }
}
