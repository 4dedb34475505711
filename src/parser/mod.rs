//! File-level parser: converts one source file's syntax tree into a
//! [`ParsedFile`](crate::model::ParsedFile).

pub mod di;
pub mod exports;
pub mod facade;
pub mod imports;
pub mod instrumentation;
pub mod scope;

use std::cell::RefCell;
use std::path::Path;

use tree_sitter::{Language, Parser};

use crate::error::FileFault;
use crate::model::ParsedFile;
use crate::resolver::TargetSyntax;

// Thread-local Parser instances: one per worker thread, zero lock contention
// when parsing files in parallel.
thread_local! {
    static PARSER_TS: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()).unwrap();
        p
    });
    static PARSER_TSX: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into()).unwrap();
        p
    });
    static PARSER_JS: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_javascript::LANGUAGE.into()).unwrap();
        p
    });
}

/// Map a file extension to its tree-sitter grammar.
pub fn language_for_extension(ext: &str) -> Option<Language> {
    match ext {
        "ts" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" | "jsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "js" | "mjs" | "cjs" => Some(tree_sitter_javascript::LANGUAGE.into()),
        _ => None,
    }
}

/// Parse one file's source text into a [`ParsedFile`], reusing the calling
/// thread's cached `Parser`. Suitable for parallel (e.g. `rayon`) use.
///
/// `target_syntax` only matters for the ambiguous `.js`/`.mjs`/`.cjs`
/// extensions: a project configured as TypeScript parses them with the
/// TypeScript grammar (a strict superset) so `allowJs`-style type-annotated
/// JavaScript still parses; a JavaScript-only project keeps the plain JS
/// grammar. `.ts`/`.tsx`/`.jsx` are unambiguous and always use their own
/// grammar regardless of `target_syntax`.
pub fn parse_file(path: &Path, source: &[u8], target_syntax: TargetSyntax) -> Result<ParsedFile, FileFault> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let is_tsx = matches!(ext, "tsx" | "jsx");
    let js_as_ts = matches!(ext, "js" | "mjs" | "cjs") && target_syntax == TargetSyntax::TypeScript;

    let tree = match ext {
        "ts" => PARSER_TS.with(|p| p.borrow_mut().parse(source, None)),
        "tsx" | "jsx" => PARSER_TSX.with(|p| p.borrow_mut().parse(source, None)),
        "js" | "mjs" | "cjs" if js_as_ts => PARSER_TS.with(|p| p.borrow_mut().parse(source, None)),
        "js" | "mjs" | "cjs" => PARSER_JS.with(|p| p.borrow_mut().parse(source, None)),
        other => {
            return Err(FileFault::ParseError {
                path: path.to_path_buf(),
                reason: format!("unsupported file extension: {other:?}"),
            });
        }
    };
    let tree = tree.ok_or_else(|| FileFault::ParseError {
        path: path.to_path_buf(),
        reason: "tree-sitter returned no tree".to_string(),
    })?;

    let language = if is_tsx {
        language_for_extension("tsx").expect("checked above")
    } else if js_as_ts {
        language_for_extension("ts").expect("checked above")
    } else {
        language_for_extension(ext).expect("checked above")
    };

    let scope_result = scope::extract(&tree, source);
    let file_imports = imports::extract_imports(&tree, source, &language);
    let export_table = exports::extract_export_table(&tree, source, &language);

    let mut exported_names = scope_result.exported_names;
    for (k, v) in export_table.exported_names {
        exported_names.insert(k, v);
    }

    Ok(ParsedFile {
        file_path: path.to_path_buf(),
        functions: scope_result.functions,
        imports: file_imports,
        re_exports: export_table.re_exports,
        exported_names,
        object_property_bindings: scope_result.object_property_bindings,
        instance_bindings: scope_result.instance_bindings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_simple_file() {
        let src = b"export function main() { helper(); }\nfunction helper() {}\n";
        let parsed = parse_file(&PathBuf::from("a.ts"), src, TargetSyntax::TypeScript).unwrap();
        assert_eq!(parsed.functions.len(), 2);
        assert_eq!(parsed.exported_names.get("main"), Some(&"main".to_string()));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let err = parse_file(&PathBuf::from("a.rs"), b"fn main() {}", TargetSyntax::TypeScript).unwrap_err();
        assert!(matches!(err, FileFault::ParseError { .. }));
    }

    #[test]
    fn javascript_target_keeps_js_files_on_the_js_grammar() {
        let src = b"export function main() { helper(); }\nfunction helper() {}\n";
        let parsed = parse_file(&PathBuf::from("a.js"), src, TargetSyntax::JavaScript).unwrap();
        assert_eq!(parsed.functions.len(), 2);
    }

    #[test]
    fn typescript_target_parses_js_files_with_the_ts_grammar() {
        let src = b"export function main(): void { helper(); }\nfunction helper(): void {}\n";
        let parsed = parse_file(&PathBuf::from("a.js"), src, TargetSyntax::TypeScript).unwrap();
        assert_eq!(parsed.functions.len(), 2);
    }
}
