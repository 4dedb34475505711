//! Declarative extraction of `import` declarations via a compiled tree-sitter
//! [`Query`], the same pattern the relationship and symbol extractors use.

use std::sync::OnceLock;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

use crate::model::{ImportInfo, ImportedName};

const IMPORT_QUERY_SRC: &str = r#"
    (import_statement
      source: (string (string_fragment) @module_path)) @import
"#;

static IMPORT_QUERY: OnceLock<Query> = OnceLock::new();

fn import_query(language: &Language) -> &'static Query {
    IMPORT_QUERY.get_or_init(|| Query::new(language, IMPORT_QUERY_SRC).expect("invalid import query"))
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Extract every `import` declaration in the file as zero or more
/// [`ImportInfo`] rows (one per bound local name).
pub fn extract_imports(tree: &Tree, source: &[u8], language: &Language) -> Vec<ImportInfo> {
    let query = import_query(language);
    let module_path_idx = query.capture_index_for_name("module_path").unwrap();
    let import_idx = query.capture_index_for_name("import").unwrap();

    let mut imports = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let mut import_node = None;
        let mut module_path = None;
        for capture in m.captures {
            if capture.index == import_idx {
                import_node = Some(capture.node);
            } else if capture.index == module_path_idx {
                module_path = Some(node_text(capture.node, source).to_owned());
            }
        }
        let (Some(import_node), Some(module_path)) = (import_node, module_path) else {
            continue;
        };
        collect_clause(import_node, &module_path, source, &mut imports);
    }

    imports
}

fn collect_clause(import_node: Node, module_path: &str, source: &[u8], out: &mut Vec<ImportInfo>) {
    let mut cursor = import_node.walk();
    for child in import_node.children(&mut cursor) {
        match child.kind() {
            "import_clause" => collect_import_clause(child, module_path, source, out),
            "namespace_import" => {
                if let Some(name) = namespace_import_name(child, source) {
                    out.push(ImportInfo {
                        local_name: name,
                        imported_name: ImportedName::Namespace,
                        module_specifier: module_path.to_owned(),
                    });
                }
            }
            _ => {}
        }
    }
}

fn collect_import_clause(clause: Node, module_path: &str, source: &[u8], out: &mut Vec<ImportInfo>) {
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => out.push(ImportInfo {
                local_name: node_text(child, source).to_owned(),
                imported_name: ImportedName::Default,
                module_specifier: module_path.to_owned(),
            }),
            "named_imports" => collect_named_imports(child, module_path, source, out),
            "namespace_import" => {
                if let Some(name) = namespace_import_name(child, source) {
                    out.push(ImportInfo {
                        local_name: name,
                        imported_name: ImportedName::Namespace,
                        module_specifier: module_path.to_owned(),
                    });
                }
            }
            _ => {}
        }
    }
}

fn namespace_import_name(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|c| c.kind() == "identifier")
        .map(|c| node_text(c, source).to_owned())
}

fn collect_named_imports(named: Node, module_path: &str, source: &[u8], out: &mut Vec<ImportInfo>) {
    let mut cursor = named.walk();
    for child in named.children(&mut cursor) {
        if child.kind() != "import_specifier" {
            continue;
        }
        let name_node = child.child_by_field_name("name");
        let alias_node = child.child_by_field_name("alias");
        match (name_node, alias_node) {
            (Some(original), Some(local)) => out.push(ImportInfo {
                local_name: node_text(local, source).to_owned(),
                imported_name: ImportedName::Named(node_text(original, source).to_owned()),
                module_specifier: module_path.to_owned(),
            }),
            (Some(original), None) => out.push(ImportInfo {
                local_name: node_text(original, source).to_owned(),
                imported_name: ImportedName::Named(node_text(original, source).to_owned()),
                module_specifier: module_path.to_owned(),
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::language_for_extension;

    fn parse(source: &str) -> (Tree, Language) {
        let lang = language_for_extension("ts").unwrap();
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&lang).unwrap();
        (parser.parse(source.as_bytes(), None).unwrap(), lang)
    }

    #[test]
    fn named_imports() {
        let src = "import { useState, useEffect as ue } from 'react';";
        let (tree, lang) = parse(src);
        let imports = extract_imports(&tree, src.as_bytes(), &lang);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].local_name, "useState");
        assert_eq!(imports[0].module_specifier, "react");
        assert_eq!(imports[1].local_name, "ue");
        assert_eq!(
            imports[1].imported_name,
            ImportedName::Named("useEffect".into())
        );
    }

    #[test]
    fn default_import() {
        let src = "import React from 'react';";
        let (tree, lang) = parse(src);
        let imports = extract_imports(&tree, src.as_bytes(), &lang);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].imported_name, ImportedName::Default);
    }

    #[test]
    fn namespace_import() {
        let src = "import * as path from 'path';";
        let (tree, lang) = parse(src);
        let imports = extract_imports(&tree, src.as_bytes(), &lang);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].local_name, "path");
        assert_eq!(imports[0].imported_name, ImportedName::Namespace);
    }
}
