//! Export, re-export, and default-export extraction.

use std::collections::HashMap;
use std::sync::OnceLock;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

use crate::model::ReExportInfo;

const EXPORT_QUERY_SRC: &str = "(export_statement) @export_stmt";

static EXPORT_QUERY: OnceLock<Query> = OnceLock::new();

fn export_query(language: &Language) -> &'static Query {
    EXPORT_QUERY.get_or_init(|| Query::new(language, EXPORT_QUERY_SRC).expect("invalid export query"))
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Walk up from a declaration node to decide whether it carries a visible
/// `export` modifier, and whether it is the file's default export.
///
/// Returns `(is_exported, is_default)`.
pub fn detect_export(node: Node) -> (bool, bool) {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "export_statement" {
            let mut cursor = n.walk();
            let is_default = n
                .children(&mut cursor)
                .any(|c| c.kind() == "default" || c.kind() == "\"default\"");
            return (true, is_default);
        }
        // Declarations nest directly under export_statement in this grammar;
        // don't walk past the statement's natural parent chain.
        if matches!(
            n.kind(),
            "program" | "statement_block" | "class_body"
        ) {
            break;
        }
        current = n.parent();
    }
    (false, false)
}

/// Named-export bookkeeping result: exported name -> local name, plus any
/// `export ... from` re-export chains.
#[derive(Debug, Default)]
pub struct ExportTable {
    pub exported_names: HashMap<String, String>,
    pub re_exports: Vec<ReExportInfo>,
}

/// Extract `export { a, b as c }`, `export { a as b } from 'mod'`, and
/// `export * from 'mod'` statements. Inline exports (`export function foo`)
/// are handled at the declaration site via [`detect_export`], not here.
pub fn extract_export_table(tree: &Tree, source: &[u8], language: &Language) -> ExportTable {
    let mut table = ExportTable::default();
    let query = export_query(language);
    let stmt_idx = query.capture_index_for_name("export_stmt").unwrap();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if capture.index == stmt_idx {
                classify(capture.node, source, &mut table);
            }
        }
    }
    table
}

fn classify(node: Node, source: &[u8], table: &mut ExportTable) {
    let module_specifier = find_source(node, source);

    let has_star = (0..node.child_count()).any(|i| {
        node.child(i as u32)
            .map(|c| c.kind() == "*")
            .unwrap_or(false)
    });
    if has_star {
        // `export * from 'mod'` carries no named clause, so the exported name
        // isn't known until lookup time. Record a wildcard sentinel (empty
        // `exported_name`) that `resolve_local_name` falls through, trying
        // the wanted name itself against `mod`'s own exports.
        if let Some(specifier) = module_specifier {
            table.re_exports.push(ReExportInfo {
                exported_name: String::new(),
                imported_name: String::new(),
                module_specifier: specifier,
            });
        }
        return;
    }

    let is_default = (0..node.child_count()).any(|i| {
        node.child(i as u32)
            .map(|c| c.kind() == "default" || c.kind() == "\"default\"")
            .unwrap_or(false)
    });
    if is_default {
        // `export default someIdentifier;` re-exports an already-declared
        // binding under the file's default slot. Declaration-site defaults
        // (`export default class Foo {}`) are handled by `detect_export`
        // instead, since the declaration node itself is the payload here.
        if let Some(id) = find_child(node, "identifier") {
            table.exported_names.insert("default".to_string(), node_text(id, source).to_owned());
        }
        return;
    }

    if let Some(clause) = find_child(node, "export_clause") {
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            if child.kind() != "export_specifier" {
                continue;
            }
            let name_node = child.child_by_field_name("name");
            let alias_node = child.child_by_field_name("alias");
            let (local_or_imported, exported) = match (name_node, alias_node) {
                (Some(n), Some(a)) => (node_text(n, source).to_owned(), node_text(a, source).to_owned()),
                (Some(n), None) => (node_text(n, source).to_owned(), node_text(n, source).to_owned()),
                _ => continue,
            };
            if let Some(ref specifier) = module_specifier {
                table.re_exports.push(ReExportInfo {
                    exported_name: exported.clone(),
                    imported_name: local_or_imported,
                    module_specifier: specifier.clone(),
                });
                table.exported_names.insert(exported.clone(), exported);
            } else {
                table.exported_names.insert(exported, local_or_imported);
            }
        }
    }
}

fn find_source(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string" {
            if let Some(frag) = child.named_child(0) {
                return Some(node_text(frag, source).to_owned());
            }
        }
    }
    None
}

fn find_child<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
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
    fn named_export() {
        let src = "export { foo, bar as baz };";
        let (tree, lang) = parse(src);
        let table = extract_export_table(&tree, src.as_bytes(), &lang);
        assert_eq!(table.exported_names.get("foo"), Some(&"foo".to_string()));
        assert_eq!(table.exported_names.get("baz"), Some(&"bar".to_string()));
        assert!(table.re_exports.is_empty());
    }

    #[test]
    fn reexport_with_rename() {
        let src = "export { helper as h } from './utils';";
        let (tree, lang) = parse(src);
        let table = extract_export_table(&tree, src.as_bytes(), &lang);
        assert_eq!(table.re_exports.len(), 1);
        assert_eq!(table.re_exports[0].exported_name, "h");
        assert_eq!(table.re_exports[0].imported_name, "helper");
        assert_eq!(table.re_exports[0].module_specifier, "./utils");
    }

    #[test]
    fn default_export_of_a_bare_identifier_is_recorded() {
        let src = "class Worker {}\nexport default Worker;";
        let (tree, lang) = parse(src);
        let table = extract_export_table(&tree, src.as_bytes(), &lang);
        assert_eq!(table.exported_names.get("default"), Some(&"Worker".to_string()));
    }

    #[test]
    fn export_star_records_a_wildcard_reexport() {
        let src = "export * from './types';";
        let (tree, lang) = parse(src);
        let table = extract_export_table(&tree, src.as_bytes(), &lang);
        assert_eq!(table.re_exports.len(), 1);
        assert_eq!(table.re_exports[0].exported_name, "");
        assert_eq!(table.re_exports[0].module_specifier, "./types");
        assert!(table.exported_names.is_empty());
    }
}
