//! Object-literal façade recognition: `const Obj = { a, b: c, d() {...} }`
//! (optionally `Object.freeze(...)`-wrapped), used as a namespace over
//! functions defined elsewhere or inline.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::model::ParsedFunction;
use crate::parser::di;
use crate::parser::scope::{collect_calls, line_span, node_text};

pub struct FacadeResult {
    pub functions: Vec<ParsedFunction>,
    pub bindings: HashMap<String, String>,
}

/// `object_node` must already be unwrapped to an `object` literal node.
pub fn extract_facade(obj_name: &str, object_node: Node, source: &[u8]) -> FacadeResult {
    let mut functions = Vec::new();
    let mut bindings = HashMap::new();

    let mut cursor = object_node.walk();
    for entry in object_node.named_children(&mut cursor) {
        match entry.kind() {
            "shorthand_property_identifier" => {
                let name = node_text(entry, source).to_owned();
                bindings.insert(format!("{obj_name}.{name}"), name);
            }
            "pair" => {
                let (Some(key), Some(value)) = (
                    entry.child_by_field_name("key"),
                    entry.child_by_field_name("value"),
                ) else {
                    continue;
                };
                if key.kind() == "computed_property_name" {
                    continue;
                }
                let prop_name = node_text(key, source).trim_matches(['"', '\'']).to_owned();
                match value.kind() {
                    "identifier" => {
                        bindings.insert(
                            format!("{obj_name}.{prop_name}"),
                            node_text(value, source).to_owned(),
                        );
                    }
                    "arrow_function" | "function_expression" => {
                        let qualified = format!("{obj_name}.{prop_name}");
                        functions.push(build_inline_function(&qualified, value, source));
                        bindings.insert(qualified.clone(), qualified);
                    }
                    _ => {}
                }
            }
            "method_definition" => {
                let Some(name_node) = entry.child_by_field_name("name") else {
                    continue;
                };
                let prop_name = node_text(name_node, source).to_owned();
                let qualified = format!("{obj_name}.{prop_name}");
                functions.push(build_inline_function(&qualified, entry, source));
                bindings.insert(qualified.clone(), qualified);
            }
            _ => {}
        }
    }

    FacadeResult { functions, bindings }
}

fn build_inline_function(qualified_name: &str, owner: Node, source: &[u8]) -> ParsedFunction {
    let params = owner.child_by_field_name("parameters");
    let body = owner.child_by_field_name("body");
    let mut call_sites = Vec::new();
    if let Some(b) = body {
        collect_calls(b, source, None, &mut call_sites);
    }
    let di_defaults = params
        .map(|p| di::extract_di_defaults(p, source))
        .unwrap_or_default();
    let (first_line, last_line) = line_span(owner);
    ParsedFunction {
        qualified_name: qualified_name.to_owned(),
        first_line,
        last_line,
        is_instrumented: false,
        call_sites,
        di_defaults,
        field_assignments: None,
        description: None,
        signature: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::language_for_extension;

    fn parse(source: &str) -> tree_sitter::Tree {
        let lang = language_for_extension("ts").unwrap();
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&lang).unwrap();
        parser.parse(source.as_bytes(), None).unwrap()
    }

    #[test]
    fn shorthand_binding() {
        let src = "const Obj = { foo };";
        let tree = parse(src);
        let root = tree.root_node();
        let decl = root.named_child(0).unwrap();
        let declarator = decl.named_child(0).unwrap();
        let value = declarator.child_by_field_name("value").unwrap();
        let result = extract_facade("Obj", value, src.as_bytes());
        assert_eq!(result.bindings.get("Obj.foo"), Some(&"foo".to_string()));
        assert!(result.functions.is_empty());
    }

    #[test]
    fn inline_method_creates_function() {
        let src = "const Obj = { foo() { bar(); } };";
        let tree = parse(src);
        let root = tree.root_node();
        let decl = root.named_child(0).unwrap();
        let declarator = decl.named_child(0).unwrap();
        let value = declarator.child_by_field_name("value").unwrap();
        let result = extract_facade("Obj", value, src.as_bytes());
        assert_eq!(result.functions.len(), 1);
        assert_eq!(result.functions[0].qualified_name, "Obj.foo");
        assert_eq!(result.bindings.get("Obj.foo"), Some(&"Obj.foo".to_string()));
    }
}
