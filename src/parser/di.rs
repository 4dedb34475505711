//! Dependency-injection default-parameter extraction and constructor
//! field-assignment extraction.

use tree_sitter::Node;

use crate::model::{DiDefaultMapping, DiTarget, FieldAssignment, FieldSource};

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Unwrap a parameter-list entry to its `(name, default)` pair, if it has a
/// default value. Handles both the bare `p = v` shape and the TypeScript-
/// annotated `required_parameter`/`optional_parameter` wrapper, which carries
/// the pattern and the default value as separate fields instead of nesting
/// them in an `assignment_pattern`.
fn di_param_parts<'a>(param: Node<'a>) -> Option<(Node<'a>, Node<'a>)> {
    match param.kind() {
        "assignment_pattern" => Some((param.child_by_field_name("left")?, param.child_by_field_name("right")?)),
        "required_parameter" | "optional_parameter" => {
            Some((param.child_by_field_name("pattern")?, param.child_by_field_name("value")?))
        }
        _ => None,
    }
}

/// Scan a function-like node's `parameters` list for `p = { k: v, ... }`
/// defaults and produce one mapping per recognized own property.
pub fn extract_di_defaults(params_node: Node, source: &[u8]) -> Vec<DiDefaultMapping> {
    let mut out = Vec::new();
    let mut cursor = params_node.walk();
    for param in params_node.named_children(&mut cursor) {
        let Some((left, right)) = di_param_parts(param) else {
            continue;
        };
        if left.kind() != "identifier" || right.kind() != "object" {
            continue;
        }
        let param_name = node_text(left, source).to_owned();
        let mut obj_cursor = right.walk();
        for entry in right.named_children(&mut obj_cursor) {
            match entry.kind() {
                "shorthand_property_identifier" => out.push(DiDefaultMapping {
                    param_name: param_name.clone(),
                    prop_name: node_text(entry, source).to_owned(),
                    target: DiTarget::LocalRef(node_text(entry, source).to_owned()),
                }),
                "pair" => {
                    let (Some(key), Some(value)) = (
                        entry.child_by_field_name("key"),
                        entry.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    let prop_name = node_text(key, source).to_owned();
                    match value.kind() {
                        "identifier" => out.push(DiDefaultMapping {
                            param_name: param_name.clone(),
                            prop_name,
                            target: DiTarget::LocalRef(node_text(value, source).to_owned()),
                        }),
                        "member_expression" => {
                            if let (Some(obj), Some(prop)) = (
                                value.child_by_field_name("object"),
                                value.child_by_field_name("property"),
                            ) {
                                if obj.kind() == "identifier" {
                                    out.push(DiDefaultMapping {
                                        param_name: param_name.clone(),
                                        prop_name,
                                        target: DiTarget::MemberRef {
                                            object: node_text(obj, source).to_owned(),
                                            member: node_text(prop, source).to_owned(),
                                        },
                                    });
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }
    out
}

/// Extract `this.field = ...` assignments from a constructor body. Only the
/// two recognized right-hand-side shapes (parameter property access, bare
/// parameter identifier) are kept.
pub fn extract_field_assignments(body: Node, source: &[u8], param_names: &[String]) -> Vec<FieldAssignment> {
    let mut out = Vec::new();
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(expr) = stmt.named_child(0) else {
            continue;
        };
        if expr.kind() != "assignment_expression" {
            continue;
        }
        let (Some(left), Some(right)) = (
            expr.child_by_field_name("left"),
            expr.child_by_field_name("right"),
        ) else {
            continue;
        };
        if left.kind() != "member_expression" {
            continue;
        }
        let (Some(obj), Some(field)) = (
            left.child_by_field_name("object"),
            left.child_by_field_name("property"),
        ) else {
            continue;
        };
        if obj.kind() != "this" {
            continue;
        }
        let field_name = node_text(field, source).to_owned();

        match right.kind() {
            "member_expression" => {
                let (Some(robj), Some(rprop)) = (
                    right.child_by_field_name("object"),
                    right.child_by_field_name("property"),
                ) else {
                    continue;
                };
                if robj.kind() == "identifier" {
                    let param_name = node_text(robj, source).to_owned();
                    if param_names.contains(&param_name) {
                        out.push(FieldAssignment {
                            field_name,
                            source: FieldSource::ParamProperty {
                                param_name,
                                prop_name: node_text(rprop, source).to_owned(),
                            },
                        });
                    }
                }
            }
            "identifier" => {
                let local = node_text(right, source).to_owned();
                if param_names.contains(&local) {
                    out.push(FieldAssignment {
                        field_name,
                        source: FieldSource::LocalRef(local),
                    });
                }
            }
            _ => {}
        }
    }
    out
}

/// Collect the bare identifier names of a `parameters` node, unwrapping
/// `assignment_pattern` defaults to their left-hand identifier.
pub fn param_names(params_node: Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params_node.walk();
    for param in params_node.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => names.push(node_text(param, source).to_owned()),
            "assignment_pattern" => {
                if let Some(left) = param.child_by_field_name("left") {
                    if left.kind() == "identifier" {
                        names.push(node_text(left, source).to_owned());
                    }
                }
            }
            "required_parameter" | "optional_parameter" => {
                // TypeScript-annotated parameter wraps an inner pattern.
                if let Some(pattern) = param.child_by_field_name("pattern") {
                    if pattern.kind() == "identifier" {
                        names.push(node_text(pattern, source).to_owned());
                    }
                }
            }
            _ => {}
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::language_for_extension;

    fn params_node(source: &str) -> (tree_sitter::Tree, usize) {
        let lang = language_for_extension("ts").unwrap();
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&lang).unwrap();
        let tree = parser.parse(source.as_bytes(), None).unwrap();
        let id = {
            let func = tree.root_node().named_child(0).unwrap();
            let params = func.child_by_field_name("parameters").unwrap();
            params.id()
        };
        (tree, id)
    }

    fn find_by_id<'a>(node: Node<'a>, id: usize) -> Option<Node<'a>> {
        if node.id() == id {
            return Some(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if let Some(found) = find_by_id(child, id) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn untyped_parameter_default_is_recognized() {
        let src = "function f(deps = { streamText }) {}";
        let (tree, id) = params_node(src);
        let params = find_by_id(tree.root_node(), id).unwrap();
        let mappings = extract_di_defaults(params, src.as_bytes());
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].param_name, "deps");
        assert_eq!(mappings[0].prop_name, "streamText");
    }

    #[test]
    fn typed_parameter_default_is_recognized() {
        let src = "function f(deps: Deps = { streamText }) {}";
        let (tree, id) = params_node(src);
        let params = find_by_id(tree.root_node(), id).unwrap();
        let mappings = extract_di_defaults(params, src.as_bytes());
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].param_name, "deps");
        assert_eq!(mappings[0].prop_name, "streamText");
    }
}
