//! Recognizes the two structural instrumentation markers the parser treats
//! specially: `instrumentFn(fnExpr)` wrapping a single function value, and a
//! top-level `instrumentOwnMethodsInPlace(ClassName)` statement.

use tree_sitter::Node;

const WRAPPER_SENTINEL: &str = "instrumentFn";
const IN_PLACE_SENTINEL: &str = "instrumentOwnMethodsInPlace";

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// If `node` is a call to the wrapper sentinel, return the inner function
/// expression argument (the last argument, since both `instrumentFn(fn)` and
/// `instrumentFn(name, fn)` are recognized).
pub fn unwrap_instrument_call<'a>(node: Node<'a>, source: &'a [u8]) -> Option<Node<'a>> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "identifier" || node_text(callee, source) != WRAPPER_SENTINEL {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    args.named_children(&mut cursor).last()
}

/// If `node` is a top-level `instrumentOwnMethodsInPlace(ClassName)`
/// statement, return `ClassName`.
pub fn in_place_target<'a>(node: Node, source: &'a [u8]) -> Option<String> {
    let call = if node.kind() == "expression_statement" {
        node.named_child(0)?
    } else {
        node
    };
    if call.kind() != "call_expression" {
        return None;
    }
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "identifier" || node_text(callee, source) != IN_PLACE_SENTINEL {
        return None;
    }
    let args = call.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    if first.kind() == "identifier" {
        Some(node_text(first, source).to_owned())
    } else {
        None
    }
}
