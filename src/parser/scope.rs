//! Scope-aware function discovery and call-site extraction.
//!
//! This is a manual recursive walk rather than a declarative query because
//! call-site extraction is scope-sensitive: nested function and class
//! declarations start an independent scope, but a function expression or
//! arrow function passed as a call argument is a *continuation* of the
//! enclosing scope (so `.map(x => f(x))`-style callbacks contribute edges to
//! the caller, not to an invisible anonymous function).

use std::collections::{HashMap, HashSet};

use tree_sitter::{Node, Tree};

use crate::model::{CallSite, ParsedFunction};
use crate::parser::{di, exports, facade, instrumentation};

pub const MODULE_SCOPE: &str = crate::model::MODULE_SCOPE;

#[derive(Debug, Default)]
pub struct ScopeResult {
    pub functions: Vec<ParsedFunction>,
    pub object_property_bindings: HashMap<String, String>,
    pub instance_bindings: HashMap<String, String>,
    pub exported_names: HashMap<String, String>,
}

pub(crate) fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

pub(crate) fn line_span(node: Node) -> (usize, usize) {
    (
        node.start_position().row + 1,
        node.end_position().row + 1,
    )
}

fn has_keyword_child(node: Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.kind() == keyword)
}

fn unwrap_export(node: Node) -> Node {
    if node.kind() == "export_statement" {
        if let Some(decl) = node.child_by_field_name("declaration") {
            return decl;
        }
    }
    node
}

/// Peel `Object.freeze(...)`, `... as const`, and `... satisfies T` wrappers
/// down to the object literal (or function) they decorate.
fn unwrap_facade_target<'a>(mut node: Node<'a>, source: &'a [u8]) -> Node<'a> {
    loop {
        match node.kind() {
            "as_expression" | "satisfies_expression" | "parenthesized_expression" => {
                let inner = node
                    .child_by_field_name("expression")
                    .or_else(|| node.named_child(0));
                match inner {
                    Some(next) => node = next,
                    None => break,
                }
            }
            "call_expression" => {
                let Some(callee) = node.child_by_field_name("function") else {
                    break;
                };
                if callee.kind() != "member_expression" {
                    break;
                }
                let obj = callee.child_by_field_name("object").map(|o| node_text(o, source));
                let prop = callee.child_by_field_name("property").map(|p| node_text(p, source));
                if obj != Some("Object") || prop != Some("freeze") {
                    break;
                }
                let Some(args) = node.child_by_field_name("arguments") else {
                    break;
                };
                match args.named_child(0) {
                    Some(first) => node = first,
                    None => break,
                }
            }
            _ => break,
        }
    }
    node
}

fn record_call(callee: Node, call_node: Node, source: &[u8], self_class: Option<&str>) -> Option<CallSite> {
    let line = call_node.start_position().row + 1;
    match callee.kind() {
        "identifier" => Some(CallSite::Named {
            name: node_text(callee, source).to_owned(),
            line,
        }),
        "member_expression" => {
            let object = callee.child_by_field_name("object")?;
            let property = callee.child_by_field_name("property")?;
            let object_token = if object.kind() == "this" {
                self_class?.to_owned()
            } else if object.kind() == "identifier" {
                node_text(object, source).to_owned()
            } else {
                return None;
            };
            Some(CallSite::Member {
                object: object_token,
                property: node_text(property, source).to_owned(),
                line,
            })
        }
        _ => None,
    }
}

/// Walk `node`'s descendants collecting call sites, refusing to cross into
/// nested function/class scopes except through the call-argument
/// continuation rule.
pub(crate) fn collect_calls(node: Node, source: &[u8], self_class: Option<&str>, out: &mut Vec<CallSite>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, source, self_class, out);
    }
}

fn visit(node: Node, source: &[u8], self_class: Option<&str>, out: &mut Vec<CallSite>) {
    match node.kind() {
        "function_declaration" | "function_expression" | "arrow_function" | "generator_function"
        | "class_declaration" | "class" | "method_definition" => {
            // Independent scope: handled at its own declaration site, not here.
        }
        "new_expression" => {
            if let Some(callee) = node.child_by_field_name("constructor") {
                if callee.kind() == "identifier" {
                    out.push(CallSite::Member {
                        object: node_text(callee, source).to_owned(),
                        property: "constructor".to_owned(),
                        line: node.start_position().row + 1,
                    });
                }
            }
            if let Some(args) = node.child_by_field_name("arguments") {
                collect_calls(args, source, self_class, out);
            }
        }
        "call_expression" => {
            if let Some(callee) = node.child_by_field_name("function") {
                if let Some(site) = record_call(callee, node, source, self_class) {
                    out.push(site);
                }
                visit(callee, source, self_class, out);
            }
            if let Some(args) = node.child_by_field_name("arguments") {
                let mut cursor = args.walk();
                for arg in args.named_children(&mut cursor) {
                    if matches!(
                        arg.kind(),
                        "arrow_function" | "function_expression" | "generator_function"
                    ) {
                        // Continuation: a callback argument inlines into the enclosing scope.
                        if let Some(body) = arg.child_by_field_name("body") {
                            collect_calls(body, source, self_class, out);
                        }
                    } else {
                        visit(arg, source, self_class, out);
                    }
                }
            }
        }
        _ => collect_calls(node, source, self_class, out),
    }
}

fn signature_text(params: Node, owner: Node, source: &[u8]) -> Option<String> {
    let params_text = node_text(params, source).to_owned();
    let return_type = owner
        .child_by_field_name("return_type")
        .map(|t| format!(": {}", node_text(t, source)));
    Some(format!("{params_text}{}", return_type.unwrap_or_default()))
}

fn build_plain_function(name: String, owner: Node, source: &[u8]) -> ParsedFunction {
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
        qualified_name: name,
        first_line,
        last_line,
        is_instrumented: false,
        call_sites,
        di_defaults,
        field_assignments: None,
        description: None,
        signature: params.and_then(|p| signature_text(p, owner, source)),
    }
}

fn extract_class(
    class_node: Node,
    source: &[u8],
    functions: &mut Vec<ParsedFunction>,
    object_property_bindings: &mut HashMap<String, String>,
) {
    let class_name = class_node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_owned())
        .unwrap_or_default();
    let Some(body) = class_node.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_definition" => {
                let Some(name_node) = member.child_by_field_name("name") else {
                    continue;
                };
                let raw_name = node_text(name_node, source).to_owned();
                let member_name = if has_keyword_child(member, "get") {
                    format!("get {raw_name}")
                } else if has_keyword_child(member, "set") {
                    format!("set {raw_name}")
                } else {
                    raw_name.clone()
                };
                let qualified_name = format!("{class_name}.{member_name}");
                let params = member.child_by_field_name("parameters");
                let body_node = member.child_by_field_name("body");
                let mut call_sites = Vec::new();
                if let Some(b) = body_node {
                    collect_calls(b, source, Some(&class_name), &mut call_sites);
                }
                let di_defaults = params
                    .map(|p| di::extract_di_defaults(p, source))
                    .unwrap_or_default();
                let field_assignments = if raw_name == "constructor" {
                    let pnames = params.map(|p| di::param_names(p, source)).unwrap_or_default();
                    body_node.map(|b| di::extract_field_assignments(b, source, &pnames))
                } else {
                    None
                };
                let (first_line, last_line) = line_span(member);
                functions.push(ParsedFunction {
                    qualified_name,
                    first_line,
                    last_line,
                    is_instrumented: false,
                    call_sites,
                    di_defaults,
                    field_assignments,
                    description: None,
                    signature: params.and_then(|p| signature_text(p, member, source)),
                });
            }
            "public_field_definition" | "field_definition" => {
                let (Some(name_node), Some(value)) = (
                    member.child_by_field_name("name"),
                    member.child_by_field_name("value"),
                ) else {
                    continue;
                };
                if !matches!(value.kind(), "arrow_function" | "function_expression") {
                    continue;
                }
                let member_name = node_text(name_node, source).to_owned();
                let qualified_name = format!("{class_name}.{member_name}");
                let params = value.child_by_field_name("parameters");
                let mut call_sites = Vec::new();
                if let Some(b) = value.child_by_field_name("body") {
                    collect_calls(b, source, Some(&class_name), &mut call_sites);
                }
                let di_defaults = params
                    .map(|p| di::extract_di_defaults(p, source))
                    .unwrap_or_default();
                let (first_line, last_line) = line_span(member);
                functions.push(ParsedFunction {
                    qualified_name,
                    first_line,
                    last_line,
                    is_instrumented: false,
                    call_sites,
                    di_defaults,
                    field_assignments: None,
                    description: None,
                    signature: params.and_then(|p| signature_text(p, value, source)),
                });
            }
            _ => {}
        }
        let _ = object_property_bindings; // classes never populate this map directly
    }
}

fn extract_variable_declaration(
    decl: Node,
    source: &[u8],
    functions: &mut Vec<ParsedFunction>,
    object_property_bindings: &mut HashMap<String, String>,
    instance_bindings: &mut HashMap<String, String>,
) {
    let mut cursor = decl.walk();
    for declarator in decl.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let (Some(name_node), Some(raw_value)) = (
            declarator.child_by_field_name("name"),
            declarator.child_by_field_name("value"),
        ) else {
            continue;
        };
        if name_node.kind() != "identifier" {
            continue;
        }
        let var_name = node_text(name_node, source).to_owned();

        let (value, is_instrumented) =
            match instrumentation::unwrap_instrument_call(raw_value, source) {
                Some(inner) => (inner, true),
                None => (raw_value, false),
            };

        match value.kind() {
            "arrow_function" | "function_expression" | "generator_function" => {
                let mut f = build_plain_function(var_name, value, source);
                f.is_instrumented = is_instrumented;
                functions.push(f);
            }
            "new_expression" => {
                if let Some(callee) = value.child_by_field_name("constructor") {
                    if callee.kind() == "identifier" {
                        instance_bindings.insert(var_name, node_text(callee, source).to_owned());
                    }
                }
            }
            _ => {
                let target = unwrap_facade_target(value, source);
                if target.kind() == "object" {
                    let facade_result = facade::extract_facade(&var_name, target, source);
                    functions.extend(facade_result.functions);
                    object_property_bindings.extend(facade_result.bindings);
                }
            }
        }
    }
}

pub fn extract(tree: &Tree, source: &[u8]) -> ScopeResult {
    let root = tree.root_node();
    let mut functions = Vec::new();
    let mut object_property_bindings = HashMap::new();
    let mut instance_bindings = HashMap::new();
    let mut exported_names = HashMap::new();
    let mut instrumented_classes: HashSet<String> = HashSet::new();
    let mut module_call_sites = Vec::new();
    let mut has_module_scope = false;

    let mut cursor = root.walk();
    let top_nodes: Vec<Node> = root.named_children(&mut cursor).collect();

    for top in &top_nodes {
        if let Some(class_name) = instrumentation::in_place_target(*top, source) {
            instrumented_classes.insert(class_name);
        }
    }

    for top in &top_nodes {
        let decl = unwrap_export(*top);
        let (is_exported, is_default) = exports::detect_export(decl);

        match decl.kind() {
            "function_declaration" => {
                if let Some(name_node) = decl.child_by_field_name("name") {
                    let name = node_text(name_node, source).to_owned();
                    functions.push(build_plain_function(name.clone(), decl, source));
                    if is_default {
                        exported_names.insert("default".to_string(), name.clone());
                    }
                    if is_exported {
                        exported_names.insert(name.clone(), name);
                    }
                }
            }
            "class_declaration" => {
                extract_class(decl, source, &mut functions, &mut object_property_bindings);
                if let Some(name_node) = decl.child_by_field_name("name") {
                    let name = node_text(name_node, source).to_owned();
                    if is_default {
                        exported_names.insert("default".to_string(), name.clone());
                    }
                    if is_exported {
                        exported_names.insert(name.clone(), name);
                    }
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                extract_variable_declaration(
                    decl,
                    source,
                    &mut functions,
                    &mut object_property_bindings,
                    &mut instance_bindings,
                );
                if is_exported {
                    let mut dcursor = decl.walk();
                    for declarator in decl.named_children(&mut dcursor) {
                        if declarator.kind() != "variable_declarator" {
                            continue;
                        }
                        if let Some(name_node) = declarator.child_by_field_name("name") {
                            if name_node.kind() == "identifier" {
                                let name = node_text(name_node, source).to_owned();
                                if is_default {
                                    exported_names.insert("default".to_string(), name.clone());
                                }
                                exported_names.insert(name.clone(), name);
                            }
                        }
                    }
                }
            }
            _ => {}
        }

        if top.kind() == "expression_statement" {
            let mut sites = Vec::new();
            collect_calls(*top, source, None, &mut sites);
            if !sites.is_empty() {
                has_module_scope = true;
                module_call_sites.extend(sites);
            }
        }
    }

    for f in functions.iter_mut() {
        if let Some((class_name, _)) = f.qualified_name.split_once('.') {
            if instrumented_classes.contains(class_name) {
                f.is_instrumented = true;
            }
        }
    }

    if has_module_scope {
        let last_line = source.iter().filter(|&&b| b == b'\n').count() + 1;
        functions.push(ParsedFunction {
            qualified_name: MODULE_SCOPE.to_string(),
            first_line: 1,
            last_line,
            is_instrumented: false,
            call_sites: module_call_sites,
            di_defaults: Vec::new(),
            field_assignments: None,
            description: None,
            signature: None,
        });
    }

    ScopeResult {
        functions,
        object_property_bindings,
        instance_bindings,
        exported_names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::language_for_extension;

    fn parse(source: &str) -> Tree {
        let lang = language_for_extension("ts").unwrap();
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&lang).unwrap();
        parser.parse(source.as_bytes(), None).unwrap()
    }

    #[test]
    fn named_call_in_function() {
        let src = "function main() { helper(); }";
        let tree = parse(src);
        let result = extract(&tree, src.as_bytes());
        let main = result.functions.iter().find(|f| f.qualified_name == "main").unwrap();
        assert_eq!(main.call_sites.len(), 1);
        assert!(matches!(&main.call_sites[0], CallSite::Named { name, .. } if name == "helper"));
    }

    #[test]
    fn callback_argument_is_continuation() {
        let src = "function main() { items.forEach(x => helper(x)); }";
        let tree = parse(src);
        let result = extract(&tree, src.as_bytes());
        let main = result.functions.iter().find(|f| f.qualified_name == "main").unwrap();
        let names: Vec<_> = main
            .call_sites
            .iter()
            .filter_map(|c| match c {
                CallSite::Named { name, .. } => Some(name.as_str()),
                CallSite::Member { property, .. } => Some(property.as_str()),
            })
            .collect();
        assert!(names.contains(&"forEach"));
        assert!(names.contains(&"helper"));
    }

    #[test]
    fn self_call_rewritten_to_class_name() {
        let src = "class Agent { run() { return this.process(); } }";
        let tree = parse(src);
        let result = extract(&tree, src.as_bytes());
        let run = result
            .functions
            .iter()
            .find(|f| f.qualified_name == "Agent.run")
            .unwrap();
        assert!(matches!(
            &run.call_sites[0],
            CallSite::Member { object, property, .. } if object == "Agent" && property == "process"
        ));
    }

    #[test]
    fn module_scope_emitted_for_top_level_call() {
        let src = "helper();";
        let tree = parse(src);
        let result = extract(&tree, src.as_bytes());
        assert!(result.functions.iter().any(|f| f.qualified_name == MODULE_SCOPE));
    }

    #[test]
    fn module_scope_absent_without_top_level_call() {
        let src = "const x = 1;";
        let tree = parse(src);
        let result = extract(&tree, src.as_bytes());
        assert!(!result.functions.iter().any(|f| f.qualified_name == MODULE_SCOPE));
    }

    #[test]
    fn new_expression_records_instance_binding() {
        let src = "class Worker {} const w = new Worker();";
        let tree = parse(src);
        let result = extract(&tree, src.as_bytes());
        assert_eq!(result.instance_bindings.get("w"), Some(&"Worker".to_string()));
    }
}
