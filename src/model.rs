//! Core data model: the typed call graph and everything the parser extracts
//! in order to build it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Sentinel qualified name for a file's synthetic top-level scope.
pub const MODULE_SCOPE: &str = "<module>";

/// File-path prefix used for synthetic external-package nodes.
pub const EXTERNAL_PREFIX: &str = "<external>::";

/// A total identifier for a function-like entity: the pair of the file that
/// declares it and its qualified name within that file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId {
    pub file_path: PathBuf,
    pub qualified_name: String,
}

impl FunctionId {
    pub fn new(file_path: impl Into<PathBuf>, qualified_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            qualified_name: qualified_name.into(),
        }
    }

    pub fn external(specifier: &str, qualified_name: impl Into<String>) -> Self {
        Self {
            file_path: PathBuf::from(format!("{EXTERNAL_PREFIX}{specifier}")),
            qualified_name: qualified_name.into(),
        }
    }

    pub fn is_external(&self) -> bool {
        self.file_path
            .to_str()
            .is_some_and(|s| s.starts_with(EXTERNAL_PREFIX))
    }
}

/// A single call expression found in a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallSite {
    /// `identifier(...)`
    Named { name: String, line: usize },
    /// `object.property(...)` or `new Class(...)`.
    Member {
        object: String,
        property: String,
        line: usize,
    },
}

impl CallSite {
    pub fn line(&self) -> usize {
        match self {
            CallSite::Named { line, .. } => *line,
            CallSite::Member { line, .. } => *line,
        }
    }
}

/// One parameter-default-object mapping extracted from a dependency-injection
/// style default parameter: `f(p = { k: v })`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiDefaultMapping {
    pub param_name: String,
    pub prop_name: String,
    pub target: DiTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiTarget {
    LocalRef(String),
    MemberRef { object: String, member: String },
}

/// A `this.field = ...` assignment found inside a constructor body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub field_name: String,
    pub source: FieldSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSource {
    /// `this.field = paramName.propName`
    ParamProperty { param_name: String, prop_name: String },
    /// `this.field = localRef`
    LocalRef(String),
}

/// One extracted function-like declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFunction {
    pub qualified_name: String,
    pub first_line: usize,
    pub last_line: usize,
    pub is_instrumented: bool,
    pub call_sites: Vec<CallSite>,
    pub di_defaults: Vec<DiDefaultMapping>,
    /// Populated only for constructors.
    pub field_assignments: Option<Vec<FieldAssignment>>,
    pub description: Option<String>,
    pub signature: Option<String>,
}

impl ParsedFunction {
    pub fn is_constructor(&self) -> bool {
        self.qualified_name.ends_with(".constructor")
    }
}

/// One `import` declaration binding a local name to an exported name of
/// another module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    pub local_name: String,
    pub imported_name: ImportedName,
    pub module_specifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

/// An `export { a as b } from 'mod'` style re-export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReExportInfo {
    pub exported_name: String,
    pub imported_name: String,
    pub module_specifier: String,
}

/// The complete syntactic model extracted from one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedFile {
    pub file_path: PathBuf,
    pub functions: Vec<ParsedFunction>,
    pub imports: Vec<ImportInfo>,
    pub re_exports: Vec<ReExportInfo>,
    /// exported name -> local name. Default exports use the key `"default"`.
    pub exported_names: HashMap<String, String>,
    /// `Obj.prop` -> qualified name of the function it ultimately references.
    pub object_property_bindings: HashMap<String, String>,
    /// local variable name -> class name, for `x = new ClassName()` bindings.
    pub instance_bindings: HashMap<String, String>,
}

impl ParsedFile {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn function(&self, qualified_name: &str) -> Option<&ParsedFunction> {
        self.functions
            .iter()
            .find(|f| f.qualified_name == qualified_name)
    }
}

/// The closed set of ways a call edge was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Direct,
    StaticMethod,
    DiDefault,
    InstrumentWrapper,
    InstanceMethod,
    ReExport,
    External,
}

/// One node of a [`CallGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub id: FunctionId,
    pub first_line: usize,
    pub last_line: Option<usize>,
    pub is_instrumented: bool,
    pub is_external: bool,
}

impl FunctionNode {
    pub fn file_path(&self) -> &Path {
        &self.id.file_path
    }

    pub fn qualified_name(&self) -> &str {
        &self.id.qualified_name
    }
}

/// One edge of a [`CallGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: FunctionId,
    pub callee: FunctionId,
    pub kind: EdgeKind,
    pub call_line: usize,
}

/// A recovered call graph: a set of [`FunctionNode`]s keyed by [`FunctionId`]
/// plus an ordered, deduplicated set of [`CallEdge`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    nodes: HashMap<FunctionId, FunctionNode>,
    edges: Vec<CallEdge>,
    edge_keys: std::collections::HashSet<(FunctionId, FunctionId)>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FunctionNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn node(&self, id: &FunctionId) -> Option<&FunctionNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &FunctionId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert a node if absent. First write wins: an existing node is never
    /// overwritten.
    pub fn insert_node(&mut self, node: FunctionNode) {
        self.nodes.entry(node.id.clone()).or_insert(node);
    }

    /// Add an edge, deduplicating on `(caller, callee)` and dropping
    /// self-edges. Returns `true` if a new edge was recorded.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if edge.caller == edge.callee {
            return false;
        }
        let key = (edge.caller.clone(), edge.callee.clone());
        if self.edge_keys.contains(&key) {
            return false;
        }
        self.edge_keys.insert(key);
        self.edges.push(edge);
        true
    }

    pub fn successors<'a>(&'a self, id: &'a FunctionId) -> impl Iterator<Item = &'a CallEdge> {
        self.edges.iter().filter(move |e| &e.caller == id)
    }

    pub fn predecessors<'a>(&'a self, id: &'a FunctionId) -> impl Iterator<Item = &'a CallEdge> {
        self.edges.iter().filter(move |e| &e.callee == id)
    }

    /// Merge another graph into this one: nodes union with first-write-wins,
    /// edges appended with the same dedup key.
    pub fn merge(&mut self, other: CallGraph) {
        for node in other.nodes.into_values() {
            self.insert_node(node);
        }
        for edge in other.edges {
            self.add_edge(edge);
        }
    }
}
