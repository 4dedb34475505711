//! Bounded breadth-first call-graph construction from a set of source
//! functions, per source, merged into one graph.

use std::collections::{HashSet, VecDeque};

use crate::diagnostics::DiagnosticSink;
use crate::error::{ConfigFault, CoreError, CoreResult};
use crate::model::{CallEdge, CallGraph, FunctionId, FunctionNode};
use crate::resolver::SymbolResolver;

/// Traversal ceilings, validated at construction.
#[derive(Debug, Clone, Copy)]
pub struct GraphBounds {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl GraphBounds {
    pub fn new(max_depth: usize, max_nodes: usize) -> CoreResult<Self> {
        if max_depth == 0 {
            return Err(CoreError::Config(ConfigFault::ZeroMaxDepth));
        }
        if max_nodes == 0 {
            return Err(CoreError::Config(ConfigFault::ZeroMaxNodes));
        }
        Ok(Self { max_depth, max_nodes })
    }
}

pub struct GraphBuilder<'a> {
    resolver: &'a mut SymbolResolver,
    bounds: GraphBounds,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(resolver: &'a mut SymbolResolver, bounds: GraphBounds) -> Self {
        Self { resolver, bounds }
    }

    /// Build and merge the bounded forward traversal from every source id.
    pub fn build(&mut self, sources: &[FunctionId], sink: &mut dyn DiagnosticSink) -> CallGraph {
        let mut merged = CallGraph::new();
        for source in sources {
            merged.merge(self.build_one(source, sink));
        }
        merged
    }

    fn build_one(&mut self, source: &FunctionId, sink: &mut dyn DiagnosticSink) -> CallGraph {
        let mut graph = CallGraph::new();

        let Some(start) = self.normalize(source, sink) else {
            return graph;
        };
        let Some(start_node) = self.node_for(&start, sink) else {
            return graph;
        };

        graph.insert_node(start_node);
        let mut visited: HashSet<FunctionId> = HashSet::new();
        visited.insert(start.clone());
        let mut queue = VecDeque::new();
        queue.push_back((start, 0usize));

        while let Some((id, depth)) = queue.pop_front() {
            if graph.node_count() >= self.bounds.max_nodes {
                break;
            }
            if depth == self.bounds.max_depth {
                continue;
            }

            let Some(file) = self.resolver.parsed_file(&id.file_path, sink) else {
                continue;
            };
            let Some(func) = file.function(&id.qualified_name).cloned() else {
                continue;
            };

            for call in &func.call_sites {
                if graph.node_count() >= self.bounds.max_nodes {
                    break;
                }
                let Some((target_id, target_node, kind)) = self.resolver.resolve_call(&file, &func, call, sink)
                else {
                    continue;
                };
                if target_id == id {
                    continue;
                }

                graph.insert_node(target_node);
                graph.add_edge(CallEdge {
                    caller: id.clone(),
                    callee: target_id.clone(),
                    kind,
                    call_line: call.line(),
                });

                if !target_id.is_external() && visited.insert(target_id.clone()) {
                    queue.push_back((target_id, depth + 1));
                }
            }
        }

        graph
    }

    /// A user-provided `Obj.prop` selector may name a façade binding rather
    /// than a function directly; rewrite it to the function it references.
    fn normalize(&mut self, source: &FunctionId, sink: &mut dyn DiagnosticSink) -> Option<FunctionId> {
        let file = self.resolver.parsed_file(&source.file_path, sink)?;
        if file.function(&source.qualified_name).is_some() {
            return Some(source.clone());
        }
        let bound = file.object_property_bindings.get(&source.qualified_name)?;
        file.function(bound)?;
        Some(FunctionId::new(source.file_path.clone(), bound.clone()))
    }

    fn node_for(&mut self, id: &FunctionId, sink: &mut dyn DiagnosticSink) -> Option<FunctionNode> {
        let file = self.resolver.parsed_file(&id.file_path, sink)?;
        let func = file.function(&id.qualified_name)?;
        Some(FunctionNode {
            id: id.clone(),
            first_line: func.first_line,
            last_line: Some(func.last_line),
            is_instrumented: func.is_instrumented,
            is_external: false,
        })
    }
}
