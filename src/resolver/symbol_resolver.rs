//! Cross-file symbol resolution: map one [`CallSite`] to a concrete target
//! function identity, following imports, re-exports, DI defaults, instance
//! bindings, and object-literal façades.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::diagnostics::DiagnosticSink;
use crate::error::{Diagnostic, ResolutionFault};
use crate::graph::cache::ParsedFileCache;
use crate::model::{
    CallSite, DiTarget, EdgeKind, FunctionId, FunctionNode, ImportedName, ParsedFile, ParsedFunction,
};
use crate::resolver::config::ResolverConfig;
use crate::resolver::module_resolver::{ModuleResolver, ResolutionOutcome};

pub struct SymbolResolver {
    config: ResolverConfig,
    module_resolver: ModuleResolver,
    cache: ParsedFileCache,
}

type Resolved = (FunctionId, FunctionNode, EdgeKind);

impl SymbolResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let module_resolver = ModuleResolver::new(&config);
        let cache = ParsedFileCache::new(config.target_syntax);
        Self {
            config,
            module_resolver,
            cache,
        }
    }

    pub fn parsed_file(&mut self, path: &Path, sink: &mut dyn DiagnosticSink) -> Option<Rc<ParsedFile>> {
        self.cache.get_or_parse(path, sink)
    }

    /// Resolve one call site found inside `caller_fn`, declared in `file`.
    pub fn resolve_call(
        &mut self,
        file: &Rc<ParsedFile>,
        caller_fn: &ParsedFunction,
        call: &CallSite,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Resolved> {
        match call {
            CallSite::Named { name, line } => self.resolve_named(file, caller_fn, name, *line, sink, true),
            CallSite::Member { object, property, line } => {
                self.resolve_member(file, caller_fn, object, property, *line, sink)
            }
        }
    }

    fn node_of(file_path: PathBuf, f: &ParsedFunction) -> (FunctionId, FunctionNode) {
        let id = FunctionId::new(file_path, f.qualified_name.clone());
        let node = FunctionNode {
            id: id.clone(),
            first_line: f.first_line,
            last_line: Some(f.last_line),
            is_instrumented: f.is_instrumented,
            is_external: false,
        };
        (id, node)
    }

    fn external_node(&self, specifier: &str, name: &str) -> (FunctionId, FunctionNode) {
        let id = FunctionId::external(specifier, name.to_string());
        let node = FunctionNode {
            id: id.clone(),
            first_line: 0,
            last_line: None,
            is_instrumented: false,
            is_external: true,
        };
        (id, node)
    }

    fn resolve_named(
        &mut self,
        file: &Rc<ParsedFile>,
        caller_fn: &ParsedFunction,
        identifier: &str,
        line: usize,
        sink: &mut dyn DiagnosticSink,
        allow_external: bool,
    ) -> Option<Resolved> {
        // 1. local function
        if let Some(f) = file.function(identifier) {
            let (id, node) = Self::node_of(file.file_path.clone(), f);
            return Some((id, node, EdgeKind::Direct));
        }

        // 2. import
        if let Some(imp) = file
            .imports
            .iter()
            .find(|i| i.local_name == identifier && !matches!(i.imported_name, ImportedName::Namespace))
        {
            let wanted = match &imp.imported_name {
                ImportedName::Named(n) => n.clone(),
                ImportedName::Default => "default".to_string(),
                ImportedName::Namespace => unreachable!(),
            };
            if let Some((target_file, target_fn)) =
                self.find_export(&file.file_path, &imp.module_specifier, &wanted, sink)
            {
                let (id, node) = Self::node_of(target_file.file_path.clone(), &target_fn);
                return Some((id, node, EdgeKind::Direct));
            }
            if allow_external && self.config.include_external && is_external(&imp.module_specifier) {
                let (id, node) = self.external_node(&imp.module_specifier, &wanted);
                return Some((id, node, EdgeKind::External));
            }
            sink.record(Diagnostic::Resolution(ResolutionFault::UnresolvedCall {
                caller: file.file_path.clone(),
                callee_token: identifier.to_string(),
                line,
            }));
            return None;
        }

        // 3. DI default
        if let Some(mapping) = caller_fn.di_defaults.iter().find(|m| {
            m.prop_name == identifier
                && matches!(&m.target, DiTarget::LocalRef(r) if r != identifier)
        }) {
            if let DiTarget::LocalRef(local_ref) = &mapping.target {
                if let Some((id, node, _)) =
                    self.resolve_named(file, caller_fn, local_ref, line, sink, allow_external)
                {
                    return Some((id, node, EdgeKind::DiDefault));
                }
            }
        }

        sink.record(Diagnostic::Resolution(ResolutionFault::UnresolvedCall {
            caller: file.file_path.clone(),
            callee_token: identifier.to_string(),
            line,
        }));
        None
    }

    fn resolve_member(
        &mut self,
        file: &Rc<ParsedFile>,
        caller_fn: &ParsedFunction,
        object: &str,
        property: &str,
        line: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Resolved> {
        // 1. DI default keyed by (paramName, propName)
        if let Some(mapping) = caller_fn
            .di_defaults
            .iter()
            .find(|m| m.param_name == object && m.prop_name == property)
            .cloned()
        {
            match mapping.target {
                DiTarget::MemberRef { object: obj_ref, member: method_ref } => {
                    if let Some((id, node, _)) =
                        self.resolve_member(file, caller_fn, &obj_ref, &method_ref, line, sink)
                    {
                        return Some((id, node, EdgeKind::DiDefault));
                    }
                }
                DiTarget::LocalRef(local_ref) => {
                    if let Some((id, node, _)) =
                        self.resolve_named(file, caller_fn, &local_ref, line, sink, true)
                    {
                        return Some((id, node, EdgeKind::DiDefault));
                    }
                }
            }
        }

        // 2. imported namespace
        if let Some(imp) = file
            .imports
            .iter()
            .find(|i| i.local_name == object && matches!(i.imported_name, ImportedName::Namespace))
        {
            if let Some((target_file, target_fn)) =
                self.find_export(&file.file_path, &imp.module_specifier, property, sink)
            {
                let (id, node) = Self::node_of(target_file.file_path.clone(), &target_fn);
                return Some((id, node, EdgeKind::Direct));
            }
        }

        // 3. imported identifier (class or plain module export)
        if let Some(imp) = file
            .imports
            .iter()
            .find(|i| i.local_name == object && !matches!(i.imported_name, ImportedName::Namespace))
        {
            let wanted = match &imp.imported_name {
                ImportedName::Named(n) => n.clone(),
                ImportedName::Default => "default".to_string(),
                ImportedName::Namespace => unreachable!(),
            };
            if let Some((target_file, target_fn)) =
                self.find_class_member(&file.file_path, &imp.module_specifier, &wanted, property, sink)
            {
                let (id, node) = Self::node_of(target_file.file_path.clone(), &target_fn);
                return Some((id, node, EdgeKind::StaticMethod));
            }
            if let Some((target_file, target_fn)) =
                self.find_export(&file.file_path, &imp.module_specifier, property, sink)
            {
                let (id, node) = Self::node_of(target_file.file_path.clone(), &target_fn);
                return Some((id, node, EdgeKind::Direct));
            }
            if self.config.include_external && is_external(&imp.module_specifier) {
                let (id, node) = self.external_node(&imp.module_specifier, property);
                return Some((id, node, EdgeKind::External));
            }
        }

        // 4. instance binding (`x = new ClassName()`)
        if let Some(class_name) = file.instance_bindings.get(object).cloned() {
            if let Some((id, node)) = self.resolve_class_member_local_or_imported(file, &class_name, property, sink) {
                return Some((id, node, EdgeKind::InstanceMethod));
            }
        }

        // 5. local class
        let local_qualified = format!("{object}.{property}");
        if let Some(f) = file.function(&local_qualified) {
            let (id, node) = Self::node_of(file.file_path.clone(), f);
            return Some((id, node, EdgeKind::StaticMethod));
        }

        // 6. constructor field indirection: self-reference rewritten to the class name
        if caller_fn.qualified_name.starts_with(&format!("{object}.")) {
            if let Some(constructor) = file.function(&format!("{object}.constructor")) {
                if let Some(assignments) = &constructor.field_assignments {
                    if let Some(assignment) = assignments.iter().find(|a| a.field_name == property) {
                        use crate::model::FieldSource;
                        match &assignment.source {
                            FieldSource::ParamProperty { param_name, prop_name } => {
                                if let Some(mapping) = constructor
                                    .di_defaults
                                    .iter()
                                    .find(|m| &m.param_name == param_name && &m.prop_name == prop_name)
                                {
                                    match &mapping.target {
                                        DiTarget::LocalRef(r) => {
                                            if let Some((id, node, _)) =
                                                self.resolve_named(file, constructor, r, line, sink, true)
                                            {
                                                return Some((id, node, EdgeKind::DiDefault));
                                            }
                                        }
                                        DiTarget::MemberRef { object: obj_ref, member: method_ref } => {
                                            if let Some((id, node, _)) = self.resolve_member(
                                                file, constructor, obj_ref, method_ref, line, sink,
                                            ) {
                                                return Some((id, node, EdgeKind::DiDefault));
                                            }
                                        }
                                    }
                                }
                            }
                            FieldSource::LocalRef(local) => {
                                if let Some((id, node, _)) =
                                    self.resolve_named(file, constructor, local, line, sink, true)
                                {
                                    return Some((id, node, EdgeKind::DiDefault));
                                }
                            }
                        }
                    }
                }
            }
        }

        // 7. object-literal binding
        if let Some(binding) = file.object_property_bindings.get(&local_qualified) {
            if binding != &local_qualified {
                if let Some(f) = file.function(binding) {
                    let (id, node) = Self::node_of(file.file_path.clone(), f);
                    return Some((id, node, EdgeKind::StaticMethod));
                }
            }
        }

        sink.record(Diagnostic::Resolution(ResolutionFault::UnresolvedCall {
            caller: file.file_path.clone(),
            callee_token: format!("{object}.{property}"),
            line,
        }));
        None
    }

    fn resolve_class_member_local_or_imported(
        &mut self,
        file: &Rc<ParsedFile>,
        class_name: &str,
        member: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<(FunctionId, FunctionNode)> {
        let qualified = format!("{class_name}.{member}");
        if let Some(f) = file.function(&qualified) {
            return Some(Self::node_of(file.file_path.clone(), f));
        }
        if let Some(imp) = file.imports.iter().find(|i| i.local_name == class_name) {
            let wanted = match &imp.imported_name {
                ImportedName::Named(n) => n.clone(),
                ImportedName::Default => "default".to_string(),
                ImportedName::Namespace => return None,
            };
            if let Some((target_file, target_fn)) =
                self.find_class_member(&file.file_path, &imp.module_specifier, &wanted, member, sink)
            {
                return Some(Self::node_of(target_file.file_path.clone(), &target_fn));
            }
        }
        None
    }

    /// Finding an export (§4.3): follow re-export chains, guarded against cycles.
    pub fn find_export(
        &mut self,
        importer: &Path,
        specifier: &str,
        wanted: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<(Rc<ParsedFile>, ParsedFunction)> {
        let mut visited = HashSet::new();
        let (file, local_name) = self.resolve_local_name(importer, specifier, wanted, &mut visited, sink)?;
        let f = file.function(&local_name)?.clone();
        Some((file, f))
    }

    /// Finding a class member (§4.3), falling back to the façade binding map.
    pub fn find_class_member(
        &mut self,
        importer: &Path,
        specifier: &str,
        wanted: &str,
        member: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<(Rc<ParsedFile>, ParsedFunction)> {
        let mut visited = HashSet::new();
        let (file, local_name) = self.resolve_local_name(importer, specifier, wanted, &mut visited, sink)?;
        let qualified = format!("{local_name}.{member}");
        if let Some(f) = file.function(&qualified) {
            return Some((file.clone(), f.clone()));
        }
        let binding = file.object_property_bindings.get(&qualified)?.clone();
        let f = file.function(&binding)?.clone();
        Some((file, f))
    }

    fn resolve_local_name(
        &mut self,
        importer: &Path,
        specifier: &str,
        wanted: &str,
        visited: &mut HashSet<(PathBuf, String)>,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<(Rc<ParsedFile>, String)> {
        let target_path = match self.module_resolver.resolve(importer, specifier) {
            ResolutionOutcome::Resolved(p) => p,
            _ => {
                sink.record(Diagnostic::Resolution(ResolutionFault::UnresolvedModule {
                    importer: importer.to_path_buf(),
                    specifier: specifier.to_string(),
                }));
                return None;
            }
        };
        if !visited.insert((target_path.clone(), wanted.to_string())) {
            return None;
        }
        let file = self.cache.get_or_parse(&target_path, sink)?;
        if let Some(re) = file.re_exports.iter().find(|r| r.exported_name == wanted).cloned() {
            return self.resolve_local_name(&file.file_path, &re.module_specifier, &re.imported_name, visited, sink);
        }
        if let Some(local) = file.exported_names.get(wanted) {
            return Some((file.clone(), local.clone()));
        }
        for wildcard in file.re_exports.iter().filter(|r| r.exported_name.is_empty()).cloned() {
            if let Some(found) =
                self.resolve_local_name(&file.file_path, &wildcard.module_specifier, wanted, visited, sink)
            {
                return Some(found);
            }
        }
        None
    }
}

fn is_external(specifier: &str) -> bool {
    crate::resolver::module_resolver::is_external_specifier(specifier)
}
