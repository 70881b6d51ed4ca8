use crate::diagnostics::{Diagnostic, DiagnosticCollector, Severity};
use crate::imports::GlobalSymbolTable;
use crate::js;
use crate::options::GenerateOptions;
use crate::registry::WidgetRegistry;
use crate::scope::{ScopeKind, ScopeResolver};
use std::collections::{HashMap, HashSet};

/// Superclass and member names of a class declared in this unit.
#[derive(Debug, Clone, Default)]
pub struct ClassSummary {
    pub superclass: Option<String>,
    pub members: Vec<String>,
    pub static_members: Vec<String>,
}

/// Facts about the class whose members are being emitted.
#[derive(Debug, Clone, Default)]
pub struct ClassContext {
    pub name: String,
    pub methods: HashSet<String>,
    /// Getter/setter pairs merged into one callable.
    pub accessors: HashSet<String>,
}

/// Emitter state positions restored after a member fails to convert.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    scope_depth: usize,
    indent: usize,
    async_len: usize,
    cascade_len: usize,
    catch_len: usize,
    member_len: usize,
}

/// Mutable state owned by one file's pipeline run.
///
/// Shared inputs (registry, symbol table, options) are borrowed read-only, so
/// independent contexts can run on different threads.
pub struct EmitContext<'a> {
    pub registry: &'a WidgetRegistry,
    pub symbols: &'a GlobalSymbolTable,
    pub options: &'a GenerateOptions,
    pub file_path: String,
    pub scope: ScopeResolver,
    pub diagnostics: DiagnosticCollector,
    /// Classes declared in this unit.
    pub local_classes: HashSet<String>,
    /// Classes in this unit that are widgets (instantiated like registry widgets).
    pub widget_classes: HashSet<String>,
    /// Symbols reached through the lazy import proxy.
    pub lazy_symbols: HashSet<String>,
    /// Namespace aliases from prefixed imports.
    pub import_prefixes: HashSet<String>,
    pub class_index: HashMap<String, ClassSummary>,
    /// Top-level getters and setters, emitted as callables.
    pub module_accessors: HashSet<String>,
    indent: usize,
    async_stack: Vec<bool>,
    cascade_counter: usize,
    cascade_stack: Vec<String>,
    catch_stack: Vec<String>,
    class_stack: Vec<ClassContext>,
    member_stack: Vec<String>,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        registry: &'a WidgetRegistry,
        symbols: &'a GlobalSymbolTable,
        options: &'a GenerateOptions,
        file_path: &str,
    ) -> Self {
        EmitContext {
            registry,
            symbols,
            options,
            file_path: file_path.to_string(),
            scope: ScopeResolver::new(),
            diagnostics: DiagnosticCollector::new(),
            local_classes: HashSet::new(),
            widget_classes: HashSet::new(),
            lazy_symbols: HashSet::new(),
            import_prefixes: HashSet::new(),
            class_index: HashMap::new(),
            module_accessors: HashSet::new(),
            indent: 0,
            async_stack: Vec::new(),
            cascade_counter: 0,
            cascade_stack: Vec::new(),
            catch_stack: Vec::new(),
            class_stack: Vec::new(),
            member_stack: Vec::new(),
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Indentation
    // ───────────────────────────────────────────────────────────────────────

    pub fn indent_level(&self) -> usize {
        self.indent
    }

    pub fn pad(&self) -> String {
        js::indent(self.indent)
    }

    pub fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += 1;
        let out = f(self);
        self.indent -= 1;
        out
    }

    // ───────────────────────────────────────────────────────────────────────
    // Scopes
    // ───────────────────────────────────────────────────────────────────────

    /// Runs `f` inside a fresh scope frame; the frame is popped on every path.
    pub fn scoped<T>(&mut self, name: &str, kind: ScopeKind, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scope.push_scope(name, kind);
        let out = f(self);
        self.scope.pop_scope();
        out
    }

    pub fn with_async<T>(&mut self, is_async: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        self.async_stack.push(is_async);
        let out = f(self);
        self.async_stack.pop();
        out
    }

    pub fn is_async(&self) -> bool {
        self.async_stack.last().copied().unwrap_or(false)
    }

    pub fn with_class<T>(&mut self, class: ClassContext, f: impl FnOnce(&mut Self) -> T) -> T {
        self.class_stack.push(class);
        let out = f(self);
        self.class_stack.pop();
        out
    }

    pub fn current_class(&self) -> Option<&ClassContext> {
        self.class_stack.last()
    }

    pub fn is_accessor(&self, name: &str) -> bool {
        self.current_class()
            .map_or(false, |c| c.accessors.contains(name))
    }

    pub fn is_class_method(&self, name: &str) -> bool {
        self.current_class()
            .map_or(false, |c| c.methods.contains(name))
    }

    pub fn with_member<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.member_stack.push(name.to_string());
        let out = f(self);
        self.member_stack.pop();
        out
    }

    /// `Class.member` path of the declaration being emitted.
    pub fn node_path(&self) -> Option<String> {
        let class = self.current_class().map(|c| c.name.as_str());
        let member = self.member_stack.last().map(|m| m.as_str());
        match (class, member) {
            (Some(c), Some(m)) => Some(format!("{}.{}", c, m)),
            (Some(c), None) => Some(c.to_string()),
            (None, Some(m)) => Some(m.to_string()),
            (None, None) => None,
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Synthetic names
    // ───────────────────────────────────────────────────────────────────────

    /// Per-file cascade receiver name (`__cascade0`, `__cascade1`, ...).
    pub fn push_cascade(&mut self) -> String {
        let name = format!("__cascade{}", self.cascade_counter);
        self.cascade_counter += 1;
        self.cascade_stack.push(name.clone());
        name
    }

    pub fn pop_cascade(&mut self) {
        self.cascade_stack.pop();
    }

    pub fn current_cascade(&self) -> Option<&str> {
        self.cascade_stack.last().map(|s| s.as_str())
    }

    /// Catch variable for the next `try`; nested handlers get distinct names.
    pub fn push_catch(&mut self) -> String {
        let name = match self.catch_stack.len() {
            0 => "__error".to_string(),
            n => format!("__error{}", n),
        };
        self.catch_stack.push(name.clone());
        name
    }

    pub fn pop_catch(&mut self) {
        self.catch_stack.pop();
    }

    pub fn current_catch(&self) -> Option<&str> {
        self.catch_stack.last().map(|s| s.as_str())
    }

    // ───────────────────────────────────────────────────────────────────────
    // Diagnostics
    // ───────────────────────────────────────────────────────────────────────

    /// Records a diagnostic, attaching the current declaration path.
    pub fn report(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.node.is_none() {
            diagnostic.node = self.node_path();
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn report_new(&mut self, code: &str, severity: Severity, message: &str) {
        self.report(Diagnostic::new(code, severity, message));
    }

    // ───────────────────────────────────────────────────────────────────────
    // Recovery
    // ───────────────────────────────────────────────────────────────────────

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            scope_depth: self.scope.depth(),
            indent: self.indent,
            async_len: self.async_stack.len(),
            cascade_len: self.cascade_stack.len(),
            catch_len: self.catch_stack.len(),
            member_len: self.member_stack.len(),
        }
    }

    /// Unwinds stacks left unbalanced by a panic inside a member emitter.
    pub fn restore(&mut self, cp: Checkpoint) {
        self.scope.truncate(cp.scope_depth);
        self.indent = cp.indent;
        self.async_stack.truncate(cp.async_len);
        self.cascade_stack.truncate(cp.cascade_len);
        self.catch_stack.truncate(cp.catch_len);
        self.member_stack.truncate(cp.member_len);
    }
}
