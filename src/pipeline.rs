//! File assembler: analyze, generate, validate, optimize.
//!
//! One `generate()` call owns every piece of mutable state it touches
//! (resolver, collector, emit context). The registry and the global symbol
//! table are borrowed read-only, so a generator can be shared across threads.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::analyze::{analyze, UnitAnalysis};
use crate::class::{emit_class, emit_enum, emit_functions};
use crate::context::EmitContext;
use crate::diagnostics::{
    Diagnostic, DiagnosticCollector, Severity, FJS_EMPTY_UNIT, FJS_ERROR_THRESHOLD,
    FJS_GENERATION_FAILED, FJS_LEVEL_CLAMPED, FJS_MALFORMED_UNIT, FJS_OPTIMIZE_FAILED,
};
use crate::error::panic_message;
use crate::expression::emit_expression;
use crate::imports::{
    plan_imports, render_exports, render_registration, GlobalSymbolTable, ImportPlan,
};
use crate::ir::{ClassDecl, DartFile, VariableDecl};
use crate::js;
use crate::optimize::{optimize, OptimizeReport};
use crate::options::GenerateOptions;
use crate::registry::WidgetRegistry;
use crate::stateful::{emit_stateful_pair, find_state_class, is_stateful_widget};
use crate::validate::{validate, ValidationReport};

lazy_static! {
    static ref EMPTY_SYMBOLS: GlobalSymbolTable = GlobalSymbolTable::default();
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub file_path: String,
    pub classes: usize,
    pub functions: usize,
    pub variables: usize,
    pub enums: usize,
    pub used_widgets: Vec<String>,
    pub used_types: Vec<String>,
    pub helpers: Vec<String>,
    pub import_modules: usize,
    pub imported_symbols: usize,
    /// Size before optimization.
    pub original_size: usize,
    pub optimized_size: usize,
    pub validated: bool,
    pub has_critical_issues: bool,
    /// Classes the validator found in the emitted module.
    pub class_names: Vec<String>,
    pub optimization: Option<OptimizeReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub code: Option<String>,
    pub statistics: GenerationStats,
    /// Most severe first.
    pub issues: Vec<Diagnostic>,
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn failed(message: &str, mut issues: Vec<Diagnostic>) -> Self {
        if !issues.iter().any(|d| d.severity == Severity::Fatal) {
            issues.insert(0, Diagnostic::new(FJS_GENERATION_FAILED, Severity::Fatal, message));
        }
        GenerationResult {
            success: false,
            code: None,
            statistics: GenerationStats::default(),
            issues,
            error: Some(message.to_string()),
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.issues.iter().filter(|d| d.is_error())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|d| d.severity == severity).count()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

pub struct CodeGenerator<'a> {
    registry: &'a WidgetRegistry,
    symbols: &'a GlobalSymbolTable,
    options: GenerateOptions,
}

impl CodeGenerator<'static> {
    /// Generator over the builtin registry and an empty symbol table.
    pub fn new(options: GenerateOptions) -> Self {
        CodeGenerator {
            registry: WidgetRegistry::builtin(),
            symbols: &EMPTY_SYMBOLS,
            options,
        }
    }
}

impl<'a> CodeGenerator<'a> {
    pub fn with_context(
        registry: &'a WidgetRegistry,
        symbols: &'a GlobalSymbolTable,
        options: GenerateOptions,
    ) -> Self {
        CodeGenerator {
            registry,
            symbols,
            options,
        }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn registry(&self) -> &'a WidgetRegistry {
        self.registry
    }

    pub fn symbols(&self) -> &'a GlobalSymbolTable {
        self.symbols
    }

    /// Generates one module. Never panics; any failure becomes a failed result.
    pub fn generate(&self, unit: &DartFile) -> GenerationResult {
        let _span = tracing::debug_span!("generate", file = %unit.file_path).entered();
        match catch_unwind(AssertUnwindSafe(|| self.run(unit))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(file = %unit.file_path, %message, "generation panicked");
                let issue = Diagnostic::new(
                    FJS_GENERATION_FAILED,
                    Severity::Fatal,
                    &format!("Generation failed: {}", message),
                )
                .with_node(&unit.file_path);
                GenerationResult::failed(&message, vec![issue])
            }
        }
    }

    /// Decodes a JSON program unit and generates it.
    pub fn generate_json(&self, unit_json: &str) -> GenerationResult {
        match serde_json::from_str::<DartFile>(unit_json) {
            Ok(unit) => self.generate(&unit),
            Err(e) => {
                let message = format!("Program unit is not valid JSON IR: {}", e);
                let issue = Diagnostic::new(FJS_MALFORMED_UNIT, Severity::Fatal, &message);
                GenerationResult::failed(&message, vec![issue])
            }
        }
    }

    fn run(&self, unit: &DartFile) -> GenerationResult {
        let mut diagnostics = DiagnosticCollector::new();
        check_unit(unit, &mut diagnostics);
        if diagnostics.has_fatal() {
            let message = format!("{} cannot be generated", display_path(unit));
            return GenerationResult::failed(&message, diagnostics.into_sorted());
        }

        // ── Analyze ──
        let analysis = {
            let _span = tracing::debug_span!("analyze").entered();
            analyze(unit, self.registry, self.symbols)
        };
        tracing::debug!(
            symbols = analysis.used_symbols.len(),
            widgets = analysis.used_widgets.len(),
            helpers = analysis.helpers.len(),
            "analysis finished"
        );

        // ── Generate ──
        let mut ctx = EmitContext::new(self.registry, self.symbols, &self.options, &unit.file_path);
        ctx.diagnostics = diagnostics;
        let plan = plan_imports(
            unit,
            self.registry,
            self.symbols,
            &analysis.used_symbols,
            &analysis.local_names,
            &mut ctx.diagnostics,
        );
        prepare_context(&mut ctx, unit, &analysis, &plan);
        let code = {
            let _span = tracing::debug_span!("emit").entered();
            assemble(&mut ctx, unit, &analysis, &plan)
        };

        let mut stats = GenerationStats {
            file_path: unit.file_path.clone(),
            classes: unit.classes.len(),
            functions: unit.functions.len(),
            variables: unit.variables.len(),
            enums: unit.enums.len(),
            used_widgets: analysis.used_widgets.iter().cloned().collect(),
            used_types: analysis.used_types.iter().cloned().collect(),
            helpers: analysis.helpers.iter().map(|h| h.name().to_string()).collect(),
            import_modules: plan.named.len() + plan.namespaces.len() + plan.lazy.len(),
            imported_symbols: plan.symbol_count(),
            original_size: code.len(),
            optimized_size: code.len(),
            ..GenerationStats::default()
        };
        let mut diagnostics = ctx.diagnostics;

        // ── Validate ──
        let mut code = code;
        if self.options.validate {
            let report = validate(&code);
            stats.validated = true;
            stats.has_critical_issues = report.has_critical_issues;
            stats.class_names = report.class_names.clone();
            if report.has_critical_issues {
                code = with_banner(&code, &report);
            }
            diagnostics.extend(report.issues);
        }

        // ── Optimize ──
        if self.options.optimize {
            let mut level = self.options.optimization_level;
            if !(1..=3).contains(&level) {
                tracing::warn!(level, "optimization level out of range, using 1");
                diagnostics.warning(
                    FJS_LEVEL_CLAMPED,
                    &format!("Optimization level {} is not 1, 2 or 3; using level 1", level),
                );
                level = 1;
            }
            match optimize(&code, level, self.options.dry_run) {
                Ok(outcome) => {
                    stats.optimized_size = outcome.report.optimized_size;
                    stats.optimization = Some(outcome.report);
                    code = outcome.code;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "optimizer failed, keeping unoptimized output");
                    diagnostics.push(
                        Diagnostic::new(
                            FJS_OPTIMIZE_FAILED,
                            Severity::Warning,
                            &format!("Optimization skipped: {}", e),
                        )
                        .with_node(&unit.file_path),
                    );
                }
            }
        }

        // ── Outcome ──
        let errors = diagnostics.error_count();
        let over_threshold = self.options.max_errors.map_or(false, |max| errors > max);
        if over_threshold {
            diagnostics.error(
                FJS_ERROR_THRESHOLD,
                &format!(
                    "{} errors recorded, more than the allowed {}",
                    errors,
                    self.options.max_errors.unwrap_or_default()
                ),
            );
        }
        if diagnostics.has_fatal() {
            let message = format!("Fatal diagnostics while generating {}", display_path(unit));
            let mut failed = GenerationResult::failed(&message, diagnostics.into_sorted());
            failed.statistics = stats;
            return failed;
        }

        tracing::debug!(
            size = code.len(),
            issues = diagnostics.len(),
            errors = diagnostics.error_count(),
            "generation finished"
        );
        GenerationResult {
            success: !over_threshold,
            code: Some(code),
            statistics: stats,
            issues: diagnostics.into_sorted(),
            error: if over_threshold {
                Some("error threshold exceeded".to_string())
            } else {
                None
            },
        }
    }
}

fn display_path(unit: &DartFile) -> &str {
    if unit.file_path.is_empty() {
        "<unnamed unit>"
    } else {
        &unit.file_path
    }
}

/// Structural checks that make a unit impossible to generate.
fn check_unit(unit: &DartFile, diagnostics: &mut DiagnosticCollector) {
    if unit.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                FJS_EMPTY_UNIT,
                Severity::Fatal,
                &format!("{} declares nothing to generate", display_path(unit)),
            )
            .with_suggestion("Check that the front-end produced classes, functions or variables."),
        );
        return;
    }
    if unit.file_path.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            FJS_MALFORMED_UNIT,
            Severity::Fatal,
            "Program unit has no file path",
        ));
    }
    let names = unit
        .classes
        .iter()
        .map(|c| &c.name)
        .chain(unit.functions.iter().map(|f| &f.name))
        .chain(unit.variables.iter().map(|v| &v.name))
        .chain(unit.enums.iter().map(|e| &e.name));
    for name in names {
        if !js::is_valid_ident(name) {
            diagnostics.push(
                Diagnostic::new(
                    FJS_MALFORMED_UNIT,
                    Severity::Fatal,
                    &format!("`{}` is not a valid declaration name", name),
                )
                .with_node(name),
            );
        }
    }
}

/// Copies analysis facts into the context and declares module-level names.
fn prepare_context(ctx: &mut EmitContext, unit: &DartFile, analysis: &UnitAnalysis, plan: &ImportPlan) {
    ctx.local_classes = unit.classes.iter().map(|c| c.name.clone()).collect();
    ctx.widget_classes = analysis.widget_classes.clone();
    ctx.class_index = analysis.class_index.clone();
    ctx.module_accessors = analysis.module_accessors.clone();
    ctx.lazy_symbols = plan.lazy_symbols();
    ctx.import_prefixes = plan.prefixes();

    let declared = unit
        .classes
        .iter()
        .map(|c| c.name.as_str())
        .chain(unit.enums.iter().map(|e| e.name.as_str()))
        .chain(unit.functions.iter().map(|f| f.name.as_str()))
        .chain(unit.imports.iter().flat_map(|d| d.show.iter().map(|s| s.as_str())));
    for name in declared {
        ctx.scope.declare_local(name, None, true);
    }
    for variable in &unit.variables {
        ctx.scope
            .declare_local(&variable.name, variable.ty.clone(), variable.is_final || variable.is_const);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

fn assemble(ctx: &mut EmitContext, unit: &DartFile, analysis: &UnitAnalysis, plan: &ImportPlan) -> String {
    let mut sections: Vec<String> = vec![format!(
        "// Generated by flutterjs-codegen from {}. Do not edit.",
        unit.file_path
    )];

    if !plan.is_empty() {
        sections.push(plan.render());
    }
    for helper in &analysis.helpers {
        sections.push(helper.source().to_string());
    }

    let variables: Vec<String> = unit.variables.iter().map(|v| emit_variable(ctx, v)).collect();
    if !variables.is_empty() {
        sections.push(variables.join("\n"));
    }

    for decl in &unit.enums {
        sections.push(emit_enum(decl));
    }
    for class in ordered_classes(unit) {
        sections.push(emit_class_or_pair(ctx, unit, class));
    }
    sections.extend(emit_functions(ctx, &unit.functions));

    let exports = render_exports(unit, ctx.symbols, &analysis.public_names, &mut ctx.diagnostics);
    if !exports.is_empty() {
        sections.push(exports);
    }
    sections.extend(render_registration(unit, &analysis.public_names));

    let separator = if ctx.options.pretty_print { "\n\n" } else { "\n" };
    let mut out = sections.join(separator);
    out.push('\n');
    out
}

fn emit_variable(ctx: &mut EmitContext, variable: &VariableDecl) -> String {
    let keyword = if (variable.is_final || variable.is_const) && variable.initializer.is_some() {
        "const"
    } else {
        "let"
    };
    let type_comment = match (&variable.ty, ctx.options.emit_type_comments) {
        (Some(ty), true) => format!(" /* {} */", ty.display_name()),
        _ => String::new(),
    };
    ctx.with_member(&variable.name, |ctx| match &variable.initializer {
        Some(init) => format!(
            "{} {}{} = {};",
            keyword,
            variable.name,
            type_comment,
            emit_expression(ctx, init)
        ),
        None => format!("{} {}{};", keyword, variable.name, type_comment),
    })
}

/// The class itself, or the whole StatefulWidget + State pair.
fn emit_class_or_pair(ctx: &mut EmitContext, unit: &DartFile, class: &ClassDecl) -> String {
    if is_stateful_widget(class) {
        if let Some(state) = find_state_class(unit, class) {
            return emit_stateful_pair(ctx, class, state);
        }
    }
    emit_class(ctx, class, None)
}

/// Classes in dependency order: every local superclass and interface comes
/// before the class that names it. A State class travels with its widget.
pub fn ordered_classes(unit: &DartFile) -> Vec<&ClassDecl> {
    let by_name: HashMap<&str, &ClassDecl> = unit.classes.iter().map(|c| (c.name.as_str(), c)).collect();
    let mut owner_of_state: HashMap<&str, &str> = HashMap::new();
    for class in unit.classes.iter().filter(|c| is_stateful_widget(c)) {
        if let Some(state) = find_state_class(unit, class) {
            owner_of_state.insert(state.name.as_str(), class.name.as_str());
        }
    }

    let mut order = Vec::new();
    let mut visited = HashSet::new();
    for class in &unit.classes {
        visit_class(class, &by_name, &owner_of_state, unit, &mut visited, &mut order);
    }
    order
}

fn visit_class<'u>(
    class: &'u ClassDecl,
    by_name: &HashMap<&str, &'u ClassDecl>,
    owner_of_state: &HashMap<&str, &str>,
    unit: &'u DartFile,
    visited: &mut HashSet<String>,
    order: &mut Vec<&'u ClassDecl>,
) {
    if let Some(owner) = owner_of_state.get(class.name.as_str()) {
        if let Some(widget) = by_name.get(owner) {
            if !visited.contains(*owner) {
                visit_class(*widget, by_name, owner_of_state, unit, visited, order);
            }
            return;
        }
    }
    if !visited.insert(class.name.clone()) {
        return;
    }

    let mut members = vec![class];
    if is_stateful_widget(class) {
        if let Some(state) = find_state_class(unit, class) {
            visited.insert(state.name.clone());
            members.push(state);
        }
    }
    for member in &members {
        let deps = member.superclass.iter().chain(member.interfaces.iter());
        for dep in deps {
            if let Some(dep_class) = by_name.get(dep.base_name()) {
                visit_class(*dep_class, by_name, owner_of_state, unit, visited, order);
            }
        }
    }
    order.push(class);
}

fn with_banner(code: &str, report: &ValidationReport) -> String {
    let mut lines = vec![
        "/*!".to_string(),
        " * FLUTTERJS CODEGEN: VALIDATION FAILED".to_string(),
        " * The module below was generated but did not pass validation.".to_string(),
    ];
    for issue in report.issues.iter().filter(|d| d.is_error()) {
        lines.push(format!(" * - {}", issue.message.replace("*/", "* /")));
    }
    lines.push(" */".to_string());
    format!("{}\n{}/*! END OF UNVALIDATED OUTPUT */\n", lines.join("\n"), code)
}
