//! Import and export synthesis.
//!
//! Used symbols are mapped to runtime modules, grouped per module and
//! rendered in sorted order so the import section is byte-stable across runs.

use crate::diagnostics::{
    Diagnostic, DiagnosticCollector, Severity, FJS_CIRCULAR_IMPORT, FJS_EXPORT_HIDE_DROPPED,
    FJS_UNRESOLVED_IDENTIFIER,
};
use crate::ir::{DartFile, ImportDirective};
use crate::js;
use crate::registry::WidgetRegistry;
use crate::scope::{is_js_global, is_runtime_export};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

lazy_static::lazy_static! {
    /// `package:flutter/<library>.dart` → runtime package.
    static ref FLUTTER_LIBRARIES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("material.dart", "@flutterjs/material");
        m.insert("widgets.dart", "@flutterjs/widgets");
        m.insert("cupertino.dart", "@flutterjs/cupertino");
        m.insert("foundation.dart", "@flutterjs/foundation");
        m.insert("services.dart", "@flutterjs/services");
        m.insert("painting.dart", "@flutterjs/painting");
        m.insert("animation.dart", "@flutterjs/animation");
        m.insert("rendering.dart", "@flutterjs/rendering");
        m.insert("gestures.dart", "@flutterjs/gestures");
        m
    };

    /// Lowercase runtime functions and the package exporting each.
    static ref RUNTIME_FUNCTIONS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("runApp", "@flutterjs/widgets");
        m.insert("showDialog", "@flutterjs/material");
        m.insert("showModalBottomSheet", "@flutterjs/material");
        m.insert("showSnackBar", "@flutterjs/material");
        m.insert("debugPrint", "@flutterjs/foundation");
        m.insert("kDebugMode", "@flutterjs/foundation");
        m.insert("kReleaseMode", "@flutterjs/foundation");
        m.insert("print", "@flutterjs/dart/core");
        m.insert("identical", "@flutterjs/dart/core");
        m.insert("jsonEncode", "@flutterjs/dart/convert");
        m.insert("jsonDecode", "@flutterjs/dart/convert");
        m.insert("max", "@flutterjs/dart/math");
        m.insert("min", "@flutterjs/dart/math");
        m.insert("sqrt", "@flutterjs/dart/math");
        m.insert("pow", "@flutterjs/dart/math");
        m
    };

    /// Types provided by `dart:core`; never imported.
    static ref CORE_TYPES: HashSet<&'static str> = [
        "int", "double", "num", "String", "bool", "dynamic", "void", "Object", "List",
        "Map", "Set", "Iterable", "Iterator", "Function", "Null", "Never", "Future",
        "Stream", "DateTime", "Type", "Symbol", "Exception", "Error", "StackTrace",
        "Comparable", "Record", "Enum", "Uri", "RegExp", "Pattern", "BigInt", "FutureOr",
        "StringBuffer", "FormatException", "ArgumentError", "StateError", "RangeError",
        "UnsupportedError", "UnimplementedError",
    ]
    .into_iter()
    .collect();

    /// Known module pairs whose static import would close a load-order cycle.
    pub static ref CIRCULAR_IMPORT_BREAKS: Vec<CircularImportBreak> = vec![
        CircularImportBreak {
            importer: "path.dart",
            target: "style.dart",
            symbols: &["Style"],
            strategy: BreakStrategy::LazyProxy,
        },
        CircularImportBreak {
            importer: "text_style.dart",
            target: "text_theme.dart",
            symbols: &["TextTheme"],
            strategy: BreakStrategy::LazyProxy,
        },
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakStrategy {
    /// No import edge; a getter object reads the target's bindings from the
    /// shared module registry at use time.
    LazyProxy,
}

/// Runtime object mapping library URIs to the bindings their modules publish.
pub const MODULE_REGISTRY: &str = "globalThis.__flutterjs_modules";

/// One enumerated cycle exception. `importer` and `target` match file names.
#[derive(Debug, Clone)]
pub struct CircularImportBreak {
    pub importer: &'static str,
    pub target: &'static str,
    pub symbols: &'static [&'static str],
    pub strategy: BreakStrategy,
}

impl CircularImportBreak {
    pub fn matches(&self, importer_path: &str, target_uri: &str) -> bool {
        file_name(importer_path) == self.importer && file_name(target_uri) == self.target
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The break rule covering an import from `importer_path` to `target_uri`.
pub fn find_break(importer_path: &str, target_uri: &str) -> Option<&'static CircularImportBreak> {
    CIRCULAR_IMPORT_BREAKS
        .iter()
        .find(|b| b.matches(importer_path, target_uri))
}

// ═══════════════════════════════════════════════════════════════════════════════
// GLOBAL SYMBOL TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Cross-file facts built before generation starts; read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSymbolTable {
    /// Symbol name → declaring library URI.
    pub symbols: HashMap<String, String>,
    /// Type-only names with no runtime value.
    pub typedefs: HashSet<String>,
    /// Library URI → URIs it imports.
    pub module_imports: HashMap<String, BTreeSet<String>>,
}

impl GlobalSymbolTable {
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn module_of(&self, name: &str) -> Option<&str> {
        self.symbols.get(name).map(|s| s.as_str())
    }

    pub fn register(&mut self, name: &str, uri: &str) {
        self.symbols.insert(name.to_string(), uri.to_string());
    }

    pub fn record_import(&mut self, from: &str, to: &str) {
        self.module_imports
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Registers every declaration and import of `unit`.
    pub fn add_unit(&mut self, unit: &DartFile) {
        let uri = unit_uri(unit);
        for name in unit
            .classes
            .iter()
            .map(|c| &c.name)
            .chain(unit.functions.iter().map(|f| &f.name))
            .chain(unit.variables.iter().map(|v| &v.name))
            .chain(unit.enums.iter().map(|e| &e.name))
        {
            self.register(name, &uri);
        }
        for typedef in &unit.typedefs {
            self.register(typedef, &uri);
            self.typedefs.insert(typedef.clone());
        }
        for import in &unit.imports {
            if let Some(target) = absolute_uri(&uri, &import.uri) {
                self.record_import(&uri, &target);
            }
        }
    }

    /// Whether `to` is reachable from `from` through recorded imports.
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from.to_string()]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(next) = self.module_imports.get(&current) {
                queue.extend(next.iter().cloned());
            }
        }
        false
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// URI RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Library URI of a unit: `package:<pkg>/...` for files under `lib/`.
pub fn unit_uri(unit: &DartFile) -> String {
    match (&unit.package_name, unit.file_path.strip_prefix("lib/")) {
        (Some(pkg), Some(rest)) => format!("package:{}/{}", pkg, rest),
        _ => unit.file_path.clone(),
    }
}

/// Resolves a directive URI against the importing library's URI. `dart:`
/// libraries have no file and yield `None`.
pub fn absolute_uri(base: &str, uri: &str) -> Option<String> {
    if uri.starts_with("dart:") {
        return None;
    }
    if uri.starts_with("package:") {
        return Some(uri.to_string());
    }
    let dir = match base.rfind('/') {
        Some(i) => &base[..i],
        None => "",
    };
    let joined = if dir.is_empty() {
        uri.to_string()
    } else {
        format!("{}/{}", dir, uri)
    };
    Some(normalize(&joined))
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(s) if *s != "..") {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            s => out.push(s),
        }
    }
    out.join("/")
}

fn dart_to_js(path: &str) -> String {
    match path.strip_suffix(".dart") {
        Some(stem) => format!("{}.js", stem),
        None => path.to_string(),
    }
}

/// Relative module specifier from one file to another, both project-relative.
pub fn relative_import_path(from_file: &str, to_file: &str) -> String {
    let from = normalize(from_file);
    let to = normalize(to_file);
    let from_dir: Vec<&str> = {
        let mut segs: Vec<&str> = from.split('/').collect();
        segs.pop();
        segs
    };
    let to_segs: Vec<&str> = to.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to_segs.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dir.len() - common;
    let rest = to_segs[common..].join("/");
    if ups == 0 {
        format!("./{}", rest)
    } else {
        format!("{}{}", "../".repeat(ups), rest)
    }
}

/// Module specifier for a directive URI seen from `from_path`, or `None` when
/// nothing needs importing (`dart:core`).
pub fn resolve_uri(from_path: &str, package: Option<&str>, uri: &str) -> Option<String> {
    if let Some(lib) = uri.strip_prefix("dart:") {
        if lib == "core" {
            return None;
        }
        return Some(format!("@flutterjs/dart/{}", lib));
    }

    if let Some(rest) = uri.strip_prefix("package:") {
        let (pkg, path) = rest.split_once('/').unwrap_or((rest, ""));
        if pkg == "flutter" {
            if let Some(module) = FLUTTER_LIBRARIES.get(path) {
                return Some(module.to_string());
            }
        }
        if Some(pkg) == package {
            let target = format!("lib/{}", path);
            return Some(dart_to_js(&relative_import_path(from_path, &target)));
        }
        return Some(format!("@flutterjs/{}/dist/{}", pkg, dart_to_js(path)));
    }

    let js_path = dart_to_js(uri);
    if js_path.starts_with("./") || js_path.starts_with("../") {
        Some(js_path)
    } else {
        Some(format!("./{}", js_path))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORT PLAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Symbols read through the module registry instead of an import.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyProxy {
    /// Library URI the target module registers under.
    pub library: String,
    pub module: String,
    pub symbols: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPlan {
    /// Module → symbols imported by name.
    pub named: BTreeMap<String, BTreeSet<String>>,
    /// Prefix alias → module.
    pub namespaces: BTreeMap<String, String>,
    pub lazy: Vec<LazyProxy>,
}

impl ImportPlan {
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.namespaces.is_empty() && self.lazy.is_empty()
    }

    pub fn lazy_symbols(&self) -> HashSet<String> {
        self.lazy
            .iter()
            .flat_map(|p| p.symbols.iter().cloned())
            .collect()
    }

    pub fn prefixes(&self) -> HashSet<String> {
        self.namespaces.keys().cloned().collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.named.values().map(|s| s.len()).sum::<usize>()
            + self.lazy.iter().map(|p| p.symbols.len()).sum::<usize>()
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for (module, names) in &self.named {
            if names.is_empty() {
                continue;
            }
            let list: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
            lines.push(format!("import {{ {} }} from {};", list.join(", "), js::quote(module)));
        }
        for (alias, module) in &self.namespaces {
            lines.push(format!("import * as {} from {};", alias, js::quote(module)));
        }
        if !self.lazy.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("const __flutterjsModules = ({} ??= {{}});", MODULE_REGISTRY));
            lines.push("const __lazyImports = {".to_string());
            for proxy in &self.lazy {
                for symbol in &proxy.symbols {
                    lines.push(format!(
                        "{}get {}() {{ return __flutterjsModules[{}].{}; }},",
                        js::INDENT,
                        symbol,
                        js::quote(&proxy.library),
                        symbol
                    ));
                }
            }
            lines.push("};".to_string());
        }
        lines.join("\n")
    }
}

/// Single lowercase letters are loop and lambda variables, never imports.
fn is_loop_variable(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_lowercase() || c == '_')
}

/// Single capitals are usually type parameters; they import only when some
/// library actually declares them.
fn is_type_parameter_like(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

/// Whether `name` may appear in a generated import list.
pub fn is_importable(name: &str, locals: &HashSet<String>) -> bool {
    if locals.contains(name) || is_loop_variable(name) || !js::is_valid_ident(name) {
        return false;
    }
    if is_js_global(name) || CORE_TYPES.contains(name) {
        return false;
    }
    name.starts_with(|c: char| c.is_ascii_uppercase()) || is_runtime_export(name)
}

struct ResolvedDirective<'u> {
    directive: &'u ImportDirective,
    module: Option<String>,
}

/// Builds the import section for `unit` from the symbols it uses.
pub fn plan_imports(
    unit: &DartFile,
    registry: &WidgetRegistry,
    symbols: &GlobalSymbolTable,
    used: &BTreeSet<String>,
    locals: &HashSet<String>,
    diagnostics: &mut DiagnosticCollector,
) -> ImportPlan {
    let package = unit.package_name.as_deref();
    let directives: Vec<ResolvedDirective> = unit
        .imports
        .iter()
        .map(|d| ResolvedDirective {
            directive: d,
            module: resolve_uri(&unit.file_path, package, &d.uri),
        })
        .collect();

    let mut plan = ImportPlan::default();
    let mut lazy: BTreeMap<String, LazyProxy> = BTreeMap::new();

    for resolved in &directives {
        if let (Some(prefix), Some(module)) = (&resolved.directive.prefix, &resolved.module) {
            plan.namespaces.insert(prefix.clone(), module.clone());
        }
    }

    for name in used {
        if !is_importable(name, locals) {
            continue;
        }
        let Some((module, directive)) = module_for_symbol(unit, registry, symbols, &directives, name) else {
            if let Some(module) = RUNTIME_FUNCTIONS.get(name.as_str()) {
                plan.named.entry(module.to_string()).or_default().insert(name.clone());
            } else if !is_type_parameter_like(name) {
                diagnostics.push(Diagnostic::new(
                    FJS_UNRESOLVED_IDENTIFIER,
                    Severity::Warning,
                    &format!("No imported library provides `{}`", name),
                ));
            }
            continue;
        };

        if let Some((rule, d)) = directive.and_then(|d| find_break(&unit.file_path, &d.uri).map(|r| (r, d))) {
            if rule.symbols.contains(&name.as_str()) && rule.strategy == BreakStrategy::LazyProxy {
                let library = absolute_uri(&unit_uri(unit), &d.uri).unwrap_or_else(|| d.uri.clone());
                lazy.entry(module.clone())
                    .or_insert_with(|| LazyProxy {
                        library,
                        module: module.clone(),
                        symbols: BTreeSet::new(),
                    })
                    .symbols
                    .insert(name.clone());
                continue;
            }
        }
        plan.named.entry(module).or_default().insert(name.clone());
    }
    plan.lazy = lazy.into_values().collect();

    report_cycles(unit, symbols, diagnostics);
    plan
}

/// Module for one used symbol, and the directive it came through if any.
fn module_for_symbol<'u>(
    unit: &DartFile,
    registry: &WidgetRegistry,
    symbols: &GlobalSymbolTable,
    directives: &'u [ResolvedDirective<'u>],
    name: &str,
) -> Option<(String, Option<&'u ImportDirective>)> {
    let unprefixed = directives.iter().filter(|d| d.directive.prefix.is_none());
    let hidden = |module: &str| {
        directives.iter().any(|d| {
            d.module.as_deref() == Some(module) && d.directive.hide.iter().any(|h| h == name)
        })
    };

    // An explicit `show` names the source library.
    for d in unprefixed.clone() {
        if d.directive.show.iter().any(|s| s == name) {
            return d.module.clone().map(|m| (m, Some(d.directive)));
        }
    }

    if let Some(module) = registry.module_for(name) {
        if !hidden(module) {
            return Some((module.to_string(), None));
        }
        return None;
    }

    let uri = symbols.module_of(name)?;
    let module = resolve_uri(&unit.file_path, unit.package_name.as_deref(), uri)?;
    if hidden(&module) {
        return None;
    }
    let directive = unprefixed
        .filter(|d| d.module.as_deref() == Some(module.as_str()))
        .map(|d| d.directive)
        .next();
    Some((module, directive))
}

/// Warns about import cycles the break table does not cover.
fn report_cycles(unit: &DartFile, symbols: &GlobalSymbolTable, diagnostics: &mut DiagnosticCollector) {
    let own = unit_uri(unit);
    let mut reported = BTreeSet::new();
    for import in &unit.imports {
        let Some(target) = absolute_uri(&own, &import.uri) else {
            continue;
        };
        if find_break(&unit.file_path, &import.uri).is_some() {
            continue;
        }
        if symbols.reaches(&target, &own) && reported.insert(target.clone()) {
            diagnostics.push(
                Diagnostic::new(
                    FJS_CIRCULAR_IMPORT,
                    Severity::Warning,
                    &format!("Import cycle between `{}` and `{}`", own, target),
                )
                .with_suggestion("Move the shared declarations into a third library, or add the pair to the circular-import table."),
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Publishes the unit's bindings in the module registry when some cycle
/// break reads them lazily.
pub fn render_registration(unit: &DartFile, public_names: &BTreeSet<String>) -> Option<String> {
    let name = file_name(&unit.file_path);
    let targeted = CIRCULAR_IMPORT_BREAKS
        .iter()
        .any(|b| b.strategy == BreakStrategy::LazyProxy && b.target == name);
    if !targeted || public_names.is_empty() {
        return None;
    }
    let list: Vec<&str> = public_names.iter().map(|s| s.as_str()).collect();
    Some(format!(
        "({} ??= {{}})[{}] = {{ {} }};",
        MODULE_REGISTRY,
        js::quote(&unit_uri(unit)),
        list.join(", ")
    ))
}

/// Re-export directives followed by the unit's own public declarations.
pub fn render_exports(
    unit: &DartFile,
    symbols: &GlobalSymbolTable,
    public_names: &BTreeSet<String>,
    diagnostics: &mut DiagnosticCollector,
) -> String {
    let mut lines = Vec::new();
    for export in &unit.exports {
        let Some(module) = resolve_uri(&unit.file_path, unit.package_name.as_deref(), &export.uri) else {
            continue;
        };
        if !export.show.is_empty() {
            let names: BTreeSet<&str> = export
                .show
                .iter()
                .filter(|s| !symbols.typedefs.contains(*s) && !unit.typedefs.contains(*s))
                .map(|s| s.as_str())
                .collect();
            if names.is_empty() {
                continue;
            }
            let list: Vec<&str> = names.into_iter().collect();
            lines.push(format!("export {{ {} }} from {};", list.join(", "), js::quote(&module)));
        } else {
            if !export.hide.is_empty() {
                diagnostics.push(Diagnostic::new(
                    FJS_EXPORT_HIDE_DROPPED,
                    Severity::Info,
                    &format!(
                        "`hide {}` on export of `{}` has no JavaScript equivalent; exported everything",
                        export.hide.join(", "),
                        export.uri
                    ),
                ));
            }
            lines.push(format!("export * from {};", js::quote(&module)));
        }
    }
    if !public_names.is_empty() {
        let list: Vec<&str> = public_names.iter().map(|s| s.as_str()).collect();
        lines.push(format!("export {{ {} }};", list.join(", ")));
    }
    lines.join("\n")
}
