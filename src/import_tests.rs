//! Import planning, module specifiers and export rendering.

#[cfg(test)]
mod tests {
    use crate::diagnostics::{
        DiagnosticCollector, Severity, FJS_CIRCULAR_IMPORT, FJS_EXPORT_HIDE_DROPPED,
        FJS_UNRESOLVED_IDENTIFIER,
    };
    use crate::imports::{
        find_break, is_importable, plan_imports, relative_import_path, render_exports,
        render_registration, resolve_uri, GlobalSymbolTable, ImportPlan,
    };
    use crate::ir::{DartFile, ExportDirective, ImportDirective};
    use crate::registry::WidgetRegistry;
    use std::collections::{BTreeSet, HashSet};

    fn import(uri: &str) -> ImportDirective {
        ImportDirective {
            uri: uri.to_string(),
            prefix: None,
            show: vec![],
            hide: vec![],
            is_deferred: false,
        }
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn app_unit(path: &str) -> DartFile {
        let mut unit = DartFile::new(path);
        unit.package_name = Some("app".to_string());
        unit
    }

    fn plan(
        unit: &DartFile,
        symbols: &GlobalSymbolTable,
        used: &[&str],
        locals: &[&str],
    ) -> (ImportPlan, DiagnosticCollector) {
        let mut diagnostics = DiagnosticCollector::new();
        let locals: HashSet<String> = locals.iter().map(|s| s.to_string()).collect();
        let plan = plan_imports(
            unit,
            WidgetRegistry::builtin(),
            symbols,
            &names(used),
            &locals,
            &mut diagnostics,
        );
        (plan, diagnostics)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // MODULE SPECIFIERS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_framework_and_dart_libraries() {
        let from = "lib/main.dart";
        assert_eq!(
            resolve_uri(from, Some("app"), "package:flutter/material.dart").as_deref(),
            Some("@flutterjs/material")
        );
        assert_eq!(resolve_uri(from, Some("app"), "dart:core"), None);
        assert_eq!(
            resolve_uri(from, Some("app"), "dart:math").as_deref(),
            Some("@flutterjs/dart/math")
        );
    }

    #[test]
    fn test_same_package_is_relative() {
        assert_eq!(
            resolve_uri("lib/main.dart", Some("app"), "package:app/home.dart").as_deref(),
            Some("./home.js")
        );
        assert_eq!(
            resolve_uri("lib/src/a/b.dart", Some("app"), "package:app/src/c.dart").as_deref(),
            Some("../c.js")
        );
        assert_eq!(
            resolve_uri("lib/main.dart", Some("app"), "widgets/card.dart").as_deref(),
            Some("./widgets/card.js")
        );
        assert_eq!(
            resolve_uri("lib/src/page.dart", Some("app"), "../main.dart").as_deref(),
            Some("../main.js")
        );
    }

    #[test]
    fn test_other_package_uses_dist() {
        assert_eq!(
            resolve_uri("lib/main.dart", Some("app"), "package:http/http.dart").as_deref(),
            Some("@flutterjs/http/dist/http.js")
        );
    }

    #[test]
    fn test_relative_import_path() {
        assert_eq!(relative_import_path("lib/a.dart", "lib/b.dart"), "./b.dart");
        assert_eq!(relative_import_path("lib/x/y/a.dart", "lib/b.dart"), "../../b.dart");
        assert_eq!(relative_import_path("lib/a.dart", "lib/x/b.dart"), "./x/b.dart");
    }

    #[test]
    fn test_importable_names() {
        let locals: HashSet<String> = ["Local".to_string()].into_iter().collect();
        assert!(is_importable("Text", &locals));
        assert!(is_importable("runApp", &locals));
        assert!(!is_importable("Local", &locals));
        assert!(!is_importable("helper", &locals));
        assert!(!is_importable("String", &locals));
        assert!(is_importable("X", &locals));
        assert!(!is_importable("x", &locals));
        assert!(!is_importable("not-an-ident", &locals));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // IMPORT PLAN
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_imports_grouped_and_sorted() {
        let unit = app_unit("lib/main.dart");
        let symbols = GlobalSymbolTable::default();
        let used = ["Text", "StatelessWidget", "Container", "Local", "helper"];
        let (first, _) = plan(&unit, &symbols, &used, &["Local"]);
        let (second, _) = plan(&unit, &symbols, &["helper", "Container", "Local", "StatelessWidget", "Text"], &["Local"]);

        assert_eq!(
            first.render(),
            "import { Container, Text } from \"@flutterjs/material\";\n\
             import { StatelessWidget } from \"@flutterjs/widgets\";"
        );
        assert_eq!(first, second);
        assert_eq!(first.symbol_count(), 3);
    }

    #[test]
    fn test_show_list_and_symbol_table() {
        let mut unit = app_unit("lib/main.dart");
        let mut models = import("package:app/models.dart");
        models.show = vec!["User".to_string()];
        unit.imports.push(models);

        let mut symbols = GlobalSymbolTable::default();
        symbols.register("Repo", "package:app/data/repo.dart");

        let (plan, diagnostics) = plan(&unit, &symbols, &["User", "Repo", "Mystery"], &[]);
        assert_eq!(plan.named.get("./models.js"), Some(&names(&["User"])));
        assert_eq!(plan.named.get("./data/repo.js"), Some(&names(&["Repo"])));
        let unresolved: Vec<_> = diagnostics
            .items()
            .iter()
            .filter(|d| d.code == FJS_UNRESOLVED_IDENTIFIER)
            .collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].severity, Severity::Warning);
        assert!(unresolved[0].message.contains("Mystery"));
    }

    #[test]
    fn test_single_letter_class_is_imported() {
        let unit = app_unit("lib/main.dart");
        let mut symbols = GlobalSymbolTable::default();
        symbols.register("Q", "package:app/q.dart");

        let (plan, diagnostics) = plan(&unit, &symbols, &["Q", "T", "i"], &[]);
        assert_eq!(plan.render(), "import { Q } from \"./q.js\";");
        assert!(!diagnostics.items().iter().any(|d| d.code == FJS_UNRESOLVED_IDENTIFIER));
    }

    #[test]
    fn test_hidden_symbol_not_imported() {
        let mut unit = app_unit("lib/main.dart");
        let mut material = import("package:flutter/material.dart");
        material.hide = vec!["Text".to_string()];
        unit.imports.push(material);

        let (plan, _) = plan(&unit, &GlobalSymbolTable::default(), &["Text", "Container"], &[]);
        let material = plan.named.get("@flutterjs/material").expect("material import");
        assert!(material.contains("Container"));
        assert!(!material.contains("Text"));
    }

    #[test]
    fn test_prefixed_import_is_namespace() {
        let mut unit = app_unit("lib/main.dart");
        let mut http = import("package:http/http.dart");
        http.prefix = Some("http".to_string());
        unit.imports.push(http);

        let (plan, _) = plan(&unit, &GlobalSymbolTable::default(), &[], &[]);
        assert_eq!(
            plan.render(),
            "import * as http from \"@flutterjs/http/dist/http.js\";"
        );
        assert!(plan.prefixes().contains("http"));
    }

    #[test]
    fn test_known_cycle_becomes_lazy_proxy() {
        let mut unit = app_unit("lib/src/path.dart");
        unit.imports.push(import("style.dart"));
        let mut symbols = GlobalSymbolTable::default();
        symbols.register("Style", "package:app/src/style.dart");
        symbols.record_import("package:app/src/style.dart", "package:app/src/path.dart");

        assert!(find_break(&unit.file_path, "style.dart").is_some());
        let (plan, diagnostics) = plan(&unit, &symbols, &["Style"], &[]);
        assert!(plan.named.is_empty());
        assert!(plan.lazy_symbols().contains("Style"));
        let rendered = plan.render();
        assert_eq!(
            rendered,
            "const __flutterjsModules = (globalThis.__flutterjs_modules ??= {});\n\
             const __lazyImports = {\n  \
             get Style() { return __flutterjsModules[\"package:app/src/style.dart\"].Style; },\n\
             };"
        );
        assert!(!rendered.contains("import "));
        assert!(!rendered.contains("./style.js"));
        assert!(!diagnostics.items().iter().any(|d| d.code == FJS_CIRCULAR_IMPORT));
    }

    #[test]
    fn test_cycle_target_registers_its_bindings() {
        let style = app_unit("lib/src/style.dart");
        let public = names(&["Style", "StyleSheet"]);
        assert_eq!(
            render_registration(&style, &public).as_deref(),
            Some("(globalThis.__flutterjs_modules ??= {})[\"package:app/src/style.dart\"] = { Style, StyleSheet };")
        );
        assert_eq!(render_registration(&app_unit("lib/src/path.dart"), &public), None);
        assert_eq!(render_registration(&style, &BTreeSet::new()), None);
    }

    #[test]
    fn test_unlisted_cycle_warns() {
        let mut unit = app_unit("lib/a.dart");
        unit.imports.push(import("b.dart"));
        let mut symbols = GlobalSymbolTable::default();
        symbols.record_import("package:app/b.dart", "package:app/c.dart");
        symbols.record_import("package:app/c.dart", "package:app/a.dart");

        let (_, diagnostics) = plan(&unit, &symbols, &[], &[]);
        let cycles: Vec<_> = diagnostics
            .items()
            .iter()
            .filter(|d| d.code == FJS_CIRCULAR_IMPORT)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].severity, Severity::Warning);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SYMBOL TABLE & EXPORTS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_symbol_table_from_units() {
        let mut models = app_unit("lib/models.dart");
        models.typedefs.push("UserId".to_string());
        models.imports.push(import("src/util.dart"));
        models.classes.push(crate::ir::ClassDecl::new("User"));

        let mut table = GlobalSymbolTable::default();
        table.add_unit(&models);
        assert_eq!(table.module_of("User"), Some("package:app/models.dart"));
        assert!(table.typedefs.contains("UserId"));
        assert!(table.reaches("package:app/models.dart", "package:app/src/util.dart"));
        assert!(!table.reaches("package:app/src/util.dart", "package:app/models.dart"));
    }

    #[test]
    fn test_exports_drop_typedefs_and_report_hide() {
        let mut unit = app_unit("lib/api.dart");
        unit.typedefs.push("UserId".to_string());
        unit.exports.push(ExportDirective {
            uri: "models.dart".to_string(),
            show: vec!["User".to_string(), "UserId".to_string()],
            hide: vec![],
        });
        unit.exports.push(ExportDirective {
            uri: "package:app/widgets.dart".to_string(),
            show: vec![],
            hide: vec!["Internal".to_string()],
        });
        let mut diagnostics = DiagnosticCollector::new();

        let out = render_exports(
            &unit,
            &GlobalSymbolTable::default(),
            &names(&["Api"]),
            &mut diagnostics,
        );
        assert_eq!(
            out,
            "export { User } from \"./models.js\";\n\
             export * from \"./widgets.js\";\n\
             export { Api };"
        );
        let dropped: Vec<_> = diagnostics
            .items()
            .iter()
            .filter(|d| d.code == FJS_EXPORT_HIDE_DROPPED)
            .collect();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].severity, Severity::Info);
    }
}
