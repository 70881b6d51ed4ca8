//! Human-readable build log for one generation run.

use std::fmt::Write;

use crate::diagnostics::{Diagnostic, Severity};
use crate::pipeline::GenerationResult;

const RULE: &str = "════════════════════════════════════════════════════════════";

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}\n{}\n{}", RULE, title, RULE);
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn write_issue(out: &mut String, issue: &Diagnostic) {
    let _ = write!(out, "  [{}] {}: {}", issue.severity.label(), issue.code, issue.message);
    if let Some(node) = &issue.node {
        let _ = write!(out, " ({})", node);
    }
    out.push('\n');
    if let Some(suggestion) = &issue.suggestion {
        let _ = writeln!(out, "      suggestion: {}", suggestion);
    }
}

pub fn render_report(result: &GenerationResult) -> String {
    let stats = &result.statistics;
    let mut out = String::new();
    let status = if result.success { "SUCCESS" } else { "FAILED" };
    let _ = writeln!(out, "FlutterJS code generation report: {}", status);
    if !stats.file_path.is_empty() {
        let _ = writeln!(out, "File: {}", stats.file_path);
    }
    if let Some(error) = &result.error {
        let _ = writeln!(out, "Error: {}", error);
    }

    section(&mut out, "INPUT");
    let _ = writeln!(out, "  classes:   {}", stats.classes);
    let _ = writeln!(out, "  functions: {}", stats.functions);
    let _ = writeln!(out, "  variables: {}", stats.variables);
    let _ = writeln!(out, "  enums:     {}", stats.enums);

    section(&mut out, "DETECTION");
    let _ = writeln!(out, "  widgets: {}", list(&stats.used_widgets));
    let _ = writeln!(out, "  types:   {}", list(&stats.used_types));
    let _ = writeln!(out, "  helpers: {}", list(&stats.helpers));
    let _ = writeln!(
        out,
        "  imports: {} symbol(s) from {} module(s)",
        stats.imported_symbols, stats.import_modules
    );

    section(&mut out, "VALIDATION");
    if !stats.validated {
        let _ = writeln!(out, "  skipped");
    } else if stats.has_critical_issues {
        let _ = writeln!(out, "  critical issues found; output carries a banner");
    } else {
        let _ = writeln!(out, "  passed");
    }
    if stats.validated {
        let _ = writeln!(out, "  classes in output: {}", list(&stats.class_names));
    }

    section(&mut out, "OPTIMIZATION");
    match &stats.optimization {
        None => {
            let _ = writeln!(out, "  skipped");
        }
        Some(o) => {
            let mode = if o.dry_run { " (dry run)" } else { "" };
            let _ = writeln!(out, "  level {}{}", o.level, mode);
            let _ = writeln!(
                out,
                "  {} -> {} bytes ({:.1}% reduction)",
                o.original_size,
                o.optimized_size,
                o.reduction_percent()
            );
            let _ = writeln!(out, "  comments removed: {}", o.comments_removed);
            let _ = writeln!(out, "  unreachable lines removed: {}", o.unreachable_lines_removed);
        }
    }

    section(&mut out, "ISSUES");
    if result.issues.is_empty() {
        let _ = writeln!(out, "  none");
    }
    let groups: [(&str, &[Severity]); 3] = [
        ("Errors", &[Severity::Fatal, Severity::Error]),
        ("Warnings", &[Severity::Warning]),
        ("Info", &[Severity::Info]),
    ];
    for (title, severities) in groups {
        let issues: Vec<&Diagnostic> = result
            .issues
            .iter()
            .filter(|d| severities.contains(&d.severity))
            .collect();
        if issues.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} ({})", title, issues.len());
        for issue in issues {
            write_issue(&mut out, issue);
        }
    }
    out
}
