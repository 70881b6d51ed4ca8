//! Post-generation checks over the emitted JavaScript text.
//!
//! Only delimiter mismatches are critical. Marker comments, suspiciously
//! small output and parser findings are reported but never block output.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{
    Diagnostic, Severity, FJS_MARKER_COMMENT, FJS_OUTPUT_TOO_SMALL, FJS_SYNTAX,
    FJS_UNBALANCED_DELIMITER,
};
use crate::source_scan::{self, line_of, SegmentKind};

/// Outputs shorter than this are most likely truncated.
pub const MIN_OUTPUT_LEN: usize = 50;

const MARKERS: &[&str] = &["TODO", "FIXME"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub issues: Vec<Diagnostic>,
    pub has_critical_issues: bool,
    /// Classes the parsed module declares, in source order.
    pub class_names: Vec<String>,
}

impl ValidationReport {
    fn critical(&mut self, diagnostic: Diagnostic) {
        self.has_critical_issues = true;
        self.issues.push(diagnostic);
    }
}

pub fn validate(source: &str) -> ValidationReport {
    let _span = tracing::debug_span!("validate", len = source.len()).entered();
    let mut report = ValidationReport::default();

    check_delimiters(source, &mut report);
    check_markers(source, &mut report);

    if source.trim().len() < MIN_OUTPUT_LEN {
        report.issues.push(
            Diagnostic::new(
                FJS_OUTPUT_TOO_SMALL,
                Severity::Warning,
                &format!("Generated output is only {} characters long", source.trim().len()),
            )
            .with_suggestion("Check the unit for declarations that failed to generate."),
        );
    }

    check_syntax(source, &mut report);

    tracing::debug!(
        issues = report.issues.len(),
        critical = report.has_critical_issues,
        "validation finished"
    );
    report
}

// ═══════════════════════════════════════════════════════════════════════════════
// DELIMITERS
// ═══════════════════════════════════════════════════════════════════════════════

fn closing_for(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

/// Whether every bracket in the code segments of `source` is closed by
/// its matching partner.
pub fn delimiters_balanced(source: &str) -> bool {
    let mut report = ValidationReport::default();
    check_delimiters(source, &mut report);
    !report.has_critical_issues
}

/// Delimiter balance over code segments only; string, template text and
/// comment contents are skipped.
fn check_delimiters(source: &str, report: &mut ValidationReport) {
    let segments = match source_scan::scan(source) {
        Ok(segments) => segments,
        Err(e) => {
            report.critical(Diagnostic::new(
                FJS_UNBALANCED_DELIMITER,
                Severity::Error,
                &format!("Unterminated {} starting on line {}", e.kind, line_of(source, e.offset)),
            ));
            return;
        }
    };

    let mut stack: Vec<(u8, usize)> = Vec::new();
    for segment in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        for (i, b) in segment.text(source).bytes().enumerate() {
            let offset = segment.start + i;
            match b {
                b'(' | b'[' | b'{' => stack.push((b, offset)),
                b')' | b']' | b'}' => match stack.pop() {
                    Some((open, _)) if closing_for(open) == b => {}
                    Some((open, at)) => {
                        report.critical(Diagnostic::new(
                            FJS_UNBALANCED_DELIMITER,
                            Severity::Error,
                            &format!(
                                "`{}` on line {} closes `{}` opened on line {}",
                                b as char,
                                line_of(source, offset),
                                open as char,
                                line_of(source, at)
                            ),
                        ));
                        return;
                    }
                    None => {
                        report.critical(Diagnostic::new(
                            FJS_UNBALANCED_DELIMITER,
                            Severity::Error,
                            &format!("Unmatched `{}` on line {}", b as char, line_of(source, offset)),
                        ));
                        return;
                    }
                },
                _ => {}
            }
        }
    }

    if let Some((open, at)) = stack.last() {
        report.critical(Diagnostic::new(
            FJS_UNBALANCED_DELIMITER,
            Severity::Error,
            &format!(
                "{} unclosed delimiter(s); innermost `{}` opened on line {}",
                stack.len(),
                *open as char,
                line_of(source, *at)
            ),
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKERS
// ═══════════════════════════════════════════════════════════════════════════════

fn check_markers(source: &str, report: &mut ValidationReport) {
    for (n, line) in source.lines().enumerate() {
        if let Some(marker) = MARKERS.iter().find(|m| line.contains(*m)) {
            report.issues.push(Diagnostic::new(
                FJS_MARKER_COMMENT,
                Severity::Warning,
                &format!("{} marker on line {}", marker, n + 1),
            ));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTAX
// ═══════════════════════════════════════════════════════════════════════════════

struct ClassCollector {
    names: Vec<String>,
}

impl<'a> oxc_ast_visit::Visit<'a> for ClassCollector {
    fn visit_class(&mut self, class: &oxc_ast::ast::Class<'a>) {
        if let Some(id) = &class.id {
            self.names.push(id.name.to_string());
        }
        oxc_ast_visit::walk::walk_class(self, class);
    }
}

fn check_syntax(source: &str, report: &mut ValidationReport) {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);
    let ret = Parser::new(&allocator, source, source_type).parse();

    for error in ret.errors.iter().take(10) {
        report.issues.push(Diagnostic::new(FJS_SYNTAX, Severity::Warning, &error.to_string()));
    }
    if ret.panicked {
        return;
    }

    let mut collector = ClassCollector { names: Vec::new() };
    oxc_ast_visit::Visit::visit_program(&mut collector, &ret.program);
    report.class_names = collector.names;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(report: &ValidationReport) -> Vec<&str> {
        report.issues.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn test_valid_module_has_no_issues() {
        let js = "class Foo extends StatelessWidget {\n  build(context) {\n    return new Text(\"hi\");\n  }\n}\n";
        let report = validate(js);
        assert!(!report.has_critical_issues);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert_eq!(report.class_names, vec!["Foo"]);
    }

    #[test]
    fn test_braces_inside_literals_are_ignored() {
        let js = "const a = \"{ ( [\";\nconst b = `${ { x: 1 }.x } }`;\n// )\n/* ] */\nconst padding = 1234567890;\n";
        let report = validate(js);
        assert!(!report.has_critical_issues, "{:?}", report.issues);
    }

    #[test]
    fn test_unclosed_brace_is_critical() {
        let js = "function f() {\n  if (x) {\n    return 1;\n}\n// padding padding padding padding\n";
        let report = validate(js);
        assert!(report.has_critical_issues);
        assert!(codes(&report).contains(&FJS_UNBALANCED_DELIMITER));
    }

    #[test]
    fn test_mismatched_close_is_critical() {
        let report = validate("const x = [1, 2);\n// padding padding padding padding padding\n");
        assert!(report.has_critical_issues);
    }

    #[test]
    fn test_balance_helper() {
        assert!(delimiters_balanced("f({ a: [1] }); // )"));
        assert!(!delimiters_balanced("f({ a: [1] );"));
    }

    #[test]
    fn test_markers_and_small_output_are_warnings() {
        let report = validate("// TODO: x\nf();\n");
        assert!(!report.has_critical_issues);
        let found = codes(&report);
        assert!(found.contains(&FJS_MARKER_COMMENT));
        assert!(found.contains(&FJS_OUTPUT_TOO_SMALL));
    }

    #[test]
    fn test_syntax_error_is_a_warning() {
        let report = validate("const = 1;\n// padding padding padding padding padding padding\n");
        assert!(!report.has_critical_issues);
        assert!(codes(&report).contains(&FJS_SYNTAX));
    }
}
