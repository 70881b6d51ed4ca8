use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const FJS_EMPTY_UNIT: &str = "FJS-ANALYZE-001";
pub const FJS_MALFORMED_UNIT: &str = "FJS-ANALYZE-002";
pub const FJS_GENERATION_FAILED: &str = "FJS-PIPELINE-001";
pub const FJS_LEVEL_CLAMPED: &str = "FJS-PIPELINE-002";
pub const FJS_ERROR_THRESHOLD: &str = "FJS-PIPELINE-003";
pub const FJS_UNRESOLVED_IDENTIFIER: &str = "FJS-SCOPE-001";
pub const FJS_UNSUPPORTED_EXPRESSION: &str = "FJS-EXPR-001";
pub const FJS_AWAIT_OUTSIDE_ASYNC: &str = "FJS-EXPR-002";
pub const FJS_UNSUPPORTED_STATEMENT: &str = "FJS-STMT-001";
pub const FJS_EMPTY_SWITCH_CASE: &str = "FJS-STMT-002";
pub const FJS_CUSTOM_WIDGET: &str = "FJS-WIDGET-001";
pub const FJS_DEPRECATED_WIDGET: &str = "FJS-WIDGET-002";
pub const FJS_UNSTABLE_WIDGET: &str = "FJS-WIDGET-003";
pub const FJS_DEV_WIDGET: &str = "FJS-WIDGET-004";
pub const FJS_UNKNOWN_PROPERTY: &str = "FJS-WIDGET-005";
pub const FJS_DEPRECATED_PROPERTY: &str = "FJS-WIDGET-006";
pub const FJS_MISSING_REQUIRED_PROPERTY: &str = "FJS-WIDGET-007";
pub const FJS_METHOD_FAILED: &str = "FJS-CLASS-001";
pub const FJS_MISSING_BUILD: &str = "FJS-STATE-001";
pub const FJS_STATE_NAMING: &str = "FJS-STATE-002";
pub const FJS_STATE_NO_SUPERCLASS: &str = "FJS-STATE-003";
pub const FJS_CIRCULAR_IMPORT: &str = "FJS-IMPORT-001";
pub const FJS_EXPORT_HIDE_DROPPED: &str = "FJS-IMPORT-002";
pub const FJS_UNBALANCED_DELIMITER: &str = "FJS-VALIDATE-001";
pub const FJS_MARKER_COMMENT: &str = "FJS-VALIDATE-002";
pub const FJS_OUTPUT_TOO_SMALL: &str = "FJS-VALIDATE-003";
pub const FJS_SYNTAX: &str = "FJS-VALIDATE-004";
pub const FJS_OPTIMIZE_FAILED: &str = "FJS-OPTIMIZE-001";

/// One-line description of what a diagnostic code protects.
pub fn describe(code: &str) -> &'static str {
    match code {
        FJS_EMPTY_UNIT => "A program unit must declare at least one item.",
        FJS_MALFORMED_UNIT => "A program unit must carry a file path and well-formed names.",
        FJS_GENERATION_FAILED => "Generation never propagates a panic to its caller.",
        FJS_LEVEL_CLAMPED => "Optimization level is one of 1, 2 or 3.",
        FJS_ERROR_THRESHOLD => "Error count stays within the configured threshold.",
        FJS_UNRESOLVED_IDENTIFIER => "Every identifier resolves to a local, field, import or global.",
        FJS_UNSUPPORTED_EXPRESSION => "Every expression node has a lowering.",
        FJS_AWAIT_OUTSIDE_ASYNC => "`await` only appears inside async functions.",
        FJS_UNSUPPORTED_STATEMENT => "Every statement node has a lowering.",
        FJS_CUSTOM_WIDGET => "Widgets outside the registry are emitted as user-defined classes.",
        FJS_DEPRECATED_WIDGET => "Deprecated widgets should be replaced.",
        FJS_UNSTABLE_WIDGET => "Beta and alpha widgets may change between releases.",
        FJS_DEV_WIDGET => "Development-only widgets must not ship.",
        FJS_UNKNOWN_PROPERTY => "Widget properties match the declared schema.",
        FJS_DEPRECATED_PROPERTY => "Deprecated properties should use their replacement.",
        FJS_MISSING_REQUIRED_PROPERTY => "Required widget properties are always supplied.",
        FJS_METHOD_FAILED => "A method that cannot be converted degrades to a stub.",
        FJS_MISSING_BUILD => "A State class declares a build method.",
        FJS_STATE_NAMING => "A State class is named _<Widget>State.",
        FJS_STATE_NO_SUPERCLASS => "A State class extends State<Widget>.",
        FJS_CIRCULAR_IMPORT => "Import cycles are broken by a registered lazy proxy.",
        FJS_EXPORT_HIDE_DROPPED => "`hide` filters on exports cannot be expressed in JavaScript.",
        FJS_UNBALANCED_DELIMITER => "Braces, brackets and parentheses balance outside literals.",
        FJS_MARKER_COMMENT => "Generated code carries no TODO or FIXME markers.",
        FJS_OUTPUT_TOO_SMALL => "Generated output is not truncated.",
        FJS_SYNTAX => "Generated output parses as a JavaScript module.",
        FJS_OPTIMIZE_FAILED => "Optimization is best-effort and falls back to the input.",
        _ => "Unknown diagnostic.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub description: String,
    pub suggestion: Option<String>,
    /// Affected declaration or node, e.g. `Counter.build`.
    pub node: Option<String>,
    pub stack_trace: Option<String>,
}

impl Diagnostic {
    pub fn new(code: &str, severity: Severity, message: &str) -> Self {
        Diagnostic {
            code: code.to_string(),
            severity,
            message: message.to_string(),
            description: describe(code).to_string(),
            suggestion: None,
            node: None,
            stack_trace: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    pub fn with_node(mut self, node: &str) -> Self {
        self.node = Some(node.to_string());
        self
    }

    pub fn with_stack_trace(mut self, trace: &str) -> Self {
        self.stack_trace = Some(trace.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

/// Accumulates diagnostics for one pipeline run.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    items: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(code = %diagnostic.code, severity = diagnostic.severity.label(), "diagnostic");
        self.items.push(diagnostic);
    }

    pub fn info(&mut self, code: &str, message: &str) {
        self.push(Diagnostic::new(code, Severity::Info, message));
    }

    pub fn warning(&mut self, code: &str, message: &str) {
        self.push(Diagnostic::new(code, Severity::Warning, message));
    }

    pub fn error(&mut self, code: &str, message: &str) {
        self.push(Diagnostic::new(code, Severity::Error, message));
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.push(d);
        }
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn has_fatal(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// Drains the collector, most severe first; order within a severity is preserved.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items.sort_by(|a, b| b.severity.cmp(&a.severity));
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_errors_before_warnings() {
        let mut c = DiagnosticCollector::new();
        c.warning(FJS_STATE_NAMING, "w1");
        c.error(FJS_MISSING_BUILD, "e1");
        c.info(FJS_CUSTOM_WIDGET, "i1");
        c.error(FJS_UNRESOLVED_IDENTIFIER, "e2");
        let sorted = c.into_sorted();
        let messages: Vec<&str> = sorted.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["e1", "e2", "w1", "i1"]);
    }

    #[test]
    fn test_description_attached() {
        let d = Diagnostic::new(FJS_MISSING_BUILD, Severity::Error, "missing");
        assert_eq!(d.description, "A State class declares a build method.");
        assert_eq!(describe("nope"), "Unknown diagnostic.");
    }
}
