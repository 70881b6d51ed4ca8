//! Text-level optimizer for generated modules.
//!
//! Level 1 only touches whitespace. Level 2 also strips comments, blank
//! lines and statements that follow a single-line `return`/`throw` in the
//! same block. Level 3 also strips indentation. Comments containing `KEEP`
//! and `/*!` comments survive every level. Line edits never reach inside
//! template literals or block comments.

use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;
use crate::source_scan::{self, SegmentKind};
use crate::validate::delimiters_balanced;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeReport {
    pub level: u8,
    pub dry_run: bool,
    pub original_size: usize,
    /// Size of the optimized text, also reported on a dry run.
    pub optimized_size: usize,
    pub comments_removed: usize,
    pub unreachable_lines_removed: usize,
}

impl OptimizeReport {
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        let saved = self.original_size as f64 - self.optimized_size as f64;
        saved * 100.0 / self.original_size as f64
    }

    pub fn changed(&self) -> bool {
        self.original_size != self.optimized_size
            || self.comments_removed > 0
            || self.unreachable_lines_removed > 0
    }
}

#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub code: String,
    pub report: OptimizeReport,
}

/// Optimizes `source` at `level` (values above 3 behave as 3).
///
/// On a dry run the returned code is `source` itself and the report
/// describes what the pass would have done.
pub fn optimize(source: &str, level: u8, dry_run: bool) -> Result<OptimizeOutcome, OptimizeError> {
    let _span = tracing::debug_span!("optimize", level, dry_run).entered();
    let level = level.clamp(1, 3);
    let mut report = OptimizeReport {
        level,
        dry_run,
        original_size: source.len(),
        ..OptimizeReport::default()
    };

    let mut code = normalize_whitespace(source)?;
    if level >= 2 {
        let (stripped, comments) = strip_comments(&code)?;
        report.comments_removed = comments;
        let (compacted, unreachable) = compact_lines(&stripped, level >= 3)?;
        if delimiters_balanced(source) && !delimiters_balanced(&compacted) {
            return Err(OptimizeError::Unbalanced);
        }
        report.unreachable_lines_removed = unreachable;
        report.optimized_size = compacted.len();
        code = format!(
            "// Optimized (level {}): {} -> {} bytes ({:.1}% reduction)\n{}",
            level,
            report.original_size,
            report.optimized_size,
            report.reduction_percent(),
            compacted
        );
    }
    report.optimized_size = code.len();

    tracing::debug!(
        original = report.original_size,
        optimized = report.optimized_size,
        comments = report.comments_removed,
        unreachable = report.unreachable_lines_removed,
        "optimization finished"
    );

    if dry_run {
        code = source.to_string();
    }
    Ok(OptimizeOutcome { code, report })
}

// ═══════════════════════════════════════════════════════════════════════════════
// LINES
// ═══════════════════════════════════════════════════════════════════════════════

struct Line<'a> {
    text: &'a str,
    /// The previous line break lies inside a template literal or block comment.
    starts_in_literal: bool,
    /// This line's break lies inside a template literal or block comment.
    ends_in_literal: bool,
}

impl Line<'_> {
    fn is_plain(&self) -> bool {
        !self.starts_in_literal && !self.ends_in_literal
    }
}

fn split_lines(source: &str) -> Result<Vec<Line<'_>>, OptimizeError> {
    let segments = source_scan::scan(source)?;
    let spans: Vec<(usize, usize)> = segments
        .iter()
        .filter(|s| matches!(s.kind, SegmentKind::TemplateText | SegmentKind::BlockComment))
        .map(|s| (s.start, s.end))
        .collect();
    let inside = |pos: usize| {
        let i = spans.partition_point(|(start, _)| *start < pos);
        i > 0 && pos < spans[i - 1].1
    };

    let mut lines = Vec::new();
    let mut offset = 0;
    let mut previous_in_literal = false;
    for text in source.split('\n') {
        let newline = offset + text.len();
        let ends_in_literal = newline < source.len() && inside(newline);
        lines.push(Line {
            text,
            starts_in_literal: previous_in_literal,
            ends_in_literal,
        });
        previous_in_literal = ends_in_literal;
        offset = newline + 1;
    }
    Ok(lines)
}

fn join(lines: Vec<String>) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn indent_width(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEVEL 1
// ═══════════════════════════════════════════════════════════════════════════════

fn normalize_whitespace(source: &str) -> Result<String, OptimizeError> {
    let mut out: Vec<String> = Vec::new();
    let mut previous_blank = false;
    for line in split_lines(source)? {
        let text = if line.ends_in_literal {
            line.text
        } else {
            line.text.trim_end()
        };
        let blank = line.is_plain() && text.is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        out.push(text.to_string());
    }
    while out.last().map_or(false, |l| l.is_empty()) {
        out.pop();
    }
    Ok(join(out))
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEVEL 2
// ═══════════════════════════════════════════════════════════════════════════════

fn keep_comment(text: &str) -> bool {
    text.contains("KEEP") || text.starts_with("/*!")
}

fn strip_comments(source: &str) -> Result<(String, usize), OptimizeError> {
    let mut out = String::with_capacity(source.len());
    let mut removed = 0;
    for segment in source_scan::scan(source)? {
        let text = segment.text(source);
        if !segment.is_comment() || keep_comment(text) {
            out.push_str(text);
            continue;
        }
        removed += 1;
        // Keeps neighbouring tokens apart.
        if segment.kind == SegmentKind::BlockComment {
            out.push_str(if text.contains('\n') { "\n" } else { " " });
        }
    }
    Ok((out, removed))
}

/// Net `(`, `[` and `{` depth of one line's code, or `None` when the line
/// opens or closes a brace or cannot be scanned on its own.
fn flat_balance(text: &str) -> Option<i32> {
    let segments = source_scan::scan(text).ok()?;
    let mut depth = 0;
    for segment in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        for b in segment.text(text).bytes() {
            match b {
                b'{' | b'}' => return None,
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth -= 1,
                _ => {}
            }
        }
    }
    Some(depth)
}

fn is_terminator(line: &Line) -> bool {
    if !line.is_plain() {
        return false;
    }
    let t = line.text.trim();
    let keyword = t == "return;" || t.starts_with("return ") || t.starts_with("throw ");
    keyword && t.ends_with(';') && flat_balance(t) == Some(0)
}

fn is_unreachable(line: &Line, indent: usize) -> bool {
    if !line.is_plain() || indent_width(line.text) != indent {
        return false;
    }
    let t = line.text.trim();
    const STOPS: &[&str] = &["}", "case ", "default", "var ", "function", "class ", "async function"];
    if STOPS.iter().any(|s| t.starts_with(s)) {
        return false;
    }
    t.ends_with(';') && flat_balance(t) == Some(0)
}

fn compact_lines(source: &str, strip_indent: bool) -> Result<(String, usize), OptimizeError> {
    let mut out = Vec::new();
    let mut removed = 0;
    let mut dead_at: Option<usize> = None;

    for line in split_lines(source)? {
        if line.is_plain() && line.text.trim().is_empty() {
            continue;
        }
        if let Some(indent) = dead_at {
            if is_unreachable(&line, indent) {
                removed += 1;
                continue;
            }
            dead_at = None;
        }
        if is_terminator(&line) {
            dead_at = Some(indent_width(line.text));
        }

        let mut text = if line.ends_in_literal {
            line.text
        } else {
            line.text.trim_end()
        };
        if strip_indent && !line.starts_in_literal {
            text = text.trim_start();
        }
        out.push(text.to_string());
    }
    Ok((join(out), removed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "// header\nclass A {   \n\n\n\n  f() {\n    /* note */\n    return 1;\n    this.x = 2;\n  }\n}\n\n\n";

    #[test]
    fn test_level_one_normalizes_whitespace() {
        let out = optimize(SAMPLE, 1, false).unwrap();
        assert_eq!(
            out.code,
            "// header\nclass A {\n\n  f() {\n    /* note */\n    return 1;\n    this.x = 2;\n  }\n}\n"
        );
        assert_eq!(out.report.comments_removed, 0);
    }

    #[test]
    fn test_level_one_is_idempotent() {
        let once = optimize(SAMPLE, 1, false).unwrap().code;
        let twice = optimize(&once, 1, false).unwrap().code;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_level_two_strips_comments_and_dead_lines() {
        let out = optimize(SAMPLE, 2, false).unwrap();
        assert!(out.code.starts_with("// Optimized (level 2): "));
        assert!(out.code.lines().next().unwrap().contains("% reduction"));
        assert!(!out.code.contains("note"));
        assert!(!out.code.contains("this.x = 2"));
        assert!(out.code.contains("    return 1;\n  }\n}\n"));
        assert_eq!(out.report.comments_removed, 2);
        assert_eq!(out.report.unreachable_lines_removed, 1);
    }

    #[test]
    fn test_keep_comments_survive() {
        let src = "// KEEP: sourcemap hint\n/*! banner */\n// drop me\nconst a = 1;\n";
        let out = optimize(src, 3, false).unwrap();
        assert!(out.code.contains("// KEEP: sourcemap hint"));
        assert!(out.code.contains("/*! banner */"));
        assert!(!out.code.contains("drop me"));
    }

    #[test]
    fn test_switch_cases_after_return_are_kept() {
        let src = "switch (x) {\n  case 1:\n    return 1;\n  case 2:\n    return 2;\n}\n";
        let out = optimize(src, 2, false).unwrap();
        assert!(out.code.contains("case 2:"));
        assert_eq!(out.report.unreachable_lines_removed, 0);
    }

    #[test]
    fn test_nested_block_after_return_is_not_dropped() {
        let src = "function f() {\n  return 1;\n  if (x) {\n    g();\n  }\n}\n";
        let out = optimize(src, 2, false).unwrap();
        assert!(out.code.contains("if (x) {"));
        assert!(out.code.contains("g();"));
    }

    #[test]
    fn test_level_three_strips_indentation() {
        let out = optimize("class A {\n  f() {\n    return 1;\n  }\n}\n", 3, false).unwrap();
        assert!(out.code.ends_with("class A {\nf() {\nreturn 1;\n}\n}\n"));
    }

    #[test]
    fn test_template_contents_are_untouched() {
        let src = "const t = `line one   \n\n\n    // not a comment\n`;\n";
        let out = optimize(src, 3, false).unwrap();
        assert!(out.code.contains("`line one   \n\n\n    // not a comment\n`;"));
    }

    #[test]
    fn test_dry_run_returns_input() {
        let out = optimize(SAMPLE, 2, true).unwrap();
        assert_eq!(out.code, SAMPLE);
        assert!(out.report.dry_run);
        assert!(out.report.changed());
        assert_eq!(out.report.comments_removed, 2);
    }

    #[test]
    fn test_unterminated_literal_is_an_error() {
        let err = optimize("const s = `open", 1, false).unwrap_err();
        assert!(matches!(err, OptimizeError::Unterminated { .. }));
    }
}
