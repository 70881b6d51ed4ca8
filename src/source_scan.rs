//! Minimal lexer for generated JavaScript.
//!
//! Splits text into code, string, template-text and comment segments so the
//! validator and optimizer can reason about delimiters and comments without
//! being fooled by literal contents. Template interpolations (`${ ... }`) are
//! scanned as code, with nested braces tracked per template.

use crate::error::OptimizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    StringLiteral,
    /// Template text including its delimiters (`` ` ``, `${`, `}`).
    TemplateText,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, SegmentKind::LineComment | SegmentKind::BlockComment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub kind: &'static str,
    pub offset: usize,
}

impl From<ScanError> for OptimizeError {
    fn from(e: ScanError) -> Self {
        OptimizeError::Unterminated {
            kind: e.kind,
            offset: e.offset,
        }
    }
}

struct Scanner<'a> {
    bytes: &'a [u8],
    segments: Vec<Segment>,
    code_start: usize,
}

impl<'a> Scanner<'a> {
    fn flush_code(&mut self, end: usize) {
        if end > self.code_start {
            self.segments.push(Segment {
                kind: SegmentKind::Code,
                start: self.code_start,
                end,
            });
        }
    }

    fn push(&mut self, kind: SegmentKind, start: usize, end: usize) {
        self.flush_code(start);
        self.segments.push(Segment { kind, start, end });
        self.code_start = end;
    }

    /// Scans a quoted string starting at the opening quote.
    fn string(&mut self, start: usize) -> Result<usize, ScanError> {
        let quote = self.bytes[start];
        let mut i = start + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'\n' => break,
                b if b == quote => return Ok(i + 1),
                _ => i += 1,
            }
        }
        Err(ScanError {
            kind: "string literal",
            offset: start,
        })
    }

    /// Scans template text starting just after `` ` `` or an interpolation's
    /// closing `}`. Returns the end offset and whether an interpolation opened.
    fn template_text(&mut self, from: usize, opened_at: usize) -> Result<(usize, bool), ScanError> {
        let mut i = from;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'`' => return Ok((i + 1, false)),
                b'$' if self.bytes.get(i + 1) == Some(&b'{') => return Ok((i + 2, true)),
                _ => i += 1,
            }
        }
        Err(ScanError {
            kind: "template literal",
            offset: opened_at,
        })
    }
}

pub fn scan(source: &str) -> Result<Vec<Segment>, ScanError> {
    let bytes = source.as_bytes();
    let mut sc = Scanner {
        bytes,
        segments: Vec::new(),
        code_start: 0,
    };
    // Brace depth inside each open `${ ... }`.
    let mut templates: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = source[i..].find('\n').map(|p| i + p).unwrap_or(bytes.len());
                sc.push(SegmentKind::LineComment, i, end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = source[i + 2..]
                    .find("*/")
                    .map(|p| i + 2 + p + 2)
                    .ok_or(ScanError {
                        kind: "block comment",
                        offset: i,
                    })?;
                sc.push(SegmentKind::BlockComment, i, end);
                i = end;
            }
            b'"' | b'\'' => {
                let end = sc.string(i)?;
                sc.push(SegmentKind::StringLiteral, i, end);
                i = end;
            }
            b'`' => {
                let (end, opened) = sc.template_text(i + 1, i)?;
                sc.push(SegmentKind::TemplateText, i, end);
                if opened {
                    templates.push(0);
                }
                i = end;
            }
            b'{' => {
                if let Some(depth) = templates.last_mut() {
                    *depth += 1;
                }
                i += 1;
            }
            b'}' => match templates.last_mut() {
                Some(0) => {
                    templates.pop();
                    let (end, opened) = sc.template_text(i + 1, i)?;
                    sc.push(SegmentKind::TemplateText, i, end);
                    if opened {
                        templates.push(0);
                    }
                    i = end;
                }
                Some(depth) => {
                    *depth -= 1;
                    i += 1;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    if !templates.is_empty() {
        return Err(ScanError {
            kind: "template interpolation",
            offset: bytes.len(),
        });
    }
    sc.flush_code(bytes.len());
    Ok(sc.segments)
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
        + 1
}
