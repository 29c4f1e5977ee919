//! Line-oriented parser for session text.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{ParsedSession, SessionSection};
use super::{BLOCK_RULE, STARTUP_RULE};
use crate::error::ParseError;

static STARTUP_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^// STARTUP_FILE:(?:\s+(.*?))?\s*$").expect("startup header pattern is valid")
});

// Exactly eight `#`, then whitespace or end of line.
static BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^########(?:\s+(.*?))?\s*$").expect("block header pattern is valid")
});

/// A line of input with its byte span.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    /// Offset just past the line terminator.
    end: usize,
    /// Line text without `\n` or a trailing `\r`.
    text: &'a str,
}

/// A recognized block start.
#[derive(Debug)]
struct Marker {
    /// Offset of the opening rule.
    start: usize,
    /// Offset of the first body byte.
    body_start: usize,
    line: usize,
    kind: MarkerKind,
}

#[derive(Debug)]
enum MarkerKind {
    Block(String),
    Malformed(ParseError),
}

/// Parse session text, skipping malformed segments.
///
/// Never fails: problems are collected in [`ParsedSession::issues`]. Use
/// [`ParsedSession::into_strict`] to reject imperfect input.
pub fn parse_session(text: &str) -> ParsedSession {
    let lines = split_lines(text);
    let markers = find_markers(&lines);
    let preamble_end = markers.first().map_or(text.len(), |m| m.start);

    let mut parsed = ParsedSession::default();
    parse_preamble(text, &lines, preamble_end, !markers.is_empty(), &mut parsed);

    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
        match &marker.kind {
            MarkerKind::Block(name) => {
                let body = strip_newline(&text[marker.body_start..end]);
                parsed.buffers.push(SessionSection {
                    name: name.clone(),
                    content: body.to_string(),
                    line: marker.line,
                });
            }
            MarkerKind::Malformed(issue) => {
                tracing::debug!(line = marker.line, %issue, "skipping malformed session block");
                parsed.issues.push(issue.clone());
            }
        }
    }
    parsed
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for piece in text.split_inclusive('\n') {
        let end = start + piece.len();
        let body = piece.strip_suffix('\n').unwrap_or(piece);
        let body = body.strip_suffix('\r').unwrap_or(body);
        lines.push(Line {
            start,
            end,
            text: body,
        });
        start = end;
    }
    lines
}

fn block_header_name(line: &str) -> Option<String> {
    if line == BLOCK_RULE {
        return None;
    }
    let caps = BLOCK_HEADER.captures(line)?;
    Some(caps.get(1).map_or("", |m| m.as_str()).to_string())
}

fn find_markers(lines: &[Line<'_>]) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let opens_block = lines[i].text == BLOCK_RULE;
        let header = if opens_block {
            lines.get(i + 1).and_then(|l| block_header_name(l.text))
        } else {
            None
        };
        let Some(name) = header else {
            i += 1;
            continue;
        };

        let line = i + 1;
        let closed = lines.get(i + 2).is_some_and(|l| l.text == BLOCK_RULE);
        if closed {
            let kind = if name.is_empty() {
                MarkerKind::Malformed(ParseError::EmptyName { line: line + 1 })
            } else {
                MarkerKind::Block(name)
            };
            markers.push(Marker {
                start: lines[i].start,
                body_start: lines[i + 2].end,
                line,
                kind,
            });
            i += 3;
        } else {
            markers.push(Marker {
                start: lines[i].start,
                body_start: lines[i + 1].end,
                line,
                kind: MarkerKind::Malformed(ParseError::UnclosedHeader {
                    line: line + 1,
                    name,
                }),
            });
            i += 2;
        }
    }
    markers
}

fn parse_preamble(
    text: &str,
    lines: &[Line<'_>],
    preamble_end: usize,
    has_blocks: bool,
    parsed: &mut ParsedSession,
) {
    let preamble = &text[..preamble_end];
    if preamble.trim().is_empty() {
        return;
    }

    let header = match lines {
        [open, header, close, ..]
            if open.text == STARTUP_RULE && close.text == STARTUP_RULE && close.end <= preamble_end =>
        {
            STARTUP_HEADER
                .captures(header.text)
                .map(|caps| (caps.get(1).map_or("", |m| m.as_str()).to_string(), close.end))
        }
        _ => None,
    };
    let Some((name, body_start)) = header else {
        parsed.issues.push(ParseError::MissingStartupHeader { line: 1 });
        return;
    };
    if name.is_empty() {
        parsed.issues.push(ParseError::EmptyName { line: 2 });
        return;
    }

    let mut body = strip_newline(&text[body_start..preamble_end]);
    if has_blocks {
        // Blank separator line before the first block.
        body = strip_newline(body);
    }
    parsed.startup = Some(SessionSection {
        name,
        content: body.to_string(),
        line: 1,
    });
}

fn strip_newline(s: &str) -> &str {
    s.strip_suffix('\n').unwrap_or(s)
}
