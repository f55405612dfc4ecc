// src/processors/markdown.rs
//! Markdown macro: passes authored Markdown through, normalized.
//!
//! BLOCK mode (the default) tidies the body without changing meaning;
//! INLINE mode flattens it to a single-line-safe form. Both modes treat
//! code as untouchable: fenced blocks and inline spans are located by a
//! nested scan and their interiors pass through verbatim, except for the
//! explicitly requested blank-line stripping inside fences.

use super::MacroProcessor;
use crate::config::ConversionConfig;
use crate::constants::{INDENT_SPACES, INLINE_BULLET, MAX_BLANK_RUN};
use crate::engine::{MacroEngine, ProcessingContext};
use crate::error::MacroError;
use crate::model::MacroNode;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.*)$").expect("invalid heading regex");
    static ref LIST_ITEM: Regex =
        Regex::new(r"^( *)([-*+]|\d{1,3}\.)( +)(.*)$").expect("invalid list regex");
    static ref LINK_SPACING: Regex =
        Regex::new(r"(!?\[[^\]]*\])\s*\(\s*([^()\s]+)\s*\)").expect("invalid link regex");
}

/// Output mode of the markdown macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Block,
    Inline,
}

impl OutputMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "block" => Some(Self::Block),
            "inline" => Some(Self::Inline),
            _ => None,
        }
    }
}

/// Processor for `markdown` macros.
#[derive(Debug, Default)]
pub struct MarkdownMacroProcessor {
    default_mode: OutputMode,
}

impl MarkdownMacroProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Honor a `{"markdown": {"default-mode": "inline"}}` processor setting.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let default_mode = config
            .processor_settings
            .get("markdown")
            .and_then(|v| v.get("default-mode"))
            .and_then(|v| v.as_str())
            .and_then(OutputMode::parse)
            .unwrap_or_default();
        Self { default_mode }
    }

    fn mode_for(&self, node: &MacroNode) -> OutputMode {
        node.parameter_text("atlassian-macro-output-type")
            .or_else(|| node.parameter_text("output"))
            .and_then(|raw| OutputMode::parse(&raw))
            .unwrap_or(self.default_mode)
    }
}

#[async_trait]
impl MacroProcessor for MarkdownMacroProcessor {
    fn macro_type(&self) -> &str {
        "markdown"
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn process(
        &self,
        node: &MacroNode,
        _ctx: &ProcessingContext,
        _engine: &MacroEngine,
    ) -> Result<String, MacroError> {
        let body = node
            .cdata_content
            .clone()
            .unwrap_or_else(|| node.body.clone());

        Ok(match self.mode_for(node) {
            OutputMode::Block => normalize_block(&body),
            OutputMode::Inline => flatten_inline(&body),
        })
    }
}

// ---------------------------------------------------------------------------
// Fence-aware segmentation
// ---------------------------------------------------------------------------

enum Segment {
    Text(Vec<String>),
    Fence(Vec<String>),
}

/// Split a body into text and fenced-code segments, line-wise.
///
/// A fence segment includes its opening and closing marker lines. An
/// unterminated fence runs to the end of the body.
fn split_fences(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current_text: Vec<String> = Vec::new();
    let mut current_fence: Option<(Vec<String>, &'static str)> = None;

    for line in input.split('\n') {
        match current_fence.as_mut() {
            Some((fence_lines, marker)) => {
                fence_lines.push(line.to_string());
                if line.trim_start().starts_with(*marker) {
                    let (fence_lines, _) = current_fence.take().expect("fence in progress");
                    segments.push(Segment::Fence(fence_lines));
                }
            }
            None => {
                let trimmed = line.trim_start();
                let marker = if trimmed.starts_with("```") {
                    Some("```")
                } else if trimmed.starts_with("~~~") {
                    Some("~~~")
                } else {
                    None
                };
                if let Some(marker) = marker {
                    if !current_text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut current_text)));
                    }
                    current_fence = Some((vec![line.to_string()], marker));
                } else {
                    current_text.push(line.to_string());
                }
            }
        }
    }

    if let Some((fence_lines, _)) = current_fence {
        segments.push(Segment::Fence(fence_lines));
    }
    if !current_text.is_empty() {
        segments.push(Segment::Text(current_text));
    }
    segments
}

// ---------------------------------------------------------------------------
// BLOCK mode
// ---------------------------------------------------------------------------

/// Normalization pass for BLOCK-mode bodies.
pub fn normalize_block(body: &str) -> String {
    let unified = body
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', &" ".repeat(INDENT_SPACES));

    let mut out_lines: Vec<String> = Vec::new();
    for segment in split_fences(&unified) {
        match segment {
            Segment::Fence(lines) => out_lines.extend(strip_fence_blanks(lines)),
            Segment::Text(lines) => {
                let cleaned: Vec<String> = lines
                    .iter()
                    .map(|line| collapse_link_spacing(&realign_list_indent(line)))
                    .collect();
                out_lines.extend(collapse_blank_runs(cleaned));
            }
        }
    }
    out_lines.join("\n")
}

/// Round list indentation to the nearest 2-space multiple per level.
fn realign_list_indent(line: &str) -> String {
    let Some(caps) = LIST_ITEM.captures(line) else {
        return line.to_string();
    };
    let width = caps[1].len();
    let level = width / INDENT_SPACES;
    format!(
        "{}{} {}",
        " ".repeat(level * INDENT_SPACES),
        &caps[2],
        &caps[4]
    )
}

/// Collapse `[text] ( url )` spacing; only single-token targets are
/// touched so prose like `[1] (see below)` survives.
fn collapse_link_spacing(line: &str) -> String {
    LINK_SPACING.replace_all(line, "$1($2)").into_owned()
}

/// Collapse runs of 3+ blank lines to exactly 2.
fn collapse_blank_runs(lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut blanks = 0;
    for line in lines {
        if line.trim().is_empty() {
            blanks += 1;
            continue;
        }
        let emitted = if blanks >= MAX_BLANK_RUN { 2 } else { blanks };
        for _ in 0..emitted {
            out.push(String::new());
        }
        blanks = 0;
        out.push(line);
    }
    let emitted = if blanks >= MAX_BLANK_RUN { 2 } else { blanks };
    for _ in 0..emitted {
        out.push(String::new());
    }
    out
}

/// Strip redundant blank lines inside a fenced block: none adjacent to
/// the fence markers, and runs between code lines collapse to one.
fn strip_fence_blanks(lines: Vec<String>) -> Vec<String> {
    if lines.len() <= 2 {
        return lines;
    }
    let last = lines.len() - 1;
    let mut out = Vec::with_capacity(lines.len());
    out.push(lines[0].clone());

    let mut pending_blank = false;
    let mut has_content = false;
    for line in &lines[1..last] {
        if line.trim().is_empty() {
            pending_blank = true;
            continue;
        }
        if pending_blank && has_content {
            out.push(String::new());
        }
        pending_blank = false;
        has_content = true;
        out.push(line.clone());
    }
    out.push(lines[last].clone());
    out
}

// ---------------------------------------------------------------------------
// INLINE mode
// ---------------------------------------------------------------------------

/// Flattening pass for INLINE-mode bodies.
pub fn flatten_inline(body: &str) -> String {
    let unified = body.replace("\r\n", "\n").replace('\r', "\n");

    let mut pieces: Vec<String> = Vec::new();
    for segment in split_fences(&unified) {
        match segment {
            // Fenced code keeps its internal newlines verbatim.
            Segment::Fence(lines) => pieces.push(lines.join("\n")),
            Segment::Text(lines) => {
                let transformed: Vec<String> =
                    lines.iter().map(|line| flatten_line(line)).collect();
                let collapsed = collapse_newlines_outside_spans(&transformed.join("\n"));
                if !collapsed.is_empty() {
                    pieces.push(collapsed);
                }
            }
        }
    }
    pieces.join(" ")
}

/// Headings become bold inline emphasis; list markers become bullets.
fn flatten_line(line: &str) -> String {
    if let Some(caps) = HEADING.captures(line) {
        return format!("**{}**", caps[2].trim_end());
    }
    if let Some(caps) = LIST_ITEM.captures(line) {
        return format!("{}{}", INLINE_BULLET, &caps[4]);
    }
    line.to_string()
}

/// Collapse newline-bearing whitespace runs to single spaces, skipping
/// inline code spans (whose newlines are preserved verbatim).
fn collapse_newlines_outside_spans(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '`' {
            let run_start = i;
            while i < chars.len() && chars[i] == '`' {
                i += 1;
            }
            let run_len = i - run_start;
            match find_closing_run(&chars, i, run_len) {
                Some(close) => {
                    // Copy the whole span, delimiters included, verbatim.
                    out.extend(&chars[run_start..close + run_len]);
                    i = close + run_len;
                }
                None => out.extend(&chars[run_start..i]),
            }
        } else if c.is_whitespace() {
            let ws_start = i;
            let mut has_newline = false;
            while i < chars.len() && chars[i].is_whitespace() {
                if chars[i] == '\n' {
                    has_newline = true;
                }
                i += 1;
            }
            if has_newline {
                out.push(' ');
            } else {
                out.extend(&chars[ws_start..i]);
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out.trim().to_string()
}

/// Index of the next backtick run of exactly `len` backticks.
fn find_closing_run(chars: &[char], from: usize, len: usize) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == '`' {
            let start = i;
            while i < chars.len() && chars[i] == '`' {
                i += 1;
            }
            if i - start == len {
                return Some(start);
            }
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_mode_passes_simple_bodies_through() {
        assert_eq!(normalize_block("# Title\n\nBody"), "# Title\n\nBody");
    }

    #[test]
    fn inline_mode_flattens_headings_and_newlines() {
        assert_eq!(flatten_inline("# Title\n\nBody"), "**Title** Body");
    }

    #[test]
    fn block_mode_unifies_line_endings_and_tabs() {
        assert_eq!(normalize_block("a\r\n\tb"), "a\n  b");
    }

    #[test]
    fn block_mode_rounds_list_indentation() {
        let input = " - one\n   - two\n      - three";
        assert_eq!(normalize_block(input), "- one\n  - two\n      - three");
    }

    #[test]
    fn block_mode_collapses_link_spacing() {
        assert_eq!(
            normalize_block("See [docs] ( https://example.com ) now"),
            "See [docs](https://example.com) now"
        );
        assert_eq!(
            normalize_block("![alt] (img.png)"),
            "![alt](img.png)"
        );
        // Prose parentheses keep their spacing.
        assert_eq!(
            normalize_block("[1] (see below)"),
            "[1] (see below)"
        );
    }

    #[test]
    fn block_mode_collapses_blank_runs_to_two() {
        assert_eq!(normalize_block("a\n\n\n\n\nb"), "a\n\n\nb");
        // One or two blank lines survive untouched.
        assert_eq!(normalize_block("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn block_mode_strips_fence_blanks() {
        let input = "```rust\n\nlet a = 1;\n\n\nlet b = 2;\n\n```";
        assert_eq!(
            normalize_block(input),
            "```rust\nlet a = 1;\n\nlet b = 2;\n```"
        );
    }

    #[test]
    fn fenced_newlines_survive_inline_mode() {
        let input = "before\n```\nline1\nline2\n```\nafter";
        assert_eq!(flatten_inline(input), "before ```\nline1\nline2\n``` after");
    }

    #[test]
    fn inline_spans_keep_their_content() {
        let input = "use `a\nb` here";
        assert_eq!(flatten_inline(input), "use `a\nb` here");
    }

    #[test]
    fn inline_mode_rewrites_list_markers() {
        assert_eq!(
            flatten_inline("- one\n- two"),
            "\u{2022} one \u{2022} two"
        );
    }
}
