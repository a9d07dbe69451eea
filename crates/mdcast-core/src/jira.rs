//! Markdown to JIRA wiki markup converter.
//!
//! JIRA's wiki renderer uses its own markup:
//! - Headings: `h1.` .. `h6.`
//! - Bold: `*text*`, italic: `_text_`, monospace: `{{text}}`
//! - Code block: `{code:lang} ... {code}`
//! - Quote block: `{quote} ... {quote}`
//! - Link: `[text|url]`, image: `!url!`
//!
//! See <https://jira.atlassian.com/secure/WikiRendererHelpAction.jspa?section=all>.
//!
//! The conversion runs as a layered pipeline over the whole document:
//! multiline blocks first (setext headers, code fences, indented code,
//! blockquotes, tables, horizontal rules), then a line-oriented pass that
//! skips the interior of already-emitted `{code}`/`{noformat}` regions, and
//! finally inline formatting where every completed match is parked in a
//! [`PlaceholderTable`] so broader patterns cannot re-match earlier output.

use std::panic::{self, AssertUnwindSafe};

use regex::{Captures, Regex};

use crate::MarkdownConverter;
use crate::placeholder::PlaceholderTable;

/// Converts CommonMark-like markdown to JIRA wiki markup.
pub struct JiraConverter {
    setext_h1: Regex,
    setext_h2: Regex,
    fence_backtick: Regex,
    fence_tilde: Regex,
    quote_run: Regex,
    quote_marker: Regex,
    table: Regex,
    horizontal_rule: Regex,
    atx_header: Regex,
    ordered_item: Regex,
    unordered_item: Regex,
    task_item: Regex,
    list_marker: Regex,
    inline: InlineRules,
}

/// Inline rules, listed in application order. Broad patterns (italic) come
/// after the narrower ones (bold-italic, bold) they would otherwise corrupt.
struct InlineRules {
    code: Regex,
    bold_italic_star: Regex,
    bold_italic_under: Regex,
    bold_star: Regex,
    bold_under: Regex,
    italic_star: Regex,
    italic_under: Regex,
    strikethrough: Regex,
    image: Regex,
    link: Regex,
}

/// Tracks whether the cursor is inside an emitted `{code}`/`{noformat}`
/// region while walking lines.
///
/// A bare `{code}` or `{noformat}` line both opens an untagged block and
/// closes an open one, so it toggles; a tagged opener (`{code:rust}`) always
/// enters the region.
#[derive(Debug, Default)]
struct FenceTracker {
    inside: bool,
}

impl FenceTracker {
    /// Feed one line. Returns `true` when the line is a fence delimiter.
    fn observe(&mut self, line: &str) -> bool {
        if line == "{code}" || line == "{noformat}" {
            self.inside = !self.inside;
            true
        } else if line.starts_with("{code") || line.starts_with("{noformat") {
            self.inside = true;
            true
        } else {
            false
        }
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

impl JiraConverter {
    pub fn new() -> Self {
        Self {
            setext_h1: re(r"(?m)^(.+)\n=+[ \t]*$"),
            setext_h2: re(r"(?m)^(.+)\n-+[ \t]*$"),
            fence_backtick: re(r"(?s)```(\w+)?\n(.*?)```"),
            fence_tilde: re(r"(?s)~~~(\w+)?\n(.*?)~~~"),
            quote_run: re(r"(?m)(?:^>.*\n?)+"),
            quote_marker: re(r"(?m)^>[ \t]?"),
            table: re(r"(?m)^\|(.+)\|[ \t]*\n\|[-:\s|]+\|[ \t]*\n((?:\|.+\|[ \t]*\n?)*)"),
            horizontal_rule: re(r"(?m)^[-_*]{3,}[ \t]*$"),
            atx_header: re(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$"),
            ordered_item: re(r"^(\s*)\d+\.\s+(.+)$"),
            unordered_item: re(r"^(\s*)[-*+]\s+(.+)$"),
            task_item: re(r"^\[([xX ])\]\s+(.+)$"),
            list_marker: re(r"^\s*(?:[-*+]|\d+\.)\s"),
            inline: InlineRules {
                code: re(r"`([^`]+)`"),
                bold_italic_star: re(r"\*\*\*(.+?)\*\*\*"),
                bold_italic_under: re(r"___(.+?)___"),
                bold_star: re(r"\*\*(.+?)\*\*"),
                bold_under: re(r"__(.+?)__"),
                italic_star: re(r"\*(.+?)\*"),
                italic_under: re(r"\b_([^_\s][^_]*?)_\b"),
                strikethrough: re(r"~~(.+?)~~"),
                image: re(r"!\[([^\]]*)\]\(([^)]+)\)"),
                link: re(r"\[([^\]]+)\]\(([^)]+)\)"),
            },
        }
    }

    fn convert_document(&self, markdown: &str) -> String {
        let content = self.convert_blocks(markdown);

        let mut tracker = FenceTracker::default();
        let mut lines: Vec<String> = Vec::new();
        for line in content.split('\n') {
            let was_inside = tracker.inside;
            if tracker.observe(line) || was_inside {
                lines.push(line.to_string());
            } else {
                lines.push(self.convert_line(line));
            }
        }
        lines.join("\n")
    }

    /// Multiline block pass. Each step rewrites the full document produced
    /// by the previous one; the order is part of the observable contract
    /// (setext detection runs before fence detection, so an underline inside
    /// a fence is claimed by the header rule first).
    fn convert_blocks(&self, markdown: &str) -> String {
        let mut content = self.setext_h1.replace_all(markdown, "h1. $1").into_owned();
        content = self.setext_h2.replace_all(&content, "h2. $1").into_owned();

        let render_fence = |caps: &Captures| {
            let body = caps[2].strip_suffix('\n').unwrap_or(&caps[2]);
            match caps.get(1) {
                Some(lang) => format!("{{code:{}}}\n{}\n{{code}}", lang.as_str(), body),
                None => format!("{{code}}\n{}\n{{code}}", body),
            }
        };
        content = self.fence_backtick.replace_all(&content, render_fence).into_owned();
        content = self.fence_tilde.replace_all(&content, render_fence).into_owned();

        content = self.collect_indented_code(&content);

        content = self
            .quote_run
            .replace_all(&content, |caps: &Captures| {
                let run = &caps[0];
                let body = self.quote_marker.replace_all(run, "");
                let body = body.trim();
                if run.ends_with('\n') {
                    format!("{{quote}}\n{body}\n{{quote}}\n")
                } else {
                    format!("{{quote}}\n{body}\n{{quote}}")
                }
            })
            .into_owned();

        content = self
            .table
            .replace_all(&content, |caps: &Captures| {
                let headers: Vec<&str> = caps[1]
                    .split('|')
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .collect();
                let mut out = format!("||{}||", headers.join("||"));
                for row in caps[2].trim().split('\n') {
                    let cells: Vec<&str> = row
                        .split('|')
                        .map(str::trim)
                        .filter(|cell| !cell.is_empty())
                        .collect();
                    if cells.is_empty() {
                        continue;
                    }
                    out.push('\n');
                    out.push('|');
                    out.push_str(&cells.join("|"));
                    out.push('|');
                }
                out
            })
            .into_owned();

        content = self.horizontal_rule.replace_all(&content, "----").into_owned();
        content
    }

    /// Buffer contiguous runs of 4-space/tab indented lines and flush them as
    /// `{code}` blocks, leaving indented list items and the interior of
    /// already-emitted fences alone.
    fn collect_indented_code(&self, content: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut buffer: Vec<String> = Vec::new();
        let mut tracker = FenceTracker::default();

        fn flush(out: &mut Vec<String>, buffer: &mut Vec<String>) {
            if buffer.is_empty() {
                return;
            }
            let body: Vec<&str> = buffer
                .iter()
                .map(|line| strip_code_indent(line).unwrap_or(line))
                .collect();
            out.push(format!("{{code}}\n{}\n{{code}}", body.join("\n")));
            buffer.clear();
        }

        for line in content.split('\n') {
            let was_inside = tracker.inside;
            if tracker.observe(line) {
                flush(&mut out, &mut buffer);
                out.push(line.to_string());
                continue;
            }
            if was_inside {
                out.push(line.to_string());
                continue;
            }
            match strip_code_indent(line) {
                Some(stripped) if !self.list_marker.is_match(stripped) => {
                    buffer.push(line.to_string());
                }
                _ => {
                    flush(&mut out, &mut buffer);
                    out.push(line.to_string());
                }
            }
        }
        flush(&mut out, &mut buffer);
        out.join("\n")
    }

    /// Line-level pass: headers, list items, then inline formatting over the
    /// text portion (or the whole line when it is neither).
    fn convert_line(&self, line: &str) -> String {
        if let Some(caps) = self.atx_header.captures(line) {
            let level = caps[1].len();
            return format!("h{level}. {}", self.convert_inline(&caps[2]));
        }

        if let Some(caps) = self.ordered_item.captures(line) {
            let level = nesting_level(&caps[1]);
            return format!("{} {}", "#".repeat(level), self.convert_inline(&caps[2]));
        }

        if let Some(caps) = self.unordered_item.captures(line) {
            let level = nesting_level(&caps[1]);
            let text = &caps[2];
            // Task items get a (/) / (x) marker; JIRA has no native task
            // list syntax.
            if let Some(task) = self.task_item.captures(text) {
                let marker = if task[1].eq_ignore_ascii_case("x") { "(/)" } else { "(x)" };
                return format!(
                    "{} {} {}",
                    "*".repeat(level),
                    marker,
                    self.convert_inline(&task[2])
                );
            }
            return format!("{} {}", "*".repeat(level), self.convert_inline(text));
        }

        self.convert_inline(line)
    }

    /// Inline pass. Every match is swapped for a placeholder token the
    /// moment it is produced, so the later broad patterns (plain italic)
    /// cannot re-match bold markers or link text that earlier rules already
    /// converted. Tokens are written back once all rules have run.
    fn convert_inline(&self, text: &str) -> String {
        let mut table = PlaceholderTable::new();
        let rules = &self.inline;

        let mut result = protect(&rules.code, text, &mut table, |c: &Captures| {
            format!("{{{{{}}}}}", &c[1])
        });
        result = protect(&rules.bold_italic_star, &result, &mut table, |c: &Captures| {
            format!("*_{}_*", &c[1])
        });
        result = protect(&rules.bold_italic_under, &result, &mut table, |c: &Captures| {
            format!("*_{}_*", &c[1])
        });
        result = protect(&rules.bold_star, &result, &mut table, |c: &Captures| {
            format!("*{}*", &c[1])
        });
        result = protect(&rules.bold_under, &result, &mut table, |c: &Captures| {
            format!("*{}*", &c[1])
        });
        result = protect(&rules.italic_star, &result, &mut table, |c: &Captures| {
            format!("_{}_", &c[1])
        });
        result = protect(&rules.italic_under, &result, &mut table, |c: &Captures| {
            format!("_{}_", &c[1])
        });
        result = protect(&rules.strikethrough, &result, &mut table, |c: &Captures| {
            format!("-{}-", &c[1])
        });
        result = protect(&rules.image, &result, &mut table, |c: &Captures| {
            format!("!{}!", &c[2])
        });
        result = protect(&rules.link, &result, &mut table, |c: &Captures| {
            format!("[{}|{}]", &c[1], &c[2])
        });

        table.restore(&result)
    }
}

impl Default for JiraConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter for JiraConverter {
    fn convert(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }
        match panic::catch_unwind(AssertUnwindSafe(|| self.convert_document(markdown))) {
            Ok(converted) => converted,
            Err(_) => {
                tracing::error!("jira conversion panicked; returning input unchanged");
                markdown.to_string()
            }
        }
    }
}

/// Replace each completed match with a placeholder token for `render`'s
/// output.
fn protect<F>(pattern: &Regex, text: &str, table: &mut PlaceholderTable, render: F) -> String
where
    F: Fn(&Captures) -> String,
{
    pattern
        .replace_all(text, |caps: &Captures| table.insert(render(caps)))
        .into_owned()
}

/// Strip one level of code indentation (four spaces or a tab).
fn strip_code_indent(line: &str) -> Option<&str> {
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

/// List nesting level from leading indentation width.
///
/// Buckets follow the reference fixtures: 0-2 spaces is level 1, 3-4 level 2,
/// 5-6 level 3, and so on in 2-space steps.
fn nesting_level(indent: &str) -> usize {
    let width = indent.len();
    if width <= 2 { 1 } else { (width - 1) / 2 + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(md: &str) -> String {
        JiraConverter::new().convert(md)
    }

    #[test]
    fn test_atx_headings() {
        assert_eq!(convert("# Heading 1"), "h1. Heading 1");
        assert_eq!(convert("## Heading 2"), "h2. Heading 2");
        assert_eq!(convert("### Heading 3"), "h3. Heading 3");
        assert_eq!(convert("###### Heading 6"), "h6. Heading 6");
    }

    #[test]
    fn test_atx_trailing_decoration_stripped() {
        assert_eq!(convert("## Title ##"), "h2. Title");
    }

    #[test]
    fn test_setext_headings() {
        assert_eq!(convert("Title\n==="), "h1. Title");
        assert_eq!(convert("Subtitle\n---"), "h2. Subtitle");
    }

    #[test]
    fn test_bold() {
        assert_eq!(convert("**bold**"), "*bold*");
        assert_eq!(convert("__bold__"), "*bold*");
        assert_eq!(convert("This is **bold** text"), "This is *bold* text");
    }

    #[test]
    fn test_italic() {
        assert_eq!(convert("*italic*"), "_italic_");
        assert_eq!(convert("_italic_"), "_italic_");
        assert_eq!(convert("This is *italic* text"), "This is _italic_ text");
    }

    #[test]
    fn test_bold_italic() {
        assert_eq!(convert("***both***"), "*_both_*");
        assert_eq!(convert("___both___"), "*_both_*");
    }

    #[test]
    fn test_bold_and_italic_in_one_line() {
        assert_eq!(convert("**bold** and *italic*"), "*bold* and _italic_");
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(convert("~~gone~~"), "-gone-");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(convert("`inline code`"), "{{inline code}}");
        assert_eq!(
            convert("2nd paragraph. *Italic*, **bold**, and `monospace`."),
            "2nd paragraph. _Italic_, *bold*, and {{monospace}}."
        );
    }

    #[test]
    fn test_links() {
        assert_eq!(
            convert("[Link](https://example.com)"),
            "[Link|https://example.com]"
        );
    }

    #[test]
    fn test_images() {
        assert_eq!(
            convert("![Alt text](https://example.com/image.png)"),
            "!https://example.com/image.png!"
        );
        assert_eq!(convert("![](https://example.com/logo.jpg)"), "!https://example.com/logo.jpg!");
    }

    #[test]
    fn test_unordered_lists() {
        assert_eq!(convert("- Item 1"), "* Item 1");
        assert_eq!(convert("* Item 2"), "* Item 2");
        assert_eq!(convert("+ Item 3"), "* Item 3");
        assert_eq!(convert("- Item 1\n- Item 2"), "* Item 1\n* Item 2");
    }

    #[test]
    fn test_nested_unordered_lists() {
        assert_eq!(
            convert("* Level 1\n    * Level 2\n      * Level 3"),
            "* Level 1\n** Level 2\n*** Level 3"
        );
        // A 2-space indent stays in the first bucket.
        assert_eq!(convert("  * Item 1\n  * Item 2"), "* Item 1\n* Item 2");
    }

    #[test]
    fn test_ordered_lists() {
        assert_eq!(convert("1. First item"), "# First item");
        assert_eq!(convert("2. Second item"), "# Second item");
        assert_eq!(convert("1. First\n2. Second"), "# First\n# Second");
        assert_eq!(
            convert("1. First\n    1. Nested\n      1. Deeper"),
            "# First\n## Nested\n### Deeper"
        );
    }

    #[test]
    fn test_task_lists() {
        assert_eq!(convert("- [x] Done"), "* (/) Done");
        assert_eq!(convert("- [X] Done"), "* (/) Done");
        assert_eq!(convert("- [ ] Pending"), "* (x) Pending");
    }

    #[test]
    fn test_fenced_code_with_language() {
        assert_eq!(
            convert("```js\nconst x=1;\n```"),
            "{code:js}\nconst x=1;\n{code}"
        );
    }

    #[test]
    fn test_fenced_code_without_language() {
        assert_eq!(convert("```\nsome code\n```"), "{code}\nsome code\n{code}");
    }

    #[test]
    fn test_tilde_fenced_code() {
        assert_eq!(
            convert("~~~python\nprint('hi')\n~~~"),
            "{code:python}\nprint('hi')\n{code}"
        );
    }

    #[test]
    fn test_code_block_content_is_not_reformatted() {
        let output = convert("```\n*foo* and **bar**\n```");
        assert_eq!(output, "{code}\n*foo* and **bar**\n{code}");
    }

    #[test]
    fn test_indented_code_block() {
        assert_eq!(
            convert("text\n    let x = 1;\n    let y = 2;\ndone"),
            "text\n{code}\nlet x = 1;\nlet y = 2;\n{code}\ndone"
        );
    }

    #[test]
    fn test_indented_list_item_is_not_code() {
        assert_eq!(convert("    * deep item"), "** deep item");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(convert("> This is a quote"), "{quote}\nThis is a quote\n{quote}");
    }

    #[test]
    fn test_blockquote_run_collapses() {
        assert_eq!(
            convert("> Line 1\n> Line 2"),
            "{quote}\nLine 1\nLine 2\n{quote}"
        );
    }

    #[test]
    fn test_separate_blockquote_runs() {
        let output = convert("> first\n\n> second");
        assert_eq!(output.matches("{quote}").count(), 4);
    }

    #[test]
    fn test_table() {
        assert_eq!(
            convert("| A | B |\n|---|---|\n| 1 | 2 |"),
            "||A||B||\n|1|2|"
        );
    }

    #[test]
    fn test_table_multiple_rows() {
        assert_eq!(
            convert("| Name | Age |\n|------|-----|\n| John | 25 |\n| Jane | 30 |"),
            "||Name||Age||\n|John|25|\n|Jane|30|"
        );
    }

    #[test]
    fn test_horizontal_rules() {
        assert_eq!(convert("---"), "----");
        assert_eq!(convert("***"), "----");
        assert_eq!(convert("___"), "----");
        assert_eq!(convert("-----"), "----");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(convert(""), "");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(convert("hello world"), "hello world");
    }

    #[test]
    fn test_heading_with_inline_formatting() {
        assert_eq!(convert("# A **bold** title"), "h1. A *bold* title");
    }

    #[test]
    fn test_list_item_with_inline_formatting() {
        assert_eq!(convert("- has `code` in it"), "* has {{code}} in it");
    }

    #[test]
    fn test_nested_bold_and_code_leaves_no_placeholder() {
        let output = convert("**bold `code`**");
        assert_eq!(output, "*bold {{code}}*");
        assert!(!output.contains('\u{e000}'));
        assert!(!output.contains("PLACEHOLDER"));
    }

    #[test]
    fn test_bold_wrapping_existing_italic() {
        assert_eq!(convert("**bold _and italic_**"), "*bold _and italic_*");
    }

    #[test]
    fn test_underscore_inside_word_is_left_alone() {
        assert_eq!(convert("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn test_unterminated_fence_degrades() {
        // No closing fence: the opener passes through as literal text.
        let output = convert("```js\nlet x = 1;");
        assert!(output.contains("let x = 1;"));
    }

    #[test]
    fn test_unbalanced_brackets_do_not_panic() {
        let output = convert("[broken](no-close and ![img](also");
        assert!(!output.is_empty());
    }

    #[test]
    fn test_nesting_level_buckets() {
        assert_eq!(nesting_level(""), 1);
        assert_eq!(nesting_level("  "), 1);
        assert_eq!(nesting_level("   "), 2);
        assert_eq!(nesting_level("    "), 2);
        assert_eq!(nesting_level("      "), 3);
    }

    #[test]
    fn test_fence_tracker_toggles_on_bare_code() {
        let mut tracker = FenceTracker::default();
        assert!(tracker.observe("{code}"));
        assert!(tracker.inside);
        assert!(!tracker.observe("let x = 1;"));
        assert!(tracker.observe("{code}"));
        assert!(!tracker.inside);
    }

    #[test]
    fn test_fence_tracker_tagged_opener() {
        let mut tracker = FenceTracker::default();
        assert!(tracker.observe("{code:rust}"));
        assert!(tracker.inside);
        assert!(tracker.observe("{code}"));
        assert!(!tracker.inside);
    }

    #[test]
    fn test_lists_after_code_block_are_still_converted() {
        let output = convert("```\ncode\n```\n\n- Item 1\n- Item 2");
        assert!(output.ends_with("* Item 1\n* Item 2"));
    }
}
