//! Markdown to Slack mrkdwn converter.
//!
//! Slack uses its own markup format called `mrkdwn`:
//! - Bold: `*text*`
//! - Italic: `_text_`
//! - Strikethrough: `~text~`
//! - Code: `` `text` `` (unchanged from markdown)
//! - Link: `<url|text>`
//!
//! See <https://api.slack.com/reference/surfaces/formatting>.
//!
//! The conversion applies a fixed, order-dependent list of regex rewrites to
//! each line, skipping the interior of fenced code blocks. `***bold
//! italic***` spans are bracketed with fixed sentinel characters up front so
//! the single- and double-asterisk rules cannot partially match inside them,
//! and the italic rule runs as an explicit scan that rejects matches
//! adjacent to another `*` (the regex engine has no lookaround). Ordered
//! lists, inline code, and blockquote markers already read the same way in
//! mrkdwn and are left untouched.

use std::panic::{self, AssertUnwindSafe};

use regex::{Captures, Regex};

use crate::MarkdownConverter;
use crate::placeholder::{TRIPLE_END, TRIPLE_START};

/// Converts CommonMark-like markdown to Slack mrkdwn.
pub struct SlackConverter {
    fence_delimiter: Regex,
    triple_emphasis: Regex,
    triple_restore: Regex,
    task_unchecked: Regex,
    task_checked: Regex,
    unordered_item: Regex,
    image: Regex,
    italic: Regex,
    heading: Regex,
    tilde_bold: Regex,
    bold_star: Regex,
    bold_under: Regex,
    link: Regex,
    horizontal_rule: Regex,
    strikethrough: Regex,
}

/// Ten box-drawing characters standing in for a horizontal rule.
const HORIZONTAL_LINE: &str =
    "\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

impl SlackConverter {
    pub fn new() -> Self {
        Self {
            fence_delimiter: re(r"^```(\w*)$"),
            triple_emphasis: re(r"\*\*\*([^*\n]+?)\*\*\*"),
            triple_restore: re(&format!("{TRIPLE_START}(.*?){TRIPLE_END}")),
            task_unchecked: re(r"^(\s*)- \[ \] (.+)"),
            task_checked: re(r"^(\s*)- \[[xX]\] (.+)"),
            unordered_item: re(r"^(\s*)- (.+)"),
            image: re(r"!\[.*?\]\((.+?)\)"),
            italic: re(r"\*([^*\n]+?)\*"),
            heading: re(r"^#{1,6} (.+)$"),
            tilde_bold: re(r"(^|\s)~\*\*(.+?)\*\*(\s|$)"),
            bold_star: re(r"\*\*(.+?)\*\*"),
            bold_under: re(r"__(.+?)__"),
            link: re(r"\[(.+?)\]\((.+?)\)"),
            horizontal_rule: re(r"^(?:---|\*\*\*|___)$"),
            strikethrough: re(r"~~(.+?)~~"),
        }
    }

    fn convert_document(&self, markdown: &str) -> String {
        let mut in_code_block = false;
        let mut lines: Vec<String> = Vec::new();

        for line in markdown.trim().split('\n') {
            if let Some(caps) = self.fence_delimiter.captures(line) {
                in_code_block = !in_code_block;
                let language = &caps[1];
                if language.is_empty() {
                    lines.push("```".to_string());
                } else {
                    lines.push(format!("```{language}"));
                }
                continue;
            }
            if in_code_block {
                lines.push(line.to_string());
                continue;
            }
            lines.push(self.convert_line(line));
        }

        lines.join("\n")
    }

    /// Apply the ordered ruleset to one line outside any code block.
    fn convert_line(&self, line: &str) -> String {
        // Shield ***bold italic*** behind fixed sentinels before anything
        // else runs.
        let sentinel = format!("{TRIPLE_START}$1{TRIPLE_END}");
        let mut result = self
            .triple_emphasis
            .replace_all(line, sentinel.as_str())
            .into_owned();

        result = self.task_unchecked.replace_all(&result, "$1\u{2022} \u{2610} $2").into_owned();
        result = self.task_checked.replace_all(&result, "$1\u{2022} \u{2611} $2").into_owned();
        result = self.unordered_item.replace_all(&result, "$1\u{2022} $2").into_owned();
        result = self.image.replace_all(&result, "<$1>").into_owned();
        result = self.apply_italic(&result);
        result = self.heading.replace_all(&result, "*$1*").into_owned();
        result = self
            .tilde_bold
            .replace_all(&result, |caps: &Captures| {
                format!("{} *{}* {}", &caps[1], &caps[2], &caps[3])
            })
            .into_owned();
        result = self.bold_star.replace_all(&result, "*$1*").into_owned();
        result = self.bold_under.replace_all(&result, "*$1*").into_owned();
        result = self.link.replace_all(&result, "<$2|$1>").into_owned();
        result = self.horizontal_rule.replace_all(&result, HORIZONTAL_LINE).into_owned();
        result = self.strikethrough.replace_all(&result, "~$1~").into_owned();

        // `${1}` rather than `$1`: the replacement parser would otherwise
        // read `$1_` as a (nonexistent) group named `1_`.
        let result = self.triple_restore.replace_all(&result, "*_${1}_*").into_owned();
        result.trim_end().to_string()
    }

    /// Single-asterisk italic, skipping candidates that touch another `*`.
    ///
    /// A match preceded or followed by `*` belongs to a bold span; rejected
    /// candidates resume the scan one character later so an overlapping
    /// later span (the `*italic*` inside `**bold with *italic* text**`) can
    /// still match.
    fn apply_italic(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut emitted = 0;
        let mut search = 0;

        while let Some(caps) = self.italic.captures_at(text, search) {
            let m = caps.get(0).expect("group 0 always present");
            let preceded = text[..m.start()].ends_with('*');
            let followed = text[m.end()..].starts_with('*');
            if preceded || followed {
                search = m.start() + 1;
                continue;
            }
            out.push_str(&text[emitted..m.start()]);
            out.push('_');
            out.push_str(&caps[1]);
            out.push('_');
            emitted = m.end();
            search = m.end();
        }

        out.push_str(&text[emitted..]);
        out
    }
}

impl Default for SlackConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter for SlackConverter {
    fn convert(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }
        match panic::catch_unwind(AssertUnwindSafe(|| self.convert_document(markdown))) {
            Ok(converted) => converted,
            Err(_) => {
                // Fail soft: the caller gets the original text, never a
                // partially converted document.
                tracing::error!("slack conversion panicked; returning input unchanged");
                markdown.to_string()
            }
        }
    }
}
