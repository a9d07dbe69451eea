//! Placeholder protection for overlapping inline rewrites.
//!
//! Inline formatting is applied as an ordered list of regex substitutions,
//! and a later, broader pattern (italic) must never re-match markup an
//! earlier rule already produced (bold markers). Each completed match is
//! therefore swapped for a synthetic token, recorded in a table, and written
//! back once every rule has run.
//!
//! Tokens are built from Unicode private-use-area characters, an alphabet
//! that does not occur in normal text, so they cannot collide with document
//! content and contain none of the `*`/`_`/`~` characters the inline rules
//! match on.

/// Opening bracket of a placeholder token.
const TOKEN_OPEN: char = '\u{e000}';
/// Closing bracket of a placeholder token.
const TOKEN_CLOSE: char = '\u{e001}';

/// Fixed sentinel marking the start of a protected `***bold italic***` span.
pub(crate) const TRIPLE_START: &str = "\u{e002}";
/// Fixed sentinel marking the end of a protected `***bold italic***` span.
pub(crate) const TRIPLE_END: &str = "\u{e003}";

/// Transient token-to-replacement table scoped to one conversion pass.
#[derive(Debug, Default)]
pub(crate) struct PlaceholderTable {
    entries: Vec<(String, String)>,
}

impl PlaceholderTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `replacement` and return the token standing in for it.
    pub(crate) fn insert(&mut self, replacement: String) -> String {
        let token = format!("{TOKEN_OPEN}{}{TOKEN_CLOSE}", self.entries.len());
        self.entries.push((token.clone(), replacement));
        token
    }

    /// Write every recorded replacement back into `text`.
    ///
    /// Runs in reverse insertion order: a later entry may embed an earlier
    /// entry's token (a bold span wrapping already-protected inline code),
    /// so later tokens must expand first for the nested ones to resolve.
    pub(crate) fn restore(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (token, replacement) in self.entries.iter().rev() {
            result = result.replace(token, replacement);
        }
        result
    }
}
