//! Target dialect identifiers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A markup dialect the library can convert markdown into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// JIRA wiki markup (`h1.`, `{code}`, `[text|url]`, ...).
    Jira,
    /// Slack `mrkdwn` (`*bold*`, `_italic_`, `<url|text>`, ...).
    Slack,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 2] = [Dialect::Jira, Dialect::Slack];

    /// Canonical lowercase name, matching what [`FromStr`] accepts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Jira => "jira",
            Dialect::Slack => "slack",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized dialect name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown dialect `{name}` (expected one of: jira, slack)")]
pub struct UnknownDialect {
    /// The name that failed to parse.
    pub name: String,
}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jira" => Ok(Dialect::Jira),
            "slack" | "mrkdwn" => Ok(Dialect::Slack),
            _ => Err(UnknownDialect { name: s.to_string() }),
        }
    }
}
