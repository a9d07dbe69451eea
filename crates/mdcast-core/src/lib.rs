//! # mdcast-core
//!
//! Markdown dialect converters: pure text-to-text transformers that rewrite
//! CommonMark-like markdown into other plain-text markup dialects.
//!
//! - **[`jira`]** -- [`JiraConverter`], markdown to JIRA wiki markup
//! - **[`slack`]** -- [`SlackConverter`], markdown to Slack `mrkdwn`
//! - **[`dialect`]** -- [`Dialect`] identifiers with string parsing
//! - **[`dispatch`]** -- [`DialectDispatcher`] routing content by dialect name
//!
//! The converters are deliberately not markdown parsers. Each one is a
//! layered pipeline of order-sensitive regex rewrites: structural blocks
//! first (code fences, quotes, tables), then a line-oriented pass that skips
//! the interior of code regions, then inline formatting shielded by
//! placeholder tokens so a broad pattern never re-matches text an earlier
//! rule already produced. This trades full CommonMark compliance for
//! predictable behavior on the markdown people actually paste into tickets
//! and chat messages.
//!
//! Conversion is stateless and infallible at the public boundary: a
//! converter either succeeds or returns its input unchanged.

pub mod dialect;
pub mod dispatch;
pub mod jira;
mod placeholder;
pub mod slack;

pub use dialect::{Dialect, UnknownDialect};
pub use dispatch::DialectDispatcher;
pub use jira::JiraConverter;
pub use slack::SlackConverter;

/// Trait for converting CommonMark-like input into a target markup dialect.
///
/// Implementations must be pure: no I/O, no shared mutable state, and no
/// panics escaping [`convert`](MarkdownConverter::convert). A converter that
/// cannot produce sensible output for some input returns the input unchanged
/// rather than failing.
pub trait MarkdownConverter: Send + Sync {
    /// Convert the given markdown string into the target dialect.
    fn convert(&self, markdown: &str) -> String;
}
