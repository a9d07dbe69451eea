//! Name-keyed routing over the registered converters.

use std::collections::HashMap;

use crate::MarkdownConverter;
use crate::dialect::Dialect;
use crate::jira::JiraConverter;
use crate::slack::SlackConverter;

/// Routes content to the converter registered under a dialect name.
///
/// Lookup is by string key so callers with external configuration ("jira",
/// "slack", or something they registered themselves) need no enum mapping;
/// a name with no converter behind it leaves the content as-is.
pub struct DialectDispatcher {
    converters: HashMap<String, Box<dyn MarkdownConverter>>,
}

impl DialectDispatcher {
    /// Dispatcher preloaded with the built-in JIRA and Slack converters.
    pub fn new() -> Self {
        let mut converters: HashMap<String, Box<dyn MarkdownConverter>> = HashMap::new();
        converters.insert(Dialect::Jira.as_str().into(), Box::new(JiraConverter::new()));
        converters.insert(Dialect::Slack.as_str().into(), Box::new(SlackConverter::new()));
        Self { converters }
    }

    /// Convert `content` using the converter registered under `dialect`,
    /// or return it unchanged when no converter carries that name.
    pub fn convert(&self, dialect: &str, content: &str) -> String {
        match self.converters.get(dialect) {
            Some(converter) => converter.convert(content),
            None => content.to_string(),
        }
    }

    /// [`convert`](Self::convert) for an already-parsed [`Dialect`].
    pub fn convert_to(&self, dialect: Dialect, content: &str) -> String {
        self.convert(dialect.as_str(), content)
    }

    /// Register (or replace) the converter behind a dialect name.
    pub fn register(&mut self, dialect: impl Into<String>, converter: Box<dyn MarkdownConverter>) {
        self.converters.insert(dialect.into(), converter);
    }

    /// Registered dialect names, sorted.
    pub fn dialects(&self) -> Vec<String> {
        let mut names: Vec<String> = self.converters.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for DialectDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_preloaded() {
        let dispatcher = DialectDispatcher::new();
        assert_eq!(dispatcher.dialects(), vec!["jira".to_string(), "slack".to_string()]);
    }

    #[test]
    fn routes_by_name_to_each_builtin() {
        let dispatcher = DialectDispatcher::new();
        assert_eq!(dispatcher.convert("jira", "# Title"), "h1. Title");
        assert_eq!(dispatcher.convert("slack", "# Title"), "*Title*");
    }

    #[test]
    fn convert_to_takes_a_dialect() {
        let dispatcher = DialectDispatcher::new();
        assert_eq!(dispatcher.convert_to(Dialect::Jira, "**b**"), "*b*");
        assert_eq!(dispatcher.convert_to(Dialect::Slack, "**b**"), "*b*");
    }

    #[test]
    fn unregistered_name_leaves_content_alone() {
        let dispatcher = DialectDispatcher::new();
        let input = "# Hello **world**";
        assert_eq!(dispatcher.convert("asciidoc", input), input);
        assert_eq!(dispatcher.convert("asciidoc", ""), "");
    }

    #[test]
    fn registered_converter_takes_over_its_name() {
        struct ShoutingConverter;
        impl MarkdownConverter for ShoutingConverter {
            fn convert(&self, markdown: &str) -> String {
                markdown.to_uppercase()
            }
        }

        let mut dispatcher = DialectDispatcher::new();
        dispatcher.register("shout", Box::new(ShoutingConverter));
        assert_eq!(dispatcher.convert("shout", "hello"), "HELLO");
        // Built-ins can be replaced under the same key.
        dispatcher.register("jira", Box::new(ShoutingConverter));
        assert_eq!(dispatcher.convert("jira", "# title"), "# TITLE");
    }

    #[test]
    fn default_matches_new() {
        assert_eq!(DialectDispatcher::new().dialects(), DialectDispatcher::default().dialects());
    }
}
