//! Compiles message templates once per `(locale, template)` and reuses them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::ast::Message;
use super::format::{
    Formatter,
    MessagePart,
};
use super::locale::LocaleData;
use super::parser::parse;
use super::value::MessageArgs;

/// A template ready to format.
///
/// Templates that fail to parse compile to a raw message that echoes the
/// template text unchanged.
#[derive(Debug)]
pub struct CompiledMessage {
    /// Source text.
    template: String,
    /// Locale data for plurals and number formatting.
    locale: Arc<LocaleData>,
    /// `None` when the template failed to parse.
    message: Option<Message>,
}

impl CompiledMessage {
    /// Parses `template`; a parse error leaves the raw text.
    fn new(locale: Arc<LocaleData>, template: &str) -> Self {
        let message = match parse(template) {
            Ok(message) => Some(message),
            Err(error) => {
                tracing::debug!(
                    locale = locale.locale(),
                    template,
                    "Template does not parse, echoing raw text: {error}"
                );
                None
            }
        };
        Self { template: template.to_string(), locale, message }
    }

    /// Source text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Locale the message was compiled for.
    #[must_use]
    pub fn locale(&self) -> &str {
        self.locale.locale()
    }

    /// True when the template failed to parse.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.message.is_none()
    }

    /// Formats to a plain string; markup contributes nothing.
    #[must_use]
    pub fn format(&self, args: &MessageArgs) -> String {
        match &self.message {
            Some(message) => Formatter::new(&self.locale, args)
                .format_to_parts(message)
                .iter()
                .map(MessagePart::as_text)
                .collect(),
            None => self.template.clone(),
        }
    }

    /// Rich output keeping markup as separate parts.
    #[must_use]
    pub fn format_to_parts(&self, args: &MessageArgs) -> Vec<MessagePart> {
        match &self.message {
            Some(message) => Formatter::new(&self.locale, args).format_to_parts(message),
            None => vec![MessagePart::Text(self.template.clone())],
        }
    }
}

/// Memoizes compiled templates and locale data.
#[derive(Debug, Default)]
pub struct MessageCompiler {
    /// Locale data by identifier.
    locales: Mutex<HashMap<String, Arc<LocaleData>>>,
    /// Locale → template → compiled message.
    cache: Mutex<HashMap<String, HashMap<String, Arc<CompiledMessage>>>>,
}

impl MessageCompiler {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached locale data for `locale`.
    fn locale_data(&self, locale: &str) -> Arc<LocaleData> {
        let mut locales = self.locales.lock();
        if let Some(data) = locales.get(locale) {
            return Arc::clone(data);
        }
        let data = Arc::new(LocaleData::new(locale));
        locales.insert(locale.to_string(), Arc::clone(&data));
        data
    }

    /// Identical template text under the same locale compiles once.
    #[must_use]
    pub fn compile(&self, locale: &str, template: &str) -> Arc<CompiledMessage> {
        let cached = self.cache.lock().get(locale).and_then(|templates| templates.get(template)).cloned();
        if let Some(compiled) = cached {
            return compiled;
        }

        let data = self.locale_data(locale);
        let compiled = Arc::new(CompiledMessage::new(data, template));
        // Another caller may have compiled it while the lock was released; keep theirs.
        Arc::clone(
            self.cache
                .lock()
                .entry(locale.to_string())
                .or_default()
                .entry(template.to_string())
                .or_insert(compiled),
        )
    }

    /// Number of cached templates across all locales.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().values().map(HashMap::len).sum()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached template.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

/// Compiles without caching.
#[must_use]
pub fn compile(locale: &str, template: &str) -> CompiledMessage {
    CompiledMessage::new(Arc::new(LocaleData::new(locale)), template)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn same_template_compiles_once() {
        let compiler = MessageCompiler::new();

        let first = compiler.compile("en", "Hi {$name}");
        let second = compiler.compile("en", "Hi {$name}");
        let other_locale = compiler.compile("de", "Hi {$name}");

        assert_that!(Arc::ptr_eq(&first, &second), eq(true));
        assert_that!(Arc::ptr_eq(&first, &other_locale), eq(false));
        assert_that!(compiler.len(), eq(2));

        compiler.clear();
        assert_that!(compiler.is_empty(), eq(true));
    }

    #[rstest]
    #[case::unclosed_placeholder("Hi {$name")]
    #[case::match_without_catch_all(".input {$n :number}\n.match $n\none {{x}}")]
    #[case::stray_brace("a } b")]
    fn parse_errors_echo_the_template(#[case] template: &str) {
        let compiled = compile("en", template);
        let args = MessageArgs::new().with("name", "Sam").with("n", 1);

        assert_that!(compiled.is_raw(), eq(true));
        assert_that!(compiled.format(&args), eq(template));
        assert_that!(
            compiled.format_to_parts(&args),
            elements_are![eq(&MessagePart::Text(template.to_string()))]
        );
    }

    #[rstest]
    fn formats_plurals_per_locale() {
        let compiler = MessageCompiler::new();
        let template = ".input {$n :number}\n.match $n\none {{{$n} Datei}}\n* {{{$n} Dateien}}";
        let compiled = compiler.compile("de", template);

        assert_that!(compiled.is_raw(), eq(false));
        assert_that!(compiled.locale(), eq("de"));
        assert_that!(compiled.format(&MessageArgs::new().with("n", 1)), eq("1 Datei"));
        assert_that!(compiled.format(&MessageArgs::new().with("n", 1200)), eq("1.200 Dateien"));
    }

    #[rstest]
    fn literal_braces_via_escapes() {
        let compiled = compile("en", r"Use \{braces\} for {$what}");

        assert_that!(compiled.format(&MessageArgs::new().with("what", "placeholders")), eq("Use {braces} for placeholders"));
    }
}
