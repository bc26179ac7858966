//! Locale-dependent data used while formatting.

use std::fmt;

use chrono::NaiveDateTime;
use intl_pluralrules::{
    PluralCategory,
    PluralRuleType,
    PluralRules,
};
use unic_langid::LanguageIdentifier;

/// Plural rules, number separators and date patterns for one locale.
///
/// Locales that do not parse, or have no plural data, use the `other`
/// category for everything and English separators.
pub struct LocaleData {
    /// Identifier as given.
    locale: String,
    /// Language subtag; empty when unparsable.
    language: String,
    /// Cardinal plural rules.
    cardinal: Option<PluralRules>,
    /// Ordinal plural rules.
    ordinal: Option<PluralRules>,
    /// Decimal separator.
    decimal_separator: char,
    /// Digit group separator.
    group_separator: char,
}

impl fmt::Debug for LocaleData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleData")
            .field("locale", &self.locale)
            .field("has_plural_rules", &self.cardinal.is_some())
            .field("decimal_separator", &self.decimal_separator)
            .field("group_separator", &self.group_separator)
            .finish_non_exhaustive()
    }
}

/// `(decimal, group)` separators by language, then by `language-REGION`.
fn separators(language: &str, region: Option<&str>) -> (char, char) {
    match (language, region) {
        ("de", Some("CH" | "LI")) => ('.', '\u{2019}'),
        ("de" | "es" | "it" | "nl" | "pt" | "id" | "tr" | "da" | "el", _) => (',', '.'),
        ("fr" | "nb" | "no" | "sv" | "fi" | "cs" | "pl" | "ru" | "uk" | "sk", _) => {
            (',', '\u{202f}')
        }
        _ => ('.', ','),
    }
}

/// CLDR category name.
const fn category_name(category: PluralCategory) -> &'static str {
    match category {
        PluralCategory::ZERO => "zero",
        PluralCategory::ONE => "one",
        PluralCategory::TWO => "two",
        PluralCategory::FEW => "few",
        PluralCategory::MANY => "many",
        PluralCategory::OTHER => "other",
    }
}

/// Date styles accepted by `:date`, `:time` and `:datetime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// `3/7/24`
    Short,
    /// `Mar 7, 2024`
    #[default]
    Medium,
    /// `March 7, 2024`
    Long,
}

impl DateStyle {
    /// Parses a `style` option value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" | "full" => Some(Self::Long),
            _ => None,
        }
    }
}

impl LocaleData {
    /// Locale data for `locale`.
    #[must_use]
    pub fn new(locale: &str) -> Self {
        let langid = locale.parse::<LanguageIdentifier>().ok();
        let rules = |rule_type| {
            let langid = langid.clone()?;
            PluralRules::create(langid, rule_type).ok()
        };
        let cardinal = rules(PluralRuleType::CARDINAL);
        let ordinal = rules(PluralRuleType::ORDINAL);
        if cardinal.is_none() {
            tracing::debug!(locale, "No plural rules for locale, using 'other'");
        }

        let language = langid.as_ref().map(|id| id.language.as_str().to_string()).unwrap_or_default();
        let region = langid.as_ref().and_then(|id| id.region.map(|region| region.as_str().to_string()));
        let (decimal_separator, group_separator) = separators(&language, region.as_deref());

        Self {
            locale: locale.to_string(),
            language,
            cardinal,
            ordinal,
            decimal_separator,
            group_separator,
        }
    }

    /// Identifier as given.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Plural category of a plain decimal number string such as `"1"` or `"1.50"`.
    ///
    /// Visible fraction digits matter: `"1"` is `one` in English, `"1.0"` is `other`.
    #[must_use]
    pub fn plural_category(&self, number: &str, ordinal: bool) -> &'static str {
        let rules = if ordinal { self.ordinal.as_ref() } else { self.cardinal.as_ref() };
        rules.and_then(|rules| rules.select(number).ok()).map_or("other", category_name)
    }

    /// Inserts locale separators into a plain number string (`-1234.5` → `-1,234.5`).
    #[must_use]
    pub fn localize_number(&self, plain: &str, grouping: bool) -> String {
        let (sign, digits) = plain.strip_prefix('-').map_or(("", plain), |rest| ("-", rest));
        let split = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
        let (integer, rest) = digits.split_at(split);

        let mut out = String::with_capacity(plain.len() + integer.len() / 3);
        out.push_str(sign);
        let len = integer.chars().count();
        for (index, digit) in integer.chars().enumerate() {
            if grouping && index > 0 && (len - index).is_multiple_of(3) {
                out.push(self.group_separator);
            }
            out.push(digit);
        }
        match rest.strip_prefix('.') {
            Some(fraction) => {
                out.push(self.decimal_separator);
                out.push_str(fraction);
            }
            None => out.push_str(rest),
        }
        out
    }

    /// Uses English month names.
    fn english(&self) -> bool {
        self.language == "en" || self.language.is_empty() || self.language == "und"
    }

    /// Month before day.
    fn us_order(&self) -> bool {
        self.locale == "en-US"
            || self.locale == "en"
            || self.language.is_empty()
            || self.language == "und"
    }

    /// Date in `style`.
    #[must_use]
    pub fn format_date(&self, value: &NaiveDateTime, style: DateStyle) -> String {
        let pattern = match style {
            DateStyle::Short if self.us_order() => "%-m/%-d/%y",
            DateStyle::Medium if self.us_order() => "%b %-d, %Y",
            DateStyle::Long if self.us_order() => "%B %-d, %Y",
            DateStyle::Medium if self.english() => "%-d %b %Y",
            DateStyle::Long if self.english() => "%-d %B %Y",
            DateStyle::Short => match self.language.as_str() {
                "de" | "fi" | "nb" | "pl" | "ru" | "cs" | "tr" => "%d.%m.%y",
                "ja" | "zh" | "ko" => "%Y/%m/%d",
                "en" => "%d/%m/%Y",
                _ => "%d/%m/%y",
            },
            DateStyle::Medium | DateStyle::Long => match self.language.as_str() {
                "de" | "fi" | "nb" | "pl" | "ru" | "cs" | "tr" => "%d.%m.%Y",
                "ja" | "zh" | "ko" | "sv" | "lt" => "%Y-%m-%d",
                _ => "%d/%m/%Y",
            },
        };
        value.format(pattern).to_string()
    }

    /// Time of day in `style`.
    #[must_use]
    pub fn format_time(&self, value: &NaiveDateTime, style: DateStyle) -> String {
        let pattern = match (style, self.us_order()) {
            (DateStyle::Short, true) => "%-I:%M %p",
            (_, true) => "%-I:%M:%S %p",
            (DateStyle::Short, false) => "%H:%M",
            (_, false) => "%H:%M:%S",
        };
        value.format(pattern).to_string()
    }
}
