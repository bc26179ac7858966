//! Formats a parsed message against arguments and locale data.

use std::collections::{
    BTreeMap,
    HashMap,
};

use thiserror::Error;

use super::ast::{
    Body,
    Declaration,
    Expression,
    MarkupKind,
    Message,
    Operand,
    Pattern,
    PatternPart,
    Variant,
    VariantKey,
};
use super::locale::{
    DateStyle,
    LocaleData,
};
use super::value::{
    MessageArgs,
    MessageValue,
};

/// One piece of formatted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    /// Literal text.
    Text(String),
    /// A formatted placeholder, or its `{$name}` source form when formatting failed.
    Value(String),
    /// Opening markup tag.
    MarkupOpen {
        /// Tag name.
        name: String,
        /// Resolved options.
        options: BTreeMap<String, String>,
    },
    /// Closing markup tag.
    MarkupClose {
        /// Tag name.
        name: String,
    },
    /// Self-closing markup tag.
    MarkupStandalone {
        /// Tag name.
        name: String,
        /// Resolved options.
        options: BTreeMap<String, String>,
    },
}

impl MessagePart {
    /// Text contributed to plain string output; markup contributes nothing.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Value(text) => text,
            Self::MarkupOpen { .. } | Self::MarkupClose { .. } | Self::MarkupStandalone { .. } => "",
        }
    }
}

/// Why a single placeholder could not be formatted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
enum FormatError {
    /// Variable not passed.
    #[error("no value")]
    MissingValue,
    /// Function not supported.
    #[error("unknown function ':{0}'")]
    UnknownFunction(String),
    /// Numeric function on a non-numeric value.
    #[error("value is not a number")]
    NotANumber,
    /// Date function on a value that is not a date.
    #[error("value is not a date")]
    NotADate,
    /// Required option absent.
    #[error("option '{0}' is required")]
    MissingOption(&'static str),
    /// Option value out of range or unknown.
    #[error("invalid value '{value}' for option '{name}'")]
    InvalidOption {
        /// Option name.
        name: String,
        /// Rejected value.
        value: String,
    },
}

/// Function annotation with option values resolved.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedFunction {
    /// Function name.
    name: String,
    /// Option name → resolved value.
    options: BTreeMap<String, String>,
}

impl ResolvedFunction {
    /// Value of option `name`.
    fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Fraction digit count of option `name`, at most 20.
    fn digits_option(&self, name: &str) -> Result<Option<usize>, FormatError> {
        self.option(name)
            .map(|value| {
                value.parse::<usize>().ok().filter(|digits| *digits <= 20).ok_or_else(|| {
                    FormatError::InvalidOption { name: name.to_string(), value: value.to_string() }
                })
            })
            .transpose()
    }

    /// `:number` or `:integer`.
    fn is_numeric(&self) -> bool {
        matches!(self.name.as_str(), "number" | "integer")
    }
}

/// An expression or declaration after resolution.
#[derive(Debug, Clone, PartialEq)]
struct Resolved {
    /// Bound value, if any.
    value: Option<MessageValue>,
    /// Annotation applied to the value.
    function: Option<ResolvedFunction>,
    /// Source form shown when formatting fails.
    fallback: String,
}

/// Minimum and maximum fraction digits.
#[derive(Debug, Clone, Copy)]
struct Digits {
    /// Minimum fraction digits.
    min: usize,
    /// Maximum fraction digits.
    max: usize,
}

impl Digits {
    /// `:number` without options.
    const DEFAULT: Self = Self { min: 0, max: 3 };
    /// `:integer`
    const INTEGER: Self = Self { min: 0, max: 0 };
}

/// Magnitude from which numbers are written in exponent form.
const EXPONENT_THRESHOLD: f64 = 1e21;

/// Fixed-point decimal string with `.` separator and no grouping.
///
/// Magnitudes of at least 1e21 use exponent form (`1.5e+300`).
fn plain_number(value: f64, digits: Digits) -> String {
    let max = digits.max.max(digits.min);
    if value.is_finite() && value.abs() >= EXPONENT_THRESHOLD {
        let formatted = format!("{value:.max$e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        let mantissa = trim_fraction(mantissa.to_string(), digits.min);
        let exponent = exponent.strip_prefix('-').map_or_else(|| format!("+{exponent}"), |e| format!("-{e}"));
        return format!("{mantissa}e{exponent}");
    }

    let text = trim_fraction(format!("{value:.max$}"), digits.min);
    if text.starts_with('-') && text.trim_start_matches(['-', '0', '.']).is_empty() {
        return text.trim_start_matches('-').to_string();
    }
    text
}

/// Drops trailing fraction zeros beyond `min` digits, and a bare `.`.
fn trim_fraction(mut text: String, min: usize) -> String {
    if let Some(dot) = text.find('.') {
        let keep = dot + 1 + min;
        while text.len() > keep && text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

/// Symbol for well-known currencies.
fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("\u{20ac}"),
        "GBP" => Some("\u{a3}"),
        "JPY" => Some("\u{a5}"),
        _ => None,
    }
}

/// Minor unit digits of a currency.
fn currency_digits(code: &str) -> usize {
    match code {
        "JPY" | "KRW" | "ISK" | "CLP" | "VND" => 0,
        _ => 2,
    }
}

/// Short label for a unit identifier.
fn unit_label(unit: &str) -> &str {
    match unit {
        "kilometer" => "km",
        "meter" => "m",
        "centimeter" => "cm",
        "kilogram" => "kg",
        "gram" => "g",
        "liter" => "L",
        "celsius" => "\u{b0}C",
        "fahrenheit" => "\u{b0}F",
        "second" => "s",
        "minute" => "min",
        "hour" => "h",
        "byte" => "B",
        "kilobyte" => "kB",
        "megabyte" => "MB",
        "gigabyte" => "GB",
        other => other,
    }
}

/// Per-call formatting state: locale, arguments and resolved declarations.
#[derive(Debug)]
pub(super) struct Formatter<'a> {
    /// Locale data for plurals and separators.
    locale: &'a LocaleData,
    /// Arguments of this call.
    args: &'a MessageArgs,
    /// Resolved declarations by variable name.
    locals: HashMap<String, Resolved>,
}

impl<'a> Formatter<'a> {
    /// Formatter for one call.
    pub(super) fn new(locale: &'a LocaleData, args: &'a MessageArgs) -> Self {
        Self { locale, args, locals: HashMap::new() }
    }

    /// Resolves declarations, selects a variant and formats it.
    pub(super) fn format_to_parts(mut self, message: &Message) -> Vec<MessagePart> {
        for declaration in &message.declarations {
            let (name, resolved) = match declaration {
                Declaration::Input { name, expression } => {
                    let argument = Resolved {
                        value: self.args.get(name).cloned(),
                        function: None,
                        fallback: format!("{{${name}}}"),
                    };
                    (name, self.annotate(argument, expression))
                }
                Declaration::Local { name, expression } => (name, self.resolve(expression)),
            };
            self.locals.insert(name.clone(), resolved);
        }

        match &message.body {
            Body::Pattern(pattern) => self.format_pattern(pattern),
            Body::Match { selectors, variants } => {
                let resolved: Vec<Resolved> = selectors.iter().map(|s| self.resolve(s)).collect();
                self.select(&resolved, variants)
                    .map(|variant| self.format_pattern(&variant.pattern))
                    .unwrap_or_default()
            }
        }
    }

    /// Declared local or argument `name`.
    fn lookup(&self, name: &str) -> Resolved {
        self.locals.get(name).cloned().unwrap_or_else(|| Resolved {
            value: self.args.get(name).cloned(),
            function: None,
            fallback: format!("{{${name}}}"),
        })
    }

    /// Option operand as text; `None` for unbound variables.
    fn option_value(&self, operand: &Operand) -> Option<String> {
        match operand {
            Operand::Literal(value) => Some(value.clone()),
            Operand::Variable(name) => {
                let resolved = self.lookup(name);
                self.format_value(&resolved).ok()
            }
        }
    }

    /// Applies an expression's function to an already resolved operand.
    ///
    /// Calling the same function again keeps earlier options unless overridden.
    fn annotate(&self, mut base: Resolved, expression: &Expression) -> Resolved {
        let Some(function) = &expression.function else {
            return base;
        };
        let mut options = match base.function.take() {
            Some(previous) if previous.name == function.name => previous.options,
            _ => BTreeMap::new(),
        };
        for (name, operand) in &function.options {
            match self.option_value(operand) {
                Some(value) => {
                    options.insert(name.clone(), value);
                }
                None => tracing::debug!(option = %name, "Ignoring option without a value"),
            }
        }
        base.function = Some(ResolvedFunction { name: function.name.clone(), options });
        base
    }

    /// Resolves operand and annotation of `expression`.
    fn resolve(&self, expression: &Expression) -> Resolved {
        let base = match &expression.operand {
            Some(Operand::Variable(name)) => {
                let mut resolved = self.lookup(name);
                resolved.fallback = expression.fallback_text();
                resolved
            }
            Some(Operand::Literal(value)) => Resolved {
                value: Some(MessageValue::String(value.clone())),
                function: None,
                fallback: expression.fallback_text(),
            },
            None => Resolved { value: None, function: None, fallback: expression.fallback_text() },
        };
        self.annotate(base, expression)
    }

    /// Formats every part of `pattern`.
    fn format_pattern(&self, pattern: &Pattern) -> Vec<MessagePart> {
        pattern
            .iter()
            .map(|part| match part {
                PatternPart::Text(text) => MessagePart::Text(text.clone()),
                PatternPart::Expression(expression) => {
                    let resolved = self.resolve(expression);
                    match self.format_value(&resolved) {
                        Ok(text) => MessagePart::Value(text),
                        Err(error) => {
                            tracing::debug!(
                                placeholder = %resolved.fallback,
                                locale = self.locale.locale(),
                                "Formatting failed: {error}"
                            );
                            MessagePart::Value(resolved.fallback)
                        }
                    }
                }
                PatternPart::Markup(markup) => {
                    let options = markup
                        .options
                        .iter()
                        .filter_map(|(name, operand)| {
                            self.option_value(operand).map(|value| (name.clone(), value))
                        })
                        .collect();
                    let name = markup.name.clone();
                    match markup.kind {
                        MarkupKind::Open => MessagePart::MarkupOpen { name, options },
                        MarkupKind::Close => MessagePart::MarkupClose { name },
                        MarkupKind::Standalone => MessagePart::MarkupStandalone { name, options },
                    }
                }
            })
            .collect()
    }

    /// Formats a resolved value with its function.
    fn format_value(&self, resolved: &Resolved) -> Result<String, FormatError> {
        let value = resolved.value.as_ref().ok_or(FormatError::MissingValue)?;
        let Some(function) = &resolved.function else {
            return Ok(match value {
                MessageValue::String(text) => text.clone(),
                MessageValue::Integer(_) | MessageValue::Number(_) => {
                    let number = value.as_number().ok_or(FormatError::NotANumber)?;
                    self.locale.localize_number(&plain_number(number, Digits::DEFAULT), true)
                }
                MessageValue::DateTime(datetime) => {
                    self.locale.format_date(datetime, DateStyle::Medium)
                }
            });
        };

        match function.name.as_str() {
            "string" => Ok(value.to_string()),
            "number" | "integer" => self.format_number(value, function),
            "currency" => self.format_currency(value, function),
            "unit" => {
                let unit = function.option("unit").ok_or(FormatError::MissingOption("unit"))?;
                let number = self.format_number(value, function)?;
                Ok(format!("{number} {}", unit_label(unit)))
            }
            "date" | "time" | "datetime" => self.format_datetime(value, function),
            other => Err(FormatError::UnknownFunction(other.to_string())),
        }
    }

    /// Fraction digits for a numeric function.
    fn number_digits(function: &ResolvedFunction) -> Result<Digits, FormatError> {
        let base = if function.name == "integer" { Digits::INTEGER } else { Digits::DEFAULT };
        let min = function.digits_option("minimumFractionDigits")?.unwrap_or(base.min);
        let max = function.digits_option("maximumFractionDigits")?.unwrap_or(base.max.max(min));
        Ok(Digits { min, max })
    }

    /// Value as a number.
    fn numeric(value: &MessageValue) -> Result<f64, FormatError> {
        value.as_number().filter(|n| n.is_finite()).ok_or(FormatError::NotANumber)
    }

    /// False with `useGrouping=false`.
    fn grouping(function: &ResolvedFunction) -> bool {
        !matches!(function.option("useGrouping"), Some("false" | "never"))
    }

    /// `:number` and `:integer`.
    fn format_number(
        &self,
        value: &MessageValue,
        function: &ResolvedFunction,
    ) -> Result<String, FormatError> {
        let mut number = Self::numeric(value)?;
        let digits = Self::number_digits(function)?;
        let percent = function.option("style") == Some("percent");
        if percent {
            number *= 100.0;
        }
        let text = self.locale.localize_number(&plain_number(number, digits), Self::grouping(function));
        Ok(if percent { format!("{text}%") } else { text })
    }

    /// `:currency`
    fn format_currency(
        &self,
        value: &MessageValue,
        function: &ResolvedFunction,
    ) -> Result<String, FormatError> {
        let code = function.option("currency").ok_or(FormatError::MissingOption("currency"))?;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(FormatError::InvalidOption {
                name: "currency".to_string(),
                value: code.to_string(),
            });
        }
        let number = Self::numeric(value)?;
        let default_digits = currency_digits(code);
        let min = function.digits_option("minimumFractionDigits")?.unwrap_or(default_digits);
        let max = function.digits_option("maximumFractionDigits")?.unwrap_or(default_digits.max(min));
        let plain = plain_number(number.abs(), Digits { min, max });
        let amount = self.locale.localize_number(&plain, Self::grouping(function));
        let sign =
            if number < 0.0 && !plain.trim_start_matches(['0', '.']).is_empty() { "-" } else { "" };
        Ok(match currency_symbol(code) {
            Some(symbol) => format!("{sign}{symbol}{amount}"),
            None => format!("{sign}{code}\u{a0}{amount}"),
        })
    }

    /// `:date`, `:time` and `:datetime`.
    fn format_datetime(
        &self,
        value: &MessageValue,
        function: &ResolvedFunction,
    ) -> Result<String, FormatError> {
        let datetime = value.as_datetime().ok_or(FormatError::NotADate)?;
        let style = |names: &[&str]| -> Result<DateStyle, FormatError> {
            names.iter().find_map(|name| function.option(name).map(|v| (*name, v))).map_or(
                Ok(DateStyle::default()),
                |(name, value)| {
                    DateStyle::parse(value).ok_or_else(|| FormatError::InvalidOption {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                },
            )
        };
        Ok(match function.name.as_str() {
            "date" => self.locale.format_date(&datetime, style(&["style", "dateStyle"])?),
            "time" => self.locale.format_time(&datetime, style(&["style", "timeStyle"])?),
            _ => {
                let date = self.locale.format_date(&datetime, style(&["dateStyle", "style"])?);
                let time = self.locale.format_time(&datetime, style(&["timeStyle"])?);
                format!("{date} {time}")
            }
        })
    }

    /// How well `key` matches a selector: 0 exact, 1 plural category.
    fn match_rank(&self, selector: &Resolved, key: &str) -> Option<u8> {
        let value = selector.value.as_ref()?;
        let numeric = selector.function.as_ref().map_or_else(
            || matches!(value, MessageValue::Integer(_) | MessageValue::Number(_)),
            ResolvedFunction::is_numeric,
        );
        if !numeric {
            return (value.to_string() == key).then_some(0);
        }

        let default_function =
            ResolvedFunction { name: "number".to_string(), options: BTreeMap::new() };
        let function = selector.function.as_ref().unwrap_or(&default_function);
        let number = Self::numeric(value).ok()?;
        let plain = plain_number(number, Self::number_digits(function).ok()?);
        if plain == key {
            return Some(0);
        }
        let ordinal = match function.option("select") {
            Some("exact") => return None,
            Some("ordinal") => true,
            _ => false,
        };
        let category = self.locale.plural_category(plain.trim_start_matches('-'), ordinal);
        (category == key).then_some(1)
    }

    /// Best variant: exact beats category beats `*`, per selector in order;
    /// the first of equally good variants wins.
    fn select<'v>(&self, selectors: &[Resolved], variants: &'v [Variant]) -> Option<&'v Variant> {
        variants
            .iter()
            .filter_map(|variant| {
                let ranks = selectors
                    .iter()
                    .zip(&variant.keys)
                    .map(|(selector, key)| match key {
                        VariantKey::CatchAll => Some(2),
                        VariantKey::Literal(literal) => self.match_rank(selector, literal),
                    })
                    .collect::<Option<Vec<u8>>>()?;
                Some((ranks, variant))
            })
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, variant)| variant)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::message::parser::parse;

    fn format(locale: &str, template: &str, args: &MessageArgs) -> String {
        let message = parse(template).unwrap();
        let data = LocaleData::new(locale);
        Formatter::new(&data, args)
            .format_to_parts(&message)
            .iter()
            .map(MessagePart::as_text)
            .collect()
    }

    #[rstest]
    #[case::integer(3.0, Digits::DEFAULT, "3")]
    #[case::trimmed(2.5, Digits::DEFAULT, "2.5")]
    #[case::rounded(1.23456, Digits::DEFAULT, "1.235")]
    #[case::min_digits(2.0, Digits { min: 2, max: 2 }, "2.00")]
    #[case::integer_style(2.7, Digits::INTEGER, "3")]
    #[case::negative_zero(-0.0001, Digits::DEFAULT, "0")]
    #[case::huge(1e300, Digits::DEFAULT, "1e+300")]
    #[case::huge_with_fraction(-1.5e21, Digits::DEFAULT, "-1.5e+21")]
    #[case::below_threshold(1e20, Digits::INTEGER, "100000000000000000000")]
    fn test_plain_number(#[case] value: f64, #[case] digits: Digits, #[case] expected: &str) {
        assert_that!(plain_number(value, digits), eq(expected));
    }

    #[rstest]
    #[case::string("Hi {$name}!", "Hi Sam!")]
    #[case::missing_variable("Hi {$nobody}!", "Hi {$nobody}!")]
    #[case::literal("{|quoted text|} and {unquoted}", "quoted text and unquoted")]
    #[case::default_number("{$big}", "1,234,567.891")]
    #[case::number_options("{$price :number minimumFractionDigits=2}", "9.50")]
    #[case::no_grouping("{$big :integer useGrouping=false}", "1234568")]
    #[case::percent("{$ratio :number style=percent}", "25%")]
    #[case::integer("{$price :integer}", "10")]
    #[case::currency("{$price :currency currency=USD}", "$9.50")]
    #[case::currency_code("{$price :currency currency=CHF}", "CHF\u{a0}9.50")]
    #[case::currency_yen("{$big :currency currency=JPY}", "\u{a5}1,234,568")]
    #[case::unit("{$distance :unit unit=kilometer}", "12 km")]
    #[case::date("{$when :date style=long}", "March 7, 2024")]
    #[case::time("{$when :time style=short}", "2:05 PM")]
    #[case::datetime("{$when :datetime dateStyle=short timeStyle=short}", "3/7/24 2:05 PM")]
    #[case::string_function("{$count :string}", "1")]
    #[case::unknown_function("{$name :shout}", "{$name}")]
    #[case::not_a_number("{$name :number}", "{$name}")]
    #[case::missing_currency("{$price :currency}", "{$price}")]
    #[case::literal_fallback("{|abc| :number}", "{|abc|}")]
    #[case::markup_is_silent("Read {#link}Terms{/link}", "Read Terms")]
    #[case::huge_number("{$huge :number}", "1e+300")]
    fn test_format(#[case] template: &str, #[case] expected: &str) {
        let args = MessageArgs::new()
            .with("name", "Sam")
            .with("big", 1_234_567.891)
            .with("price", 9.5)
            .with("ratio", 0.25)
            .with("distance", 12)
            .with("count", 1)
            .with("huge", 1e300)
            .with("when", "2024-03-07T14:05:09");

        assert_that!(format("en", template, &args), eq(expected));
    }

    #[rstest]
    fn locale_separators_apply() {
        let args = MessageArgs::new().with("n", 1234.5);

        assert_that!(format("de", "{$n :number minimumFractionDigits=2}", &args), eq("1.234,50"));
    }

    #[rstest]
    fn declarations_carry_annotations() {
        let template = ".input {$n :number minimumFractionDigits=1}\n.local $m = {$n :number maximumFractionDigits=1}\n{{{$n} / {$m}}}";
        let args = MessageArgs::new().with("n", 2);

        assert_that!(format("en", template, &args), eq("2.0 / 2.0"));
    }

    const ITEMS: &str = ".input {$count :number}\n.match $count\n0 {{No items}}\none {{One item}}\n* {{{$count} items}}";

    #[rstest]
    #[case::exact_zero(0, "No items")]
    #[case::category_one(1, "One item")]
    #[case::catch_all(5, "5 items")]
    fn plural_selection(#[case] count: i64, #[case] expected: &str) {
        let args = MessageArgs::new().with("count", count);

        assert_that!(format("en", ITEMS, &args), eq(expected));
    }

    #[rstest]
    fn exact_beats_category() {
        let template = ".input {$n :number}\n.match $n\none {{category}}\n1 {{exact}}\n* {{other}}";
        let args = MessageArgs::new().with("n", 1);

        assert_that!(format("en", template, &args), eq("exact"));
    }

    #[rstest]
    fn missing_selector_value_uses_catch_all() {
        assert_that!(format("en", ITEMS, &MessageArgs::new()), eq("{$count} items"));
    }

    #[rstest]
    fn polish_plural_categories() {
        let template = ".input {$n :number}\n.match $n\none {{plik}}\nfew {{pliki}}\nmany {{plików}}\n* {{pliku}}";

        assert_that!(format("pl", template, &MessageArgs::new().with("n", 3)), eq("pliki"));
        assert_that!(format("pl", template, &MessageArgs::new().with("n", 5)), eq("plików"));
    }

    #[rstest]
    fn ordinal_selection() {
        let template = ".input {$n :number select=ordinal}\n.match $n\none {{{$n}st}}\ntwo {{{$n}nd}}\nfew {{{$n}rd}}\n* {{{$n}th}}";

        assert_that!(format("en", template, &MessageArgs::new().with("n", 22)), eq("22nd"));
        assert_that!(format("en", template, &MessageArgs::new().with("n", 11)), eq("11th"));
    }

    #[rstest]
    fn string_selection_with_two_selectors() {
        let template = ".input {$g :string}\n.input {$n :number}\n.match $g $n\nfemale one {{her item}}\nfemale * {{her items}}\n* one {{their item}}\n* * {{their items}}";

        let args = MessageArgs::new().with("g", "female").with("n", 1);
        assert_that!(format("en", template, &args), eq("her item"));
        let args = MessageArgs::new().with("g", "other").with("n", 4);
        assert_that!(format("en", template, &args), eq("their items"));
    }

    #[rstest]
    fn markup_parts_keep_resolved_options() {
        let message = parse("{#link href=$url}Go{/link}{#br/}").unwrap();
        let data = LocaleData::new("en");
        let args = MessageArgs::new().with("url", "/home");

        let parts = Formatter::new(&data, &args).format_to_parts(&message);

        assert_that!(
            parts,
            elements_are![
                eq(&MessagePart::MarkupOpen {
                    name: "link".to_string(),
                    options: BTreeMap::from([("href".to_string(), "/home".to_string())]),
                }),
                eq(&MessagePart::Text("Go".to_string())),
                eq(&MessagePart::MarkupClose { name: "link".to_string() }),
                eq(&MessagePart::MarkupStandalone { name: "br".to_string(), options: BTreeMap::new() })
            ]
        );
    }
}
