//! Argument values passed to compiled messages.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{
    NaiveDate,
    NaiveDateTime,
};

/// A runtime value bound to a message variable.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageValue {
    /// Text.
    String(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Number(f64),
    /// Local date and time.
    DateTime(NaiveDateTime),
}

impl MessageValue {
    /// Numeric view, parsing strings.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Number(value) => Some(*value),
            Self::String(text) => text.trim().parse().ok(),
            Self::DateTime(_) => None,
        }
    }

    /// Date view, parsing ISO 8601 strings (`2024-05-01` or `2024-05-01T09:30:00`).
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(value) => Some(*value),
            Self::String(text) => {
                let text = text.trim();
                text.parse::<NaiveDateTime>()
                    .ok()
                    .or_else(|| chrono::DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_local()))
                    .or_else(|| text.parse::<NaiveDate>().ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
            }
            Self::Integer(_) | Self::Number(_) => None,
        }
    }
}

impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<&str> for MessageValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MessageValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

macro_rules! integer_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for MessageValue {
            fn from(value: $ty) -> Self {
                Self::Integer(i64::from(value))
            }
        })*
    };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for MessageValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Number(value as f64), Self::Integer)
    }
}

impl From<f64> for MessageValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDateTime> for MessageValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveDate> for MessageValue {
    fn from(value: NaiveDate) -> Self {
        Self::DateTime(value.and_time(chrono::NaiveTime::MIN))
    }
}

/// Named arguments for one formatting call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageArgs {
    /// Values by variable name.
    values: BTreeMap<String, MessageValue>,
}

impl MessageArgs {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MessageValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<MessageValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MessageValue> {
        self.values.get(name)
    }

    /// True without arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arguments in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for MessageArgs
where
    K: Into<String>,
    V: Into<MessageValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (name, value) in iter {
            args.set(name, value);
        }
        args
    }
}
