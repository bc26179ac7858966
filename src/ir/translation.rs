//! Runtime translation data.

use std::collections::HashMap;

/// Key → message template for one locale, as supplied by an external source.
pub type RawTranslations = HashMap<String, String>;
