//! Intermediate representations shared by extraction, the key store and the runtime.

pub mod key_usage;
pub mod meta;
pub mod translation;

pub use key_usage::{
    ExtractedKey,
    Occurrence,
};
pub use meta::{
    MetaField,
    TranslationMeta,
    VariableMeta,
};
pub use translation::RawTranslations;
