//! Message templates: parsing, locale data, formatting and the compile cache.

pub mod ast;
pub mod compiler;
pub mod format;
pub mod locale;
pub mod parser;
pub mod value;

pub use compiler::{
    CompiledMessage,
    MessageCompiler,
    compile,
};
pub use format::MessagePart;
pub use locale::{
    DateStyle,
    LocaleData,
};
pub use parser::{
    ParseError,
    ParseErrorKind,
    parse,
};
pub use value::{
    MessageArgs,
    MessageValue,
};
