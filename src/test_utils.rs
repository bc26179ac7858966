//! Shared fixtures for unit tests.
#![cfg(test)]

use std::collections::{
    BTreeMap,
    BTreeSet,
};

use crate::chunks::Manifest;
use crate::ir::{
    ExtractedKey,
    Occurrence,
    TranslationMeta,
};

/// An occurrence whose metadata only carries a fallback.
pub(crate) fn occurrence(key: &str, fallback: &str, file: &str, line: u32) -> Occurrence {
    Occurrence::new(key, TranslationMeta::new(fallback), file, line)
}

/// Two chunks: `main` uses `greet` and imports `cart`, which uses `cart.total`.
pub(crate) fn sample_manifest() -> Manifest {
    let keys = [
        occurrence("greet", "Hi {$name}", "src/main.ts", 3),
        occurrence("cart.total", "Total: {$amount}", "src/cart.ts", 7),
    ]
    .iter()
    .map(ExtractedKey::from_occurrence)
    .collect();

    let set = |items: &[&str]| items.iter().map(|item| (*item).to_string()).collect::<BTreeSet<_>>();
    Manifest {
        keys,
        chunks: BTreeMap::from([
            ("cart".to_string(), set(&["cart.total"])),
            ("main".to_string(), set(&["greet"])),
        ]),
        imports: BTreeMap::from([("cart".to_string(), set(&[])), ("main".to_string(), set(&["cart"]))]),
    }
}
