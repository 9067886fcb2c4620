//! Parser for the draw.io style micro-language.
//!
//! A style string is a semicolon-separated list of `key[=value]` tokens, e.g.
//! `"shape=ellipse;whiteSpace=wrap;html=1"`. Tokens without `=` are flags.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One parsed style entry: either an explicit value or a bare flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Value(String),
    Flag(bool),
}

impl StyleValue {
    /// The explicit value, if any. Flags have no textual value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleValue::Value(s) => Some(s),
            StyleValue::Flag(_) => None,
        }
    }
}

/// Parsed style entries, in declaration order.
pub type StyleMap = IndexMap<String, StyleValue>;

/// Parses a draw.io style string into a [`StyleMap`].
///
/// Splits on `;`, then on the first `=` of each token; the value keeps any
/// further `=` characters verbatim. A token without `=` is recorded as a
/// flag. Unknown keys are preserved as-is. Never fails; empty input yields
/// an empty map.
pub fn parse_style(raw: &str) -> StyleMap {
    let mut map = StyleMap::new();
    for token in raw.split(';') {
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((key, value)) => {
                map.insert(key.to_string(), StyleValue::Value(value.to_string()));
            }
            None => {
                map.insert(token.to_string(), StyleValue::Flag(true));
            }
        }
    }
    map
}
