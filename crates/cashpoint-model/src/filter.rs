//! Search filter normalization.
//!
//! User-typed search terms use shell-style wildcards (`*` for any run of
//! characters, `?` for exactly one). The row query matches with SQL `LIKE`,
//! so [`escape_filter`] rewrites the term into a LIKE pattern: literal `_`
//! and `%` are dropped, the wildcards are translated, and the pattern is
//! wrapped in `%` so it matches anywhere in the column.
//!
//! Filter requests may also carry a JSON options object (for example
//! `{"rub": true, "round_the_clock": true}`). [`parse_filter_options`]
//! decodes it and tells malformed JSON apart from JSON that is not an
//! object; [`options_or_empty`] is the lenient variant used by the dispatch
//! path, which logs and falls back to no options.

use cashpoint_core::logging::targets;
use serde_json::{Map, Value};

/// Auxiliary query parameters decoded from a filter request.
pub type FilterOptions = Map<String, Value>;

/// Why an options payload could not be used.
#[derive(Debug, thiserror::Error)]
pub enum FilterOptionsError {
    /// The payload is not valid JSON.
    #[error("cannot parse filter options json: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload is valid JSON but not an object.
    #[error("filter options must be a json object, got {kind}")]
    NotAnObject {
        /// JSON type of the payload that was received.
        kind: &'static str,
    },
}

/// Converts a user search term into a LIKE pattern.
///
/// Literal `_` and `%` are removed first, then `*` becomes `%` and `?`
/// becomes `_`. The result is prefixed and suffixed with `%` unless it
/// already starts or ends with one. Both checks look at the translated term,
/// so an empty term yields `"%%"`.
///
/// ```
/// use cashpoint_model::filter::escape_filter;
///
/// assert_eq!(escape_filter("bank"), "%bank%");
/// assert_eq!(escape_filter("*ab?"), "%ab_%");
/// assert_eq!(escape_filter("a_b%c"), "%abc%");
/// ```
pub fn escape_filter(input: &str) -> String {
    let body: String = input
        .chars()
        .filter(|c| !matches!(c, '_' | '%'))
        .map(|c| match c {
            '*' => '%',
            '?' => '_',
            other => other,
        })
        .collect();

    let needs_prefix = !body.starts_with('%');
    let needs_suffix = !body.ends_with('%');

    let mut pattern = String::with_capacity(body.len() + 2);
    if needs_prefix {
        pattern.push('%');
    }
    pattern.push_str(&body);
    if needs_suffix {
        pattern.push('%');
    }
    pattern
}

/// Decodes a JSON options payload.
pub fn parse_filter_options(options: &str) -> Result<FilterOptions, FilterOptionsError> {
    match serde_json::from_str::<Value>(options)? {
        Value::Object(map) => Ok(map),
        other => Err(FilterOptionsError::NotAnObject {
            kind: json_kind(&other),
        }),
    }
}

/// Decodes a JSON options payload, logging and returning empty options on
/// any failure.
pub fn options_or_empty(options: &str) -> FilterOptions {
    match parse_filter_options(options) {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!(target: targets::FILTER, payload = options, "{err}");
            FilterOptions::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
