//! Decoding of request parameters.
//!
//! Read operations take parameters as individual `key=value` pairs, write
//! operations take a body of pairs joined by `&`. Both go through the same
//! field decoder so the two paths cannot drift apart.

use std::collections::BTreeMap;

use serde::Deserialize;
use url::form_urlencoded;

use crate::error::FlightError;

/// Named request parameters, keyed by field name.
pub type Params = BTreeMap<String, String>;

/// How field values are decoded.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormDecoding {
    /// Split on `&` and `=` without percent-decoding, except that a literal
    /// `%2B` in a country value becomes `+`.
    #[default]
    Legacy,
    /// `application/x-www-form-urlencoded`.
    Standard,
}

/// Decode a `key=value&key=value` body.
///
/// An empty body yields no parameters. Empty segments (`a=1&&b=2`) are skipped.
pub fn decode_body(body: &str, decoding: FormDecoding) -> Result<Params, FlightError> {
    decode_pairs(body.split('&'), decoding)
}

/// Decode individual `key=value` fields into a parameter map.
///
/// Later fields overwrite earlier ones with the same key.
pub fn decode_pairs<'a, I>(fields: I, decoding: FormDecoding) -> Result<Params, FlightError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut params = Params::new();
    for field in fields.into_iter().filter(|f| !f.is_empty()) {
        let (key, value) = decode_field(field, decoding)?;
        params.insert(key, value);
    }
    Ok(params)
}

fn decode_field(field: &str, decoding: FormDecoding) -> Result<(String, String), FlightError> {
    let (key, value) = field
        .split_once('=')
        .ok_or_else(|| FlightError::MalformedField {
            field: field.to_string(),
        })?;

    match decoding {
        FormDecoding::Legacy => Ok((key.to_string(), legacy_value(key, value))),
        FormDecoding::Standard => {
            let decoded = form_urlencoded::parse(field.as_bytes())
                .next()
                .map(|(k, v)| (k.into_owned(), v.into_owned()));
            decoded.ok_or_else(|| FlightError::MalformedField {
                field: field.to_string(),
            })
        }
    }
}

// Country names such as "Trinidad+Tobago" arrive with the plus already
// escaped; nothing else is decoded in legacy mode.
fn legacy_value(key: &str, value: &str) -> String {
    if key.eq_ignore_ascii_case("country") {
        value.replace("%2B", "+")
    } else {
        value.to_string()
    }
}
