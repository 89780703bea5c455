//! Request extractors that reject malformed input with the app's JSON error body.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Deserializer};

use crate::Error;

/// Like [axum::Json], but rejections are converted to [Error].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Like [axum::extract::Query], but rejections are converted to [Error].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// Like [axum::extract::Path], but rejections are converted to [Error].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Deserialize a field that distinguishes "missing" from "null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>` field: a missing field is `None`, `null` is
/// `Some(None)` and a value is `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::double_option;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        envelope_id: Option<Option<i64>>,
    }

    #[test]
    fn distinguishes_missing_null_and_value() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"envelope_id": null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"envelope_id": 3}"#).unwrap();

        assert_eq!(missing.envelope_id, None);
        assert_eq!(null.envelope_id, Some(None));
        assert_eq!(value.envelope_id, Some(Some(3)));
    }
}
