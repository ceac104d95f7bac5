use crate::{
    error::{Error, ErrorKind, ErrorOrigin},
    value::Item,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

///
/// Cursor
///
/// Opaque continuation token: the last evaluated key of a page plus the
/// index it came from, as URL-safe base64 JSON.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Cursor {
    #[serde(rename = "k")]
    pub last_key: Item,

    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

impl Cursor {
    #[must_use]
    pub const fn new(last_key: Item, index: Option<String>) -> Self {
        Self { last_key, index }
    }

    pub fn encode(&self) -> Result<String, Error> {
        let json = serde_json::to_vec(self).map_err(|err| malformed(&err.to_string()))?;

        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(token: &str) -> Result<Self, Error> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| malformed(&err.to_string()))?;
        let cursor: Self =
            serde_json::from_slice(&bytes).map_err(|err| malformed(&err.to_string()))?;

        if cursor.last_key.is_empty() {
            return Err(malformed("empty key"));
        }

        Ok(cursor)
    }
}

fn malformed(reason: &str) -> Error {
    Error::new(
        ErrorKind::InvalidOperator,
        ErrorOrigin::Cursor,
        format!("malformed cursor: {reason}"),
    )
}
