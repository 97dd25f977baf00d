//! The serialize/deserialize boundary for persisted rows.
//!
//! Composite fields (inventory maps, tag sets) are persisted as text and
//! must round-trip through this one encode/decode pair. Raw text never
//! leaks into domain logic; everything above this module works with the
//! typed structs from `townlet-types`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Encode a row to its persisted text form.
pub fn encode_row<T: Serialize>(row: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(row)?)
}

/// Decode a row from its persisted text form.
pub fn decode_row<T: DeserializeOwned>(text: &str) -> Result<T, StoreError> {
    Ok(serde_json::from_str(text)?)
}
