//! Relay-style connection cursors: base64 of `arrayconnection:<offset>`.

use crate::error::{Result, TranslateError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const CURSOR_PREFIX: &str = "arrayconnection:";

/// Cursor for the element at `offset`
pub fn offset_to_cursor(offset: u64) -> String {
    STANDARD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

/// Offset encoded in `cursor`
pub fn cursor_to_offset(cursor: &str) -> Result<u64> {
    let invalid = || TranslateError::InvalidInput(format!("invalid cursor '{cursor}'"));

    let bytes = STANDARD.decode(cursor).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    text.strip_prefix(CURSOR_PREFIX)
        .and_then(|offset| offset.parse().ok())
        .ok_or_else(invalid)
}
