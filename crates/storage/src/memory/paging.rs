//! Paging tokens issued by the in-memory backend
//!
//! A token is the URL-safe base64 encoding of the last returned row's scan
//! position plus the table it belongs to. Tokens from other tables, or text
//! that does not decode, are rejected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use colonnade_core::{Error, Result};

use super::table::ScanKey;
use crate::result::PagingState;
use crate::statement::TableRef;

#[derive(Debug, Serialize, Deserialize)]
struct ScanPosition {
    table: String,
    token: u64,
    key: String,
}

pub(crate) fn encode(table: &TableRef, last: &ScanKey) -> PagingState {
    let position = ScanPosition {
        table: table.to_string(),
        token: last.0,
        key: last.1.clone(),
    };
    // serializing a struct of plain strings and integers cannot fail
    let bytes = serde_json::to_vec(&position).unwrap_or_default();
    PagingState::from_token(URL_SAFE_NO_PAD.encode(bytes))
}

pub(crate) fn decode(table: &TableRef, state: &PagingState) -> Result<ScanKey> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state.as_str())
        .map_err(|e| Error::InvalidPagingState(e.to_string()))?;
    let position: ScanPosition =
        serde_json::from_slice(&bytes).map_err(|e| Error::InvalidPagingState(e.to_string()))?;
    if position.table != table.to_string() {
        return Err(Error::InvalidPagingState(format!(
            "paging state belongs to {}, not {}",
            position.table, table
        )));
    }
    Ok((position.token, position.key))
}
