//! Row identifier resolution.
//!
//! Sources are tried in a fixed order and the first usable value wins:
//! numeric field value, string field value, row metadata (`ID` then `id`),
//! and finally the `ID` query parameter of the page URL. A value that does
//! not parse is a miss at that step; only running out of sources is an
//! error.
//!
//! Text values are read by their leading digits, so `"12abc"` is row 12 and
//! `"7.5"` is row 7. A sign other than `+` or a result of zero is a miss.

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use url::Url;

use crate::{error::IdentifierMissing, RowId};

const IDENTIFIER_FIELD_NAMES: [&str; 2] = ["ID", "id"];
const URL_IDENTIFIER_PARAM: &str = "ID";

/// Read access to the other columns of the row being rendered.
pub trait RowMetadata: Send + Sync {
    /// Value of the named column, or `None` when the row has no such column.
    fn value_by_name(&self, name: &str) -> anyhow::Result<Option<Value>>;
}

/// Resolves the row identifier for one cell, trying each source in order.
pub fn resolve_row_id(
    field_value: &Value,
    row: Option<&dyn RowMetadata>,
    page_url: Option<&str>,
) -> Result<RowId, IdentifierMissing> {
    if let Value::Number(number) = field_value {
        if let Some(id) = row_id_from_number(number) {
            return Ok(id);
        }
    }
    if let Some(id) = field_value.as_str().and_then(row_id_from_str) {
        return Ok(id);
    }
    if let Some(id) = row.and_then(row_id_from_metadata) {
        return Ok(id);
    }
    if let Some(id) = page_url.and_then(row_id_from_page_url) {
        return Ok(id);
    }
    Err(IdentifierMissing)
}

fn row_id_from_number(number: &serde_json::Number) -> Option<RowId> {
    if let Some(value) = number.as_u64() {
        return RowId::new(value);
    }
    number
        .as_f64()
        .filter(|value| value.is_finite() && *value >= 1.0 && value.fract() == 0.0)
        .filter(|value| *value <= u64::MAX as f64)
        .and_then(|value| RowId::new(value as u64))
}

fn row_id_from_str(value: &str) -> Option<RowId> {
    let trimmed = value.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..digits_end].parse::<u64>().ok().and_then(RowId::new)
}

fn row_id_from_value(value: &Value) -> Option<RowId> {
    match value {
        Value::Number(number) => row_id_from_number(number),
        Value::String(text) => row_id_from_str(text),
        _ => None,
    }
}

/// A failed or panicking lookup ends the metadata step as a miss; a failure
/// on `ID` does not go on to `id`.
fn row_id_from_metadata(row: &dyn RowMetadata) -> Option<RowId> {
    match panic::catch_unwind(AssertUnwindSafe(|| lookup_metadata_id(row))) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("row metadata lookup panicked, treating as a miss");
            None
        },
    }
}

fn lookup_metadata_id(row: &dyn RowMetadata) -> Option<RowId> {
    for name in IDENTIFIER_FIELD_NAMES {
        match row.value_by_name(name) {
            Ok(value) => {
                if let Some(id) = value.as_ref().and_then(row_id_from_value) {
                    return Some(id);
                }
            },
            Err(err) => {
                tracing::debug!(field = name, error = %err, "row metadata lookup failed");
                return None;
            },
        }
    }
    None
}

fn row_id_from_page_url(page_url: &str) -> Option<RowId> {
    let url = Url::parse(page_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == URL_IDENTIFIER_PARAM)
        .and_then(|(_, value)| row_id_from_str(&value))
}
