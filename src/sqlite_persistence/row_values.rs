use rusqlite::types::Type;
use rusqlite::Row;

fn unrecognized(index: usize, column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        Type::Text,
        format!("Unrecognized value '{}' in column {}", value, column).into(),
    )
}

/// Reads a text column through `parse`. An unrecognized value fails the row.
pub fn parse_text_column<T>(
    row: &Row,
    column: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let index = row.as_ref().column_index(column)?;
    let value: String = row.get(index)?;
    parse(&value).ok_or_else(|| unrecognized(index, column, &value))
}

/// Like [`parse_text_column`], with NULL read as `None`.
pub fn parse_optional_text_column<T>(
    row: &Row,
    column: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<Option<T>> {
    let index = row.as_ref().column_index(column)?;
    let value: Option<String> = row.get(index)?;
    match value {
        None => Ok(None),
        Some(value) => parse(&value)
            .map(Some)
            .ok_or_else(|| unrecognized(index, column, &value)),
    }
}
