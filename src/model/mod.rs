pub mod attendance;
pub mod device;
pub mod employee;
pub mod role;
pub mod user;

use std::str::FromStr;

/// Decode a string column into one of the strum-backed status enums.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
