//! Storage of fixed sets of labels (roles, statuses, payment methods) as text columns.

/// Implement [std::fmt::Display], [rusqlite::types::ToSql] and
/// [rusqlite::types::FromSql] for an enum that has an `as_str` method and a
/// [std::str::FromStr] implementation.
///
/// The enum is stored in the database as the same label used in the JSON API,
/// e.g. "Teaching Staff".
macro_rules! impl_text_column {
    ($type:ty) => {
        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl rusqlite::types::ToSql for $type {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $type {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error| rusqlite::types::FromSqlError::Other(Box::new(error)))
            }
        }
    };
}

pub(crate) use impl_text_column;
