mod row_values;
mod versioned_schema;

pub use row_values::{parse_optional_text_column, parse_text_column};
pub use versioned_schema::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    BASE_DB_VERSION, DEFAULT_TIMESTAMP,
};
