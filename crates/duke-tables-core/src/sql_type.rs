//! Abstract database column types

use crate::column::Column;

/// Storage-engine-independent classification of a database column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AbstractSqlType {
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Year,
    Other,
}

impl AbstractSqlType {
    /// Classify a database type name such as `int8`, `varchar(255)` or
    /// `timestamp with time zone`.
    ///
    /// Covers the common Postgres, MySQL and SQLite spellings; anything else
    /// is [`AbstractSqlType::Other`].
    pub fn from_db_type(db_type: &str) -> Self {
        let lower = db_type.trim().to_ascii_lowercase();
        // Drop length/precision arguments: `decimal(10,2)` -> `decimal`
        let base = match lower.find('(') {
            Some(idx) => lower[..idx].trim_end(),
            None => lower.as_str(),
        };
        let base = base.strip_suffix(" unsigned").unwrap_or(base);

        match base {
            "int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "mediumint" | "bigint"
            | "tinyint" | "serial" | "smallserial" | "bigserial" => AbstractSqlType::Integer,
            "float" | "float4" | "float8" | "double" | "double precision" | "real" => {
                AbstractSqlType::Float
            }
            "decimal" | "numeric" | "money" => AbstractSqlType::Decimal,
            "bool" | "boolean" | "bit" => AbstractSqlType::Boolean,
            "date" => AbstractSqlType::Date,
            "datetime" | "timestamp" | "timestamptz" | "timestamp with time zone"
            | "timestamp without time zone" => AbstractSqlType::DateTime,
            "time" | "timetz" | "time with time zone" | "time without time zone" => {
                AbstractSqlType::Time
            }
            "year" => AbstractSqlType::Year,
            _ => AbstractSqlType::Other,
        }
    }
}

/// Maps a column's storage-specific type to an [`AbstractSqlType`].
///
/// Supplied by the caller for columns whose type depends on the database
/// (`ID`, `ForeignKey`, `SpecificDBType`).
pub trait SqlTypeMapper: Send + Sync {
    fn abstract_type(&self, column: &Column) -> AbstractSqlType;
}

/// Mapper driven by [`Column::db_type`] and [`AbstractSqlType::from_db_type`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSqlTypes;

impl SqlTypeMapper for GenericSqlTypes {
    fn abstract_type(&self, column: &Column) -> AbstractSqlType {
        column
            .db_type
            .as_deref()
            .map(AbstractSqlType::from_db_type)
            .unwrap_or(AbstractSqlType::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui_type::UiType;

    #[test]
    fn test_from_db_type() {
        assert_eq!(AbstractSqlType::from_db_type("int8"), AbstractSqlType::Integer);
        assert_eq!(
            AbstractSqlType::from_db_type("INT(11) UNSIGNED"),
            AbstractSqlType::Integer
        );
        assert_eq!(
            AbstractSqlType::from_db_type("decimal(10,2)"),
            AbstractSqlType::Decimal
        );
        assert_eq!(
            AbstractSqlType::from_db_type("double precision"),
            AbstractSqlType::Float
        );
        assert_eq!(
            AbstractSqlType::from_db_type("timestamp with time zone"),
            AbstractSqlType::DateTime
        );
        assert_eq!(AbstractSqlType::from_db_type("boolean"), AbstractSqlType::Boolean);
        assert_eq!(AbstractSqlType::from_db_type("varchar(255)"), AbstractSqlType::Other);
    }

    #[test]
    fn test_generic_mapper() {
        let col = Column::new("id", "Id", UiType::Id).with_db_type("bigint");
        assert_eq!(GenericSqlTypes.abstract_type(&col), AbstractSqlType::Integer);

        let col = Column::new("x", "X", UiType::SpecificDbType);
        assert_eq!(GenericSqlTypes.abstract_type(&col), AbstractSqlType::Other);
    }
}
