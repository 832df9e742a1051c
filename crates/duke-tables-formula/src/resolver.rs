//! Column type resolution
//!
//! Maps a column's UI type to the [`FormulaDataType`] a reference to it has
//! inside a formula. Formula, rollup and lookup columns depend on other
//! columns and are resolved by the validation pass; everything else is a
//! fixed mapping, with database-typed columns delegated to a
//! [`SqlTypeMapper`].

use duke_tables_core::{AbstractSqlType, Column, FormulaDataType, SqlTypeMapper, UiType};

/// Find the column a formula refers to by `name`: its ID, else its title
pub fn find_column<'c>(columns: &'c [Column], name: &str) -> Option<&'c Column> {
    columns
        .iter()
        .find(|c| c.id == name)
        .or_else(|| columns.iter().find(|c| c.title == name))
}

/// Static type of a column reference
pub fn column_data_type(column: &Column, sql_types: Option<&dyn SqlTypeMapper>) -> FormulaDataType {
    match column.ui_type {
        UiType::SingleLineText
        | UiType::LongText
        | UiType::MultiSelect
        | UiType::SingleSelect
        | UiType::PhoneNumber
        | UiType::Email
        | UiType::Url
        | UiType::Attachment => FormulaDataType::String,

        UiType::Year
        | UiType::Number
        | UiType::Decimal
        | UiType::Rating
        | UiType::Count
        | UiType::AutoNumber
        | UiType::Currency
        | UiType::Percent
        | UiType::Duration
        | UiType::Links
        | UiType::Checkbox => FormulaDataType::Numeric,

        UiType::Date | UiType::DateTime | UiType::CreateTime | UiType::LastModifiedTime => {
            FormulaDataType::Date
        }

        ui_type if ui_type.is_storage_typed() => match sql_types {
            Some(mapper) => sql_data_type(mapper.abstract_type(column)),
            None => FormulaDataType::Unknown,
        },

        _ => FormulaDataType::Unknown,
    }
}

/// Formula type of an abstract database type
pub fn sql_data_type(sql_type: AbstractSqlType) -> FormulaDataType {
    match sql_type {
        AbstractSqlType::Integer | AbstractSqlType::Float | AbstractSqlType::Decimal => {
            FormulaDataType::Numeric
        }
        AbstractSqlType::Boolean => FormulaDataType::Boolean,
        AbstractSqlType::Date
        | AbstractSqlType::DateTime
        | AbstractSqlType::Time
        | AbstractSqlType::Year => FormulaDataType::Date,
        AbstractSqlType::Other => FormulaDataType::String,
    }
}
