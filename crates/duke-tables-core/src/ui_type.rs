//! Column UI types

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The user-facing type of a column.
///
/// Names match the wire/storage spelling (`"SingleLineText"`, `"URL"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UiType {
    #[cfg_attr(feature = "serde", serde(rename = "ID"))]
    Id,
    LinkToAnotherRecord,
    ForeignKey,
    Lookup,
    SingleLineText,
    LongText,
    Attachment,
    Checkbox,
    MultiSelect,
    SingleSelect,
    Collaborator,
    Date,
    Year,
    Time,
    PhoneNumber,
    Email,
    #[cfg_attr(feature = "serde", serde(rename = "URL"))]
    Url,
    Number,
    Decimal,
    Currency,
    Percent,
    Duration,
    Rating,
    Formula,
    Rollup,
    Count,
    DateTime,
    CreateTime,
    LastModifiedTime,
    AutoNumber,
    Geometry,
    #[cfg_attr(feature = "serde", serde(rename = "JSON"))]
    Json,
    #[cfg_attr(feature = "serde", serde(rename = "SpecificDBType"))]
    SpecificDbType,
    Barcode,
    QrCode,
    Button,
    Links,
    GeoData,
    User,
    CreatedBy,
    LastModifiedBy,
}

impl UiType {
    /// Every UI type, in declaration order
    pub const ALL: [UiType; 41] = [
        UiType::Id,
        UiType::LinkToAnotherRecord,
        UiType::ForeignKey,
        UiType::Lookup,
        UiType::SingleLineText,
        UiType::LongText,
        UiType::Attachment,
        UiType::Checkbox,
        UiType::MultiSelect,
        UiType::SingleSelect,
        UiType::Collaborator,
        UiType::Date,
        UiType::Year,
        UiType::Time,
        UiType::PhoneNumber,
        UiType::Email,
        UiType::Url,
        UiType::Number,
        UiType::Decimal,
        UiType::Currency,
        UiType::Percent,
        UiType::Duration,
        UiType::Rating,
        UiType::Formula,
        UiType::Rollup,
        UiType::Count,
        UiType::DateTime,
        UiType::CreateTime,
        UiType::LastModifiedTime,
        UiType::AutoNumber,
        UiType::Geometry,
        UiType::Json,
        UiType::SpecificDbType,
        UiType::Barcode,
        UiType::QrCode,
        UiType::Button,
        UiType::Links,
        UiType::GeoData,
        UiType::User,
        UiType::CreatedBy,
        UiType::LastModifiedBy,
    ];

    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            UiType::Id => "ID",
            UiType::LinkToAnotherRecord => "LinkToAnotherRecord",
            UiType::ForeignKey => "ForeignKey",
            UiType::Lookup => "Lookup",
            UiType::SingleLineText => "SingleLineText",
            UiType::LongText => "LongText",
            UiType::Attachment => "Attachment",
            UiType::Checkbox => "Checkbox",
            UiType::MultiSelect => "MultiSelect",
            UiType::SingleSelect => "SingleSelect",
            UiType::Collaborator => "Collaborator",
            UiType::Date => "Date",
            UiType::Year => "Year",
            UiType::Time => "Time",
            UiType::PhoneNumber => "PhoneNumber",
            UiType::Email => "Email",
            UiType::Url => "URL",
            UiType::Number => "Number",
            UiType::Decimal => "Decimal",
            UiType::Currency => "Currency",
            UiType::Percent => "Percent",
            UiType::Duration => "Duration",
            UiType::Rating => "Rating",
            UiType::Formula => "Formula",
            UiType::Rollup => "Rollup",
            UiType::Count => "Count",
            UiType::DateTime => "DateTime",
            UiType::CreateTime => "CreateTime",
            UiType::LastModifiedTime => "LastModifiedTime",
            UiType::AutoNumber => "AutoNumber",
            UiType::Geometry => "Geometry",
            UiType::Json => "JSON",
            UiType::SpecificDbType => "SpecificDBType",
            UiType::Barcode => "Barcode",
            UiType::QrCode => "QrCode",
            UiType::Button => "Button",
            UiType::Links => "Links",
            UiType::GeoData => "GeoData",
            UiType::User => "User",
            UiType::CreatedBy => "CreatedBy",
            UiType::LastModifiedBy => "LastModifiedBy",
        }
    }

    /// Columns whose type depends on the underlying database column type
    pub fn is_storage_typed(&self) -> bool {
        matches!(
            self,
            UiType::Id | UiType::ForeignKey | UiType::SpecificDbType
        )
    }
}

impl fmt::Display for UiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UiType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UiType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownUiType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for ui in UiType::ALL {
            assert_eq!(ui.as_str().parse::<UiType>().unwrap(), ui);
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Spreadsheet".parse::<UiType>().unwrap_err();
        assert!(matches!(err, Error::UnknownUiType(name) if name == "Spreadsheet"));
    }

    #[test]
    fn test_storage_typed() {
        assert!(UiType::SpecificDbType.is_storage_typed());
        assert!(!UiType::Number.is_storage_typed());
    }
}
