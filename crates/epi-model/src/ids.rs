#![deny(unsafe_code)]

use std::fmt;

use crate::EpiError;

const MAX_IDENT_LEN: usize = 63;

/// A schema, table or column name that is safe to splice into SQL text.
///
/// Only ASCII letters, digits and underscore are accepted.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct SqlIdent(String);

impl SqlIdent {
    pub fn new(value: impl Into<String>) -> Result<Self, EpiError> {
        let value = value.into();
        if is_safe_identifier(&value) {
            Ok(Self(value))
        } else {
            Err(EpiError::InvalidIdentifier { value })
        }
    }

    /// Identifier from a literal that is known to be valid.
    pub fn from_static(value: &'static str) -> Self {
        debug_assert!(is_safe_identifier(value), "invalid identifier literal {value}");
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for interpolation into a statement.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

pub fn is_safe_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_IDENT_LEN
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

impl TryFrom<String> for SqlIdent {
    type Error = EpiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SqlIdent> for String {
    fn from(value: SqlIdent) -> Self {
        value.0
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical location of a disease's case records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FactTable {
    pub schema: SqlIdent,
    pub table: SqlIdent,
}

impl FactTable {
    pub fn new(schema: &str, table: &str) -> Result<Self, EpiError> {
        Ok(Self {
            schema: SqlIdent::new(schema.trim())?,
            table: SqlIdent::new(table.trim())?,
        })
    }

    /// `"schema"."table"`, ready for a FROM clause.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema.quoted(), self.table.quoted())
    }

    /// Unquoted `schema.table` key, as used by allow-lists.
    pub fn key(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

impl fmt::Display for FactTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
