//! Error taxonomy shared by every surveillance crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EpiError {
    /// A required row (e.g. an active fact-table mapping) does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A caller-supplied argument could not be interpreted.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidArgument {
        field: String,
        value: String,
        reason: String,
    },

    /// A schema/table/column name failed the identifier allow-list.
    #[error("unsafe SQL identifier: '{value}'")]
    InvalidIdentifier { value: String },

    /// A mapped table exists but is outside the configured allow-list.
    #[error("fact table '{table}' is not in the allowed table list")]
    TableNotAllowed { table: String },

    #[error("store error ({context}): {message}")]
    Store { context: String, message: String },

    #[error("{0}")]
    Internal(String),
}

/// Coarse classification used at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Internal,
}

impl EpiError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn invalid_argument(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn store(context: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Store {
            context: context.into(),
            message: error.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidIdentifier { .. }
            | Self::TableNotAllowed { .. }
            | Self::Store { .. }
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand back to an end user.
    ///
    /// Internal failures collapse to a generic text; the detailed message is
    /// only meant for logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::NotFound | ErrorKind::InvalidArgument => self.to_string(),
            ErrorKind::Internal => "internal error while computing statistics".to_string(),
        }
    }

    /// The field name for `InvalidArgument`, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EpiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_do_not_leak_details() {
        let error = EpiError::store("age_counts", "no such table: main.secret_cases");
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert!(!error.public_message().contains("secret_cases"));
        assert!(error.to_string().contains("secret_cases"));
    }

    #[test]
    fn not_found_names_the_key() {
        let error = EpiError::not_found("fact table mapping", "D99");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.public_message(), "fact table mapping not found: D99");
    }
}
