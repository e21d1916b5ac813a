use dashkit_core::NormalizeError;

use crate::http::TransportError;

/// Every failure the list layer turns into UI-visible state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] NormalizeError),

    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("update of '{key}' failed: {source}")]
    Mutation {
        key: String,
        #[source]
        source: TransportError,
    },

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl ListError {
    pub fn mutation(key: impl Into<String>, source: TransportError) -> Self {
        Self::Mutation {
            key: key.into(),
            source,
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Message suitable for a toast or an inline error row.
    pub fn user_message(&self) -> String {
        match self {
            ListError::MalformedResponse(_) => "The server returned data in an unexpected format".into(),
            ListError::Transport(e) => e.message(),
            ListError::Mutation { key, source } => format!("Could not update {key}: {}", source.message()),
            ListError::Validation { message, .. } => message.clone(),
        }
    }

    /// Entity the failure is scoped to, for mutation failures.
    pub fn key(&self) -> Option<&str> {
        match self {
            ListError::Mutation { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<dashkit_core::Error> for ListError {
    fn from(e: dashkit_core::Error) -> Self {
        use dashkit_core::Error as E;
        let field = match e {
            E::InvalidPage(_) => "page",
            E::InvalidPageSize => "page size",
            E::InvalidSortOrder(_) => "sort order",
            E::InvalidFilter(_) => "filter",
        };
        Self::validation(field, e.to_string())
    }
}
