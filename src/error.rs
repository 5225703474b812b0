use thiserror::Error;

use crate::template::PlaceholderMode;

#[derive(Debug, Error)]
pub enum SqlParamsError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Parameter count mismatch: template expects {expected}, binding supplies {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Unbound named parameter: {0}")]
    UnboundParameter(String),

    #[error("Template mixes positional and named placeholders")]
    MixedPlaceholders,

    #[error("Binding does not match template: template is {template:?}, binding is {binding:?}")]
    BindingModeMismatch {
        template: PlaceholderMode,
        binding: PlaceholderMode,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Prepare error: {0}")]
    PrepareError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Prepared statement {0} has been released")]
    StatementReleased(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlParamsError {
    /// True for errors raised before any backend round trip.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::ArityMismatch { .. }
                | Self::UnboundParameter(_)
                | Self::MixedPlaceholders
                | Self::BindingModeMismatch { .. }
                | Self::InvalidQuery(_)
                | Self::StatementReleased(_)
        )
    }

    /// True when the connection that produced this error can no longer be used.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportError(_))
    }
}

impl From<serde_json::Error> for SqlParamsError {
    fn from(err: serde_json::Error) -> Self {
        SqlParamsError::ConfigError(format!("invalid options JSON: {err}"))
    }
}
