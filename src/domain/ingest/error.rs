use crate::error::AppError;
use std::collections::BTreeMap;
use std::fmt;

/// Raw content attached to a decode error is capped to this many bytes.
pub const MAX_DIAGNOSTIC_CONTENT: usize = 4 * 1024;

/// Named diagnostic fields attached to an ingestion error (url, status, content, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    fields: BTreeMap<&'static str, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.fields.insert(key, value.to_string());
        self
    }

    pub fn insert(&mut self, key: &'static str, value: impl ToString) {
        self.fields.insert(key, value.to_string());
    }

    /// Attach raw feed bytes, truncated then lossily decoded.
    pub fn with_content(self, raw: &[u8]) -> Self {
        let end = raw.len().min(MAX_DIAGNOSTIC_CONTENT);
        let text = String::from_utf8_lossy(&raw[..end]).into_owned();
        self.with("content", text)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.fields {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}={:?}", key, value)?;
        }
        Ok(())
    }
}

/// Failure of one feed's pipeline. Never escapes a cycle: the orchestrator
/// turns it into the feed's persisted failure record.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("fetch failed: {message}")]
    Fetch {
        message: String,
        context: ErrorContext,
    },

    #[error("feed could not be decoded: {message}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        context: ErrorContext,
    },
}

impl IngestError {
    pub fn fetch(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Fetch {
            message: message.into(),
            context,
        }
    }

    pub fn decode(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Decode {
            message: message.into(),
            context,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Fetch { context, .. }
            | Self::Decode { context, .. }
            | Self::Storage { context, .. } => context,
        }
    }

    /// Add a diagnostic field after the fact (e.g. the stage or URL known only to the caller).
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        match &mut self {
            Self::Fetch { context, .. }
            | Self::Decode { context, .. }
            | Self::Storage { context, .. } => context.insert(key, value),
        }
        self
    }
}

impl From<AppError> for IngestError {
    fn from(err: AppError) -> Self {
        IngestError::Storage {
            message: err.to_string(),
            context: ErrorContext::new(),
        }
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err).into()
    }
}
