use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field or lookup path that caused the error (e.g., "record.result", "candidates[3]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected length, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "store", "cosine_match")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the lookup cache.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Partition key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Embedding unavailable: {message}{}", format_context(.context))]
    EmbeddingUnavailable {
        message: String,
        context: ErrorContext,
    },

    /// A broken store invariant. Never expected at runtime.
    #[error("Internal invariant violated: {message}{}", format_context(.context))]
    InvariantViolation {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Error::KeyNotFound { key: key.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn embedding_unavailable(msg: impl Into<String>) -> Self {
        Self::embedding_unavailable_with_context(msg, ErrorContext::new())
    }

    pub fn embedding_unavailable_with_context(
        msg: impl Into<String>,
        context: ErrorContext,
    ) -> Self {
        Error::EmbeddingUnavailable {
            message: msg.into(),
            context,
        }
    }

    pub fn invariant_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvariantViolation {
            message: msg.into(),
            context,
        }
    }

    /// Whether the failure came from the embedder.
    ///
    /// Callers typically treat this as non-retryable for the current call and
    /// may fall back to an exact-match cache.
    pub fn is_embedding_unavailable(&self) -> bool {
        matches!(self, Error::EmbeddingUnavailable { .. })
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::EmbeddingUnavailable { context, .. }
            | Error::InvariantViolation { context, .. }
            | Error::Validation { context, .. } => Some(context),
            _ => None,
        }
    }
}
