//! Errors raised while loading and checking the service configuration

use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type InstareelResult<T> = Result<T, InstareelError>;

/// Where an error came from and what the operator can do about it
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    /// Correlates the log line with the response the caller saw
    pub error_id: String,
    pub component: String,
    pub operation: Option<String>,
    pub suggestion: Option<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            component: component.to_string(),
            operation: None,
            suggestion: None,
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

#[derive(Error, Debug)]
pub enum InstareelError {
    /// The configuration file could not be read, parsed or written
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// A configuration value is out of range
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: String,
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InstareelError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            InstareelError::Config { context, .. }
            | InstareelError::InvalidValue { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Emit one structured error event carrying the context fields
    pub fn log(&self) {
        let context = self.context();
        error!(
            error_id = context.map(|c| c.error_id.as_str()),
            component = context.map(|c| c.component.as_str()),
            operation = context.and_then(|c| c.operation.as_deref()),
            suggestion = context.and_then(|c| c.suggestion.as_deref()),
            error = %self,
            "Configuration problem"
        );
    }
}

/// Build an [`InstareelError::InvalidValue`] for a config field
#[macro_export]
macro_rules! invalid_value {
    ($field:expr, $msg:expr, $suggestion:expr) => {
        $crate::InstareelError::InvalidValue {
            field: $field.to_string(),
            message: $msg.to_string(),
            context: $crate::ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion($suggestion),
        }
    };
}
