use thiserror::Error;

/// Fallback message when a `success:false` envelope carries no message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Something went wrong, Please try again!";
/// Fallback message when nothing better can be extracted from a failure.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("AuthError: {0}")]
    Auth(#[from] AuthError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("ValidationError: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{message}")]
    AuthRequired { message: String, hint: String },
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    /// The failure itself was already reported through the feedback channel.
    #[error("{0}")]
    ActionFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error on {endpoint}: {message}")]
    Network { endpoint: String, message: String },
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("API error: {status} {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Authentication failed")]
    Unauthorized {
        status: u16,
        endpoint: String,
        server_message: String,
    },
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Human-readable message suitable for a toast or a status line.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network { message, .. } => message.clone(),
            ApiError::Timeout { timeout_secs, .. } => {
                format!("Request timed out after {} seconds", timeout_secs)
            }
            ApiError::Api { message, .. } => message.clone(),
            ApiError::Unauthorized { server_message, .. } => {
                if server_message.is_empty() {
                    "Session expired, please log in again".to_string()
                } else {
                    server_message.clone()
                }
            }
            ApiError::Decode { .. } => UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Network { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::Api { endpoint, .. }
            | ApiError::Unauthorized { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => endpoint,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::Unauthorized { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Invalid credentials. {remaining_attempts} attempts remaining.")]
    InvalidCredentials { remaining_attempts: u32 },
    #[error("{message}")]
    LockedOut {
        remaining_minutes: i64,
        message: String,
    },
    #[error("Session expired or invalid")]
    SessionExpired,
    #[error("Not logged in")]
    NotAuthenticated,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Session storage failed: {message}")]
    Session { message: String },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Client-side validation failure, one entry per failing field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", .errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; "))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::Unauthorized { .. } => ErrorSeverity::High,
                ApiError::Timeout { .. } | ApiError::Network { .. } => ErrorSeverity::Medium,
                ApiError::Api { status, .. } if *status >= 500 => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Auth(AuthError::LockedOut { .. }) => ErrorSeverity::Critical,
            AppError::Auth(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Validation(_) => ErrorSeverity::Low,
        }
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Cli(cli_error) => cli_error.to_string(),
            AppError::Api(api_error) => api_error.user_message(),
            AppError::Auth(auth_error) => auth_error.to_string(),
            AppError::Validation(validation_error) => validation_error.to_string(),
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Api(ApiError::Unauthorized { .. })
            | AppError::Auth(AuthError::SessionExpired | AuthError::NotAuthenticated) => {
                Some("'shopdesk auth login' to start a new session".to_string())
            }
            AppError::Api(ApiError::Timeout { .. } | ApiError::Network { .. }) => Some(
                "Check your connection and the configured API URL ('shopdesk config show')"
                    .to_string(),
            ),
            AppError::Auth(AuthError::LockedOut { .. }) => {
                Some("Wait for the lockout to expire, or use 'auth forgot-password'".to_string())
            }
            AppError::Config(ConfigError::InvalidValue { field, .. })
            | AppError::Storage(StorageError::InvalidConfig(ConfigError::InvalidValue {
                field,
                ..
            })) => Some(format!(
                "Fix it with 'shopdesk config set {} <value>'",
                field
            )),
            AppError::Cli(CliError::AuthRequired { hint, .. }) => Some(hint.clone()),
            _ => None,
        }
    }
}
