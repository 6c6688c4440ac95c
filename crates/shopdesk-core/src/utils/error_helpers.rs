use crate::error::{ApiError, StorageError, UNEXPECTED_ERROR_MESSAGE};
use std::io;

/// Helper functions for standardizing error conversions across the codebase
/// Convert reqwest transport errors to ApiError with endpoint context
pub fn convert_request_error(error: reqwest::Error, endpoint: &str, timeout_secs: u64) -> ApiError {
    if error.is_timeout() {
        return convert_timeout_error(endpoint, timeout_secs);
    }
    ApiError::Network {
        endpoint: endpoint.to_string(),
        message: if error.is_connect() {
            format!("Unable to reach the server: {}", error)
        } else {
            error.to_string()
        },
    }
}

/// Convert timeout errors to ApiError with endpoint context
pub fn convert_timeout_error(endpoint: &str, timeout_secs: u64) -> ApiError {
    ApiError::Timeout {
        timeout_secs,
        endpoint: endpoint.to_string(),
    }
}

/// Convert JSON deserialization errors to ApiError with endpoint context
pub fn convert_json_error(error: serde_json::Error, endpoint: &str) -> ApiError {
    ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: format!("JSON parse error: {}", error),
    }
}

/// Message for a non-2xx response: the body's `message` when the body is JSON
/// carrying one, otherwise the status reason, otherwise a generic fallback.
pub fn http_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| UNEXPECTED_ERROR_MESSAGE.to_string())
}

/// Convert IO errors on a storage path to StorageError
pub fn convert_io_error(error: io::Error, path: &std::path::Path) -> StorageError {
    StorageError::FileIo {
        path: path.to_string_lossy().to_string(),
        source: error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_http_error_message_prefers_body() {
        let msg = http_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"message":"Title is required"}"#,
        );
        assert_eq!(msg, "Title is required");
    }

    #[test]
    fn test_http_error_message_falls_back_to_reason() {
        assert_eq!(
            http_error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "Internal Server Error"
        );
        assert_eq!(
            http_error_message(StatusCode::NOT_FOUND, r#"{"message":""}"#),
            "Not Found"
        );
    }

    #[test]
    fn test_http_error_message_unknown_status() {
        let status = StatusCode::from_u16(599).expect("valid status");
        assert_eq!(http_error_message(status, ""), UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_convert_timeout_error() {
        let err = convert_timeout_error("/order", 30);
        assert_eq!(
            err,
            ApiError::Timeout {
                timeout_secs: 30,
                endpoint: "/order".to_string()
            }
        );
    }

    #[test]
    fn test_convert_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = convert_json_error(json_err, "/product");
        assert!(matches!(err, ApiError::Decode { ref endpoint, .. } if endpoint == "/product"));
    }
}
