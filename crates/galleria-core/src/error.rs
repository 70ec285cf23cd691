use thiserror::Error;

/// Top-level error type for the Galleria backend.
///
/// Variants map onto the HTTP surface as follows: `InvalidIdentifier` and
/// `InvalidArgument` become 400s, `NotFound` a 404, and `Storage` /
/// `Completion` a generic 500 with the detail kept server-side.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GalleriaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for GalleriaError {
    fn from(err: toml::de::Error) -> Self {
        GalleriaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GalleriaError {
    fn from(err: serde_json::Error) -> Self {
        GalleriaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Galleria operations.
pub type Result<T> = std::result::Result<T, GalleriaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GalleriaError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = GalleriaError::InvalidIdentifier("not-a-uuid".to_string());
        assert_eq!(err.to_string(), "Invalid identifier: not-a-uuid");

        let err = GalleriaError::InvalidArgument("limit out of range".to_string());
        assert_eq!(err.to_string(), "Invalid argument: limit out of range");

        let err = GalleriaError::NotFound("message".to_string());
        assert_eq!(err.to_string(), "Not found: message");

        let err = GalleriaError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");

        let err = GalleriaError::Completion("timed out".to_string());
        assert_eq!(err.to_string(), "Completion error: timed out");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GalleriaError = io_err.into();
        assert!(matches!(err, GalleriaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_becomes_config() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: GalleriaError = parsed.unwrap_err().into();
        assert!(matches!(err, GalleriaError::Config(_)));
    }

    #[test]
    fn test_serde_json_error_becomes_serialization() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        let err: GalleriaError = parsed.unwrap_err().into();
        assert!(matches!(err, GalleriaError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
