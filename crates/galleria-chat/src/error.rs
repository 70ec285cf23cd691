//! Error types for the conversational plumbing.

use galleria_core::error::GalleriaError;

/// Errors from the chat layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("completion request failed: {0}")]
    Completion(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Completion(err.to_string())
    }
}

impl From<ChatError> for GalleriaError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Completion(msg) => GalleriaError::Completion(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::Completion("deployment not found".to_string());
        assert_eq!(
            err.to_string(),
            "completion request failed: deployment not found"
        );
    }

    #[test]
    fn test_chat_error_into_galleria_error() {
        let err: GalleriaError = ChatError::Completion("timed out".to_string()).into();
        assert!(matches!(err, GalleriaError::Completion(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
