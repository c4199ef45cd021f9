//! Error types for msgbridge wire decoding.

use thiserror::Error;

/// Errors that can occur while decoding bridge wire data.
#[derive(Debug, Error)]
pub enum WireError {
    /// A raw push event failed typed decoding.
    #[error("event decode failed: {0}")]
    EventDecode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = crate::PushEvent::from_value(serde_json::json!({"type": "bogus"})).unwrap_err();
        assert!(err.to_string().starts_with("event decode failed"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WireError>();
    }
}
