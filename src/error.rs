//! Error types for the meklet front-end.
//!
//! None of these ever reach the rendered page. The flow logs them and leaves
//! the results area as it was.

/// Errors raised while talking to the search or summary services, or while
/// binding the page template.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body was not the JSON shape we expect.
    #[error("decode error: {0}")]
    Decode(String),

    /// The page template lacks an element the search flow needs.
    #[error("missing page element: {0}")]
    MissingElement(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ClientError::Http("connection refused".into()).to_string(),
            "HTTP error: connection refused"
        );
        assert_eq!(
            ClientError::MissingElement("search-form".into()).to_string(),
            "missing page element: search-form"
        );
        assert_eq!(
            ClientError::Config("summary_concurrency must be greater than 0".into()).to_string(),
            "config error: summary_concurrency must be greater than 0"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
    }
}
