//! Error types for enscope.
//!
//! Errors circulate internally between the provider layer and the failover
//! resolver; the public resolution operations normalize every failure to an
//! absence result, so none of these reach callers of the resolver API.

use thiserror::Error;

/// Result type alias using `EnscopeError`.
pub type Result<T> = std::result::Result<T, EnscopeError>;

/// Main error type for all enscope operations.
#[derive(Debug, Error)]
pub enum EnscopeError {
    /// The underlying RPC provider failed (timeout, connection refused,
    /// malformed response). Recoverable via endpoint rotation.
    #[error("RPC provider error: {0}")]
    Provider(String),

    /// An RPC endpoint URL could not be parsed into a provider. Deterministic
    /// for that endpoint; rotation moves on to the next one.
    #[error("invalid RPC endpoint '{url}': {reason}")]
    EndpointParse {
        /// The offending endpoint URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl EnscopeError {
    /// Returns true if retrying the same endpoint could succeed.
    ///
    /// Transport failures are transient; a URL rejected at parse time stays
    /// rejected.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EnscopeError::Provider(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EnscopeError::EndpointParse {
            url: "not a url".into(),
            reason: "relative URL without a base".into(),
        };
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_error_classification() {
        assert!(EnscopeError::Provider("timeout".into()).is_recoverable());
        assert!(!EnscopeError::EndpointParse {
            url: "not a url".into(),
            reason: "relative URL without a base".into(),
        }
        .is_recoverable());
    }
}
