//! Token codec error types

use std::fmt;

use thiserror::Error;

/// Which half of the key pair could not be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Private,
    Public,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => f.write_str("Private"),
            Self::Public => f.write_str("Public"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Missing or Corrupted {0} Key")]
    KeyUnavailable(KeyKind),

    #[error("401 Unauthorized - {0}")]
    Unauthorized(String),

    #[error("token record is already expired")]
    ExpiredRecord,

    #[error("failed to encode token: {0}")]
    Encode(String),
}

impl TokenError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    #[must_use]
    pub const fn is_key_unavailable(&self) -> bool {
        matches!(self, Self::KeyUnavailable(_))
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Reason carried by an `Unauthorized` failure
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::unauthorized("token expired"),
            _ => Self::Unauthorized(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use jsonwebtoken::errors::{Error as JwtError, ErrorKind};

    use super::*;

    #[test]
    fn test_key_unavailable_display() {
        assert_eq!(
            TokenError::KeyUnavailable(KeyKind::Private).to_string(),
            "Missing or Corrupted Private Key"
        );
        assert_eq!(
            TokenError::KeyUnavailable(KeyKind::Public).to_string(),
            "Missing or Corrupted Public Key"
        );
    }

    #[test]
    fn test_unauthorized_display() {
        let err = TokenError::unauthorized("Test Error");
        assert_eq!(err.to_string(), "401 Unauthorized - Test Error");
        assert_eq!(err.reason(), Some("Test Error"));
    }

    #[test]
    fn test_expired_signature_maps_to_token_expired() {
        let err: TokenError = JwtError::from(ErrorKind::ExpiredSignature).into();
        assert_eq!(err.to_string(), "401 Unauthorized - token expired");
    }

    #[test]
    fn test_other_jwt_errors_keep_verifier_message() {
        let jwt_err = JwtError::from(ErrorKind::InvalidSignature);
        let expected = format!("401 Unauthorized - {jwt_err}");
        let err: TokenError = jwt_err.into();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), expected);
        assert_ne!(err.reason(), Some("token expired"));
    }

    #[test]
    fn test_predicates() {
        assert!(TokenError::KeyUnavailable(KeyKind::Public).is_key_unavailable());
        assert!(!TokenError::ExpiredRecord.is_unauthorized());
        assert!(TokenError::ExpiredRecord.reason().is_none());
    }
}
