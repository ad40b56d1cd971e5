//! Identity provider plugins
//!
//! An identity adapter implements [`AuthProvider`] and ships a
//! [`ProviderModule`] whose entry point yields a [`ProviderConstructor`].
//! The [`ProviderRegistry`] drives every provider through
//! configure → register → instantiate → activate.

mod discovery;
mod loader;
mod registry;

use async_trait::async_trait;
use thiserror::Error;

use crate::token::TokenError;

pub use discovery::{enumerate_candidates, list_available_providers};
pub use loader::{
    LoadError, ProviderConstructor, ProviderLoader, ProviderModule, StaticProviderLoader,
    constructor,
};
pub use registry::{ProviderRegistry, RegistryError};

/// Failures raised by identity adapters while issuing a token
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Upstream credential exchange failed: {0}")]
    Upstream(String),

    #[error("Token is in the wrong format, received {0}")]
    WrongFormat(String),

    #[error("Token is missing required properties: sub: {sub}, iss: {iss}, exp: {exp}")]
    MissingRequiredClaims {
        sub: String,
        iss: String,
        exp: String,
    },

    #[error("No Roles configured for user")]
    NoRolesConfigured,

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AdapterError {
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

/// Credentials handed to a provider
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

impl TokenRequest {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A live identity provider able to issue normalized tokens
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange the request's credentials upstream and return a signed token
    async fn get_token(&self, request: &TokenRequest) -> Result<String, AdapterError>;
}
