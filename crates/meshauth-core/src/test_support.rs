//! Shared fixtures for unit tests

use std::sync::Arc;

use crate::token::{
    NormalizedToken, Result, StaticKeyMaterial, TokenCodec, TokenError, TokenVerifier,
    VerifiedPayload, unix_now,
};

pub const PRIVATE_KEY: &[u8] = include_bytes!("../testdata/private_key.pem");
pub const PUBLIC_KEY: &[u8] = include_bytes!("../testdata/public_key.pem");
pub const OTHER_PRIVATE_KEY: &[u8] = include_bytes!("../testdata/other_private_key.pem");

pub fn codec() -> TokenCodec {
    TokenCodec::new(Arc::new(StaticKeyMaterial::new(PRIVATE_KEY, PUBLIC_KEY)))
}

pub fn sample_token() -> NormalizedToken {
    NormalizedToken::new("user-1", "https://idp.example.com/realms/mesh", unix_now() + 3600)
        .with_session_id("session-1")
        .with_tenant_id("tenant-a")
        .with_claims(["read"])
        .with_raw_token("upstream.access.token")
}

/// Verifier returning a canned outcome regardless of input
#[derive(Debug)]
pub enum StubVerifier {
    Valid(NormalizedToken),
    Malformed,
    Fails(&'static str),
    Panics(&'static str),
}

impl TokenVerifier for StubVerifier {
    fn verify(&self, _token: &str) -> Result<VerifiedPayload> {
        match self {
            Self::Valid(token) => Ok(VerifiedPayload::Valid(token.clone())),
            Self::Malformed => Ok(VerifiedPayload::Malformed("somestring".to_string())),
            Self::Fails(reason) => Err(TokenError::unauthorized(*reason)),
            Self::Panics(message) => panic!("{message}"),
        }
    }
}
