//! Normalized token model and codec
//!
//! Every upstream identity provider is mapped onto [`NormalizedToken`], which
//! is then re-signed locally with RS256 by [`TokenCodec`].

mod codec;
mod error;
mod keys;

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use codec::{TokenCodec, TokenVerifier};
pub use error::{KeyKind, Result, TokenError};
pub use keys::{FileKeyMaterial, KeyMaterial, StaticKeyMaterial};

/// Tenant assigned when neither the request nor the token names one
pub const DEFAULT_TENANT_ID: &str = "DEFAULT";

/// Canonical internal token record
///
/// Serialized field names form the public payload of signed tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedToken {
    #[serde(rename = "clientId")]
    pub subject_id: String,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "sid", default)]
    pub session_id: String,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Older tokens carry the tenant under this name
    #[serde(rename = "TENANT_ID", default, skip_serializing_if = "Option::is_none")]
    pub legacy_tenant_id: Option<String>,
    #[serde(default)]
    pub claims: BTreeSet<String>,
    #[serde(rename = "tokenString", default)]
    pub raw_token_string: String,
}

impl NormalizedToken {
    pub fn new(
        subject_id: impl Into<String>,
        issuer: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            issuer: issuer.into(),
            session_id: String::new(),
            expires_at,
            tenant_id: None,
            legacy_tenant_id: None,
            claims: BTreeSet::new(),
            raw_token_string: String::new(),
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn with_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims = claims.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_raw_token(mut self, raw: impl Into<String>) -> Self {
        self.raw_token_string = raw.into();
        self
    }

    pub fn has_claim(&self, claim: &str) -> bool {
        self.claims.contains(claim)
    }

    /// Tenant id with the legacy `TENANT_ID` field as fallback
    pub fn resolved_tenant_id(&self) -> Option<&str> {
        pick_tenant_id(self.tenant_id.as_deref(), self.legacy_tenant_id.as_deref())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Outcome of a successful signature check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedPayload {
    Valid(NormalizedToken),
    /// Signature held but the payload was a bare string, not a record
    Malformed(String),
}

impl VerifiedPayload {
    pub const fn token(&self) -> Option<&NormalizedToken> {
        match self {
            Self::Valid(token) => Some(token),
            Self::Malformed(_) => None,
        }
    }

    pub fn into_token(self) -> Option<NormalizedToken> {
        match self {
            Self::Valid(token) => Some(token),
            Self::Malformed(_) => None,
        }
    }
}

/// Choose between the `tenantId` and legacy `TENANT_ID` values.
///
/// An empty string counts as absent, so `{tenantId: "", TENANT_ID: "x"}`
/// resolves to `x`. Whitespace is kept; callers trim as they see fit.
pub fn pick_tenant_id<'a>(tenant_id: Option<&'a str>, legacy: Option<&'a str>) -> Option<&'a str> {
    tenant_id
        .filter(|t| !t.is_empty())
        .or_else(|| legacy.filter(|t| !t.is_empty()))
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}
