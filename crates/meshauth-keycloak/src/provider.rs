//! Keycloak implementation of [`AuthProvider`]

use std::sync::Arc;

use async_trait::async_trait;
use meshauth_core::{
    AdapterError, AuthProvider, DEFAULT_TENANT_ID, NormalizedToken, RolePolicy, TokenCodec,
    TokenRequest, pick_tenant_id,
};
use serde_json::Value;

use crate::decode::{UpstreamClaims, decode_unverified, display_claim, string_claim};
use crate::exchange::{CredentialExchange, UpstreamTokens};
use crate::roles::map_roles;

/// Exchanges credentials with Keycloak and re-signs the result locally
pub struct KeycloakProvider {
    exchange: Arc<dyn CredentialExchange>,
    codec: Arc<TokenCodec>,
    role_policy: RolePolicy,
}

impl std::fmt::Debug for KeycloakProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakProvider")
            .field("codec", &self.codec)
            .field("role_policy", &self.role_policy)
            .finish_non_exhaustive()
    }
}

impl KeycloakProvider {
    pub fn new(
        exchange: Arc<dyn CredentialExchange>,
        codec: Arc<TokenCodec>,
        role_policy: RolePolicy,
    ) -> Self {
        Self {
            exchange,
            codec,
            role_policy,
        }
    }

    /// Map upstream tokens onto a [`NormalizedToken`]
    pub fn normalize(&self, tokens: &UpstreamTokens) -> Result<NormalizedToken, AdapterError> {
        normalize(tokens, self.role_policy)
    }
}

#[async_trait]
impl AuthProvider for KeycloakProvider {
    async fn get_token(&self, request: &TokenRequest) -> Result<String, AdapterError> {
        let tokens = self.exchange.exchange(request).await?;
        let record = self.normalize(&tokens)?;

        tracing::debug!(
            subject = %record.subject_id,
            tenant = ?record.tenant_id,
            claims = record.claims.len(),
            "Normalized Keycloak token"
        );

        Ok(self.codec.sign(&record)?)
    }
}

pub fn normalize(
    tokens: &UpstreamTokens,
    role_policy: RolePolicy,
) -> Result<NormalizedToken, AdapterError> {
    let claims = decode_unverified(&tokens.access_token)?;

    let (Some(subject), Some(issuer), Some(expires_at)) = (
        string_claim(&claims, "sub"),
        string_claim(&claims, "iss"),
        expiry(&claims),
    ) else {
        return Err(AdapterError::MissingRequiredClaims {
            sub: display_claim(&claims, "sub"),
            iss: display_claim(&claims, "iss"),
            exp: display_claim(&claims, "exp"),
        });
    };

    let tenant_id = pick_tenant_id(
        claims.get("tenantId").and_then(Value::as_str),
        claims.get("TENANT_ID").and_then(Value::as_str),
    )
    .unwrap_or(DEFAULT_TENANT_ID);

    let roles = map_roles(&claims, role_policy)?;

    Ok(NormalizedToken::new(subject, issuer, expires_at)
        .with_session_id(string_claim(&claims, "sid").unwrap_or_default())
        .with_tenant_id(tenant_id)
        .with_claims(roles)
        .with_raw_token(tokens.access_token.clone()))
}

fn expiry(claims: &UpstreamClaims) -> Option<i64> {
    let exp = claims.get("exp")?;
    exp.as_i64()
        .or_else(|| exp.as_f64().map(|f| f as i64))
        .filter(|e| *e != 0)
}
