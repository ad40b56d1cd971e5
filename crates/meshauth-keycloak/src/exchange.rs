//! Upstream credential exchange

use async_trait::async_trait;
use meshauth_core::{AdapterError, TokenRequest};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::config::KeycloakConfig;

/// Tokens returned by the upstream identity provider
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamTokens {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl UpstreamTokens {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            refresh_token: None,
        }
    }
}

impl std::fmt::Debug for UpstreamTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamTokens")
            .field("token_type", &self.token_type)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Trades a username and password for upstream tokens
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(&self, request: &TokenRequest) -> Result<UpstreamTokens, AdapterError>;
}

/// Resource-owner password grant against the Keycloak token endpoint
pub struct HttpCredentialExchange {
    config: KeycloakConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpCredentialExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCredentialExchange")
            .field("token_endpoint", &self.config.token_endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpCredentialExchange {
    pub fn new(config: KeycloakConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AdapterError::Upstream(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl CredentialExchange for HttpCredentialExchange {
    async fn exchange(&self, request: &TokenRequest) -> Result<UpstreamTokens, AdapterError> {
        tracing::debug!(
            endpoint = %self.config.token_endpoint,
            username = %request.username,
            "Exchanging credentials with Keycloak"
        );

        let response = self
            .client
            .post(self.config.token_endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(password_grant_form(&self.config, request))
            .send()
            .await
            .map_err(|e| AdapterError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "Keycloak rejected credential exchange");
            return Err(AdapterError::Upstream(format!(
                "token endpoint returned {status}"
            )));
        }

        response
            .json::<UpstreamTokens>()
            .await
            .map_err(|e| AdapterError::Upstream(format!("Invalid token response: {e}")))
    }
}

fn password_grant_form(config: &KeycloakConfig, request: &TokenRequest) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", &config.client_id)
        .append_pair("client_secret", &config.client_secret)
        .append_pair("username", &request.username)
        .append_pair("password", &request.password)
        .append_pair("grant_type", "password")
        .finish()
}
