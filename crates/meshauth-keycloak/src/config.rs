//! Resolved adapter settings

use meshauth_core::config::KeycloakSettings;
use meshauth_core::{Error, RolePolicy};
use url::Url;

/// Settings the adapter needs once every required value is known
#[derive(Clone)]
pub struct KeycloakConfig {
    pub token_endpoint: Url,
    pub client_id: String,
    pub client_secret: String,
    pub role_policy: RolePolicy,
}

impl std::fmt::Debug for KeycloakConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakConfig")
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("role_policy", &self.role_policy)
            .finish()
    }
}

impl KeycloakConfig {
    pub fn from_settings(settings: &KeycloakSettings) -> meshauth_core::Result<Self> {
        let auth_url = settings
            .auth_url
            .as_ref()
            .ok_or_else(|| Error::Config("keycloak auth_url is required".into()))?;
        let realm = required(settings.realm.as_deref(), "realm")?;
        let client_id = required(settings.client_id.as_deref(), "client_id")?;
        let client_secret = settings.client_secret.clone().unwrap_or_default();

        Ok(Self {
            token_endpoint: token_endpoint(auth_url, realm)?,
            client_id: client_id.to_string(),
            client_secret,
            role_policy: settings.role_policy,
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> meshauth_core::Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("keycloak {name} is required")))
}

/// `<auth_url>/realms/<realm>/protocol/openid-connect/token`
pub fn token_endpoint(auth_url: &Url, realm: &str) -> meshauth_core::Result<Url> {
    let base = auth_url.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/realms/{realm}/protocol/openid-connect/token"))
        .map_err(|e| Error::Config(format!("Invalid keycloak token endpoint: {e}")))
}
