//! Configuration builder

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::Error;
use crate::tenant::TenantOptions;
use crate::token::{DEFAULT_TENANT_ID, FileKeyMaterial, TokenCodec};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub keys: KeySettings,
    pub providers: Vec<String>,
    pub clock_skew: Duration,
    pub tenant: TenantSettings,
    pub keycloak: KeycloakSettings,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Key material backed by the configured PEM paths
    pub fn key_material(&self) -> FileKeyMaterial {
        FileKeyMaterial::new(
            self.keys.private_key_path.clone(),
            self.keys.public_key_path.clone(),
        )
    }

    pub fn codec(&self) -> TokenCodec {
        TokenCodec::new(Arc::new(self.key_material())).with_leeway(self.clock_skew)
    }

    pub fn tenant_options(&self, authenticated: bool) -> TenantOptions {
        TenantOptions {
            authenticated,
            default_tenant_id: self.tenant.default_tenant_id.clone(),
            tenant_id_header: None,
        }
    }
}

/// PEM locations for the signing key pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySettings {
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSettings {
    pub default_tenant_id: String,
}

/// What the Keycloak adapter does when a user has no realm roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolePolicy {
    /// Refuse to issue a token
    #[default]
    Strict,
    /// Issue a token carrying only resource roles
    Lenient,
}

impl FromStr for RolePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(Error::Config(format!(
                "Unknown role policy '{other}', expected strict or lenient"
            ))),
        }
    }
}

/// Upstream Keycloak connection settings
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeycloakSettings {
    pub auth_url: Option<Url>,
    pub realm: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub role_policy: RolePolicy,
}

impl std::fmt::Debug for KeycloakSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakSettings")
            .field("auth_url", &self.auth_url.as_ref().map(Url::as_str))
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("role_policy", &self.role_policy)
            .finish()
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    keys: KeySettings,
    providers: Vec<String>,
    clock_skew: Duration,
    default_tenant_id: Option<String>,
    keycloak: KeycloakSettings,
    telemetry: TelemetryConfig,
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: KeySettings {
                private_key_path: None,
                public_key_path: None,
            },
            providers: Vec::new(),
            clock_skew: Duration::ZERO,
            default_tenant_id: None,
            keycloak: KeycloakSettings {
                auth_url: None,
                realm: None,
                client_id: None,
                client_secret: None,
                role_policy: RolePolicy::Strict,
            },
            telemetry: TelemetryConfig {
                log_level: String::new(),
                json_logs: false,
            },
        }
    }

    #[must_use]
    pub fn private_key_path(mut self, path: PathBuf) -> Self {
        self.keys.private_key_path = Some(path);
        self
    }

    #[must_use]
    pub fn public_key_path(mut self, path: PathBuf) -> Self {
        self.keys.public_key_path = Some(path);
        self
    }

    /// Replace the provider list
    #[must_use]
    pub fn providers(mut self, names: Vec<String>) -> Self {
        self.providers = names;
        self
    }

    /// Append one provider name
    #[must_use]
    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.providers.push(name.into());
        self
    }

    #[must_use]
    pub const fn clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    #[must_use]
    pub fn default_tenant_id(mut self, tenant_id: String) -> Self {
        self.default_tenant_id = Some(tenant_id);
        self
    }

    // Keycloak adapter settings

    #[must_use]
    pub fn keycloak_auth_url(mut self, url: Url) -> Self {
        self.keycloak.auth_url = Some(url);
        self
    }

    #[must_use]
    pub fn keycloak_realm(mut self, realm: String) -> Self {
        self.keycloak.realm = Some(realm);
        self
    }

    #[must_use]
    pub fn keycloak_client_id(mut self, client_id: String) -> Self {
        self.keycloak.client_id = Some(client_id);
        self
    }

    #[must_use]
    pub fn keycloak_client_secret(mut self, secret: String) -> Self {
        self.keycloak.client_secret = Some(secret);
        self
    }

    #[must_use]
    pub const fn role_policy(mut self, policy: RolePolicy) -> Self {
        self.keycloak.role_policy = policy;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> crate::Result<Config> {
        let default_tenant_id = match self.default_tenant_id {
            Some(id) if id.trim().is_empty() => {
                return Err(Error::Config("default_tenant_id cannot be blank".into()));
            }
            Some(id) => id,
            None => DEFAULT_TENANT_ID.to_string(),
        };

        let mut providers: Vec<String> = Vec::with_capacity(self.providers.len());
        for name in self.providers {
            let name = name.trim().to_string();
            if !name.is_empty() && !providers.contains(&name) {
                providers.push(name);
            }
        }

        let log_level = if self.telemetry.log_level.is_empty() {
            "info".to_string()
        } else {
            self.telemetry.log_level
        };

        Ok(Config {
            keys: self.keys,
            providers,
            clock_skew: self.clock_skew,
            tenant: TenantSettings { default_tenant_id },
            keycloak: self.keycloak,
            telemetry: TelemetryConfig {
                log_level,
                json_logs: self.telemetry.json_logs,
            },
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
