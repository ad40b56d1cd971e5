//! Keycloak identity adapter
//!
//! Exchanges a username and password for a Keycloak access token, maps its
//! roles and tenant onto a [`meshauth_core::NormalizedToken`] and signs that
//! with the local key pair.
//!
//! ```ignore
//! let module = meshauth_keycloak::register(&config.keycloak, Arc::new(config.key_material()))?;
//! let loader = StaticProviderLoader::new().with_module(meshauth_keycloak::PROVIDER_NAME, module);
//! let mut registry = ProviderRegistry::with_providers(Arc::new(loader), ["keycloak"]);
//! registry.init().await?;
//! ```

mod config;
mod decode;
mod exchange;
mod provider;
mod roles;

use std::sync::Arc;

use meshauth_core::config::KeycloakSettings;
use meshauth_core::provider::constructor;
use meshauth_core::{KeyMaterial, ProviderModule, RolePolicy, TokenCodec};

pub use config::{KeycloakConfig, token_endpoint};
pub use decode::{UpstreamClaims, decode_unverified};
pub use exchange::{CredentialExchange, HttpCredentialExchange, UpstreamTokens};
pub use provider::{KeycloakProvider, normalize};
pub use roles::map_roles;

/// Name the adapter is loaded under
pub const PROVIDER_NAME: &str = "keycloak";

/// Provider module talking to the Keycloak instance described by `settings`
pub fn register(
    settings: &KeycloakSettings,
    keys: Arc<dyn KeyMaterial>,
) -> meshauth_core::Result<ProviderModule> {
    let config = KeycloakConfig::from_settings(settings)?;
    let role_policy = config.role_policy;
    let exchange = HttpCredentialExchange::new(config)
        .map_err(|e| meshauth_core::Error::Config(e.to_string()))?;

    Ok(register_with(
        Arc::new(exchange),
        Arc::new(TokenCodec::new(keys)),
        role_policy,
    ))
}

/// Provider module over an arbitrary credential exchange
pub fn register_with(
    exchange: Arc<dyn CredentialExchange>,
    codec: Arc<TokenCodec>,
    role_policy: RolePolicy,
) -> ProviderModule {
    ProviderModule::from_constructor(constructor(move || {
        KeycloakProvider::new(Arc::clone(&exchange), Arc::clone(&codec), role_policy)
    }))
}
