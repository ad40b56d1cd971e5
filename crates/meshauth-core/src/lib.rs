//! Multi-tenant identity token core
//!
//! Signs and verifies normalized identity tokens, answers claim and tenant
//! questions about them, and drives pluggable identity providers through a
//! single registry.

pub mod claims;
pub mod config;
mod error;
pub mod observability;
pub mod provider;
pub mod tenant;
pub mod token;

#[cfg(test)]
mod test_support;

pub use claims::{ClaimValidationResult, validate_token_and_claims};
pub use config::{Config, ConfigBuilder, RolePolicy, TelemetryConfig};
pub use error::{Error, Result};
pub use provider::{
    AdapterError, AuthProvider, LoadError, ProviderConstructor, ProviderLoader, ProviderModule,
    ProviderRegistry, RegistryError, StaticProviderLoader, TokenRequest,
};
pub use tenant::{
    TenantLookup, TenantOptions, TenantValidationResult, extract_tenant,
    validate_and_extract_tenant, validate_token_and_extract_tenant,
};
pub use token::{
    DEFAULT_TENANT_ID, FileKeyMaterial, KeyKind, KeyMaterial, NormalizedToken, StaticKeyMaterial,
    TokenCodec, TokenError, TokenVerifier, VerifiedPayload, pick_tenant_id,
};
