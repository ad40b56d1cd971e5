//! Provider lifecycle registry

use std::sync::Arc;

use thiserror::Error;

use super::loader::{ProviderConstructor, ProviderLoader};
use super::{AdapterError, AuthProvider, TokenRequest};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No Provider Config")]
    NoProviderConfig,

    #[error(transparent)]
    Provider(#[from] AdapterError),
}

/// Tracks configured, registered and instantiated providers and the single
/// active one.
///
/// Lifecycle violations are reported as `false`, never as errors. Mutating
/// calls take `&mut self`; share a registry behind a lock if several tasks
/// need it.
pub struct ProviderRegistry {
    loader: Arc<dyn ProviderLoader>,
    configured: Vec<String>,
    registered: Vec<(String, ProviderConstructor)>,
    instances: Vec<(String, Box<dyn AuthProvider>)>,
    active: Option<String>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("configured", &self.configured)
            .field("registered", &self.get_registered())
            .field("instances", &self.get_instances())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl ProviderRegistry {
    pub fn new(loader: Arc<dyn ProviderLoader>) -> Self {
        Self {
            loader,
            configured: Vec::new(),
            registered: Vec::new(),
            instances: Vec::new(),
            active: None,
        }
    }

    /// Registry with every name in `names` already configured
    pub fn with_providers<I, S>(loader: Arc<dyn ProviderLoader>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new(loader);
        for name in names {
            registry.configure_provider(name);
        }
        registry
    }

    pub fn configure_provider(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.configured.contains(&name) {
            return false;
        }
        tracing::debug!(provider = %name, "Provider configured");
        self.configured.push(name);
        true
    }

    /// Load the module named `name` and store the constructor its entry
    /// point returns.
    pub async fn register_provider(&mut self, name: &str) -> bool {
        let module = match self.loader.load(name).await {
            Ok(module) => module,
            Err(e) => {
                tracing::warn!(provider = %name, error = %e, "Provider module could not be loaded");
                return false;
            }
        };

        let Some(ctor) = module.register() else {
            tracing::warn!(provider = %name, "Provider module has no register entry point");
            return false;
        };

        match self.registered.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = ctor,
            None => self.registered.push((name.to_string(), ctor)),
        }
        tracing::debug!(provider = %name, "Provider registered");
        true
    }

    /// Build the single instance for `name` and make it active
    pub fn instantiate_provider(&mut self, name: &str) -> bool {
        let Some(ctor) = self
            .registered
            .iter()
            .find_map(|(n, ctor)| (n == name).then_some(ctor))
        else {
            return false;
        };

        if self.instances.iter().any(|(n, _)| n == name) {
            return false;
        }

        let instance = ctor();
        self.instances.push((name.to_string(), instance));
        self.active = Some(name.to_string());
        tracing::info!(provider = %name, "Provider instantiated and active");
        true
    }

    pub fn set_active(&mut self, name: &str) -> bool {
        if !self.instances.iter().any(|(n, _)| n == name) {
            return false;
        }
        self.active = Some(name.to_string());
        true
    }

    /// Register and instantiate every configured provider in order.
    ///
    /// The last provider instantiated ends up active.
    pub async fn init(&mut self) -> Result<(), RegistryError> {
        if self.configured.is_empty() {
            return Err(RegistryError::NoProviderConfig);
        }

        let names = self.configured.clone();
        for name in &names {
            if self.register_provider(name).await {
                self.instantiate_provider(name);
            }
        }

        tracing::info!(
            configured = names.len(),
            instantiated = self.instances.len(),
            active = ?self.active,
            "Provider registry initialised"
        );
        Ok(())
    }

    /// Ask the active provider for a token; `""` when nothing is active
    pub async fn get_token(&self, request: &TokenRequest) -> Result<String, RegistryError> {
        let Some(provider) = self.active_provider() else {
            tracing::debug!("No active provider, returning empty token");
            return Ok(String::new());
        };
        Ok(provider.get_token(request).await?)
    }

    pub fn get_configured(&self) -> Vec<String> {
        self.configured.clone()
    }

    pub fn get_registered(&self) -> Vec<String> {
        self.registered.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn get_instances(&self) -> Vec<String> {
        self.instances.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn get_active(&self) -> Option<String> {
        self.active.clone()
    }

    fn active_provider(&self) -> Option<&dyn AuthProvider> {
        let active = self.active.as_deref()?;
        self.instances
            .iter()
            .find_map(|(n, p)| (n == active).then_some(p.as_ref()))
    }
}
