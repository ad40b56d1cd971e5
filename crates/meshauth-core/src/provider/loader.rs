//! Provider module loading boundary

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::AuthProvider;

/// Builds a fresh provider instance
pub type ProviderConstructor = Arc<dyn Fn() -> Box<dyn AuthProvider> + Send + Sync>;

type EntryPoint = Arc<dyn Fn() -> ProviderConstructor + Send + Sync>;

/// Wrap a closure producing a concrete provider as a [`ProviderConstructor`]
pub fn constructor<P, F>(build: F) -> ProviderConstructor
where
    P: AuthProvider + 'static,
    F: Fn() -> P + Send + Sync + 'static,
{
    Arc::new(move || Box::new(build()) as Box<dyn AuthProvider>)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Provider module not found: {0}")]
    NotFound(String),

    #[error("Failed to load provider module {name}: {reason}")]
    Failed { name: String, reason: String },
}

/// A loaded provider package
///
/// The `register` entry point is optional; a module without one is loadable
/// but cannot be registered.
#[derive(Clone, Default)]
pub struct ProviderModule {
    entry_point: Option<EntryPoint>,
}

impl std::fmt::Debug for ProviderModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderModule")
            .field("has_entry_point", &self.has_entry_point())
            .finish()
    }
}

impl ProviderModule {
    pub fn new<F>(register: F) -> Self
    where
        F: Fn() -> ProviderConstructor + Send + Sync + 'static,
    {
        Self {
            entry_point: Some(Arc::new(register)),
        }
    }

    /// Module whose entry point always hands out the same constructor
    pub fn from_constructor(ctor: ProviderConstructor) -> Self {
        Self::new(move || Arc::clone(&ctor))
    }

    pub fn without_entry_point() -> Self {
        Self::default()
    }

    pub const fn has_entry_point(&self) -> bool {
        self.entry_point.is_some()
    }

    /// Invoke the entry point, if any
    pub fn register(&self) -> Option<ProviderConstructor> {
        self.entry_point.as_ref().map(|entry| entry())
    }
}

/// Resolves provider modules by name
#[async_trait]
pub trait ProviderLoader: Send + Sync {
    async fn load(&self, name: &str) -> Result<ProviderModule, LoadError>;
}

/// Compile-time registration table
#[derive(Debug, Clone, Default)]
pub struct StaticProviderLoader {
    modules: HashMap<String, ProviderModule>,
}

impl StaticProviderLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>, module: ProviderModule) -> Self {
        self.insert(name, module);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, module: ProviderModule) {
        self.modules.insert(name.into(), module);
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl ProviderLoader for StaticProviderLoader {
    async fn load(&self, name: &str) -> Result<ProviderModule, LoadError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AdapterError, TokenRequest};

    struct Fixed;

    #[async_trait]
    impl AuthProvider for Fixed {
        async fn get_token(&self, _request: &TokenRequest) -> Result<String, AdapterError> {
            Ok("fixed".to_string())
        }
    }

    #[tokio::test]
    async fn test_static_loader_resolves_registered_module() {
        let loader = StaticProviderLoader::new()
            .with_module("fixed", ProviderModule::from_constructor(constructor(|| Fixed)));

        let module = loader.load("fixed").await.unwrap();
        let ctor = module.register().unwrap();
        let provider = ctor();
        let token = provider
            .get_token(&TokenRequest::password("u", "p"))
            .await
            .unwrap();
        assert_eq!(token, "fixed");
    }

    #[tokio::test]
    async fn test_static_loader_unknown_name() {
        let loader = StaticProviderLoader::new();
        assert_eq!(
            loader.load("missing").await.unwrap_err(),
            LoadError::NotFound("missing".into())
        );
    }

    #[test]
    fn test_module_without_entry_point() {
        let module = ProviderModule::without_entry_point();
        assert!(!module.has_entry_point());
        assert!(module.register().is_none());
        assert!(format!("{module:?}").contains("false"));
    }

    #[test]
    fn test_loader_names_sorted() {
        let loader = StaticProviderLoader::new()
            .with_module("zeta", ProviderModule::without_entry_point())
            .with_module("alpha", ProviderModule::without_entry_point());
        assert_eq!(loader.names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Failed {
            name: "keycloak".into(),
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "Failed to load provider module keycloak: boom");
    }
}
