//! Key material access

use std::path::{Path, PathBuf};

use super::error::{KeyKind, Result, TokenError};

/// Supplies PEM-encoded key bytes on demand
pub trait KeyMaterial: Send + Sync {
    fn private_key(&self) -> Result<Vec<u8>>;

    fn public_key(&self) -> Result<Vec<u8>>;
}

/// Reads PEM files from disk at every call
#[derive(Debug, Clone)]
pub struct FileKeyMaterial {
    private_key_path: Option<PathBuf>,
    public_key_path: Option<PathBuf>,
}

impl FileKeyMaterial {
    pub fn new(private_key_path: Option<PathBuf>, public_key_path: Option<PathBuf>) -> Self {
        Self {
            private_key_path,
            public_key_path,
        }
    }

    fn read(path: Option<&Path>, kind: KeyKind) -> Result<Vec<u8>> {
        let path = path.ok_or(TokenError::KeyUnavailable(kind))?;
        std::fs::read(path).map_err(|e| {
            tracing::warn!(key = %kind, path = %path.display(), error = %e, "Failed to read key file");
            TokenError::KeyUnavailable(kind)
        })
    }
}

impl KeyMaterial for FileKeyMaterial {
    fn private_key(&self) -> Result<Vec<u8>> {
        Self::read(self.private_key_path.as_deref(), KeyKind::Private)
    }

    fn public_key(&self) -> Result<Vec<u8>> {
        Self::read(self.public_key_path.as_deref(), KeyKind::Public)
    }
}

/// In-memory key pair
#[derive(Clone, Default)]
pub struct StaticKeyMaterial {
    private_key: Option<Vec<u8>>,
    public_key: Option<Vec<u8>>,
}

// Key bytes never reach debug output
impl std::fmt::Debug for StaticKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeyMaterial")
            .field("has_private_key", &self.private_key.is_some())
            .field("has_public_key", &self.public_key.is_some())
            .finish()
    }
}

impl StaticKeyMaterial {
    pub fn new(private_key: impl Into<Vec<u8>>, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            private_key: Some(private_key.into()),
            public_key: Some(public_key.into()),
        }
    }

    /// Verification-only material
    pub fn public_only(public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            private_key: None,
            public_key: Some(public_key.into()),
        }
    }
}

impl KeyMaterial for StaticKeyMaterial {
    fn private_key(&self) -> Result<Vec<u8>> {
        self.private_key
            .clone()
            .ok_or(TokenError::KeyUnavailable(KeyKind::Private))
    }

    fn public_key(&self) -> Result<Vec<u8>> {
        self.public_key
            .clone()
            .ok_or(TokenError::KeyUnavailable(KeyKind::Public))
    }
}
