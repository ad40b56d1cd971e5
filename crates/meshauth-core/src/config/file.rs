//! TOML configuration file loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::builder::{ConfigBuilder, RolePolicy};
use crate::Result;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./meshauth.toml",
    "~/.config/meshauth/config.toml",
    "/etc/meshauth/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(keys) = config.keys {
        if let Some(path) = keys.private_key_path {
            builder = builder.private_key_path(path);
        }

        if let Some(path) = keys.public_key_path {
            builder = builder.public_key_path(path);
        }

        if let Some(secs) = keys.clock_skew_secs {
            builder = builder.clock_skew(Duration::from_secs(secs));
        }
    }

    if let Some(providers) = config.providers
        && let Some(enabled) = providers.enabled
    {
        builder = builder.providers(enabled);
    }

    if let Some(tenant) = config.tenant
        && let Some(id) = tenant.default_tenant_id
    {
        builder = builder.default_tenant_id(id);
    }

    if let Some(kc) = config.keycloak {
        if let Some(url_str) = kc.auth_url {
            let url = Url::parse(&url_str)
                .map_err(|e| crate::Error::Config(format!("Invalid keycloak auth_url: {e}")))?;
            builder = builder.keycloak_auth_url(url);
        }

        if let Some(realm) = kc.realm {
            builder = builder.keycloak_realm(realm);
        }

        if let Some(client_id) = kc.client_id {
            builder = builder.keycloak_client_id(client_id);
        }

        if let Some(secret) = kc.client_secret {
            builder = builder.keycloak_client_secret(secret);
        }

        if let Some(policy) = kc.role_policy {
            builder = builder.role_policy(policy.parse::<RolePolicy>()?);
        }
    }

    if let Some(obs) = config.observability {
        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    keys: Option<KeysConfig>,
    providers: Option<ProvidersConfig>,
    tenant: Option<TenantConfig>,
    keycloak: Option<KeycloakConfig>,
    observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Deserialize)]
struct KeysConfig {
    private_key_path: Option<PathBuf>,
    public_key_path: Option<PathBuf>,
    clock_skew_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProvidersConfig {
    enabled: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TenantConfig {
    default_tenant_id: Option<String>,
}

#[derive(Deserialize)]
struct KeycloakConfig {
    auth_url: Option<String>,
    realm: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    role_policy: Option<String>,
}

impl std::fmt::Debug for KeycloakConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakConfig")
            .field("auth_url", &self.auth_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("role_policy", &self.role_policy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    log_level: Option<String>,
    json_logs: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[keys]
private_key_path = "/etc/meshauth/private.pem"
public_key_path = "/etc/meshauth/public.pem"
clock_skew_secs = 5

[providers]
enabled = ["keycloak"]

[tenant]
default_tenant_id = "acme"

[keycloak]
auth_url = "https://sso.example.com"
realm = "mesh"
client_id = "gateway"
client_secret = "hunter2"
role_policy = "lenient"

[observability]
log_level = "warn"
json_logs = true
"#;

        let file = create_temp_config(toml_content);
        let config = load_from_file(file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            config.keys.private_key_path,
            Some(PathBuf::from("/etc/meshauth/private.pem"))
        );
        assert_eq!(config.clock_skew, Duration::from_secs(5));
        assert_eq!(config.providers, vec!["keycloak"]);
        assert_eq!(config.tenant.default_tenant_id, "acme");
        assert_eq!(config.keycloak.realm.as_deref(), Some("mesh"));
        assert_eq!(config.keycloak.client_secret.as_deref(), Some("hunter2"));
        assert_eq!(config.keycloak.role_policy, RolePolicy::Lenient);
        assert_eq!(config.telemetry.log_level, "warn");
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_parse_partial_config() {
        let file = create_temp_config("[providers]\nenabled = [\"a\", \"b\"]\n");
        let config = load_from_file(file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.providers, vec!["a", "b"]);
        assert_eq!(config.tenant.default_tenant_id, "DEFAULT");
        assert_eq!(config.keycloak.role_policy, RolePolicy::Strict);
    }

    #[test]
    fn test_empty_config_file() {
        let file = create_temp_config("");
        assert!(load_from_file(file.path(), ConfigBuilder::new()).is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let file = create_temp_config("[keys\nprivate_key_path = ");
        let err = load_from_file(file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_invalid_auth_url() {
        let file = create_temp_config("[keycloak]\nauth_url = \"::nope\"\n");
        let err = load_from_file(file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Invalid keycloak auth_url"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_from_file(Path::new("/nonexistent/meshauth.toml"), ConfigBuilder::new())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_keycloak_file_config_debug_hides_secret() {
        let kc = KeycloakConfig {
            auth_url: None,
            realm: None,
            client_id: Some("gateway".into()),
            client_secret: Some("hunter2".into()),
            role_policy: None,
        };
        assert!(!format!("{kc:?}").contains("hunter2"));
    }
}
