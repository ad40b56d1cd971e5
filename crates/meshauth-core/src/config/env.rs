//! Environment variable loading for configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::builder::{ConfigBuilder, RolePolicy};
use crate::Result;

/// Environment variable names
mod vars {
    pub const CERT_PATH_PRIVATE: &str = "CERT_PATH_PRIVATE";
    pub const CERT_PATH_PUBLIC: &str = "CERT_PATH_PUBLIC";
    pub const AUTH_PROVIDERS: &str = "AUTH_PROVIDERS";
    pub const AUTH_CLOCK_SKEW_SECS: &str = "AUTH_CLOCK_SKEW_SECS";
    pub const AUTH_DEFAULT_TENANT_ID: &str = "AUTH_DEFAULT_TENANT_ID";
    pub const AUTH_URL: &str = "AUTH_URL";
    pub const KEYCLOAK_REALM: &str = "KEYCLOAK_REALM";
    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
    pub const KEYCLOAK_ROLE_POLICY: &str = "KEYCLOAK_ROLE_POLICY";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const MESHAUTH_JSON_LOGS: &str = "MESHAUTH_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Key material
    if let Ok(path) = env::var(vars::CERT_PATH_PRIVATE) {
        builder = builder.private_key_path(PathBuf::from(path));
    }

    if let Ok(path) = env::var(vars::CERT_PATH_PUBLIC) {
        builder = builder.public_key_path(PathBuf::from(path));
    }

    // Providers
    if let Ok(list) = env::var(vars::AUTH_PROVIDERS) {
        let names: Vec<String> = list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        builder = builder.providers(names);
    }

    if let Ok(secs_str) = env::var(vars::AUTH_CLOCK_SKEW_SECS)
        && let Ok(secs) = secs_str.parse::<u64>()
    {
        builder = builder.clock_skew(Duration::from_secs(secs));
    }

    if let Ok(tenant_id) = env::var(vars::AUTH_DEFAULT_TENANT_ID) {
        builder = builder.default_tenant_id(tenant_id);
    }

    // Keycloak
    if let Ok(url_str) = env::var(vars::AUTH_URL) {
        let url = Url::parse(&url_str)
            .map_err(|e| crate::Error::Config(format!("Invalid {}: {}", vars::AUTH_URL, e)))?;
        builder = builder.keycloak_auth_url(url);
    }

    if let Ok(realm) = env::var(vars::KEYCLOAK_REALM) {
        builder = builder.keycloak_realm(realm);
    }

    if let Ok(client_id) = env::var(vars::CLIENT_ID) {
        builder = builder.keycloak_client_id(client_id);
    }

    if let Ok(secret) = env::var(vars::CLIENT_SECRET) {
        builder = builder.keycloak_client_secret(secret);
    }

    if let Ok(policy) = env::var(vars::KEYCLOAK_ROLE_POLICY) {
        builder = builder.role_policy(policy.parse::<RolePolicy>()?);
    }

    // Telemetry
    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::MESHAUTH_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        vars::CERT_PATH_PRIVATE,
        vars::CERT_PATH_PUBLIC,
        vars::AUTH_PROVIDERS,
        vars::AUTH_CLOCK_SKEW_SECS,
        vars::AUTH_DEFAULT_TENANT_ID,
        vars::AUTH_URL,
        vars::KEYCLOAK_REALM,
        vars::CLIENT_ID,
        vars::CLIENT_SECRET,
        vars::KEYCLOAK_ROLE_POLICY,
        vars::RUST_LOG,
        vars::MESHAUTH_JSON_LOGS,
    ];

    /// Run `f` with exactly `vars` set among the variables this module reads
    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_MUTEX.lock().unwrap();

        let old_values: Vec<_> = ALL_VARS.iter().map(|k| (*k, env::var(k).ok())).collect();

        for key in ALL_VARS {
            // SAFETY: We hold a mutex lock to ensure no concurrent modifications
            unsafe { env::remove_var(key) };
        }
        for (key, value) in vars {
            // SAFETY: We hold a mutex lock to ensure no concurrent modifications
            unsafe { env::set_var(key, value) };
        }

        let result = f();

        for (key, old_value) in old_values {
            match old_value {
                // SAFETY: We hold a mutex lock to ensure no concurrent modifications
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_load_nothing_set() {
        let config = with_env_vars(&[], || load_from_env(ConfigBuilder::new()))
            .unwrap()
            .build()
            .unwrap();
        assert!(config.providers.is_empty());
        assert!(config.keys.private_key_path.is_none());
        assert_eq!(config.tenant.default_tenant_id, "DEFAULT");
    }

    #[test]
    fn test_load_full_env() {
        let config = with_env_vars(
            &[
                (vars::CERT_PATH_PRIVATE, "/keys/private.pem"),
                (vars::CERT_PATH_PUBLIC, "/keys/public.pem"),
                (vars::AUTH_PROVIDERS, "keycloak, ,ldap"),
                (vars::AUTH_CLOCK_SKEW_SECS, "15"),
                (vars::AUTH_DEFAULT_TENANT_ID, "tenant-zero"),
                (vars::AUTH_URL, "https://sso.example.com/auth"),
                (vars::KEYCLOAK_REALM, "mesh"),
                (vars::CLIENT_ID, "gateway"),
                (vars::CLIENT_SECRET, "secret"),
                (vars::KEYCLOAK_ROLE_POLICY, "lenient"),
                (vars::RUST_LOG, "debug"),
                (vars::MESHAUTH_JSON_LOGS, "yes"),
            ],
            || load_from_env(ConfigBuilder::new()),
        )
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(
            config.keys.private_key_path,
            Some(PathBuf::from("/keys/private.pem"))
        );
        assert_eq!(
            config.keys.public_key_path,
            Some(PathBuf::from("/keys/public.pem"))
        );
        assert_eq!(config.providers, vec!["keycloak", "ldap"]);
        assert_eq!(config.clock_skew, Duration::from_secs(15));
        assert_eq!(config.tenant.default_tenant_id, "tenant-zero");
        assert_eq!(
            config.keycloak.auth_url.as_ref().map(Url::as_str),
            Some("https://sso.example.com/auth")
        );
        assert_eq!(config.keycloak.realm.as_deref(), Some("mesh"));
        assert_eq!(config.keycloak.client_id.as_deref(), Some("gateway"));
        assert_eq!(config.keycloak.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.keycloak.role_policy, RolePolicy::Lenient);
        assert_eq!(config.telemetry.log_level, "debug");
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_invalid_auth_url() {
        let result = with_env_vars(&[(vars::AUTH_URL, "not a url")], || {
            load_from_env(ConfigBuilder::new())
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains(vars::AUTH_URL));
    }

    #[test]
    fn test_invalid_role_policy() {
        let result = with_env_vars(&[(vars::KEYCLOAK_ROLE_POLICY, "maybe")], || {
            load_from_env(ConfigBuilder::new())
        });
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_unparseable_clock_skew_is_ignored() {
        let config = with_env_vars(&[(vars::AUTH_CLOCK_SKEW_SECS, "soon")], || {
            load_from_env(ConfigBuilder::new())
        })
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(config.clock_skew, Duration::ZERO);
    }
}
