use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use meshauth_core::config::{self, Config};
use meshauth_core::observability::init_logging;
use meshauth_core::provider::list_available_providers;
use meshauth_core::{
    ProviderRegistry, StaticProviderLoader, TenantOptions, TokenRequest,
    validate_and_extract_tenant, validate_token_and_claims,
};

#[derive(Parser, Debug)]
#[command(name = "meshauth")]
#[command(about = "Issue and validate multi-tenant identity tokens", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials with the active provider and print a signed token
    Token {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "MESHAUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Verify a token and print its payload
    Verify { token: String },

    /// Report which of the given claims a token carries
    Claims {
        token: String,

        #[arg(required = true)]
        claims: Vec<String>,
    },

    /// Resolve the tenant for a request
    Tenant {
        /// Raw Authorization header value
        #[arg(long)]
        header: Option<String>,

        /// Require a verified bearer token
        #[arg(long)]
        authenticated: bool,

        /// Tenant header value for unauthenticated requests
        #[arg(long)]
        tenant_header: Option<String>,
    },

    /// List provider candidates from a Cargo manifest
    Providers {
        #[arg(long, default_value = "Cargo.toml")]
        manifest: PathBuf,

        #[arg(long, default_value = "")]
        filter: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration with precedence: env > file > defaults, CLI flags on top
    let mut builder = if let Some(ref path) = args.config {
        config::load_config_from_path(path)?
    } else {
        config::load_config()?
    };

    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }
    if args.json_logs {
        builder = builder.json_logs(true);
    }

    let config = builder.build()?;
    init_logging(&config.telemetry)?;

    tracing::debug!(?config, "Configuration loaded");

    match args.command {
        Command::Token { username, password } => {
            let token = issue_token(&config, TokenRequest::password(username, password)).await?;
            if token.is_empty() {
                anyhow::bail!("No active provider; configure one via AUTH_PROVIDERS");
            }
            println!("{token}");
        }
        Command::Verify { token } => {
            let Some(record) = config.codec().verify(&token)?.into_token() else {
                anyhow::bail!("Token payload is not a token record");
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Claims { token, claims } => {
            let result = validate_token_and_claims(&config.codec(), &token, &claims)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Tenant {
            header,
            authenticated,
            tenant_header,
        } => {
            let mut options: TenantOptions = config.tenant_options(authenticated);
            if let Some(value) = tenant_header {
                options = options.with_tenant_id_header(value);
            }
            let result = validate_and_extract_tenant(&config.codec(), header.as_deref(), &options);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Providers { manifest, filter } => {
            for name in list_available_providers(&manifest, &filter) {
                println!("{name}");
            }
        }
    }

    Ok(())
}

async fn issue_token(config: &Config, request: TokenRequest) -> anyhow::Result<String> {
    let mut loader = StaticProviderLoader::new();
    if config.providers.iter().any(|p| p == meshauth_keycloak::PROVIDER_NAME) {
        let module = meshauth_keycloak::register(&config.keycloak, Arc::new(config.key_material()))?;
        loader.insert(meshauth_keycloak::PROVIDER_NAME, module);
    }
    tracing::debug!(modules = ?loader.names(), "Provider modules available");

    let mut registry = ProviderRegistry::with_providers(Arc::new(loader), config.providers.clone());
    registry.init().await?;

    tracing::info!(active = ?registry.get_active(), "Requesting token");
    Ok(registry.get_token(&request).await?)
}
