// SPDX-License-Identifier: Apache-2.0

//! Token, header and status commands.

use adoauth_core::auth::{EnvSecretSource, secrets::resolve_pat};
use adoauth_core::{
    AuthConfig, AuthMode, TokenProviderFactory, auth_headers, build_authorization_header,
};
use anyhow::Result;
use console::style;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::cli::OutputFormat;

/// User agent sent alongside the Authorization header.
const USER_AGENT: &str = concat!("adoauth/", env!("CARGO_PKG_VERSION"));

async fn fetch_token(settings: &AuthConfig) -> Result<SecretString> {
    debug!(
        auth_type = %settings.auth_type,
        tenant = ?settings.tenant,
        no_cache = settings.no_cache,
        "Resolving token"
    );
    let provider = TokenProviderFactory::default().create(
        settings.auth_type,
        settings.tenant.as_deref(),
        settings.no_cache,
    )?;
    Ok(provider.get_token().await?)
}

/// Run the token command - print the raw token string.
pub async fn run_token(settings: &AuthConfig, output: OutputFormat) -> Result<()> {
    let token = fetch_token(settings).await?;

    match output {
        OutputFormat::Text => println!("{}", token.expose_secret()),
        OutputFormat::Json => println!(
            "{}",
            json!({
                "auth_type": settings.auth_type,
                "token": token.expose_secret(),
            })
        ),
    }
    Ok(())
}

/// Run the header command - print the Authorization header value.
pub async fn run_header(settings: &AuthConfig, output: OutputFormat) -> Result<()> {
    let token = fetch_token(settings).await?;

    match output {
        OutputFormat::Text => println!("{}", build_authorization_header(&token)),
        OutputFormat::Json => {
            let headers = auth_headers(&token, USER_AGENT);
            let authorization = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let user_agent = headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            println!(
                "{}",
                json!({
                    "authorization": authorization,
                    "user_agent": user_agent,
                })
            );
        }
    }
    Ok(())
}

/// Run the status command - show effective settings without requesting a token.
pub fn run_status(settings: &AuthConfig, output: OutputFormat) {
    let pat_source = (settings.auth_type == AuthMode::PreSharedSecret)
        .then(|| resolve_pat(&EnvSecretSource).map(|(_, name)| name))
        .flatten();

    match output {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "auth_type": settings.auth_type,
                "tenant": settings.tenant,
                "no_cache": settings.no_cache,
                "pat_source": pat_source,
            })
        ),
        OutputFormat::Text => {
            println!("{} {}", style("Auth type:").bold(), settings.auth_type);
            println!(
                "{} {}",
                style("Tenant:").bold(),
                settings.tenant.as_deref().unwrap_or("(default)")
            );
            println!("{} {}", style("No cache:").bold(), settings.no_cache);
            if settings.auth_type == AuthMode::PreSharedSecret {
                match pat_source {
                    Some(name) => println!("{} {name}", style("PAT source:").bold()),
                    None => println!(
                        "{} no PAT found in the environment",
                        style("!").yellow().bold()
                    ),
                }
            }
        }
    }
}
