// SPDX-License-Identifier: Apache-2.0

//! Externally delegated bearer credentials.
//!
//! Backs the `azcli` and `env` auth modes. Each [`TokenCredential`] owns its
//! own caching; callers simply ask for a token over a scope list every time.
//! Credentials compose through [`ChainedTokenCredential`], which tries its
//! members in order until one yields a token.

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::AuthMode;
use super::secrets::SecretSource;

/// Environment variable holding a pre-issued Azure DevOps bearer token.
pub const ACCESS_TOKEN_ENV_VAR: &str = "AZURE_DEVOPS_ACCESS_TOKEN";

#[cfg(windows)]
const AZ_PROGRAM: &str = "az.cmd";
#[cfg(not(windows))]
const AZ_PROGRAM: &str = "az";

/// A bearer token returned by a credential backend.
#[derive(Clone)]
pub struct AccessToken {
    /// The bearer token value.
    pub token: SecretString,
    /// Expiry as seconds since the Unix epoch, when the backend reports it.
    pub expires_on: Option<u64>,
}

impl AccessToken {
    /// Creates a token without expiry information.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_on: None,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// A source of bearer tokens for a list of scopes.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Requests a token for `scopes`.
    ///
    /// Returns `Ok(None)` when the source is reachable but has nothing to
    /// offer, and `Err` when the source itself failed.
    async fn get_token(&self, scopes: &[&str]) -> Result<Option<AccessToken>>;
}

/// Tries a list of credentials in order until one produces a token.
pub struct ChainedTokenCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
}

impl ChainedTokenCredential {
    /// Creates a chain from `sources`, highest priority first.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl TokenCredential for ChainedTokenCredential {
    fn name(&self) -> &str {
        "chained"
    }

    #[instrument(skip(self), fields(members = self.sources.len()))]
    async fn get_token(&self, scopes: &[&str]) -> Result<Option<AccessToken>> {
        let mut last_error = None;

        for source in &self.sources {
            match source.get_token(scopes).await {
                Ok(Some(token)) => {
                    debug!(credential = source.name(), "Credential produced a token");
                    return Ok(Some(token));
                }
                Ok(None) => {
                    debug!(credential = source.name(), "Credential had no token");
                }
                Err(e) => {
                    debug!(credential = source.name(), error = %e, "Credential failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Output of `az account get-access-token --output json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenOutput {
    access_token: String,
    #[serde(rename = "expires_on")]
    expires_on: Option<u64>,
}

/// Acquires tokens from the Azure CLI (`az account get-access-token`).
#[derive(Debug, Clone, Default)]
pub struct AzureCliCredential {
    tenant_id: Option<String>,
}

impl AzureCliCredential {
    /// Creates a credential using the CLI's current tenant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a credential scoped to `tenant_id`.
    #[must_use]
    pub fn with_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
        }
    }
}

/// Converts a `.default` scope into the resource the Azure CLI expects.
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

fn validate_tenant_id(tenant_id: &str) -> Result<()> {
    let valid = !tenant_id.is_empty()
        && tenant_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !valid {
        bail!("Invalid tenant id '{tenant_id}': only alphanumerics, '-' and '.' are allowed");
    }
    Ok(())
}

fn parse_cli_output(stdout: &[u8]) -> Result<AccessToken> {
    let output: CliTokenOutput =
        serde_json::from_slice(stdout).context("Failed to parse Azure CLI token output")?;
    Ok(AccessToken {
        token: SecretString::from(output.access_token),
        expires_on: output.expires_on,
    })
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &str {
        "azure_cli"
    }

    #[instrument(skip(self), fields(tenant = ?self.tenant_id))]
    async fn get_token(&self, scopes: &[&str]) -> Result<Option<AccessToken>> {
        let [scope] = scopes else {
            bail!("Azure CLI credential accepts exactly one scope, got {}", scopes.len());
        };

        let mut command = Command::new(AZ_PROGRAM);
        command
            .args(["account", "get-access-token", "--output", "json", "--resource"])
            .arg(scope_to_resource(scope))
            .stdin(Stdio::null());
        if let Some(tenant) = &self.tenant_id {
            validate_tenant_id(tenant)?;
            command.arg("--tenant").arg(tenant);
        }

        debug!("Requesting token from Azure CLI");
        let output = command
            .output()
            .await
            .context("Failed to execute Azure CLI - is `az` installed and on PATH?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Azure CLI could not provide a token ({}): {} - run `az login`",
                output.status,
                stderr.trim()
            ));
        }

        let token = parse_cli_output(&output.stdout)?;
        if token.token.expose_secret().is_empty() {
            debug!("Azure CLI returned an empty token");
            return Ok(None);
        }
        Ok(Some(token))
    }
}

/// Reads a pre-issued bearer token from [`ACCESS_TOKEN_ENV_VAR`].
pub struct EnvironmentCredential {
    source: Arc<dyn SecretSource>,
}

impl EnvironmentCredential {
    /// Creates a credential reading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn SecretSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    fn name(&self) -> &str {
        "environment"
    }

    async fn get_token(&self, _scopes: &[&str]) -> Result<Option<AccessToken>> {
        let token = self
            .source
            .get(ACCESS_TOKEN_ENV_VAR)
            .map(|raw| raw.trim().to_owned())
            .filter(|t| !t.is_empty());

        if token.is_none() {
            debug!(var = ACCESS_TOKEN_ENV_VAR, "No access token in environment");
        }
        Ok(token.map(AccessToken::new))
    }
}

/// Builds the credential chains used by the `azcli` and `env` modes.
pub trait CredentialChainFactory: Send + Sync {
    /// The generic fallback credential for `mode`.
    fn default_chain(&self, mode: AuthMode) -> Arc<dyn TokenCredential>;

    /// A CLI credential pinned to `tenant_id`.
    fn cli_credential(&self, tenant_id: &str) -> Arc<dyn TokenCredential>;
}

/// Default chains backed by the Azure CLI and the process environment.
///
/// - `azcli`: developer tools only (`[azure_cli]`)
/// - `env`: `[environment, azure_cli]`
pub struct DefaultCredentialChainFactory {
    secrets: Arc<dyn SecretSource>,
}

impl DefaultCredentialChainFactory {
    /// Creates a factory whose environment credential reads from `secrets`.
    #[must_use]
    pub fn new(secrets: Arc<dyn SecretSource>) -> Self {
        Self { secrets }
    }
}

impl CredentialChainFactory for DefaultCredentialChainFactory {
    fn default_chain(&self, mode: AuthMode) -> Arc<dyn TokenCredential> {
        let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::new();
        match mode {
            AuthMode::Environment => {
                sources.push(Arc::new(EnvironmentCredential::new(Arc::clone(
                    &self.secrets,
                ))));
                sources.push(Arc::new(AzureCliCredential::new()));
            }
            AuthMode::AzureCli => sources.push(Arc::new(AzureCliCredential::new())),
            AuthMode::Interactive | AuthMode::PreSharedSecret => {
                warn!(mode = %mode, "Requested a credential chain for a non-delegated mode");
            }
        }
        Arc::new(ChainedTokenCredential::new(sources))
    }

    fn cli_credential(&self, tenant_id: &str) -> Arc<dyn TokenCredential> {
        Arc::new(AzureCliCredential::with_tenant(tenant_id))
    }
}
