// SPDX-License-Identifier: Apache-2.0

//! Token provider construction.
//!
//! [`TokenProviderFactory::create`] picks the credential source for an
//! [`AuthMode`] once; the returned [`TokenProvider`] is then asked for a
//! token before every request. Construction never performs network I/O.

use std::sync::Arc;

use bon::Builder;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument};

use super::credential::{
    ChainedTokenCredential, CredentialChainFactory, DefaultCredentialChainFactory,
    TokenCredential,
};
use super::interactive::{
    BrowserLauncher, OAuthAuthenticator, PublicClientConfig, PublicClientFactory, SystemBrowser,
};
use super::secrets::{EnvSecretSource, SecretSource, resolve_pat};
use super::{AuthMode, OAUTH_CLIENT_ID, PAT_PREFIX, SCOPES, authority_for};
use crate::Result;
use crate::error::AuthError;

fn prefixed(pat: &SecretString) -> SecretString {
    SecretString::from(format!("{PAT_PREFIX}{}", pat.expose_secret()))
}

enum PatSource {
    /// Read once at construction.
    Cached(SecretString),
    /// Re-read on every call.
    Fresh(Arc<dyn SecretSource>),
}

struct DelegatedCredential {
    credential: Arc<dyn TokenCredential>,
    no_cache: bool,
}

enum Inner {
    Pat(PatSource),
    Delegated(DelegatedCredential),
    Interactive(OAuthAuthenticator),
}

/// Produces the current token for one auth mode.
///
/// Tokens from the `pat` mode carry the [`PAT_PREFIX`] sentinel; pass every
/// token through [`crate::build_authorization_header`] rather than
/// formatting a bearer header directly.
pub struct TokenProvider {
    mode: AuthMode,
    inner: Inner,
}

impl TokenProvider {
    /// The auth mode this provider was built for.
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Returns the current token.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn get_token(&self) -> Result<SecretString> {
        match &self.inner {
            Inner::Pat(PatSource::Cached(token)) => Ok(token.clone()),
            Inner::Pat(PatSource::Fresh(source)) => {
                let (pat, _) = resolve_pat(source.as_ref()).ok_or(AuthError::MissingPat)?;
                debug!(length = pat.expose_secret().len(), "Fresh PAT read from environment");
                Ok(prefixed(&pat))
            }
            Inner::Delegated(delegated) => {
                if delegated.no_cache {
                    debug!(
                        "no-cache requested for azcli/env auth (limited effect - the credential backend manages its own cache)"
                    );
                }
                let token = delegated
                    .credential
                    .get_token(SCOPES)
                    .await?
                    .filter(|t| !t.token.expose_secret().is_empty())
                    .ok_or_else(|| {
                        AuthError::token_acquisition(
                            "Failed to obtain Azure DevOps token. Ensure you have Azure CLI logged in or use the interactive type of authentication.",
                        )
                    })?;
                Ok(token.token)
            }
            Inner::Interactive(authenticator) => authenticator.get_token().await,
        }
    }
}

/// Builds [`TokenProvider`]s from an auth mode, optional tenant and cache flag.
///
/// Every backend is injectable; unset ones fall back to:
/// - secrets: the process environment
/// - credentials: [`DefaultCredentialChainFactory`]
/// - browser: [`SystemBrowser`]
///
/// There is no default OAuth client, so the `interactive` mode needs
/// `public_clients` to be set.
#[derive(Builder, Default)]
pub struct TokenProviderFactory {
    secrets: Option<Arc<dyn SecretSource>>,
    credentials: Option<Arc<dyn CredentialChainFactory>>,
    public_clients: Option<Arc<dyn PublicClientFactory>>,
    browser: Option<Arc<dyn BrowserLauncher>>,
}

impl TokenProviderFactory {
    fn secret_source(&self) -> Arc<dyn SecretSource> {
        self.secrets
            .clone()
            .unwrap_or_else(|| Arc::new(EnvSecretSource))
    }

    /// Creates a provider for `mode`.
    ///
    /// # Errors
    ///
    /// - `pat` without `no_cache`: [`AuthError::MissingPat`] when no PAT is set.
    /// - `interactive` without a configured OAuth client factory:
    ///   [`AuthError::Configuration`].
    #[instrument(skip(self))]
    pub fn create(
        &self,
        mode: AuthMode,
        tenant_id: Option<&str>,
        no_cache: bool,
    ) -> Result<TokenProvider> {
        let inner = match mode {
            AuthMode::PreSharedSecret => Inner::Pat(self.pat_source(no_cache)?),
            AuthMode::AzureCli | AuthMode::Environment => {
                Inner::Delegated(self.delegated(mode, tenant_id, no_cache))
            }
            AuthMode::Interactive => Inner::Interactive(self.interactive(tenant_id, no_cache)?),
        };

        info!(mode = %mode, "Token provider configured");
        Ok(TokenProvider { mode, inner })
    }

    fn pat_source(&self, no_cache: bool) -> Result<PatSource> {
        let source = self.secret_source();
        if no_cache {
            debug!("PAT authentication configured with no-cache (will re-read sources on each call)");
            return Ok(PatSource::Fresh(source));
        }

        let (pat, name) = resolve_pat(source.as_ref()).ok_or(AuthError::MissingPat)?;
        debug!(
            source = name,
            length = pat.expose_secret().len(),
            cached = true,
            "PAT authentication configured"
        );
        Ok(PatSource::Cached(prefixed(&pat)))
    }

    fn delegated(
        &self,
        mode: AuthMode,
        tenant_id: Option<&str>,
        no_cache: bool,
    ) -> DelegatedCredential {
        let chains = self.credentials.clone().unwrap_or_else(|| {
            Arc::new(DefaultCredentialChainFactory::new(self.secret_source()))
        });

        let fallback = chains.default_chain(mode);
        let credential = match tenant_id {
            Some(tenant) => {
                debug!(tenant, "Prepending tenant-scoped CLI credential");
                let chained: Arc<dyn TokenCredential> = Arc::new(ChainedTokenCredential::new(
                    vec![chains.cli_credential(tenant), fallback],
                ));
                chained
            }
            None => fallback,
        };

        DelegatedCredential {
            credential,
            no_cache,
        }
    }

    fn interactive(&self, tenant_id: Option<&str>, no_cache: bool) -> Result<OAuthAuthenticator> {
        let factory = self.public_clients.as_ref().ok_or_else(|| {
            AuthError::configuration(
                "Interactive authentication requires an OAuth client. Use azcli, env or pat instead.",
            )
        })?;

        let client = factory.create(PublicClientConfig {
            client_id: OAUTH_CLIENT_ID.to_string(),
            authority: authority_for(tenant_id),
        })?;
        let browser = self
            .browser
            .clone()
            .unwrap_or_else(|| Arc::new(SystemBrowser));

        Ok(OAuthAuthenticator::new(client, browser, no_cache))
    }
}
