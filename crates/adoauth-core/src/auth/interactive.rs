// SPDX-License-Identifier: Apache-2.0

//! Interactive (browser-based) OAuth login.
//!
//! The OAuth protocol itself lives behind [`PublicClient`]; this module only
//! drives it. [`OAuthAuthenticator`] remembers the account from the last
//! successful login and tries a silent acquisition with it before falling
//! back to an interactive login:
//!
//! ```text
//! NoAccount --login ok--> HasAccount --silent ok--> HasAccount
//!     ^                        |
//!     +---- silent failed -----+
//!     +---- no_cache ----------+
//! ```

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::SCOPES;
use crate::error::AuthError;

/// An account known to the interactive backend's token cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Stable account identifier (`<object id>.<tenant id>`).
    pub home_account_id: String,
    /// Sign-in name, usually an email address.
    pub username: String,
    /// Tenant the account signed in to.
    pub tenant_id: Option<String>,
}

/// Result of a silent or interactive token acquisition.
#[derive(Clone)]
pub struct AuthenticationResult {
    /// The bearer token. Empty when the backend produced nothing usable.
    pub access_token: SecretString,
    /// The account the token was issued to.
    pub account: Option<AccountInfo>,
}

impl fmt::Debug for AuthenticationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationResult")
            .field("access_token", &"[REDACTED]")
            .field("account", &self.account)
            .finish()
    }
}

/// Prompt behavior for an interactive login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Force the user to enter credentials even if a browser session exists.
    Login,
}

/// Parameters for an interactive login.
pub struct InteractiveRequest<'a> {
    /// Scopes to request.
    pub scopes: &'a [&'a str],
    /// Opens the login URL for the user.
    pub open_browser: &'a (dyn Fn(&str) + Send + Sync),
    /// Optional prompt override.
    pub prompt: Option<Prompt>,
}

/// A public OAuth client capable of silent and interactive acquisition.
#[async_trait]
pub trait PublicClient: Send + Sync {
    /// Acquires a token for `account` without user interaction.
    async fn acquire_token_silent(
        &self,
        scopes: &[&str],
        account: &AccountInfo,
    ) -> Result<AuthenticationResult>;

    /// Acquires a token through a browser-based login.
    async fn acquire_token_interactive(
        &self,
        request: InteractiveRequest<'_>,
    ) -> Result<AuthenticationResult>;

    /// Lists every account in the client's token cache.
    async fn all_accounts(&self) -> Result<Vec<AccountInfo>>;

    /// Removes `account` from the client's token cache.
    async fn remove_account(&self, account: &AccountInfo) -> Result<()>;
}

/// Registration used to build a [`PublicClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicClientConfig {
    /// Application (client) ID.
    pub client_id: String,
    /// Login authority URL.
    pub authority: String,
}

/// Builds [`PublicClient`]s. Must not perform network I/O.
pub trait PublicClientFactory: Send + Sync {
    /// Creates a client for `config`.
    fn create(&self, config: PublicClientConfig) -> Result<Arc<dyn PublicClient>>;
}

/// Opens URLs for the user.
pub trait BrowserLauncher: Send + Sync {
    /// Opens `url`.
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs in the system default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        open::that(url).with_context(|| format!("Failed to open browser for {url}"))
    }
}

/// Drives silent and interactive login against a [`PublicClient`].
pub struct OAuthAuthenticator {
    client: Arc<dyn PublicClient>,
    browser: Arc<dyn BrowserLauncher>,
    account: Mutex<Option<AccountInfo>>,
    no_cache: bool,
}

impl OAuthAuthenticator {
    /// Creates an authenticator with no stored account.
    #[must_use]
    pub fn new(
        client: Arc<dyn PublicClient>,
        browser: Arc<dyn BrowserLauncher>,
        no_cache: bool,
    ) -> Self {
        Self {
            client,
            browser,
            account: Mutex::new(None),
            no_cache,
        }
    }

    /// The account remembered from the last successful login, if any.
    pub async fn stored_account(&self) -> Option<AccountInfo> {
        self.account.lock().await.clone()
    }

    /// Returns a bearer token, logging in interactively when needed.
    ///
    /// Concurrent calls are not coalesced; two callers without a stored
    /// account will both start an interactive login.
    #[instrument(skip(self), fields(no_cache = self.no_cache))]
    pub async fn get_token(&self) -> Result<SecretString, AuthError> {
        if !self.no_cache
            && let Some(result) = self.try_silent().await
        {
            return usable_token(result);
        }

        if self.no_cache {
            self.clear_accounts().await?;
        }

        let open_browser = |url: &str| {
            if let Err(e) = self.browser.open(url) {
                warn!(error = %e, "Could not open browser, visit the login URL manually");
            }
        };
        let request = InteractiveRequest {
            scopes: SCOPES,
            open_browser: &open_browser,
            prompt: self.no_cache.then_some(Prompt::Login),
        };

        debug!("Starting interactive login");
        let result = self.client.acquire_token_interactive(request).await?;
        *self.account.lock().await = result.account.clone();
        info!("Interactive login completed");

        usable_token(result)
    }

    /// Attempts silent acquisition with the stored account.
    ///
    /// A failure forgets the stored account so the next call goes straight
    /// to the interactive path.
    async fn try_silent(&self) -> Option<AuthenticationResult> {
        let account = self.account.lock().await.clone()?;

        match self.client.acquire_token_silent(SCOPES, &account).await {
            Ok(result) => {
                debug!("Silent token acquisition succeeded");
                Some(result)
            }
            Err(e) => {
                warn!(error = %e, "Silent token acquisition failed, falling back to interactive login");
                *self.account.lock().await = None;
                None
            }
        }
    }

    async fn clear_accounts(&self) -> Result<(), AuthError> {
        let accounts = self.client.all_accounts().await?;
        debug!(count = accounts.len(), "Clearing cached accounts");
        for account in &accounts {
            self.client.remove_account(account).await?;
        }
        *self.account.lock().await = None;
        Ok(())
    }
}

fn usable_token(result: AuthenticationResult) -> Result<SecretString, AuthError> {
    if result.access_token.expose_secret().is_empty() {
        return Err(AuthError::token_acquisition(
            "Failed to obtain Azure DevOps OAuth token.",
        ));
    }
    Ok(result.access_token)
}
