// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `TokenProviderFactory` using in-memory backends.
//!
//! The OAuth client, credential chains and secret store are replaced with
//! recording fakes so the provider state machine can be observed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adoauth_core::auth::{
    AccessToken, AccountInfo, AuthenticationResult, BrowserLauncher, CredentialChainFactory,
    InteractiveRequest, OAuthAuthenticator, Prompt, PublicClient, PublicClientConfig, PublicClientFactory,
    SecretSource, TokenCredential,
};
use adoauth_core::{AuthError, AuthMode, TokenProviderFactory, build_authorization_header};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct MemorySecrets(Mutex<HashMap<String, String>>);

impl MemorySecrets {
    fn set(&self, name: &str, value: &str) {
        self.0
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }
}

impl SecretSource for MemorySecrets {
    fn get(&self, name: &str) -> Option<String> {
        self.0.lock().unwrap().get(name).cloned()
    }
}

fn account(n: usize) -> AccountInfo {
    AccountInfo {
        home_account_id: format!("oid-{n}.tid"),
        username: format!("user{n}@contoso.com"),
        tenant_id: Some("tid".to_string()),
    }
}

#[derive(Default)]
struct FakeClient {
    silent_fails: AtomicBool,
    interactive_fails: AtomicBool,
    interactive_empty: AtomicBool,
    silent_calls: AtomicUsize,
    interactive_calls: AtomicUsize,
    removed: AtomicUsize,
    prompts: Mutex<Vec<Option<Prompt>>>,
    cached_accounts: Mutex<Vec<AccountInfo>>,
    configs: Mutex<Vec<PublicClientConfig>>,
}

#[async_trait]
impl PublicClient for FakeClient {
    async fn acquire_token_silent(
        &self,
        _scopes: &[&str],
        account: &AccountInfo,
    ) -> Result<AuthenticationResult> {
        self.silent_calls.fetch_add(1, Ordering::SeqCst);
        if self.silent_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("interaction_required"));
        }
        Ok(AuthenticationResult {
            access_token: SecretString::from(format!("silent-{}", account.username)),
            account: Some(account.clone()),
        })
    }

    async fn acquire_token_interactive(
        &self,
        request: InteractiveRequest<'_>,
    ) -> Result<AuthenticationResult> {
        let n = self.interactive_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(request.prompt);
        (request.open_browser)("https://login.microsoftonline.com/common/oauth2/v2.0/authorize");

        if self.interactive_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("user cancelled the login"));
        }
        if self.interactive_empty.load(Ordering::SeqCst) {
            return Ok(AuthenticationResult {
                access_token: SecretString::from(String::new()),
                account: None,
            });
        }

        let account = account(n);
        self.cached_accounts.lock().unwrap().push(account.clone());
        Ok(AuthenticationResult {
            access_token: SecretString::from(format!("interactive-{n}")),
            account: Some(account),
        })
    }

    async fn all_accounts(&self) -> Result<Vec<AccountInfo>> {
        Ok(self.cached_accounts.lock().unwrap().clone())
    }

    async fn remove_account(&self, account: &AccountInfo) -> Result<()> {
        self.removed.fetch_add(1, Ordering::SeqCst);
        self.cached_accounts
            .lock()
            .unwrap()
            .retain(|a| a != account);
        Ok(())
    }
}

struct FakeClientFactory(Arc<FakeClient>);

impl PublicClientFactory for FakeClientFactory {
    fn create(&self, config: PublicClientConfig) -> Result<Arc<dyn PublicClient>> {
        self.0.configs.lock().unwrap().push(config);
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct RecordingBrowser(Mutex<Vec<String>>);

impl BrowserLauncher for RecordingBrowser {
    fn open(&self, url: &str) -> Result<()> {
        self.0.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct FailingBrowser;

impl BrowserLauncher for FailingBrowser {
    fn open(&self, _url: &str) -> Result<()> {
        Err(anyhow!("no display"))
    }
}

struct FixedCredential {
    name: &'static str,
    token: Option<&'static str>,
    failure: Option<&'static str>,
    calls: AtomicUsize,
    scopes: Mutex<Vec<String>>,
}

impl FixedCredential {
    fn new(name: &'static str, token: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            name,
            token,
            failure: None,
            calls: AtomicUsize::new(0),
            scopes: Mutex::new(Vec::new()),
        })
    }

    fn failing(name: &'static str, message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            token: None,
            failure: Some(message),
            calls: AtomicUsize::new(0),
            scopes: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TokenCredential for FixedCredential {
    fn name(&self) -> &str {
        self.name
    }

    async fn get_token(&self, scopes: &[&str]) -> Result<Option<AccessToken>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scopes
            .lock()
            .unwrap()
            .extend(scopes.iter().map(ToString::to_string));
        if let Some(message) = self.failure {
            return Err(anyhow!(message));
        }
        Ok(self.token.map(AccessToken::new))
    }
}

struct FakeChains {
    fallback: Arc<FixedCredential>,
    cli: Arc<FixedCredential>,
    modes: Mutex<Vec<AuthMode>>,
    tenants: Mutex<Vec<String>>,
}

impl CredentialChainFactory for FakeChains {
    fn default_chain(&self, mode: AuthMode) -> Arc<dyn TokenCredential> {
        self.modes.lock().unwrap().push(mode);
        self.fallback.clone()
    }

    fn cli_credential(&self, tenant_id: &str) -> Arc<dyn TokenCredential> {
        self.tenants.lock().unwrap().push(tenant_id.to_string());
        self.cli.clone()
    }
}

fn fake_chains(
    fallback: Option<&'static str>,
    cli: Option<&'static str>,
) -> Arc<FakeChains> {
    Arc::new(FakeChains {
        fallback: FixedCredential::new("fallback", fallback),
        cli: FixedCredential::new("cli", cli),
        modes: Mutex::new(Vec::new()),
        tenants: Mutex::new(Vec::new()),
    })
}

fn interactive_factory(client: &Arc<FakeClient>, browser: Arc<dyn BrowserLauncher>) -> TokenProviderFactory {
    TokenProviderFactory::builder()
        .public_clients(Arc::new(FakeClientFactory(client.clone())))
        .browser(browser)
        .build()
}

// ============================================================================
// PAT mode
// ============================================================================

#[tokio::test]
async fn test_pat_end_to_end_basic_header() {
    let secrets = Arc::new(MemorySecrets::default());
    secrets.set("AZDO_PAT", "ABC123PAT");

    let provider = TokenProviderFactory::builder()
        .secrets(secrets)
        .build()
        .create(AuthMode::PreSharedSecret, None, false)
        .unwrap();

    let token = provider.get_token().await.unwrap();
    assert_eq!(token.expose_secret(), "pat:ABC123PAT");

    let expected = format!("Basic {}", STANDARD.encode(":ABC123PAT"));
    assert_eq!(build_authorization_header(&token), expected);
}

#[tokio::test]
async fn test_pat_secondary_only() {
    let secrets = Arc::new(MemorySecrets::default());
    secrets.set("ADO_PAT", "SECONDARY");

    let provider = TokenProviderFactory::builder()
        .secrets(secrets)
        .build()
        .create(AuthMode::PreSharedSecret, None, false)
        .unwrap();

    assert_eq!(provider.get_token().await.unwrap().expose_secret(), "pat:SECONDARY");
}

#[tokio::test]
async fn test_pat_whitespace_only_fails_in_both_cache_modes() {
    let secrets = Arc::new(MemorySecrets::default());
    secrets.set("AZDO_PAT", "   ");
    let factory = TokenProviderFactory::builder().secrets(secrets).build();

    let cached = factory.create(AuthMode::PreSharedSecret, None, false);
    assert!(matches!(cached, Err(AuthError::MissingPat)));

    let fresh = factory
        .create(AuthMode::PreSharedSecret, None, true)
        .unwrap();
    assert!(matches!(
        fresh.get_token().await,
        Err(AuthError::MissingPat)
    ));
}

// ============================================================================
// Delegated credential modes
// ============================================================================

#[tokio::test]
async fn test_azcli_uses_default_chain_and_fixed_scope() {
    let chains = fake_chains(Some("bearer-from-cli"), None);
    let provider = TokenProviderFactory::builder()
        .credentials(chains.clone())
        .build()
        .create(AuthMode::AzureCli, None, false)
        .unwrap();

    let token = provider.get_token().await.unwrap();
    assert_eq!(token.expose_secret(), "bearer-from-cli");
    assert_eq!(build_authorization_header(&token), "Bearer bearer-from-cli");

    assert_eq!(*chains.modes.lock().unwrap(), vec![AuthMode::AzureCli]);
    assert!(chains.tenants.lock().unwrap().is_empty());
    assert_eq!(
        *chains.fallback.scopes.lock().unwrap(),
        vec!["499b84ac-1321-427f-aa17-267ca6975798/.default".to_string()]
    );
}

#[tokio::test]
async fn test_tenant_prepends_cli_credential() {
    let chains = fake_chains(Some("fallback-token"), Some("tenant-token"));
    let provider = TokenProviderFactory::builder()
        .credentials(chains.clone())
        .build()
        .create(AuthMode::Environment, Some("contoso"), false)
        .unwrap();

    assert_eq!(provider.get_token().await.unwrap().expose_secret(), "tenant-token");
    assert_eq!(*chains.tenants.lock().unwrap(), vec!["contoso".to_string()]);
    assert_eq!(chains.fallback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tenant_chain_falls_back_to_generic_credential() {
    let chains = fake_chains(Some("fallback-token"), None);
    let provider = TokenProviderFactory::builder()
        .credentials(chains.clone())
        .build()
        .create(AuthMode::AzureCli, Some("contoso"), false)
        .unwrap();

    assert_eq!(provider.get_token().await.unwrap().expose_secret(), "fallback-token");
    assert_eq!(chains.cli.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delegated_without_token_is_acquisition_error() {
    let chains = fake_chains(None, None);
    let provider = TokenProviderFactory::builder()
        .credentials(chains)
        .build()
        .create(AuthMode::Environment, None, true)
        .unwrap();

    assert!(matches!(
        provider.get_token().await,
        Err(AuthError::TokenAcquisition { .. })
    ));
}

#[tokio::test]
async fn test_delegated_backend_failure_reaches_caller_unmodified() {
    let chains = Arc::new(FakeChains {
        fallback: FixedCredential::failing(
            "fallback",
            "Azure CLI could not provide a token: Please run 'az login' to setup account.",
        ),
        cli: FixedCredential::new("cli", None),
        modes: Mutex::new(Vec::new()),
        tenants: Mutex::new(Vec::new()),
    });
    let provider = TokenProviderFactory::builder()
        .credentials(chains.clone())
        .build()
        .create(AuthMode::AzureCli, None, false)
        .unwrap();

    let err = provider.get_token().await.unwrap_err();
    assert!(matches!(err, AuthError::Backend(_)));
    assert_eq!(
        err.to_string(),
        "Azure CLI could not provide a token: Please run 'az login' to setup account."
    );
    assert_eq!(chains.fallback.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delegated_no_cache_still_calls_backend_each_time() {
    let chains = fake_chains(Some("t"), None);
    let provider = TokenProviderFactory::builder()
        .credentials(chains.clone())
        .build()
        .create(AuthMode::AzureCli, None, true)
        .unwrap();

    provider.get_token().await.unwrap();
    provider.get_token().await.unwrap();
    assert_eq!(chains.fallback.calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Interactive mode
// ============================================================================

#[tokio::test]
async fn test_interactive_reuses_account_silently() {
    let client = Arc::new(FakeClient::default());
    let browser = Arc::new(RecordingBrowser::default());
    let provider = interactive_factory(&client, browser.clone())
        .create(AuthMode::Interactive, None, false)
        .unwrap();

    let first = provider.get_token().await.unwrap();
    assert_eq!(first.expose_secret(), "interactive-1");

    let second = provider.get_token().await.unwrap();
    assert_eq!(second.expose_secret(), "silent-user1@contoso.com");

    assert_eq!(client.interactive_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.silent_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*client.prompts.lock().unwrap(), vec![None]);
    assert_eq!(browser.0.lock().unwrap().len(), 1);
    assert_eq!(client.removed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_interactive_no_cache_always_forces_login() {
    let client = Arc::new(FakeClient::default());
    // Accounts left behind by earlier sessions.
    client
        .cached_accounts
        .lock()
        .unwrap()
        .extend([account(90), account(91)]);
    let provider = interactive_factory(&client, Arc::new(RecordingBrowser::default()))
        .create(AuthMode::Interactive, None, true)
        .unwrap();

    assert_eq!(provider.get_token().await.unwrap().expose_secret(), "interactive-1");
    assert_eq!(provider.get_token().await.unwrap().expose_secret(), "interactive-2");

    assert_eq!(client.silent_calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.interactive_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        *client.prompts.lock().unwrap(),
        vec![Some(Prompt::Login), Some(Prompt::Login)]
    );
    // Both leftover accounts went before the first login, and the account
    // from the first login went before the second.
    assert_eq!(client.removed.load(Ordering::SeqCst), 3);
    assert_eq!(*client.cached_accounts.lock().unwrap(), vec![account(2)]);
}

#[tokio::test]
async fn test_interactive_silent_failure_falls_back_to_login() {
    let client = Arc::new(FakeClient::default());
    let provider = interactive_factory(&client, Arc::new(RecordingBrowser::default()))
        .create(AuthMode::Interactive, None, false)
        .unwrap();

    provider.get_token().await.unwrap();
    client.silent_fails.store(true, Ordering::SeqCst);

    let token = provider.get_token().await.unwrap();
    assert_eq!(token.expose_secret(), "interactive-2");
    assert_eq!(client.silent_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.interactive_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_silent_failure_forgets_account_when_login_also_fails() {
    let client = Arc::new(FakeClient::default());
    let provider = interactive_factory(&client, Arc::new(RecordingBrowser::default()))
        .create(AuthMode::Interactive, None, false)
        .unwrap();

    provider.get_token().await.unwrap();
    client.silent_fails.store(true, Ordering::SeqCst);
    client.interactive_fails.store(true, Ordering::SeqCst);

    let err = provider.get_token().await.unwrap_err();
    assert!(matches!(err, AuthError::Backend(_)));
    assert_eq!(err.to_string(), "user cancelled the login");

    // The stale account is gone, so the next call skips silent acquisition.
    let _ = provider.get_token().await;
    assert_eq!(client.silent_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.interactive_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_authenticator_tracks_stored_account() {
    let client = Arc::new(FakeClient::default());
    let authenticator =
        OAuthAuthenticator::new(client.clone(), Arc::new(RecordingBrowser::default()), false);
    assert_eq!(authenticator.stored_account().await, None);

    authenticator.get_token().await.unwrap();
    assert_eq!(authenticator.stored_account().await, Some(account(1)));

    // Silent success keeps the account.
    authenticator.get_token().await.unwrap();
    assert_eq!(authenticator.stored_account().await, Some(account(1)));

    client.silent_fails.store(true, Ordering::SeqCst);
    client.interactive_fails.store(true, Ordering::SeqCst);
    assert!(authenticator.get_token().await.is_err());
    assert_eq!(authenticator.stored_account().await, None);
}

#[tokio::test]
async fn test_interactive_empty_token_is_acquisition_error() {
    let client = Arc::new(FakeClient::default());
    client.interactive_empty.store(true, Ordering::SeqCst);
    let provider = interactive_factory(&client, Arc::new(RecordingBrowser::default()))
        .create(AuthMode::Interactive, None, false)
        .unwrap();

    assert!(matches!(
        provider.get_token().await,
        Err(AuthError::TokenAcquisition { .. })
    ));
}

#[tokio::test]
async fn test_browser_failure_does_not_abort_login() {
    let client = Arc::new(FakeClient::default());
    let provider = interactive_factory(&client, Arc::new(FailingBrowser))
        .create(AuthMode::Interactive, None, false)
        .unwrap();

    assert_eq!(provider.get_token().await.unwrap().expose_secret(), "interactive-1");
}

#[test]
fn test_interactive_authority_follows_tenant() {
    let client = Arc::new(FakeClient::default());
    let factory = interactive_factory(&client, Arc::new(RecordingBrowser::default()));

    factory.create(AuthMode::Interactive, None, false).unwrap();
    factory
        .create(AuthMode::Interactive, Some("contoso"), false)
        .unwrap();

    let configs = client.configs.lock().unwrap();
    assert_eq!(configs[0].authority, "https://login.microsoftonline.com/common");
    assert_eq!(configs[1].authority, "https://login.microsoftonline.com/contoso");
    assert_eq!(configs[0].client_id, "0d50963b-7bb9-4fe7-94c7-a99af00b5136");
    // Construction performs no token requests.
    assert_eq!(client.interactive_calls.load(Ordering::SeqCst), 0);
}
