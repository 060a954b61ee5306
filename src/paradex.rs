//! Top-level entry points
//!
//! `Paradex` wires the environment, the account, the REST client and the
//! WebSocket client together. `ParadexSubkey` is the same client built from
//! L2-only credentials.

use std::ops::Deref;
use std::sync::Arc;

use crate::account::ParadexAccount;
use crate::api::{
    AuthProvider, HttpClient, ParadexApiClient, ParadexWebsocketClient, ReconnectConfig,
    RetryPolicy, TlsConnector, WsConnector,
};
use crate::config::{ClientConfig, Credentials, Environment};
use crate::error::{ParadexError, ParadexResult};
use crate::types::SystemConfig;

pub struct Paradex {
    config: ClientConfig,
    system_config: SystemConfig,
    api_client: Arc<ParadexApiClient>,
    ws_client: ParadexWebsocketClient,
    account: Option<Arc<ParadexAccount>>,
}

impl Paradex {
    /// Client for `env` with default settings and no account.
    pub async fn new(env: Environment) -> ParadexResult<Self> {
        Self::with_config(ClientConfig::for_env(env)).await
    }

    /// Fetch the system config; initialize the account when credentials are set.
    pub async fn with_config(config: ClientConfig) -> ParadexResult<Self> {
        let http = HttpClient::new().with_retry_policy(RetryPolicy::new(config.http_max_retries));
        Self::with_transports(config, http, Arc::new(TlsConnector)).await
    }

    /// [`Paradex::with_config`] with a caller-supplied HTTP client and
    /// WebSocket connector.
    #[tracing::instrument(skip_all, fields(env = %config.env))]
    pub async fn with_transports(
        config: ClientConfig,
        http: HttpClient,
        ws_connector: Arc<dyn WsConnector>,
    ) -> ParadexResult<Self> {
        config.validate()?;

        let api_client = Arc::new(ParadexApiClient::with_http_client(&config, http));
        let system_config = api_client.fetch_system_config().await?;
        let ws_client =
            ParadexWebsocketClient::with_connector(&config, ReconnectConfig::default(), ws_connector);

        let mut paradex = Self {
            config,
            system_config,
            api_client,
            ws_client,
            account: None,
        };

        if !paradex.config.credentials.is_empty() {
            let account =
                ParadexAccount::from_credentials(&paradex.system_config, &paradex.config.credentials)?;
            paradex.attach_account(account).await?;
        }

        Ok(paradex)
    }

    /// Build a main account, onboard and authenticate it, and share it with
    /// the WebSocket client. The L2 key wins when both keys are given.
    pub async fn init_account(
        &mut self,
        l1_address: &str,
        l1_private_key: Option<&str>,
        l2_private_key: Option<&str>,
    ) -> ParadexResult<Arc<ParadexAccount>> {
        let account = match (l2_private_key, l1_private_key) {
            (Some(l2_key), _) => {
                ParadexAccount::from_l2_private_key(&self.system_config, l1_address, l2_key)?
            }
            (None, Some(l1_key)) => {
                ParadexAccount::from_l1_private_key(&self.system_config, l1_address, l1_key)?
            }
            (None, None) => {
                return Err(ParadexError::Config(
                    "Provide an L1 or an L2 private key to initialize the account".into(),
                ))
            }
        };
        self.attach_account(account).await
    }

    async fn attach_account(&mut self, account: ParadexAccount) -> ParadexResult<Arc<ParadexAccount>> {
        let account = Arc::new(account);
        self.api_client.init_account(account.clone()).await?;

        let provider: Arc<dyn AuthProvider> = self.api_client.clone();
        self.ws_client.init_account(provider).await;

        self.account = Some(account.clone());
        Ok(account)
    }

    pub fn env(&self) -> Environment {
        self.config.env
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn system_config(&self) -> &SystemConfig {
        &self.system_config
    }

    pub fn api_client(&self) -> &Arc<ParadexApiClient> {
        &self.api_client
    }

    pub fn ws_client(&self) -> &ParadexWebsocketClient {
        &self.ws_client
    }

    pub fn account(&self) -> Option<&Arc<ParadexAccount>> {
        self.account.as_ref()
    }
}

/// Client restricted to an L2 subkey: no onboarding, no on-chain operations.
pub struct ParadexSubkey {
    inner: Paradex,
}

impl ParadexSubkey {
    pub async fn new(env: Environment, l2_private_key: &str, l2_address: &str) -> ParadexResult<Self> {
        Self::with_config(ClientConfig::for_env(env), l2_private_key, l2_address).await
    }

    /// `config` with its credentials replaced by the subkey.
    pub async fn with_config(
        mut config: ClientConfig,
        l2_private_key: &str,
        l2_address: &str,
    ) -> ParadexResult<Self> {
        if l2_private_key.trim().is_empty() || l2_address.trim().is_empty() {
            return Err(ParadexError::Config(
                "Subkey requires both l2_private_key and l2_address".into(),
            ));
        }
        config.credentials = Credentials {
            l2_private_key: Some(l2_private_key.to_string()),
            l2_address: Some(l2_address.to_string()),
            ..Credentials::default()
        };

        Ok(Self {
            inner: Paradex::with_config(config).await?,
        })
    }

    /// The subkey account, already initialized at construction.
    pub fn init_account(&self) -> ParadexResult<Arc<ParadexAccount>> {
        self.inner
            .account()
            .cloned()
            .ok_or(ParadexError::AccountNotInitialized)
    }
}

impl Deref for ParadexSubkey {
    type Target = Paradex;

    fn deref(&self) -> &Paradex {
        &self.inner
    }
}
