//! Entry point of the SDK
//!
//! ```rust,no_run
//! use ambra_sdk::Api;
//!
//! # async fn example() -> ambra_sdk::domain::Result<()> {
//! let api = Api::with_creds("https://access.example.com/api/v3", "me@example.com", "secret")?;
//! let user = api.session().user().get().await?;
//! println!("logged in as {}", user["email"]);
//! api.logout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{secret_string, AmbraConfig};
use crate::domain::{AmbraError, Result, Sid};
use crate::service::entrypoints::{Account, Audit, Group, Namespace, Session, Study, User};
use crate::service::{ServiceClient, Storage, WsConfig, WsManager};

/// Authenticated access to every namespace
#[derive(Debug, Clone)]
pub struct Api {
    client: ServiceClient,
    ws_config: WsConfig,
}

impl Api {
    /// Log in with a username and password on first use
    pub fn with_creds(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let mut config = AmbraConfig::for_url(url);
        config.ambra.username = Some(username.into());
        config.ambra.password = Some(secret_string(password.into()));
        Self::from_config(&config)
    }

    /// Use an existing session id
    pub fn with_sid(url: impl Into<String>, sid: impl Into<String>) -> Result<Self> {
        let mut config = AmbraConfig::for_url(url);
        config.ambra.sid = Some(secret_string(sid.into()));
        Self::from_config(&config)
    }

    /// Build from a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the configuration is invalid.
    pub fn from_config(config: &AmbraConfig) -> Result<Self> {
        config.validate().map_err(AmbraError::Configuration)?;

        let client = ServiceClient::from_config(&config.ambra)?;
        let ws_config = WsConfig::from_config(config)?;

        tracing::debug!(url = %client.base_url(), "Ambra API client created");
        Ok(Self { client, ws_config })
    }

    /// Underlying client, for endpoints without a namespace struct
    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    /// Current sid, logging in if needed
    pub async fn sid(&self) -> Result<Sid> {
        self.client.sid().await
    }

    pub fn session(&self) -> Session {
        Session::new(self.client.clone())
    }

    pub fn study(&self) -> Study {
        Study::new(self.client.clone())
    }

    pub fn user(&self) -> User {
        User::new(self.client.clone())
    }

    pub fn account(&self) -> Account {
        Account::new(self.client.clone())
    }

    pub fn group(&self) -> Group {
        Group::new(self.client.clone())
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.client.clone())
    }

    pub fn audit(&self) -> Audit {
        Audit::new(self.client.clone())
    }

    /// Storage API calls
    pub fn storage(&self) -> Storage {
        Storage::new(self.client.clone())
    }

    /// WebSocket settings used by [`ws`](Self::ws)
    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    /// Open a channel socket
    pub async fn ws(&self) -> Result<WsManager> {
        WsManager::connect(self.ws_config.clone()).await
    }

    /// End the session
    pub async fn logout(&self) -> Result<()> {
        self.client.logout().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_with_sid_derives_websocket_url() {
        let api = Api::with_sid("https://access.example.com/api/v3", "sid-1").unwrap();
        assert_eq!(
            api.ws_config().url.as_str(),
            "wss://access.example.com/api/v3/channel/websocket"
        );
        assert_eq!(
            api.client().storage_base(),
            "https://access.example.com/api/v3/storage"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            Api::with_sid("ftp://nowhere", "sid-1"),
            Err(AmbraError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_password() {
        assert!(matches!(
            Api::with_creds("https://access.example.com/api/v3", "me@example.com", ""),
            Err(AmbraError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_with_creds_logs_in_lazily() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/session/login")
            .with_body(r#"{"status":"OK","sid":"sid-9"}"#)
            .expect(1)
            .create_async()
            .await;
        let count = server
            .mock("POST", "/study/count")
            .match_body(Matcher::UrlEncoded("sid".into(), "sid-9".into()))
            .with_body(r#"{"status":"OK","count":12}"#)
            .expect(2)
            .create_async()
            .await;

        let api = Api::with_creds(server.url(), "me@example.com", "pw").unwrap();
        assert_eq!(api.study().count().get().await.unwrap()["count"], 12);
        assert_eq!(api.study().count().get().await.unwrap()["count"], 12);

        login.assert_async().await;
        count.assert_async().await;
    }
}
