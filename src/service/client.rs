//! Authenticated services client

use super::session::{CredentialSession, SessionProvider, StaticSession};
use super::transport::{HttpTransport, Params};
use crate::config::ServiceConfig;
use crate::domain::{AmbraError, ErrorSpec, Result, ServiceErrorKind, Sid};
use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

struct ClientInner {
    transport: HttpTransport,
    session: Arc<dyn SessionProvider>,
    storage_base: String,
    page_rows: usize,
}

/// Client shared by every namespace, query and storage call
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct ServiceClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.inner.transport.base_url())
            .field("storage_base", &self.inner.storage_base)
            .finish()
    }
}

impl ServiceClient {
    /// Build a client from the services config
    ///
    /// A configured `sid` wins over credentials.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when neither a sid nor credentials are set.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;

        let session: Arc<dyn SessionProvider> = match (&config.sid, &config.username, &config.password) {
            (Some(sid), _, _) if !sid.expose_secret().is_empty() => {
                let sid = Sid::new(sid.expose_secret().as_str()).map_err(AmbraError::Configuration)?;
                Arc::new(StaticSession::new(transport.clone(), sid))
            }
            (_, Some(username), Some(password)) => Arc::new(CredentialSession::new(
                transport.clone(),
                username.clone(),
                password.clone(),
                config.account_id.clone(),
            )),
            _ => {
                return Err(AmbraError::Configuration(
                    "Either ambra.sid or ambra.username and ambra.password must be set".to_string(),
                ))
            }
        };

        Ok(Self::with_session(transport, session, config.storage_base()?, config.page_rows))
    }

    /// Build a client around an existing session provider
    pub fn with_session(
        transport: HttpTransport,
        session: Arc<dyn SessionProvider>,
        storage_base: String,
        page_rows: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                session,
                storage_base,
                page_rows,
            }),
        }
    }

    /// Services base URL
    pub fn base_url(&self) -> &str {
        self.inner.transport.base_url()
    }

    /// Storage API base URL
    pub fn storage_base(&self) -> &str {
        &self.inner.storage_base
    }

    /// Default page size for list queries
    pub fn page_rows(&self) -> usize {
        self.inner.page_rows
    }

    /// The session provider
    pub fn session(&self) -> &Arc<dyn SessionProvider> {
        &self.inner.session
    }

    /// Current sid
    pub async fn sid(&self) -> Result<Sid> {
        self.inner.session.sid().await
    }

    /// POST to a services endpoint with the session's sid
    ///
    /// An `AuthorizationRequired` response triggers one re-login and retry
    /// when the session can refresh.
    pub async fn post(
        &self,
        path: &str,
        params: &Params,
        errors: &'static [ErrorSpec],
    ) -> Result<Value> {
        self.with_relogin(path, |sid| async move {
            self.post_with_sid(path, params, errors, &sid).await
        })
        .await
    }

    /// POST without a sid
    pub async fn post_raw(
        &self,
        path: &str,
        params: &Params,
        errors: &'static [ErrorSpec],
    ) -> Result<Value> {
        self.inner.transport.post_form(path, params, errors).await
    }

    async fn post_with_sid(
        &self,
        path: &str,
        params: &Params,
        errors: &'static [ErrorSpec],
        sid: &Sid,
    ) -> Result<Value> {
        let mut with_sid = Vec::with_capacity(params.len() + 1);
        with_sid.push(("sid".to_string(), sid.expose().to_string()));
        with_sid.extend(params.iter().cloned());
        self.inner.transport.post_form(path, &with_sid, errors).await
    }

    /// Send a Storage API request; the sid travels as a query parameter
    ///
    /// Expired sessions are handled as in [`post`](Self::post).
    pub async fn storage(&self, method: Method, url: &str, query: &Params) -> Result<Value> {
        self.with_relogin(url, |sid| {
            let method = method.clone();
            async move {
                let mut with_sid = Vec::with_capacity(query.len() + 1);
                with_sid.push(("sid".to_string(), sid.expose().to_string()));
                with_sid.extend(query.iter().cloned());
                self.inner
                    .transport
                    .storage_request(method, url, &with_sid)
                    .await
            }
        })
        .await
    }

    /// Run `call` with the current sid, logging in again once on a 401
    async fn with_relogin<F, Fut>(&self, endpoint: &str, call: F) -> Result<Value>
    where
        F: Fn(Sid) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let sid = self.inner.session.sid().await?;
        match call(sid).await {
            Err(AmbraError::Service(e))
                if e.kind == ServiceErrorKind::AuthorizationRequired
                    && self.inner.session.can_refresh() =>
            {
                tracing::info!(endpoint = %endpoint, "Session expired, logging in again");
                let sid = self.inner.session.refresh().await?;
                call(sid).await
            }
            other => other,
        }
    }

    /// End the session
    pub async fn logout(&self) -> Result<()> {
        self.inner.session.logout().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, RetryConfig};
    use mockito::Matcher;

    fn config_for(url: &str) -> ServiceConfig {
        ServiceConfig {
            url: url.to_string(),
            username: Some("user@example.com".to_string()),
            password: Some(secret_string("pw".to_string())),
            retry: RetryConfig::none(),
            ..ServiceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_post_adds_sid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/session/login")
            .with_body(r#"{"status":"OK","sid":"sid-1"}"#)
            .create_async()
            .await;
        let user = server
            .mock("POST", "/session/user")
            .match_body(Matcher::UrlEncoded("sid".into(), "sid-1".into()))
            .with_body(r#"{"status":"OK","uuid":"u-1"}"#)
            .create_async()
            .await;

        let client = ServiceClient::from_config(&config_for(&server.url())).unwrap();
        let body = client.post("/session/user", &vec![], &[]).await.unwrap();

        assert_eq!(body["uuid"], "u-1");
        user.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_session_relogs_once() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/session/login")
            .with_body(r#"{"status":"OK","sid":"sid-1"}"#)
            .expect(2)
            .create_async()
            .await;
        let calls = server
            .mock("POST", "/study/count")
            .with_status(401)
            .with_body(r#"{"status":"ERROR","error_type":"NO_SESSION"}"#)
            .expect(2)
            .create_async()
            .await;

        let client = ServiceClient::from_config(&config_for(&server.url())).unwrap();
        let err = client.post("/study/count", &vec![], &[]).await.unwrap_err();

        assert_eq!(
            err.as_service().unwrap().kind,
            ServiceErrorKind::AuthorizationRequired
        );
        login.assert_async().await;
        calls.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_session_relogs_for_storage() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/session/login")
            .with_body(r#"{"status":"OK","sid":"sid-1"}"#)
            .expect(2)
            .create_async()
            .await;
        let schema = server
            .mock("GET", "/study/ns-1/1.2.3/schema")
            .match_query(Matcher::UrlEncoded("sid".into(), "sid-1".into()))
            .with_status(401)
            .expect(2)
            .create_async()
            .await;

        let mut config = config_for(&server.url());
        config.storage_url = Some(server.url());
        let client = ServiceClient::from_config(&config).unwrap();

        let url = format!("{}/study/ns-1/1.2.3/schema", client.storage_base());
        let err = client.storage(Method::GET, &url, &vec![]).await.unwrap_err();

        assert_eq!(
            err.as_service().unwrap().kind,
            ServiceErrorKind::AuthorizationRequired
        );
        login.assert_async().await;
        schema.assert_async().await;
    }

    #[tokio::test]
    async fn test_static_sid_is_not_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let calls = server
            .mock("POST", "/study/count")
            .match_body(Matcher::UrlEncoded("sid".into(), "static".into()))
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let mut config = config_for(&server.url());
        config.sid = Some(secret_string("static".to_string()));
        let client = ServiceClient::from_config(&config).unwrap();

        assert!(client.post("/study/count", &vec![], &[]).await.is_err());
        calls.assert_async().await;
    }

    #[test]
    fn test_missing_credentials() {
        let config = ServiceConfig {
            url: "https://access.example.com/api/v3".to_string(),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            ServiceClient::from_config(&config),
            Err(AmbraError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_sends_sid_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/study/ns-1/1.2.3/schema")
            .match_query(Matcher::UrlEncoded("sid".into(), "static".into()))
            .with_body(r#"{"series":[]}"#)
            .create_async()
            .await;

        let mut config = config_for(&server.url());
        config.sid = Some(secret_string("static".to_string()));
        config.storage_url = Some(server.url());
        let client = ServiceClient::from_config(&config).unwrap();

        let url = format!("{}/study/ns-1/1.2.3/schema", client.storage_base());
        let body = client.storage(Method::GET, &url, &vec![]).await.unwrap();
        assert_eq!(body["series"], serde_json::json!([]));
        mock.assert_async().await;
    }
}
