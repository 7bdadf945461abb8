//! Session handling
//!
//! Every services call carries a `sid`. A [`SessionProvider`] hands it out
//! and, when it owns credentials, can log in again after the service reports
//! the session expired.

use super::transport::{HttpTransport, Params};
use crate::config::SecretString;
use crate::domain::{AmbraError, ErrorSpec, Result, Sid};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::sync::Mutex;

/// Errors `/session/login` can report
pub(crate) const LOGIN_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("BAD_PASSWORD", "The password is wrong"),
    ErrorSpec::new("BLOCKED", "The user is blocked"),
    ErrorSpec::new("DISABLED", "The user is disabled"),
    ErrorSpec::new("LOCKOUT", "Too many failed attempts"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
    ErrorSpec::new("PASSWORD_RESET", "The password must be reset"),
    ErrorSpec::new("VALIDATE", "The email address has not been validated"),
];

const LOGOUT_ERRORS: &[ErrorSpec] = &[];

/// Source of session ids for service calls
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current sid, logging in first if needed
    async fn sid(&self) -> Result<Sid>;

    /// Discard the current sid and obtain a new one
    async fn refresh(&self) -> Result<Sid>;

    /// Whether [`refresh`](Self::refresh) can produce a new sid
    fn can_refresh(&self) -> bool;

    /// Forget the cached sid without contacting the service
    async fn invalidate(&self);

    /// End the session on the service side
    async fn logout(&self) -> Result<()>;
}

#[derive(Debug)]
struct ActiveSession {
    sid: Sid,
    logged_in_at: DateTime<Utc>,
}

/// Session backed by login credentials
pub struct CredentialSession {
    transport: HttpTransport,
    username: String,
    password: SecretString,
    account_id: Option<String>,
    active: Mutex<Option<ActiveSession>>,
}

impl CredentialSession {
    /// Create a session that logs in lazily on first use
    pub fn new(
        transport: HttpTransport,
        username: impl Into<String>,
        password: SecretString,
        account_id: Option<String>,
    ) -> Self {
        Self {
            transport,
            username: username.into(),
            password,
            account_id,
            active: Mutex::new(None),
        }
    }

    /// Time of the last successful login
    pub async fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        self.active.lock().await.as_ref().map(|s| s.logged_in_at)
    }

    async fn login(&self) -> Result<Sid> {
        let mut params: Params = vec![
            ("login".to_string(), self.username.clone()),
            (
                "password".to_string(),
                self.password.expose_secret().as_str().to_string(),
            ),
        ];
        if let Some(ref account_id) = self.account_id {
            params.push(("account_id".to_string(), account_id.clone()));
        }

        let body = self
            .transport
            .post_form("/session/login", &params, LOGIN_ERRORS)
            .await
            .map_err(|e| match e {
                AmbraError::Service(service) => AmbraError::Authentication(service.to_string()),
                other => other,
            })?;

        let sid = body
            .get("sid")
            .and_then(Value::as_str)
            .ok_or_else(|| AmbraError::Authentication("Login response has no sid".to_string()))?;
        let sid = Sid::new(sid).map_err(AmbraError::Authentication)?;

        tracing::info!(login = %self.username, "Logged in to Ambra");
        Ok(sid)
    }
}

#[async_trait]
impl SessionProvider for CredentialSession {
    async fn sid(&self) -> Result<Sid> {
        let mut active = self.active.lock().await;
        if let Some(ref session) = *active {
            return Ok(session.sid.clone());
        }
        let sid = self.login().await?;
        *active = Some(ActiveSession {
            sid: sid.clone(),
            logged_in_at: Utc::now(),
        });
        Ok(sid)
    }

    async fn refresh(&self) -> Result<Sid> {
        let mut active = self.active.lock().await;
        *active = None;
        tracing::debug!(login = %self.username, "Refreshing Ambra session");
        let sid = self.login().await?;
        *active = Some(ActiveSession {
            sid: sid.clone(),
            logged_in_at: Utc::now(),
        });
        Ok(sid)
    }

    fn can_refresh(&self) -> bool {
        true
    }

    async fn invalidate(&self) {
        *self.active.lock().await = None;
    }

    async fn logout(&self) -> Result<()> {
        let session = self.active.lock().await.take();
        let Some(session) = session else {
            return Ok(());
        };
        let params: Params = vec![("sid".to_string(), session.sid.expose().to_string())];
        self.transport
            .post_form("/session/logout", &params, LOGOUT_ERRORS)
            .await?;
        tracing::info!(login = %self.username, "Logged out of Ambra");
        Ok(())
    }
}

/// Session backed by a pre-issued sid
pub struct StaticSession {
    transport: HttpTransport,
    sid: Mutex<Option<Sid>>,
}

impl StaticSession {
    /// Wrap an existing sid
    pub fn new(transport: HttpTransport, sid: Sid) -> Self {
        Self {
            transport,
            sid: Mutex::new(Some(sid)),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn sid(&self) -> Result<Sid> {
        self.sid
            .lock()
            .await
            .clone()
            .ok_or_else(|| AmbraError::Authentication("Session has been logged out".to_string()))
    }

    async fn refresh(&self) -> Result<Sid> {
        Err(AmbraError::Authentication(
            "Session id expired and no credentials are available to log in again".to_string(),
        ))
    }

    fn can_refresh(&self) -> bool {
        false
    }

    async fn invalidate(&self) {
        *self.sid.lock().await = None;
    }

    async fn logout(&self) -> Result<()> {
        let sid = self.sid.lock().await.take();
        if let Some(sid) = sid {
            let params: Params = vec![("sid".to_string(), sid.expose().to_string())];
            self.transport
                .post_form("/session/logout", &params, LOGOUT_ERRORS)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, RetryConfig, ServiceConfig};
    use mockito::Matcher;

    fn transport_for(url: &str) -> HttpTransport {
        HttpTransport::new(&ServiceConfig {
            url: url.to_string(),
            retry: RetryConfig::none(),
            ..ServiceConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_credential_session_logs_in_once() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/session/login")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("login".into(), "user@example.com".into()),
                Matcher::UrlEncoded("password".into(), "pw".into()),
                Matcher::UrlEncoded("account_id".into(), "acc-1".into()),
            ]))
            .with_body(r#"{"status":"OK","sid":"sid-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let session = CredentialSession::new(
            transport_for(&server.url()),
            "user@example.com",
            secret_string("pw".to_string()),
            Some("acc-1".to_string()),
        );

        assert_eq!(session.sid().await.unwrap().expose(), "sid-1");
        assert_eq!(session.sid().await.unwrap().expose(), "sid-1");
        assert!(session.logged_in_at().await.is_some());
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_password_is_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/session/login")
            .with_status(412)
            .with_body(r#"{"status":"ERROR","error_type":"BAD_PASSWORD"}"#)
            .create_async()
            .await;

        let session = CredentialSession::new(
            transport_for(&server.url()),
            "user@example.com",
            secret_string("wrong".to_string()),
            None,
        );

        let err = session.sid().await.unwrap_err();
        assert!(matches!(err, AmbraError::Authentication(ref msg) if msg.contains("BAD_PASSWORD")));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/session/login")
            .with_body(r#"{"status":"OK","sid":"sid-1"}"#)
            .create_async()
            .await;
        let logout = server
            .mock("POST", "/session/logout")
            .match_body(Matcher::UrlEncoded("sid".into(), "sid-1".into()))
            .with_body(r#"{"status":"OK"}"#)
            .expect(1)
            .create_async()
            .await;

        let session = CredentialSession::new(
            transport_for(&server.url()),
            "user@example.com",
            secret_string("pw".to_string()),
            None,
        );
        session.sid().await.unwrap();
        session.logout().await.unwrap();
        session.logout().await.unwrap();

        assert!(session.logged_in_at().await.is_none());
        logout.assert_async().await;
    }

    #[tokio::test]
    async fn test_static_session_cannot_refresh() {
        let session = StaticSession::new(
            transport_for("http://localhost:1"),
            Sid::new("fixed").unwrap(),
        );
        assert!(!session.can_refresh());
        assert_eq!(session.sid().await.unwrap().expose(), "fixed");
        assert!(session.refresh().await.is_err());

        session.invalidate().await;
        assert!(session.sid().await.is_err());
    }
}
