//! `/session/*` endpoints

use crate::domain::{ErrorSpec, Result};
use crate::service::query::Query;
use crate::service::session::LOGIN_ERRORS;
use crate::service::ServiceClient;

const USER_ERRORS: &[ErrorSpec] = &[];

const PERMISSIONS_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The account or namespace can not be found"),
];

const UUID_ERRORS: &[ErrorSpec] = &[];

/// Session namespace
#[derive(Debug, Clone)]
pub struct Session {
    client: ServiceClient,
}

impl Session {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Log in and return a new sid in the response
    ///
    /// This does not change the sid the client itself uses.
    pub fn login(&self, login: &str, password: &str) -> Query {
        Query::anonymous(self.client.clone(), "/session/login", LOGIN_ERRORS)
            .param("login", login)
            .param("password", password)
    }

    /// End the client's session
    pub async fn logout(&self) -> Result<()> {
        self.client.logout().await
    }

    /// The user the session belongs to
    pub fn user(&self) -> Query {
        Query::new(self.client.clone(), "/session/user", USER_ERRORS)
    }

    /// Permissions of the session user, optionally within one account
    pub fn permissions(&self, account_id: Option<&str>) -> Query {
        Query::new(self.client.clone(), "/session/permissions", PERMISSIONS_ERRORS)
            .param_opt("account_id", account_id)
    }

    /// Generate a new uuid
    pub fn uuid(&self) -> Query {
        Query::new(self.client.clone(), "/session/uuid", UUID_ERRORS)
    }
}
