//! `/account/*` endpoints

use crate::domain::ErrorSpec;
use crate::service::query::{ListFeatures, ListQuery, Query};
use crate::service::ServiceClient;

const LIST_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_CONDITION", "The condition in the filter is not supported"),
    ErrorSpec::new("INVALID_FIELD", "The field is not valid for this object"),
];

const GET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The account can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to view this account"),
];

const ADD_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("ALREADY_EXISTS", "An account with this name already exists"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to create accounts"),
];

const SET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_JSON", "A JSON parameter is not valid"),
    ErrorSpec::new("NOT_FOUND", "The account can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to edit this account"),
];

const DELETE_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The account can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to delete this account"),
];

/// Account namespace
#[derive(Debug, Clone)]
pub struct Account {
    client: ServiceClient,
}

impl Account {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// List the accounts the user belongs to
    pub fn list(&self) -> ListQuery {
        ListQuery::new(
            self.client.clone(),
            "/account/list",
            "accounts",
            ListFeatures::ALL,
            LIST_ERRORS,
        )
    }

    /// Get an account by uuid
    pub fn get(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/account/get", GET_ERRORS).param("uuid", uuid)
    }

    /// Create an account
    pub fn add(&self, name: &str) -> Query {
        Query::new(self.client.clone(), "/account/add", ADD_ERRORS).param("name", name)
    }

    /// Update account fields
    pub fn set(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/account/set", SET_ERRORS).param("uuid", uuid)
    }

    /// Delete an account
    pub fn delete(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/account/delete", DELETE_ERRORS).param("uuid", uuid)
    }
}
