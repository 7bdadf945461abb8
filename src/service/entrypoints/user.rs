//! `/user/*` endpoints

use crate::domain::ErrorSpec;
use crate::service::query::{ListFeatures, ListQuery, Query};
use crate::service::ServiceClient;

const LIST_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_CONDITION", "The condition in the filter is not supported"),
    ErrorSpec::new("INVALID_FIELD", "The field is not valid for this object"),
    ErrorSpec::new("NOT_FOUND", "The account can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to list the users of this account"),
];

const GET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The user can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to view this user"),
];

const ADD_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("ALREADY_EXISTS", "A user with this email already exists"),
    ErrorSpec::new("INVALID_EMAIL", "The email address is not valid"),
    ErrorSpec::new("INVALID_PASSWORD", "The password does not meet the password policy"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
];

const SET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_EMAIL", "The email address is not valid"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
    ErrorSpec::new("NOT_FOUND", "The user can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to edit this user"),
];

const DELETE_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The user can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to delete this user"),
];

/// User namespace
#[derive(Debug, Clone)]
pub struct User {
    client: ServiceClient,
}

impl User {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// List the users of an account
    pub fn list(&self, account_id: &str) -> ListQuery {
        ListQuery::new(
            self.client.clone(),
            "/user/list",
            "users",
            ListFeatures::ALL,
            LIST_ERRORS,
        )
        .param("account_id", account_id)
    }

    /// Get a user by uuid
    pub fn get(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/user/get", GET_ERRORS).param("uuid", uuid)
    }

    /// Create a user
    pub fn add(&self, email: &str, first: &str, last: &str) -> Query {
        Query::new(self.client.clone(), "/user/add", ADD_ERRORS)
            .param("email", email)
            .param("first", first)
            .param("last", last)
    }

    /// Update user fields
    pub fn set(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/user/set", SET_ERRORS).param("uuid", uuid)
    }

    /// Delete a user
    pub fn delete(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/user/delete", DELETE_ERRORS).param("uuid", uuid)
    }
}
