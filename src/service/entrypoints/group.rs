//! `/group/*` endpoints

use crate::domain::ErrorSpec;
use crate::service::query::{ListFeatures, ListQuery, Query};
use crate::service::ServiceClient;

const LIST_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The account can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to list the groups of this account"),
];

const GET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The group can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to view this group"),
];

const ADD_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("DUP_NAME", "A group with this name already exists"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
    ErrorSpec::new("NOT_FOUND", "The account can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to add groups to this account"),
];

const SET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("DUP_NAME", "A group with this name already exists"),
    ErrorSpec::new("NOT_FOUND", "The group can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to edit this group"),
];

const DELETE_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The group can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to delete this group"),
];

const USER_ADD_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("ALREADY_EXISTS", "The user is already a member of the group"),
    ErrorSpec::new("NOT_FOUND", "The group or user can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to edit this group"),
];

const USER_DELETE_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The group or user can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to edit this group"),
];

/// Group namespace
#[derive(Debug, Clone)]
pub struct Group {
    client: ServiceClient,
}

impl Group {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// List the groups of an account
    pub fn list(&self, account_id: &str) -> ListQuery {
        ListQuery::new(
            self.client.clone(),
            "/group/list",
            "groups",
            ListFeatures::ALL,
            LIST_ERRORS,
        )
        .param("account_id", account_id)
    }

    pub fn get(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/group/get", GET_ERRORS).param("uuid", uuid)
    }

    pub fn add(&self, account_id: &str, name: &str) -> Query {
        Query::new(self.client.clone(), "/group/add", ADD_ERRORS)
            .param("account_id", account_id)
            .param("name", name)
    }

    pub fn set(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/group/set", SET_ERRORS).param("uuid", uuid)
    }

    pub fn delete(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/group/delete", DELETE_ERRORS).param("uuid", uuid)
    }

    /// Add a user to the group
    pub fn user_add(&self, uuid: &str, user_id: &str) -> Query {
        Query::new(self.client.clone(), "/group/user/add", USER_ADD_ERRORS)
            .param("uuid", uuid)
            .param("user_id", user_id)
    }

    /// Remove a user from the group
    pub fn user_delete(&self, uuid: &str, user_id: &str) -> Query {
        Query::new(self.client.clone(), "/group/user/delete", USER_DELETE_ERRORS)
            .param("uuid", uuid)
            .param("user_id", user_id)
    }
}
