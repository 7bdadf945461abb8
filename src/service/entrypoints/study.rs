//! `/study/*` endpoints

use crate::domain::ErrorSpec;
use crate::service::query::{ListFeatures, ListQuery, Query};
use crate::service::ServiceClient;

const LIST_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_CONDITION", "The condition in the filter is not supported"),
    ErrorSpec::new("INVALID_FIELD", "The field is not valid for this object"),
    ErrorSpec::new("INVALID_SORT_FIELD", "The sort field is not valid"),
    ErrorSpec::new("INVALID_SORT_ORDER", "The sort order is not valid"),
];

const GET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The study can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to view this study"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
];

const ADD_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("ALREADY_EXISTS", "A study with the same study_uid already exists"),
    ErrorSpec::new("INVALID_JSON", "The customfield parameter is not a valid JSON structure"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
    ErrorSpec::new("NOT_FOUND", "The storage or phi namespace can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to add a study to this namespace"),
];

const SET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_JSON", "The customfield parameter is not a valid JSON structure"),
    ErrorSpec::new("LOCKED", "The study is locked"),
    ErrorSpec::new("MISSING_FIELDS", "A required field is missing"),
    ErrorSpec::new("NOT_FOUND", "The study can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to edit the study"),
];

const DELETE_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The study can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to delete the study"),
    ErrorSpec::new("LOCKED", "The study is locked"),
];

const SHARE_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_EMAIL", "The email address is not valid"),
    ErrorSpec::new("NOT_FOUND", "The study or share target can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to share the study"),
    ErrorSpec::with_subtype("NOT_PERM", "SHARE_CODE", "The share code does not allow this share"),
];

const APPROVE_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The study can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to approve the study"),
    ErrorSpec::new("NOT_PENDING", "The study is not pending approval"),
];

const COUNT_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("INVALID_CONDITION", "The condition in the filter is not supported"),
];

/// Study namespace
#[derive(Debug, Clone)]
pub struct Study {
    client: ServiceClient,
}

impl Study {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// List the studies the user can see
    pub fn list(&self) -> ListQuery {
        ListQuery::new(
            self.client.clone(),
            "/study/list",
            "studies",
            ListFeatures::ALL,
            LIST_ERRORS,
        )
    }

    /// Get a study by uuid
    pub fn get(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/study/get", GET_ERRORS).param("uuid", uuid)
    }

    /// Add a study record to a storage namespace
    pub fn add(&self, storage_namespace: &str, phi_namespace: &str, study_uid: &str) -> Query {
        Query::new(self.client.clone(), "/study/add", ADD_ERRORS)
            .param("storage_namespace", storage_namespace)
            .param("phi_namespace", phi_namespace)
            .param("study_uid", study_uid)
    }

    /// Update study fields
    pub fn set(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/study/set", SET_ERRORS).param("uuid", uuid)
    }

    /// Delete a study
    pub fn delete(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/study/delete", DELETE_ERRORS).param("uuid", uuid)
    }

    /// Share a study with a user, group, account or email address
    pub fn share(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/study/share", SHARE_ERRORS).param("uuid", uuid)
    }

    /// Approve a study waiting in an approval queue
    pub fn approve(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/study/approve", APPROVE_ERRORS).param("uuid", uuid)
    }

    /// Count studies
    pub fn count(&self) -> Query {
        Query::new(self.client.clone(), "/study/count", COUNT_ERRORS)
    }
}
