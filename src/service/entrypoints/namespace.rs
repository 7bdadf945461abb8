//! `/namespace/*` endpoints

use crate::domain::ErrorSpec;
use crate::service::query::{ListFeatures, ListQuery, Query};
use crate::service::ServiceClient;

const LIST_ERRORS: &[ErrorSpec] = &[];

const GET_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The namespace can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to view this namespace"),
];

/// Namespace namespace
#[derive(Debug, Clone)]
pub struct Namespace {
    client: ServiceClient,
}

impl Namespace {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// List the namespaces the user can access
    pub fn list(&self) -> ListQuery {
        ListQuery::new(
            self.client.clone(),
            "/namespace/list",
            "namespaces",
            ListFeatures::PAGINATE,
            LIST_ERRORS,
        )
    }

    pub fn get(&self, uuid: &str) -> Query {
        Query::new(self.client.clone(), "/namespace/get", GET_ERRORS).param("uuid", uuid)
    }
}
