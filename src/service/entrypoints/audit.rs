//! `/audit/*` endpoints

use crate::domain::ErrorSpec;
use crate::service::query::{ListFeatures, ListQuery};
use crate::service::ServiceClient;

const OBJECT_ERRORS: &[ErrorSpec] = &[
    ErrorSpec::new("NOT_FOUND", "The object can not be found"),
    ErrorSpec::new("NOT_PERM", "You are not permitted to view the audit trail of this object"),
];

/// Audit namespace
#[derive(Debug, Clone)]
pub struct Audit {
    client: ServiceClient,
}

impl Audit {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Audit trail of one object, newest first unless sorted otherwise
    pub fn object(&self, uuid: &str) -> ListQuery {
        ListQuery::new(
            self.client.clone(),
            "/audit/object",
            "events",
            ListFeatures::SORT,
            OBJECT_ERRORS,
        )
        .param("uuid", uuid)
    }
}
