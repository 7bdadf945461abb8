//! Storage API calls
//!
//! The Storage API is served per engine. A study is addressed by its
//! storage namespace and DICOM study instance UID; when the study lives on
//! a specific engine the locator carries that engine's host name and the
//! request goes to `https://<engine_fqdn>/api/v3/storage` instead of the
//! configured storage base.

use super::client::ServiceClient;
use super::transport::Params;
use crate::domain::{AmbraError, Result};
use reqwest::Method;
use serde_json::Value;

/// Where a study lives in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyLocator {
    /// Engine host name, e.g. `engine1.example.com`
    pub engine_fqdn: Option<String>,
    /// Storage namespace uuid
    pub namespace: String,
    /// Study instance UID
    pub study_uid: String,
}

impl StudyLocator {
    /// Locate a study on the configured storage base
    pub fn new(namespace: impl Into<String>, study_uid: impl Into<String>) -> Self {
        Self {
            engine_fqdn: None,
            namespace: namespace.into(),
            study_uid: study_uid.into(),
        }
    }

    /// Route requests to a specific engine
    pub fn on_engine(mut self, engine_fqdn: impl Into<String>) -> Self {
        self.engine_fqdn = Some(engine_fqdn.into());
        self
    }

    /// Build a locator from a `/study/get` response
    ///
    /// Reads `storage_namespace`, `study_uid` and, when present,
    /// `engine_fqdn`.
    pub fn from_study(study: &Value) -> Result<Self> {
        let field = |name: &str| {
            study
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let namespace = field("storage_namespace").ok_or_else(|| {
            AmbraError::Validation("Study has no storage_namespace".to_string())
        })?;
        let study_uid = field("study_uid")
            .ok_or_else(|| AmbraError::Validation("Study has no study_uid".to_string()))?;

        Ok(Self {
            engine_fqdn: field("engine_fqdn"),
            namespace,
            study_uid,
        })
    }
}

/// Storage API namespace
#[derive(Debug, Clone)]
pub struct Storage {
    client: ServiceClient,
}

impl Storage {
    pub(crate) fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    fn base(&self, locator: &StudyLocator) -> String {
        match locator.engine_fqdn {
            Some(ref fqdn) => format!("https://{fqdn}/api/v3/storage"),
            None => self.client.storage_base().to_string(),
        }
    }

    fn study_url(&self, locator: &StudyLocator) -> Result<String> {
        for (name, value) in [
            ("namespace", &locator.namespace),
            ("study_uid", &locator.study_uid),
        ] {
            if value.trim().is_empty() {
                return Err(AmbraError::Validation(format!("Storage {name} cannot be empty")));
            }
        }
        Ok(format!(
            "{}/study/{}/{}",
            self.base(locator),
            locator.namespace,
            locator.study_uid
        ))
    }

    /// Series and images of a study
    pub async fn study_schema(&self, locator: &StudyLocator) -> Result<Value> {
        let url = format!("{}/schema", self.study_url(locator)?);
        self.client.storage(Method::GET, &url, &Params::new()).await
    }

    /// DICOM attributes of one image version as JSON
    pub async fn image_json(
        &self,
        locator: &StudyLocator,
        image_uid: &str,
        version: &str,
    ) -> Result<Value> {
        let url = format!(
            "{}/image/{image_uid}/version/{version}/json",
            self.study_url(locator)?
        );
        self.client.storage(Method::GET, &url, &Params::new()).await
    }

    /// Patient information of a study
    pub async fn study_phi(&self, locator: &StudyLocator) -> Result<Value> {
        let url = format!("{}/phi", self.study_url(locator)?);
        self.client.storage(Method::GET, &url, &Params::new()).await
    }

    /// Delete a study's images from storage
    pub async fn delete_study(&self, locator: &StudyLocator) -> Result<()> {
        let url = self.study_url(locator)?;
        self.client.storage(Method::DELETE, &url, &Params::new()).await?;
        tracing::info!(
            namespace = %locator.namespace,
            study_uid = %locator.study_uid,
            "Deleted study from storage"
        );
        Ok(())
    }
}
