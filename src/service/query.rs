//! Query building and pagination
//!
//! [`Query`] is one POST to a services endpoint. [`ListQuery`] adds field
//! selection, filtering, sorting and page-by-page iteration on top of it. A
//! list is read by re-issuing the same POST with an incrementing
//! `page.number` until the service returns a short page, reports
//! `page.more = 0`, or `max_results` is reached.
//!
//! ```rust,no_run
//! use ambra_sdk::service::filtering::Field;
//! use futures::TryStreamExt;
//!
//! # async fn example(api: &ambra_sdk::Api) -> ambra_sdk::domain::Result<()> {
//! let studies = api
//!     .study()
//!     .list()
//!     .only(["uuid", "patient_name", "modality"])
//!     .filter_by(Field::new("modality").equals("CT"))
//!     .sort_by(Field::new("created").desc())
//!     .max_results(500)
//!     .all()
//!     .await?;
//!
//! let mut pages = api.study().list().rows(50).pages();
//! while let Some(page) = pages.try_next().await? {
//!     println!("page {} has {} studies", page.number, page.items.len());
//! }
//! # Ok(())
//! # }
//! ```

use super::client::ServiceClient;
use super::filtering::{Filter, Sorter};
use super::params::ParamValue;
use super::transport::Params;
use crate::domain::{AmbraError, ErrorSpec, Result};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;

/// Which list features an endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListFeatures {
    /// Accepts `filter.*` parameters
    pub filter: bool,
    /// Accepts `sort_by`
    pub sort: bool,
}

impl ListFeatures {
    /// Pagination, filtering and sorting
    pub const ALL: ListFeatures = ListFeatures {
        filter: true,
        sort: true,
    };

    /// Pagination only
    pub const PAGINATE: ListFeatures = ListFeatures {
        filter: false,
        sort: false,
    };

    /// Pagination and sorting
    pub const SORT: ListFeatures = ListFeatures {
        filter: false,
        sort: true,
    };
}

/// A single services call
#[derive(Debug, Clone)]
pub struct Query {
    client: ServiceClient,
    endpoint: Cow<'static, str>,
    params: Params,
    fields: Option<Vec<String>>,
    errors: &'static [ErrorSpec],
    anonymous: bool,
}

impl Query {
    /// Call `endpoint` (e.g. `/study/get`) decoding errors with `errors`
    pub fn new(
        client: ServiceClient,
        endpoint: impl Into<Cow<'static, str>>,
        errors: &'static [ErrorSpec],
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            params: Vec::new(),
            fields: None,
            errors,
            anonymous: false,
        }
    }

    /// Call an endpoint that takes no sid, such as `/session/login`
    pub fn anonymous(
        client: ServiceClient,
        endpoint: impl Into<Cow<'static, str>>,
        errors: &'static [ErrorSpec],
    ) -> Self {
        Self {
            anonymous: true,
            ..Self::new(client, endpoint, errors)
        }
    }

    /// Endpoint path
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Add a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((key.into(), value.into().into_inner()));
        self
    }

    /// Add a parameter when `value` is `Some`
    pub fn param_opt<V: Into<ParamValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Restrict the returned fields
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .get_or_insert_with(Vec::new)
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Parameters as they will be sent, without the sid
    pub fn params(&self) -> Params {
        let mut params = self.params.clone();
        if let Some(ref fields) = self.fields {
            params.push((
                "fields".to_string(),
                ParamValue::list(fields.iter()).into_inner(),
            ));
        }
        params
    }

    /// Send and return the JSON response
    pub async fn get(&self) -> Result<Value> {
        if self.anonymous {
            return self
                .client
                .post_raw(&self.endpoint, &self.params(), self.errors)
                .await;
        }
        self.client
            .post(&self.endpoint, &self.params(), self.errors)
            .await
    }

    /// Send and deserialize the response
    pub async fn get_as<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.get().await?;
        serde_json::from_value(body).map_err(|e| {
            AmbraError::Serialization(format!("{}: {e}", self.endpoint))
        })
    }
}

/// One page of a list response
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    /// Rows requested
    pub rows: usize,
    /// Objects on this page
    pub items: Vec<Value>,
    /// `page.more` when the service reports it
    pub more: Option<bool>,
    /// `page.count` when the service reports it
    pub count: Option<usize>,
}

impl Page {
    fn from_response(body: &Value, result_key: &str, number: usize, rows: usize) -> Result<Self> {
        let items = match body.get(result_key) {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(AmbraError::Serialization(format!(
                    "Expected '{result_key}' to be a list, got {other}"
                )))
            }
        };

        let page = body.get("page");
        let more = page.and_then(|p| p.get("more")).and_then(value_as_bool);
        let count = page
            .and_then(|p| p.get("count"))
            .and_then(value_as_usize);

        Ok(Self {
            number,
            rows,
            items,
            more,
            count,
        })
    }
}

fn value_as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn value_as_usize(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// A paginated list call
#[derive(Debug, Clone)]
pub struct ListQuery {
    query: Query,
    result_key: Cow<'static, str>,
    features: ListFeatures,
    filters: Vec<Filter>,
    sorters: Vec<Sorter>,
    rows: Option<usize>,
    max_results: Option<usize>,
}

impl ListQuery {
    /// List `endpoint`, reading objects from `result_key` (e.g. `studies`)
    pub fn new(
        client: ServiceClient,
        endpoint: impl Into<Cow<'static, str>>,
        result_key: impl Into<Cow<'static, str>>,
        features: ListFeatures,
        errors: &'static [ErrorSpec],
    ) -> Self {
        Self {
            query: Query::new(client, endpoint, errors),
            result_key: result_key.into(),
            features,
            filters: Vec::new(),
            sorters: Vec::new(),
            rows: None,
            max_results: None,
        }
    }

    /// Endpoint path
    pub fn endpoint(&self) -> &str {
        self.query.endpoint()
    }

    /// Add a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query = self.query.param(key, value);
        self
    }

    /// Add a parameter when `value` is `Some`
    pub fn param_opt<V: Into<ParamValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.query = self.query.param_opt(key, value);
        self
    }

    /// Restrict the returned fields
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query = self.query.only(fields);
        self
    }

    /// Add a filter; the call fails if the endpoint cannot filter
    pub fn filter_by(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a sort key; the call fails if the endpoint cannot sort
    pub fn sort_by(mut self, sorter: Sorter) -> Self {
        self.sorters.push(sorter);
        self
    }

    /// Page size, defaults to the client's `page_rows`
    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows.max(1));
        self
    }

    /// Stop after this many objects
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    fn page_rows(&self) -> usize {
        let rows = self.rows.unwrap_or_else(|| self.query.client.page_rows());
        match self.max_results {
            Some(max) if max > 0 => rows.min(max),
            _ => rows,
        }
    }

    /// Parameters for page `number`, without the sid
    ///
    /// # Errors
    ///
    /// Returns `Validation` when filters or sorters were added to an
    /// endpoint that does not support them.
    pub fn page_params(&self, number: usize, rows: usize) -> Result<Params> {
        if !self.filters.is_empty() && !self.features.filter {
            return Err(AmbraError::Validation(format!(
                "{} does not support filtering",
                self.endpoint()
            )));
        }
        if !self.sorters.is_empty() && !self.features.sort {
            return Err(AmbraError::Validation(format!(
                "{} does not support sorting",
                self.endpoint()
            )));
        }

        let mut params = self.query.params();
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.sorters.is_empty() {
            params.push(("sort_by".to_string(), Sorter::join(&self.sorters)));
        }
        params.push(("page.number".to_string(), number.to_string()));
        params.push(("page.rows".to_string(), rows.to_string()));
        Ok(params)
    }

    /// Fetch a single page
    pub async fn fetch_page(&self, number: usize, rows: usize) -> Result<Page> {
        let params = self.page_params(number, rows)?;
        let body = self
            .query
            .client
            .post(self.query.endpoint(), &params, self.query.errors)
            .await?;
        Page::from_response(&body, &self.result_key, number, rows)
    }

    /// Lazily fetch pages
    pub fn pages(self) -> BoxStream<'static, Result<Page>> {
        if self.max_results == Some(0) {
            return stream::empty().boxed();
        }
        let rows = self.page_rows();

        stream::try_unfold(
            (self, Some(1_usize), 0_usize),
            move |(query, next, seen)| async move {
                let Some(number) = next else {
                    return Ok(None);
                };

                let mut page = query.fetch_page(number, rows).await?;
                let mut seen = seen + page.items.len();
                let mut more = !page.items.is_empty()
                    && page.items.len() >= rows
                    && page.more.unwrap_or(true);

                if let Some(max) = query.max_results {
                    if seen >= max {
                        let keep = page.items.len() - (seen - max);
                        page.items.truncate(keep);
                        seen = max;
                        more = false;
                    }
                }

                tracing::trace!(
                    endpoint = %query.endpoint(),
                    page = number,
                    items = page.items.len(),
                    more,
                    "Fetched page"
                );

                let next = if more { Some(number + 1) } else { None };
                Ok::<_, AmbraError>(Some((page, (query, next, seen))))
            },
        )
        .boxed()
    }

    /// Lazily fetch objects across pages
    pub fn stream(self) -> BoxStream<'static, Result<Value>> {
        self.pages()
            .map_ok(|page| stream::iter(page.items.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    /// Fetch every object
    pub async fn all(self) -> Result<Vec<Value>> {
        self.stream().try_collect().await
    }

    /// Fetch and deserialize every object
    pub async fn all_as<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let endpoint = self.endpoint().to_string();
        self.all()
            .await?
            .into_iter()
            .map(|v| {
                serde_json::from_value(v)
                    .map_err(|e| AmbraError::Serialization(format!("{endpoint}: {e}")))
            })
            .collect()
    }

    /// Fetch the first object, if any
    pub async fn first(self) -> Result<Option<Value>> {
        let mut items = self.max_results(1).all().await?;
        Ok(items.pop())
    }

    /// Number of matching objects
    ///
    /// Uses `page.count` when the service reports it, otherwise walks every
    /// page.
    pub async fn count(self) -> Result<usize> {
        let page = self.fetch_page(1, 1).await?;
        if let Some(count) = page.count {
            return Ok(count);
        }
        let mut total = 0;
        let mut items = self.stream();
        while items.try_next().await?.is_some() {
            total += 1;
        }
        Ok(total)
    }
}
