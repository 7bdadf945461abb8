//! Cross-cutting concerns of an endpoint

use super::parser::{Endpoint, RequestParameter};

/// What list support an endpoint needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndpointFeatures {
    pub pagination: bool,
    pub filter: bool,
    pub sort: bool,
}

/// Inspect parameters and description
pub fn classify(endpoint: &Endpoint) -> EndpointFeatures {
    let description = endpoint.description.to_lowercase();

    EndpointFeatures {
        pagination: has_param(endpoint, |n| n == "page.number" || n == "page.rows")
            || description.contains("supports pagination"),
        filter: has_param(endpoint, |n| n.starts_with("filter."))
            || description.contains("filtering"),
        sort: has_param(endpoint, |n| n == "sort_by") || description.contains("sorting"),
    }
}

fn has_param(endpoint: &Endpoint, pred: impl Fn(&str) -> bool) -> bool {
    endpoint.parameters.iter().any(|p| pred(&p.name))
}

/// Parameters handled by the query layer rather than method arguments
/// Endpoints called before a session exists
const ANONYMOUS_ENDPOINTS: &[&str] = &["/session/login"];

/// Whether the endpoint is sent without a `sid`
pub fn is_anonymous(endpoint: &Endpoint) -> bool {
    ANONYMOUS_ENDPOINTS.contains(&endpoint.url.as_str())
}

pub fn is_managed_parameter(parameter: &RequestParameter) -> bool {
    let name = parameter.name.as_str();
    name == "sid"
        || name == "sort_by"
        || name == "fields"
        || name.starts_with("page.")
        || name.starts_with("filter.")
}
