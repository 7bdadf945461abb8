//! Source rendering
//!
//! Output follows the layout of `service::entrypoints`: one struct per
//! namespace wrapping a [`ServiceClient`](crate::service::ServiceClient),
//! one method per endpoint returning an unsent query, and one error table
//! constant per endpoint.
//!
//! SDK types are always reached through the lowercase `domain`, `query` and
//! `service` module paths. Generated items are PascalCase or UPPER_CASE, so
//! a namespace such as `/query/*` cannot shadow them.

use super::classify::{classify, is_anonymous, is_managed_parameter, EndpointFeatures};
use super::parser::Endpoint;
use crate::domain::{AmbraError, Result};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::PathBuf;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Method names the generated `impl` already defines
const RESERVED_METHODS: &[&str] = &["new"];

/// A file to write, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Rendered namespace module
#[derive(Debug, Clone)]
pub struct RenderedNamespace {
    pub module: String,
    pub type_name: String,
    pub file: GeneratedFile,
    /// Endpoints that made it into the file
    pub endpoints: usize,
}

fn escape_keyword(ident: String) -> String {
    if KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else {
        ident
    }
}

/// Turn an arbitrary name into a snake_case identifier
pub fn rust_ident(raw: &str) -> String {
    let mut ident = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            ident.push(c.to_ascii_lowercase());
        } else if !ident.ends_with('_') {
            ident.push('_');
        }
    }
    let ident = ident.trim_matches('_').to_string();
    let ident = match ident.chars().next() {
        None => "param".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{ident}"),
        Some(_) => ident,
    };
    escape_keyword(ident)
}

/// Turn a namespace into a PascalCase type name
pub fn type_name(namespace: &str) -> String {
    let name: String = namespace
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if name.is_empty() {
        return "Namespace".to_string();
    }
    escape_keyword(name)
}

/// Method name from the path after the namespace, e.g. `user_add`
pub fn method_name(endpoint: &Endpoint) -> String {
    let segments = endpoint.action_segments();
    if segments.is_empty() {
        return "call".to_string();
    }
    let name = rust_ident(&segments.join("_"));
    if RESERVED_METHODS.contains(&name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}

fn summary_line(description: &str) -> &str {
    let first = description.split(". ").next().unwrap_or_default().trim();
    first.trim_end_matches('.')
}

fn result_key(endpoint: &Endpoint) -> Option<&str> {
    endpoint
        .response
        .iter()
        .find(|r| r.kind.to_lowercase().contains("list"))
        .map(|r| r.name.as_str())
}

fn features_expr(features: EndpointFeatures) -> &'static str {
    match (features.filter, features.sort) {
        (true, true) => "query::ListFeatures::ALL",
        (false, true) => "query::ListFeatures::SORT",
        (false, false) => "query::ListFeatures::PAGINATE",
        (true, false) => "query::ListFeatures {\n                filter: true,\n                sort: false,\n            }",
    }
}

struct Method<'a> {
    endpoint: &'a Endpoint,
    name: String,
    features: EndpointFeatures,
    result_key: Option<&'a str>,
}

impl Method<'_> {
    fn errors_const(&self) -> String {
        format!("{}_ERRORS", self.name.trim_end_matches('_').to_uppercase())
    }

    fn is_list(&self) -> bool {
        self.features.pagination && self.result_key.is_some()
    }
}

/// Render one namespace module
pub fn render_namespace(namespace: &str, endpoints: &[&Endpoint]) -> Result<RenderedNamespace> {
    let module = rust_ident(namespace);
    let type_name = type_name(namespace);

    let mut seen = BTreeSet::new();
    let mut methods = Vec::new();
    for &endpoint in endpoints {
        let name = method_name(endpoint);
        if !seen.insert(name.clone()) {
            tracing::warn!(url = %endpoint.url, method = %name, "Duplicate method name, skipping");
            continue;
        }
        let features = classify(endpoint);
        let result_key = result_key(endpoint);
        if features.pagination && result_key.is_none() {
            tracing::warn!(
                url = %endpoint.url,
                "Paginated endpoint has no list response field, rendering as a plain call"
            );
        }
        methods.push(Method {
            endpoint,
            name,
            features,
            result_key,
        });
    }

    let mut out = String::new();
    write_namespace(&mut out, namespace, &type_name, &methods)
        .map_err(|e| AmbraError::Codegen(format!("Failed to render {namespace}: {e}")))?;

    Ok(RenderedNamespace {
        file: GeneratedFile {
            path: PathBuf::from(format!("{module}.rs")),
            contents: out,
        },
        module,
        type_name,
        endpoints: methods.len(),
    })
}

fn write_namespace(
    out: &mut String,
    namespace: &str,
    type_name: &str,
    methods: &[Method<'_>],
) -> std::fmt::Result {
    writeln!(out, "//! `/{namespace}/*` endpoints")?;
    writeln!(out, "//!")?;
    writeln!(out, "//! Generated by `ambra generate`.")?;
    writeln!(out)?;

    writeln!(out, "use crate::service::query;")?;
    writeln!(out, "use crate::{{domain, service}};")?;

    for method in methods {
        writeln!(out)?;
        write_errors(out, method)?;
    }

    writeln!(out)?;
    writeln!(out, "/// {type_name} namespace")?;
    writeln!(out, "#[derive(Debug, Clone)]")?;
    writeln!(out, "pub struct {type_name} {{")?;
    writeln!(out, "    client: service::ServiceClient,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl {type_name} {{")?;
    writeln!(out, "    pub(crate) fn new(client: service::ServiceClient) -> Self {{")?;
    writeln!(out, "        Self {{ client }}")?;
    writeln!(out, "    }}")?;

    for method in methods {
        writeln!(out)?;
        write_method(out, method)?;
    }
    writeln!(out, "}}")
}

fn write_errors(out: &mut String, method: &Method<'_>) -> std::fmt::Result {
    let errors = &method.endpoint.errors;
    if errors.is_empty() {
        return writeln!(out, "const {}: &[domain::ErrorSpec] = &[];", method.errors_const());
    }
    writeln!(out, "const {}: &[domain::ErrorSpec] = &[", method.errors_const())?;
    for error in errors {
        match error.error_subtype {
            Some(ref subtype) => writeln!(
                out,
                "    domain::ErrorSpec::with_subtype({:?}, {:?}, {:?}),",
                error.error_type, subtype, error.description
            )?,
            None => writeln!(
                out,
                "    domain::ErrorSpec::new({:?}, {:?}),",
                error.error_type, error.description
            )?,
        }
    }
    writeln!(out, "];")
}

fn write_method(out: &mut String, method: &Method<'_>) -> std::fmt::Result {
    let endpoint = method.endpoint;

    let mut used = BTreeSet::new();
    let mut args = Vec::new();
    let mut optional = Vec::new();
    for parameter in endpoint.parameters.iter().filter(|p| !is_managed_parameter(p)) {
        if parameter.optional {
            optional.push(parameter.name.as_str());
            continue;
        }
        let mut ident = rust_ident(&parameter.name);
        while !used.insert(ident.clone()) {
            ident.push('_');
        }
        args.push((parameter.name.as_str(), ident));
    }

    let summary = summary_line(&endpoint.description);
    if !summary.is_empty() {
        writeln!(out, "    /// {summary}")?;
    }
    if !optional.is_empty() {
        if !summary.is_empty() {
            writeln!(out, "    ///")?;
        }
        let names: Vec<String> = optional.iter().map(|n| format!("`{n}`")).collect();
        writeln!(out, "    /// Optional: {}", names.join(", "))?;
    }

    let mut signature = String::from("&self");
    for (_, ident) in &args {
        write!(signature, ", {ident}: &str")?;
    }
    let returns = if method.is_list() { "query::ListQuery" } else { "query::Query" };
    writeln!(out, "    pub fn {}({signature}) -> {returns} {{", method.name)?;

    match method.result_key {
        Some(key) if method.features.pagination => {
            writeln!(out, "        query::ListQuery::new(")?;
            writeln!(out, "            self.client.clone(),")?;
            writeln!(out, "            {:?},", endpoint.url)?;
            writeln!(out, "            {key:?},")?;
            writeln!(out, "            {},", features_expr(method.features))?;
            writeln!(out, "            {},", method.errors_const())?;
            write!(out, "        )")?;
        }
        _ => {
            let constructor = if is_anonymous(endpoint) { "anonymous" } else { "new" };
            write!(
                out,
                "        query::Query::{constructor}(self.client.clone(), {:?}, {})",
                endpoint.url,
                method.errors_const()
            )?;
        }
    }
    for (name, ident) in &args {
        writeln!(out)?;
        write!(out, "            .param({name:?}, {ident})")?;
    }
    writeln!(out)?;
    writeln!(out, "    }}")
}

/// Render the `mod.rs` declaring every namespace
pub fn render_mod(namespaces: &[RenderedNamespace]) -> GeneratedFile {
    let mut sorted: Vec<_> = namespaces.iter().collect();
    sorted.sort_by(|a, b| a.module.cmp(&b.module));

    let mut out = String::from("//! Services API namespaces\n//!\n//! Generated by `ambra generate`.\n\n");
    for ns in &sorted {
        out.push_str(&format!("pub mod {};\n", ns.module));
    }
    out.push('\n');
    for ns in &sorted {
        out.push_str(&format!("pub use {}::{};\n", ns.module, ns.type_name));
    }

    GeneratedFile {
        path: PathBuf::from("mod.rs"),
        contents: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::parser::{ErrorParameter, RequestParameter, ResponseParameter};
    use test_case::test_case;

    fn param(name: &str, optional: bool) -> RequestParameter {
        RequestParameter {
            name: name.to_string(),
            kind: "string".to_string(),
            description: String::new(),
            optional,
        }
    }

    fn study_list() -> Endpoint {
        Endpoint {
            url: "/study/list".to_string(),
            description: "List studies. Supports pagination, filtering and sorting.".to_string(),
            parameters: vec![param("sid", false), param("page.number", true), param("phi_namespace", true)],
            errors: vec![ErrorParameter {
                error_type: "INVALID_CONDITION".to_string(),
                error_subtype: None,
                description: "Bad \"condition\"".to_string(),
            }],
            response: vec![ResponseParameter {
                name: "studies".to_string(),
                kind: "list".to_string(),
                description: String::new(),
            }],
        }
    }

    fn group_user_add() -> Endpoint {
        Endpoint {
            url: "/group/user/add".to_string(),
            parameters: vec![param("uuid", false), param("user_id", false)],
            errors: vec![ErrorParameter {
                error_type: "NOT_PERM".to_string(),
                error_subtype: Some("SHARE_CODE".to_string()),
                description: "No".to_string(),
            }],
            ..Endpoint::default()
        }
    }

    #[test_case("study_uid", "study_uid")]
    #[test_case("customfield-abc", "customfield_abc")]
    #[test_case("type", "type_")]
    #[test_case("2fa", "_2fa")]
    #[test_case("--", "param")]
    fn test_rust_ident(raw: &str, expected: &str) {
        assert_eq!(rust_ident(raw), expected);
    }

    #[test_case("study", "Study")]
    #[test_case("dicom_data", "DicomData")]
    #[test_case("self", "Self_")]
    fn test_type_name(raw: &str, expected: &str) {
        assert_eq!(type_name(raw), expected);
    }

    #[test]
    fn test_list_endpoint_renders_list_query() {
        let endpoint = study_list();
        let rendered = render_namespace("study", &[&endpoint]).unwrap();
        let src = &rendered.file.contents;

        assert_eq!(rendered.file.path, PathBuf::from("study.rs"));
        assert!(src.contains("use crate::service::query;\nuse crate::{domain, service};\n"));
        assert!(src.contains("/// List studies\n"));
        assert!(src.contains("/// Optional: `phi_namespace`"));
        assert!(src.contains("pub fn list(&self) -> query::ListQuery {"));
        assert!(src.contains("            \"studies\",\n            query::ListFeatures::ALL,"));
        assert!(src.contains(r#"domain::ErrorSpec::new("INVALID_CONDITION", "Bad \"condition\""),"#));
        assert!(!src.contains(".param(\"sid\""));
    }

    #[test]
    fn test_nested_path_renders_arguments() {
        let endpoint = group_user_add();
        let rendered = render_namespace("group", &[&endpoint]).unwrap();
        let src = &rendered.file.contents;

        assert!(src.contains("pub fn user_add(&self, uuid: &str, user_id: &str) -> query::Query {"));
        assert!(src.contains("query::Query::new(self.client.clone(), \"/group/user/add\", USER_ADD_ERRORS)"));
        assert!(src.contains("            .param(\"uuid\", uuid)\n            .param(\"user_id\", user_id)\n"));
        assert!(src.contains(r#"domain::ErrorSpec::with_subtype("NOT_PERM", "SHARE_CODE", "No"),"#));
    }

    #[test]
    fn test_paginated_without_list_field_is_plain_call() {
        let mut endpoint = study_list();
        endpoint.response.clear();
        let rendered = render_namespace("study", &[&endpoint]).unwrap();
        assert!(rendered.file.contents.contains("pub fn list(&self) -> query::Query {"));
    }

    #[test]
    fn test_duplicate_methods_skipped() {
        let a = group_user_add();
        let b = group_user_add();
        let rendered = render_namespace("group", &[&a, &b]).unwrap();
        assert_eq!(rendered.endpoints, 1);
    }

    #[test]
    fn test_keyword_method_name() {
        let endpoint = Endpoint {
            url: "/study/type".to_string(),
            ..Endpoint::default()
        };
        let rendered = render_namespace("study", &[&endpoint]).unwrap();
        assert!(rendered.file.contents.contains("pub fn type_(&self) -> query::Query {"));
        assert!(rendered.file.contents.contains("const TYPE_ERRORS: &[domain::ErrorSpec] = &[];"));
    }

    #[test]
    fn test_query_namespace_keeps_sdk_paths() {
        let get = Endpoint {
            url: "/query/get".to_string(),
            parameters: vec![param("uuid", false)],
            ..Endpoint::default()
        };
        let list = Endpoint {
            url: "/query/list".to_string(),
            ..study_list()
        };
        let rendered = render_namespace("query", &[&get, &list]).unwrap();
        let src = &rendered.file.contents;

        assert_eq!(rendered.type_name, "Query");
        assert!(src.contains("pub struct Query {\n    client: service::ServiceClient,\n}"));
        assert!(src.contains("pub fn get(&self, uuid: &str) -> query::Query {"));
        assert!(src.contains("pub fn list(&self) -> query::ListQuery {"));
        assert!(!src.contains("use crate::service::query::"));
        assert!(!src.contains(" Query::new("));
        assert!(!src.contains("&[ErrorSpec]"));
    }

    #[test]
    fn test_endpoint_named_new_is_escaped() {
        let endpoint = Endpoint {
            url: "/study/new".to_string(),
            ..Endpoint::default()
        };
        let rendered = render_namespace("study", &[&endpoint]).unwrap();
        let src = &rendered.file.contents;

        assert!(src.contains("pub(crate) fn new(client: service::ServiceClient) -> Self {"));
        assert!(src.contains("pub fn new_(&self) -> query::Query {"));
        assert!(src.contains("const NEW_ERRORS: &[domain::ErrorSpec] = &[];"));
    }

    #[test]
    fn test_login_is_sent_without_sid() {
        let login = Endpoint {
            url: "/session/login".to_string(),
            parameters: vec![param("login", false), param("password", false)],
            ..Endpoint::default()
        };
        let user = Endpoint {
            url: "/session/user".to_string(),
            ..Endpoint::default()
        };
        let rendered = render_namespace("session", &[&login, &user]).unwrap();
        let src = &rendered.file.contents;

        assert!(src.contains("query::Query::anonymous(self.client.clone(), \"/session/login\", LOGIN_ERRORS)"));
        assert!(src.contains("query::Query::new(self.client.clone(), \"/session/user\", USER_ERRORS)"));
    }

    #[test]
    fn test_render_mod_sorted() {
        let group = group_user_add();
        let study = study_list();
        let namespaces = vec![
            render_namespace("study", &[&study]).unwrap(),
            render_namespace("group", &[&group]).unwrap(),
        ];
        let file = render_mod(&namespaces);
        assert!(file
            .contents
            .contains("pub mod group;\npub mod study;\n\npub use group::Group;\npub use study::Study;\n"));
    }
}
