//! Entrypoint generator
//!
//! Reads the HTML API reference and writes one Rust module per services
//! namespace in the shape of [`crate::service::entrypoints`]:
//!
//! 1. [`parser`] turns each `<h2>` section into an [`Endpoint`] with its
//!    request, error and response rows.
//! 2. [`classify`](classify::classify) decides whether the endpoint pages,
//!    filters and sorts.
//! 3. [`render`] emits `<namespace>.rs` files plus a `mod.rs`.

pub mod classify;
pub mod parser;
pub mod render;

pub use classify::EndpointFeatures;
pub use parser::{Endpoint, ErrorParameter, RequestParameter, ResponseParameter};
pub use render::GeneratedFile;

use crate::domain::{AmbraError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Generated sources, not yet written
#[derive(Debug, Clone, Default)]
pub struct Generated {
    pub files: Vec<GeneratedFile>,
    pub namespaces: usize,
    pub endpoints: usize,
    pub skipped: usize,
}

/// Outcome of [`generate`]
#[derive(Debug, Clone, Default)]
pub struct GenerateSummary {
    pub namespaces: usize,
    pub endpoints: usize,
    /// Sections without an endpoint URL
    pub skipped: usize,
    pub files: Vec<PathBuf>,
}

/// Render sources from an HTML reference
pub fn generate_sources(html: &str) -> Result<Generated> {
    let document = parser::parse_document(html)?;

    let mut grouped: BTreeMap<&str, Vec<&Endpoint>> = BTreeMap::new();
    for endpoint in &document.endpoints {
        grouped.entry(endpoint.namespace()).or_default().push(endpoint);
    }

    let mut rendered = Vec::with_capacity(grouped.len());
    for (namespace, endpoints) in &grouped {
        rendered.push(render::render_namespace(namespace, endpoints)?);
    }
    if rendered.is_empty() {
        return Err(AmbraError::Codegen(
            "Input contains no endpoint sections".to_string(),
        ));
    }

    let mut generated = Generated {
        namespaces: rendered.len(),
        endpoints: rendered.iter().map(|r| r.endpoints).sum(),
        skipped: document.skipped.len(),
        files: Vec::with_capacity(rendered.len() + 1),
    };
    generated.files.push(render::render_mod(&rendered));
    generated
        .files
        .extend(rendered.into_iter().map(|r| r.file));
    Ok(generated)
}

/// Generate entrypoint modules from `input` into `output_dir`
///
/// # Errors
///
/// Returns `Io` when the input cannot be read or a file cannot be written,
/// `Codegen` when the input has no endpoints.
pub fn generate(input: &Path, output_dir: &Path) -> Result<GenerateSummary> {
    let html = fs::read_to_string(input).map_err(|e| {
        AmbraError::Io(format!("Failed to read {}: {e}", input.display()))
    })?;
    let generated = generate_sources(&html)?;

    fs::create_dir_all(output_dir).map_err(|e| {
        AmbraError::Io(format!("Failed to create {}: {e}", output_dir.display()))
    })?;

    let mut files = Vec::with_capacity(generated.files.len());
    for file in &generated.files {
        let path = output_dir.join(&file.path);
        fs::write(&path, &file.contents)
            .map_err(|e| AmbraError::Io(format!("Failed to write {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Wrote generated module");
        files.push(path);
    }

    tracing::info!(
        namespaces = generated.namespaces,
        endpoints = generated.endpoints,
        skipped = generated.skipped,
        output = %output_dir.display(),
        "Generated entrypoints"
    );

    Ok(GenerateSummary {
        namespaces: generated.namespaces,
        endpoints: generated.endpoints,
        skipped: generated.skipped,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REFERENCE: &str = r#"
<h2>/study/get</h2>
<p>Get a study</p>
<table class="parameters"><tr><td>uuid</td><td>uuid</td><td>Study id</td></tr></table>
<table class="errors"><tr><td>NOT_FOUND</td><td>The study can not be found</td></tr></table>
<h2>/study/list</h2>
<p>List studies. This call supports pagination.</p>
<table class="response"><tr><td>studies</td><td>list</td><td>Studies</td></tr></table>
<h2>/audit/object</h2>
<table class="parameters">
  <tr><td>uuid</td><td>uuid</td><td>Object id</td></tr>
  <tr><td>sort_by</td><td>string</td><td>Sort order (optional)</td></tr>
  <tr><td>page.rows</td><td>integer</td><td>Rows (optional)</td></tr>
</table>
<table class="response"><tr><td>events</td><td>list</td><td>Audit events</td></tr></table>
<h2>Changelog</h2>
"#;

    #[test]
    fn test_generate_sources() {
        let generated = generate_sources(REFERENCE).unwrap();

        assert_eq!(generated.namespaces, 2);
        assert_eq!(generated.endpoints, 3);
        assert_eq!(generated.skipped, 1);

        let paths: Vec<_> = generated.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("mod.rs"),
                PathBuf::from("audit.rs"),
                PathBuf::from("study.rs")
            ]
        );

        let audit = &generated.files[1].contents;
        assert!(audit.contains("pub fn object(&self, uuid: &str) -> ListQuery {"));
        assert!(audit.contains("ListFeatures::SORT"));
    }

    #[test]
    fn test_generate_writes_files() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("api.html");
        fs::write(&input, REFERENCE).unwrap();
        let output = dir.path().join("out");

        let summary = generate(&input, &output).unwrap();

        assert_eq!(summary.files.len(), 3);
        let study = fs::read_to_string(output.join("study.rs")).unwrap();
        assert!(study.contains("pub struct Study {"));
        assert!(study.contains("pub fn get(&self, uuid: &str) -> Query {"));
        assert!(study.contains("pub fn list(&self) -> ListQuery {"));
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = generate(&dir.path().join("nope.html"), dir.path()).unwrap_err();
        assert!(matches!(err, AmbraError::Io(_)));
    }

    #[test]
    fn test_only_non_endpoint_sections() {
        assert!(matches!(
            generate_sources("<h2>Intro</h2><p>hello</p>"),
            Err(AmbraError::Codegen(_))
        ));
    }
}
