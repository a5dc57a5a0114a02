//! Raw per-document metadata models
//!
//! The shape of the `metadata.json` objects published next to each
//! document build. These are source-side models: the normalizer maps them
//! into the domain documents, and nothing downstream of it sees them.

use serde::Deserialize;

/// One entry of the metadata authors list.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaAuthor {
    pub name: String,

    /// Role tag, e.g. "IPAC Lead" or "SPHEREx Lead".
    #[serde(default)]
    pub role: Option<String>,
}

/// Approval record attached to approved documents.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaApproval {
    pub date: String,
    pub name: String,
}

/// Fields common to every category's metadata object.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonMeta {
    pub title: String,

    /// The document handle, e.g. `SSDC-MS-001`.
    pub identifier: String,

    /// The handle's series prefix, e.g. `SSDC-MS`.
    pub document_handle_prefix: String,

    /// Root HTML URL of the published document.
    pub canonical_url: String,

    /// URL of the source repository.
    pub repository_url: String,

    #[serde(default)]
    pub authors: Vec<MetaAuthor>,

    #[serde(default)]
    pub approval: Option<MetaApproval>,
}

/// Pipeline level as published: an integer, or a string with an `L`
/// prefix (`"L2"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PipelineLevel {
    Number(u32),
    Tagged(String),
}

impl PipelineLevel {
    /// Coerce to the plain integer level.
    pub fn as_level(&self) -> Result<u32, String> {
        match self {
            PipelineLevel::Number(n) => Ok(*n),
            PipelineLevel::Tagged(s) => s
                .trim_start_matches('L')
                .parse()
                .map_err(|_| format!("unparsable pipeline level '{s}'")),
        }
    }
}

/// Module Specification metadata (SSDC-MS).
#[derive(Debug, Clone, Deserialize)]
pub struct MsMeta {
    #[serde(flatten)]
    pub common: CommonMeta,

    pub pipeline_level: PipelineLevel,

    pub diagram_index: u32,

    pub difficulty: String,
}

/// Interface metadata (SSDC-IF).
#[derive(Debug, Clone, Deserialize)]
pub struct IfMeta {
    #[serde(flatten)]
    pub common: CommonMeta,

    pub interface_partner: String,
}

/// Test Report metadata (SSDC-TR).
#[derive(Debug, Clone, Deserialize)]
pub struct TrMeta {
    #[serde(flatten)]
    pub common: CommonMeta,

    #[serde(default)]
    pub va_doors_id: Option<String>,

    #[serde(default)]
    pub req_doors_id: Option<String>,

    #[serde(default)]
    pub ipac_jira_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_level_coercion() {
        let tagged: PipelineLevel = serde_json::from_value(serde_json::json!("L3")).unwrap();
        assert_eq!(tagged.as_level(), Ok(3));

        let number: PipelineLevel = serde_json::from_value(serde_json::json!(4)).unwrap();
        assert_eq!(number.as_level(), Ok(4));

        let bad: PipelineLevel = serde_json::from_value(serde_json::json!("level two")).unwrap();
        assert!(bad.as_level().is_err());
    }

    #[test]
    fn test_ms_meta_parses_flattened_object() {
        let json = serde_json::json!({
            "title": "Spectral Extraction Module",
            "identifier": "SSDC-MS-003",
            "document_handle_prefix": "SSDC-MS",
            "canonical_url": "https://spherex-docs.ipac.caltech.edu/ssdc-ms-003",
            "repository_url": "https://github.com/SPHEREx/ssdc-ms-003",
            "authors": [
                {"name": "A. Lead", "role": "IPAC Lead"},
                {"name": "B. Contact", "role": "SPHEREx Lead"}
            ],
            "pipeline_level": "L2",
            "diagram_index": 7,
            "difficulty": "High"
        });
        let meta: MsMeta = serde_json::from_value(json).unwrap();
        assert_eq!(meta.common.identifier, "SSDC-MS-003");
        assert_eq!(meta.pipeline_level.as_level(), Ok(2));
        assert_eq!(meta.diagram_index, 7);
        assert!(meta.common.approval.is_none());
    }
}
