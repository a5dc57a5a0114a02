//! The seven category document types
//!
//! Flat structs, one per category, each embedding [`DocumentCommon`]. A
//! re-ingested project produces a brand-new value that replaces the stored
//! one under the same key; nothing here is mutated in place.

use super::{Category, Document, DocumentCommon};
use serde::{Deserialize, Serialize};

/// A Module Specification document (SSDC-MS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsDocument {
    #[serde(flatten)]
    pub common: DocumentCommon,

    /// Name of the SPHEREx-side project contact.
    pub project_contact_name: String,

    /// Index of the module within its pipeline-level diagram.
    pub diagram_index: u32,

    /// Pipeline level the module belongs to.
    pub pipeline_level: u32,

    /// Approval as `"{date}, {name}"`, when the document is approved.
    pub approval_str: Option<String>,

    pub difficulty: String,
}

impl MsDocument {
    /// Display reference of the module in the pipeline diagrams, e.g. `L2.7`.
    pub fn diagram_ref(&self) -> String {
        format!("L{}.{}", self.pipeline_level, self.diagram_index)
    }

    /// Zero-padded variant of [`diagram_ref`](Self::diagram_ref) that sorts
    /// lexicographically, e.g. `L2.07`.
    pub fn diagram_ref_sortable(&self) -> String {
        format!("L{}.{:02}", self.pipeline_level, self.diagram_index)
    }
}

impl Document for MsDocument {
    fn common(&self) -> &DocumentCommon {
        &self.common
    }

    fn category() -> Category {
        Category::SsdcMs
    }
}

/// A Project Management document (SSDC-PM).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmDocument {
    #[serde(flatten)]
    pub common: DocumentCommon,

    pub approval_str: Option<String>,
}

impl Document for PmDocument {
    fn common(&self) -> &DocumentCommon {
        &self.common
    }

    fn category() -> Category {
        Category::SsdcPm
    }
}

/// An Interface document (SSDC-IF).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfDocument {
    #[serde(flatten)]
    pub common: DocumentCommon,

    pub approval_str: Option<String>,

    /// Name of the partner on the other side of the interface.
    pub interface_partner_name: String,
}

impl Document for IfDocument {
    fn common(&self) -> &DocumentCommon {
        &self.common
    }

    fn category() -> Category {
        Category::SsdcIf
    }
}

/// A Data Product document (SSDC-DP).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpDocument {
    #[serde(flatten)]
    pub common: DocumentCommon,

    pub approval_str: Option<String>,
}

impl Document for DpDocument {
    fn common(&self) -> &DocumentCommon {
        &self.common
    }

    fn category() -> Category {
        Category::SsdcDp
    }
}

/// A Test Report document (SSDC-TR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrDocument {
    #[serde(flatten)]
    pub common: DocumentCommon,

    pub approval_str: Option<String>,

    /// DOORS id of the verification activity.
    pub va_doors_id: Option<String>,

    /// DOORS id of the requirement under test.
    pub req_doors_id: Option<String>,

    /// IPAC Jira ticket id tracking the test campaign.
    pub ipac_jira_id: Option<String>,
}

impl TrDocument {
    /// Whether any verification tracking id is attached to this report.
    pub fn has_verification_ids(&self) -> bool {
        self.va_doors_id.is_some() || self.req_doors_id.is_some() || self.ipac_jira_id.is_some()
    }

    /// Browse URL for the IPAC Jira ticket, when one is linked.
    pub fn ipac_jira_url(&self) -> Option<String> {
        self.ipac_jira_id
            .as_deref()
            .map(|id| format!("https://jira.ipac.caltech.edu/browse/{id}"))
    }
}

impl Document for TrDocument {
    fn common(&self) -> &DocumentCommon {
        &self.common
    }

    fn category() -> Category {
        Category::SsdcTr
    }
}

/// A Technical Note (SSDC-TN).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TnDocument {
    #[serde(flatten)]
    pub common: DocumentCommon,
}

impl Document for TnDocument {
    fn common(&self) -> &DocumentCommon {
        &self.common
    }

    fn category() -> Category {
        Category::SsdcTn
    }
}

/// An Operations Note (SSDC-OP).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDocument {
    #[serde(flatten)]
    pub common: DocumentCommon,
}

impl Document for OpDocument {
    fn common(&self) -> &DocumentCommon {
        &self.common
    }

    fn category() -> Category {
        Category::SsdcOp
    }
}
