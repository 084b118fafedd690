use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    pub level: usize,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSpan {
    pub id: String,
    pub raw_text: String,
}

impl ControlSpan {
    pub fn is_located(&self) -> bool {
        !self.raw_text.is_empty()
    }
}

/// Labeled sections of a control, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ProfileApplicability,
    Description,
    Rationale,
    Impact,
    Audit,
    Remediation,
    DefaultValue,
    References,
    CisControls,
    AdditionalInformation,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::ProfileApplicability,
        Field::Description,
        Field::Rationale,
        Field::Impact,
        Field::Audit,
        Field::Remediation,
        Field::DefaultValue,
        Field::References,
        Field::CisControls,
        Field::AdditionalInformation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::ProfileApplicability => "Profile Applicability",
            Field::Description => "Description",
            Field::Rationale => "Rationale",
            Field::Impact => "Impact",
            Field::Audit => "Audit",
            Field::Remediation => "Remediation",
            Field::DefaultValue => "Default Value",
            Field::References => "References",
            Field::CisControls => "CIS Controls",
            Field::AdditionalInformation => "Additional Information",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Field::ProfileApplicability => "profile_applicability",
            Field::Description => "description",
            Field::Rationale => "rationale",
            Field::Impact => "impact",
            Field::Audit => "audit",
            Field::Remediation => "remediation",
            Field::DefaultValue => "default_value",
            Field::References => "references",
            Field::CisControls => "cis_controls",
            Field::AdditionalInformation => "additional_information",
        }
    }

    pub fn rule(self) -> ExtractionRule {
        match self {
            Field::References => ExtractionRule::List,
            _ => ExtractionRule::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Whitespace collapsed into a single line of text.
    Text,
    /// One entry per bullet or numbered item.
    List,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    pub id: String,
    pub title: String,
    pub profile_applicability: Option<String>,
    pub description: Option<String>,
    pub rationale: Option<String>,
    pub impact: Option<String>,
    pub audit: Option<String>,
    pub remediation: Option<String>,
    pub default_value: Option<String>,
    pub references: Option<Vec<String>>,
    pub cis_controls: Option<String>,
    pub additional_information: Option<String>,
}

impl ControlRecord {
    /// Record with only id and title populated.
    pub fn empty(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn has_field(&self, field: Field) -> bool {
        match field {
            Field::References => self.references.is_some(),
            _ => self.text_slot(field).is_some(),
        }
    }

    pub fn text_slot_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::ProfileApplicability => Some(&mut self.profile_applicability),
            Field::Description => Some(&mut self.description),
            Field::Rationale => Some(&mut self.rationale),
            Field::Impact => Some(&mut self.impact),
            Field::Audit => Some(&mut self.audit),
            Field::Remediation => Some(&mut self.remediation),
            Field::DefaultValue => Some(&mut self.default_value),
            Field::CisControls => Some(&mut self.cis_controls),
            Field::AdditionalInformation => Some(&mut self.additional_information),
            Field::References => None,
        }
    }

    pub fn list_slot_mut(&mut self, field: Field) -> Option<&mut Option<Vec<String>>> {
        match field {
            Field::References => Some(&mut self.references),
            _ => None,
        }
    }

    fn text_slot(&self, field: Field) -> Option<&String> {
        match field {
            Field::ProfileApplicability => self.profile_applicability.as_ref(),
            Field::Description => self.description.as_ref(),
            Field::Rationale => self.rationale.as_ref(),
            Field::Impact => self.impact.as_ref(),
            Field::Audit => self.audit.as_ref(),
            Field::Remediation => self.remediation.as_ref(),
            Field::DefaultValue => self.default_value.as_ref(),
            Field::CisControls => self.cis_controls.as_ref(),
            Field::AdditionalInformation => self.additional_information.as_ref(),
            Field::References => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlsDocument {
    pub controls: Vec<ControlRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub path: String,
    pub input_format: String,
    pub sha256: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldCoverage {
    pub field: String,
    pub present: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunCounts {
    pub toc_entries: usize,
    pub spans_located: usize,
    pub spans_missing: usize,
    pub records: usize,
    pub worker_failures: usize,
    pub header_lines_removed: usize,
    pub footer_lines_removed: usize,
    pub dehyphenation_merges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub source: SourceInfo,
    pub output_path: String,
    pub workers: usize,
    pub counts: RunCounts,
    pub field_coverage: Vec<FieldCoverage>,
    pub warnings: Vec<String>,
}
