//! # RCA Protocol
//!
//! Shared record types for the failure-diagnosis pipeline: the incident
//! supplied by the caller, the evidence shapes produced by retrieval, and
//! the mechanism/recommendation outputs returned to the caller.
//!
//! Everything here is plain serde data. The caller-facing result shape
//! (`AnalysisReport`) is the one contract the core honors field-for-field;
//! transport framing lives outside this workspace.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured description of an observed equipment failure.
///
/// Every field is optional: "unknown" is a valid state and must never be
/// read as "this field rules out certain mechanisms". An incident is built
/// once per request and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Incident {
    pub asset_type: Option<String>,
    pub component: Option<String>,
    pub material: Option<String>,
    pub service: Option<String>,
    pub environment: Option<String>,
    pub temperature: Option<String>,
    pub pressure: Option<String>,
    pub observed_damage: Option<String>,
    pub location: Option<String>,
    pub time_in_service: Option<String>,
    pub notes: Option<String>,
    pub lab_summary: Option<String>,
}

impl Incident {
    /// Field values in declaration order, used by the query builder.
    pub fn field_values(&self) -> [&Option<String>; 12] {
        [
            &self.asset_type,
            &self.component,
            &self.material,
            &self.service,
            &self.environment,
            &self.temperature,
            &self.pressure,
            &self.observed_damage,
            &self.location,
            &self.time_in_service,
            &self.notes,
            &self.lab_summary,
        ]
    }

    /// Look up a field by its snake_case name. Returns `None` for unknown
    /// names so callers can iterate a required-field list safely.
    pub fn field(&self, name: &str) -> Option<&Option<String>> {
        match name {
            "asset_type" => Some(&self.asset_type),
            "component" => Some(&self.component),
            "material" => Some(&self.material),
            "service" => Some(&self.service),
            "environment" => Some(&self.environment),
            "temperature" => Some(&self.temperature),
            "pressure" => Some(&self.pressure),
            "observed_damage" => Some(&self.observed_damage),
            "location" => Some(&self.location),
            "time_in_service" => Some(&self.time_in_service),
            "notes" => Some(&self.notes),
            "lab_summary" => Some(&self.lab_summary),
            _ => None,
        }
    }

    /// True when the named field carries a non-blank value.
    pub fn field_is_present(&self, name: &str) -> bool {
        self.field(name)
            .and_then(|v| v.as_deref())
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// Which corpus an evidence chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Case,
    /// Handbook/standard excerpt. Serialized as `hb`, the tag the corpus
    /// files use.
    #[serde(rename = "hb")]
    Handbook,
}

/// A retrieved prior case, summarized for the reasoning prompt.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimilarCase {
    pub id: String,
    pub title: String,
    /// Leading slice of the case text (bounded so prompts stay small).
    pub snippet: String,
    /// Mechanism tag if the case record carries one.
    pub mechanism: Option<String>,
    pub similarity: f32,
    pub ref_id: Option<String>,
}

/// A handbook/standard excerpt handed to the generative steps.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HandbookSnippet {
    pub id: String,
    pub source: String,
    pub text: String,
}

/// One candidate failure mechanism chosen by the reasoner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Mechanism {
    pub name: String,
    /// Always within [0, 1]; out-of-range model output is clamped.
    pub confidence: f32,
    pub reasoning: String,
    /// Citations referencing case/handbook chunk ids.
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// Reasoner output: 1–3 ranked mechanisms.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MechanismsOut {
    pub mechanisms: Vec<Mechanism>,
}

/// Categorized remediation actions plus the missing-input gap set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecsOut {
    pub immediate: Vec<String>,
    pub medium_term: Vec<String>,
    pub long_term: Vec<String>,
    pub monitoring: Vec<String>,
    pub gaps: Vec<String>,
}

/// Terminal artifact of one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub incident: Incident,
    /// The retrieval query built from the incident, echoed for debugging.
    pub rag_query: String,
    pub mechanisms: MechanismsOut,
    pub recommendations: RecsOut,
}
