use crate::error::{EvidenceStoreError, Result};
use crate::types::EvidenceChunk;
use rca_protocol::EvidenceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Source label and id prefix stamped on evidence synthesized from the
/// catalog, e.g. chunk id `api571-3.2`.
pub const CATALOG_TAG: &str = "api571";

/// A field that the catalog JSON stores as either one string or a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultiText {
    One(String),
    Many(Vec<String>),
}

impl MultiText {
    /// Multi-valued entries joined by newline; blank parts dropped.
    pub fn joined(&self) -> String {
        match self {
            MultiText::One(s) => s.trim().to_string(),
            MultiText::Many(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl Default for MultiText {
    fn default() -> Self {
        MultiText::One(String::new())
    }
}

/// One mechanism definition from the reference standard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub description_of_damage: MultiText,
    pub affected_materials: MultiText,
    pub critical_factors: MultiText,
    pub affected_units_equipment: MultiText,
    pub appearance: MultiText,
    pub prevention_mitigation: MultiText,
    pub inspection_monitoring: MultiText,
}

impl CatalogEntry {
    /// Render the non-empty labeled fields as `Label: value` lines. Fields
    /// left empty in the standard are omitted entirely.
    pub fn render(&self) -> String {
        let fields: [(&str, &MultiText); 7] = [
            ("Description of damage", &self.description_of_damage),
            ("Affected materials", &self.affected_materials),
            ("Critical factors", &self.critical_factors),
            ("Affected units or equipment", &self.affected_units_equipment),
            ("Appearance", &self.appearance),
            ("Prevention / mitigation", &self.prevention_mitigation),
            ("Inspection / monitoring", &self.inspection_monitoring),
        ];

        fields
            .iter()
            .filter_map(|(label, value)| {
                let text = value.joined();
                if text.is_empty() {
                    None
                } else {
                    Some(format!("{label}: {text}"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Deterministic lookup of mechanism definitions from a named standard,
/// distinct from the similarity-retrieved corpora. Loaded once, read-only.
#[derive(Debug, Default)]
pub struct MechanismCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl MechanismCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON array of entries keyed by their `id` field.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading mechanism catalog from {:?}", path);
        let bytes = tokio::fs::read(path).await?;
        let raw: Vec<CatalogEntry> = serde_json::from_slice(&bytes)?;

        let mut entries = HashMap::new();
        for entry in raw {
            if entry.id.is_empty() {
                return Err(EvidenceStoreError::CorpusError(format!(
                    "catalog entry without id in {:?}",
                    path
                )));
            }
            entries.insert(entry.id.clone(), entry);
        }
        log::info!("Mechanism catalog ready: {} entries", entries.len());
        Ok(Self { entries })
    }

    pub fn from_entries(raw: Vec<CatalogEntry>) -> Self {
        let entries = raw.into_iter().map(|e| (e.id.clone(), e)).collect();
        Self { entries }
    }

    pub fn get_entry(&self, mech_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(mech_id)
    }

    /// Display name for a mechanism id; unknown ids fall back to the id
    /// itself.
    pub fn get_name(&self, mech_id: &str) -> String {
        self.entries
            .get(mech_id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| mech_id.to_string())
    }

    /// Synthesize a handbook-kind evidence chunk for a mechanism id, or
    /// `None` when the id is unknown or the entry renders empty.
    pub fn to_evidence(&self, mech_id: &str) -> Option<EvidenceChunk> {
        let entry = self.entries.get(mech_id)?;
        let text = entry.render();
        if text.is_empty() {
            return None;
        }
        Some(EvidenceChunk {
            id: format!("{CATALOG_TAG}-{mech_id}"),
            kind: EvidenceKind::Handbook,
            source: CATALOG_TAG.to_string(),
            text,
            mechanism: Some(entry.name.clone()),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
