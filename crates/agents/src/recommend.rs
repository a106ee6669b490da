use crate::llm::{invoke, ChatModel};
use crate::prompts::RECS_SYS;
use rca_protocol::{HandbookSnippet, Incident, MechanismsOut, RecsOut};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Incident fields whose absence is always surfaced as a gap, whatever the
/// model declares.
const REQUIRED_FIELDS: &[&str] = &[
    "material",
    "environment",
    "observed_damage",
    "time_in_service",
];

/// Rule-based completeness floor: one `Missing <field>` entry per blank
/// required field, underscores rendered as spaces.
pub fn deterministic_gaps(incident: &Incident) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| !incident.field_is_present(field))
        .map(|field| format!("Missing {}", field.replace('_', " ")))
        .collect()
}

/// Strict parse shape for the model's reply. The four action keys are
/// required so an error payload or bare `{}` is rejected rather than read
/// as an empty-but-valid answer; `gaps` alone may be omitted.
#[derive(Debug, Deserialize)]
struct RecsPayload {
    immediate: Vec<String>,
    medium_term: Vec<String>,
    long_term: Vec<String>,
    monitoring: Vec<String>,
    #[serde(default)]
    gaps: Vec<String>,
}

/// Produce categorized remediation actions for the chosen mechanisms.
///
/// Model-declared gaps are unioned with the deterministic completeness
/// check, deduplicated, and sorted. Malformed model output degrades to an
/// empty action set carrying only the deterministic gaps — the same
/// never-fail discipline as the reasoner.
pub async fn recommend(
    model: &dyn ChatModel,
    incident: &Incident,
    mechanisms: &MechanismsOut,
    handbook: &[HandbookSnippet],
) -> RecsOut {
    let prompt = build_prompt(incident, mechanisms, handbook);
    let raw = invoke(model, &prompt, true).await;

    let mut recs = match serde_json::from_str::<RecsPayload>(&raw) {
        Ok(payload) => RecsOut {
            immediate: payload.immediate,
            medium_term: payload.medium_term,
            long_term: payload.long_term,
            monitoring: payload.monitoring,
            gaps: payload.gaps,
        },
        Err(e) => {
            log::warn!("Recommendation output failed to parse ({e}); returning gap-only result");
            RecsOut::default()
        }
    };

    let mut gaps: BTreeSet<String> = recs
        .gaps
        .iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect();
    gaps.extend(deterministic_gaps(incident));
    recs.gaps = gaps.into_iter().collect();

    recs
}

fn build_prompt(
    incident: &Incident,
    mechanisms: &MechanismsOut,
    handbook: &[HandbookSnippet],
) -> String {
    let handbook_refs: Vec<serde_json::Value> = handbook
        .iter()
        .map(|s| serde_json::json!({ "id": s.id, "source": s.source }))
        .collect();

    format!(
        "{RECS_SYS}\n\
         Incident:\n{}\n\n\
         Mechanisms (selected):\n{}\n\n\
         Handbook snippets (ids/sources only):\n{}\n\n\
         Return valid JSON with keys: immediate, medium_term, long_term, monitoring, gaps.\n\
         No prose, no markdown - only valid JSON.",
        to_json(incident),
        to_json(&mechanisms.mechanisms),
        to_json(&handbook_refs),
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::test_support::ScriptedModel;
    use pretty_assertions::assert_eq;
    use rca_protocol::Mechanism;

    fn mechanisms() -> MechanismsOut {
        MechanismsOut {
            mechanisms: vec![Mechanism {
                name: "CO2 corrosion".to_string(),
                confidence: 0.8,
                reasoning: "r".to_string(),
                evidence: vec!["HB-1".to_string()],
            }],
        }
    }

    fn incident_missing_material_and_time() -> Incident {
        Incident {
            environment: Some("Wet CO2".to_string()),
            observed_damage: Some("Pitting".to_string()),
            material: Some("".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn deterministic_gaps_cover_blank_required_fields() {
        let gaps = deterministic_gaps(&incident_missing_material_and_time());
        assert_eq!(
            gaps,
            vec![
                "Missing material".to_string(),
                "Missing time in service".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn model_gaps_are_unioned_deduped_and_sorted() {
        let model = ScriptedModel::replying(
            r#"{"immediate": ["Isolate line"], "medium_term": [], "long_term": [],
                "monitoring": ["Monthly UT survey"],
                "gaps": ["Missing material", "Missing lab analysis"]}"#,
        );
        let recs = recommend(
            &model,
            &incident_missing_material_and_time(),
            &mechanisms(),
            &[],
        )
        .await;
        assert_eq!(recs.immediate, vec!["Isolate line".to_string()]);
        assert_eq!(
            recs.gaps,
            vec![
                "Missing lab analysis".to_string(),
                "Missing material".to_string(),
                "Missing time in service".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn populated_fields_are_not_flagged() {
        let incident = Incident {
            material: Some("Carbon steel".to_string()),
            environment: Some("Wet CO2 service".to_string()),
            observed_damage: Some("Localized pitting".to_string()),
            time_in_service: Some("".to_string()),
            ..Default::default()
        };
        let model = ScriptedModel::replying(
            r#"{"immediate": [], "medium_term": [], "long_term": [], "monitoring": [], "gaps": []}"#,
        );
        let recs = recommend(&model, &incident, &mechanisms(), &[]).await;
        assert_eq!(recs.gaps, vec!["Missing time in service".to_string()]);
    }

    #[tokio::test]
    async fn malformed_output_yields_gap_only_result() {
        let model = ScriptedModel::replying("no json here");
        let recs = recommend(
            &model,
            &incident_missing_material_and_time(),
            &mechanisms(),
            &[],
        )
        .await;
        assert!(recs.immediate.is_empty());
        assert!(recs.monitoring.is_empty());
        assert_eq!(
            recs.gaps,
            vec![
                "Missing material".to_string(),
                "Missing time in service".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_payload_is_rejected_not_parsed() {
        let model = ScriptedModel::new(vec![Err(LlmError::Network("down".to_string()))]);
        let recs = recommend(
            &model,
            &incident_missing_material_and_time(),
            &mechanisms(),
            &[],
        )
        .await;
        assert!(recs.immediate.is_empty());
        assert_eq!(recs.gaps.len(), 2);
    }
}
