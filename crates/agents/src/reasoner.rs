use crate::llm::{invoke, ChatModel};
use crate::prompts::REASONER_SYS;
use rca_protocol::{HandbookSnippet, Incident, Mechanism, MechanismsOut, SimilarCase};
use serde::Deserialize;

/// Known mechanism vocabulary: lowercase match key paired with one
/// canonical display form (the original data had ad hoc per-keyword
/// casing; a single lookup table replaces that).
const MECH_KEYWORDS: &[(&str, &str)] = &[
    ("co2 corrosion", "CO2 corrosion"),
    ("mic", "Microbiologically influenced corrosion"),
    ("chloride scc", "Chloride SCC"),
    ("caustic scc", "Caustic SCC"),
    ("scc", "SCC"),
    ("hic", "HIC"),
    ("ssc", "SSC"),
    ("erosion-corrosion", "Erosion-corrosion"),
    ("pitting", "Pitting"),
    ("galvanic", "Galvanic corrosion"),
    ("crevice", "Crevice corrosion"),
    ("abrasive wear", "Abrasive wear"),
    ("adhesive wear", "Adhesive wear"),
    ("fatigue", "Fatigue"),
    ("embrittlement", "Embrittlement"),
];

/// Shortlist size cap.
const MAX_CANDIDATES: usize = 6;

/// Shortlist when neither handbook text nor case tags match anything.
const FALLBACK_CANDIDATES: &[&str] = &[
    "CO2 corrosion",
    "Microbiologically influenced corrosion",
    "Erosion-corrosion",
];

/// Name/confidence/reasoning of the single mechanism substituted when the
/// model's output cannot be parsed.
const FALLBACK_MECHANISM: &str = "CO2 corrosion";
const FALLBACK_CONFIDENCE: f32 = 0.5;
const FALLBACK_REASONING: &str = "Fallback response; model returned invalid JSON.";

/// Deterministic mechanism shortlist: keyword hits over lowercased
/// handbook text, unioned with mechanism tags on the similar cases,
/// first-seen order, capped at `MAX_CANDIDATES`.
pub fn candidate_mechanisms(
    handbook: &[HandbookSnippet],
    similar_cases: &[SimilarCase],
) -> Vec<String> {
    let text = handbook
        .iter()
        .map(|s| s.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    fn push_unique(found: &mut Vec<String>, name: &str) {
        if !found.iter().any(|f| f.eq_ignore_ascii_case(name)) {
            found.push(name.to_string());
        }
    }

    let mut found: Vec<String> = Vec::new();
    for (keyword, display) in MECH_KEYWORDS {
        if text.contains(keyword) {
            push_unique(&mut found, display);
        }
    }

    for case in similar_cases {
        if let Some(mechanism) = case.mechanism.as_deref() {
            if !mechanism.trim().is_empty() {
                push_unique(&mut found, mechanism);
            }
        }
    }

    if found.is_empty() {
        found = FALLBACK_CANDIDATES.iter().map(|s| s.to_string()).collect();
    }

    found.truncate(MAX_CANDIDATES);
    found
}

#[derive(Debug, Deserialize)]
struct ReasonerPayload {
    mechanisms: Vec<Mechanism>,
}

/// Choose 1–3 failure mechanisms for the incident given the selected
/// evidence.
///
/// Never fails the caller: unparseable or empty model output degrades to a
/// single fixed fallback mechanism, and transport failures arrive here as
/// an error-shaped string that takes the same path. Out-of-range
/// confidences are clamped into [0, 1]; anything past three mechanisms is
/// dropped.
pub async fn reason(
    model: &dyn ChatModel,
    incident: &Incident,
    similar_cases: &[SimilarCase],
    handbook: &[HandbookSnippet],
) -> MechanismsOut {
    let candidates = candidate_mechanisms(handbook, similar_cases);
    let prompt = build_prompt(incident, &candidates, similar_cases, handbook);

    let raw = invoke(model, &prompt, true).await;

    let mut mechanisms = match serde_json::from_str::<ReasonerPayload>(&raw) {
        Ok(payload) => payload.mechanisms,
        Err(e) => {
            log::warn!("Reasoner output failed to parse ({e}); substituting fallback");
            Vec::new()
        }
    };

    if mechanisms.is_empty() {
        mechanisms.push(fallback_mechanism());
    }
    mechanisms.truncate(3);
    for mechanism in &mut mechanisms {
        mechanism.confidence = mechanism.confidence.clamp(0.0, 1.0);
    }

    MechanismsOut { mechanisms }
}

fn fallback_mechanism() -> Mechanism {
    Mechanism {
        name: FALLBACK_MECHANISM.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        reasoning: FALLBACK_REASONING.to_string(),
        evidence: Vec::new(),
    }
}

fn build_prompt(
    incident: &Incident,
    candidates: &[String],
    similar_cases: &[SimilarCase],
    handbook: &[HandbookSnippet],
) -> String {
    // Handbook excerpts go in as id/source references only; the full text
    // already drove the shortlist and would blow up the prompt.
    let handbook_refs: Vec<serde_json::Value> = handbook
        .iter()
        .map(|s| serde_json::json!({ "id": s.id, "source": s.source }))
        .collect();

    format!(
        "{REASONER_SYS}\n\
         New case JSON:\n{}\n\n\
         Candidate mechanisms: {}\n\n\
         Similar cases (id/title/snippet/mechanism/similarity):\n{}\n\n\
         Handbook excerpts (ids/sources only):\n{}\n\n\
         Choose 1-3 mechanisms with confidence and reasoning. Cite evidence by case id or handbook id.\n\
         Return JSON only.",
        to_json(incident),
        to_json(&candidates),
        to_json(&similar_cases),
        to_json(&handbook_refs),
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
