use crate::error::Result;
use crate::llm::ChatModel;
use crate::query::build_query;
use crate::recommend::recommend;
use crate::reasoner::reason;
use crate::select::{EvidenceSelector, DEFAULT_TOP_K};
use rca_evidence_store::{EvidenceStore, MechanismCatalog};
use rca_protocol::{AnalysisReport, Incident};

/// Per-request knobs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Combined retrieval depth before partitioning by corpus kind.
    pub top_k: usize,
    /// Catalog id whose definition is injected ahead of retrieved handbook
    /// evidence, when known.
    pub reference_mechanism: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            reference_mechanism: None,
        }
    }
}

/// Run the full pipeline for one incident: build the retrieval query,
/// select evidence, reason about mechanisms, then generate
/// recommendations. Strictly sequential; the recommendation step is
/// conditioned on the chosen mechanisms.
///
/// Generative-model unreliability never surfaces as an error here — both
/// generative steps degrade internally. The only error path is the
/// evidence store itself.
pub async fn analyze(
    store: &EvidenceStore,
    catalog: &MechanismCatalog,
    model: &dyn ChatModel,
    incident: Incident,
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    let rag_query = build_query(&incident);
    log::info!("Analyzing incident (query: '{rag_query}')");

    let selector = EvidenceSelector::new(store, catalog);
    let evidence = selector
        .select(
            &incident,
            options.reference_mechanism.as_deref(),
            options.top_k,
        )
        .await?;

    let mechanisms = reason(model, &incident, &evidence.cases, &evidence.handbook).await;
    log::info!(
        "Reasoner selected {} mechanism(s): {}",
        mechanisms.mechanisms.len(),
        mechanisms
            .mechanisms
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let recommendations = recommend(model, &incident, &mechanisms, &evidence.handbook).await;

    Ok(AnalysisReport {
        incident,
        rag_query,
        mechanisms,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_support::ScriptedModel;
    use pretty_assertions::assert_eq;
    use rca_evidence_store::{
        CatalogEntry, CorpusRecord, EvidenceKind, HashingEmbedder, MultiText,
    };
    use std::sync::Arc;

    async fn store() -> EvidenceStore {
        let records = vec![
            CorpusRecord {
                id: "CS-019".to_string(),
                kind: EvidenceKind::Case,
                title: "Flowline pitting failure".to_string(),
                text: "Carbon steel flowline, wet CO2, localized pitting at 6 o'clock".to_string(),
                mechanism: Some("CO2 corrosion".to_string()),
                embedding: None,
            },
            CorpusRecord {
                id: "HB11-2.3".to_string(),
                kind: EvidenceKind::Handbook,
                title: "CO2 corrosion".to_string(),
                text: "CO2 corrosion attacks carbon steel where free water is present".to_string(),
                mechanism: None,
                embedding: None,
            },
        ];
        EvidenceStore::from_records(records, Arc::new(HashingEmbedder::default()))
            .await
            .unwrap()
    }

    fn catalog() -> MechanismCatalog {
        MechanismCatalog::from_entries(vec![CatalogEntry {
            id: "3.2".to_string(),
            name: "CO2 corrosion".to_string(),
            description_of_damage: MultiText::One("Metal loss in wet CO2".to_string()),
            ..Default::default()
        }])
    }

    fn incident() -> Incident {
        Incident {
            material: Some("Carbon steel".to_string()),
            environment: Some("Wet CO2 service".to_string()),
            observed_damage: Some("Localized pitting".to_string()),
            time_in_service: Some("".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn full_pipeline_produces_report() {
        let model = ScriptedModel::new(vec![
            Ok(r#"{"mechanisms": [{"name": "CO2 corrosion", "confidence": 0.85,
                "reasoning": "Wet CO2 on carbon steel.", "evidence": ["CS-019", "HB11-2.3"]}]}"#
                .to_string()),
            Ok(r#"{"immediate": ["Isolate and depressurize line"],
                "medium_term": ["UT thickness survey of low points [HB11-2.3]"],
                "long_term": ["Evaluate corrosion inhibitor program"],
                "monitoring": ["Quarterly coupon retrieval"],
                "gaps": []}"#
                .to_string()),
        ]);

        let report = analyze(
            &store().await,
            &catalog(),
            &model,
            incident(),
            &AnalysisOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            report.rag_query,
            "Carbon steel | Wet CO2 service | Localized pitting"
        );
        assert_eq!(report.mechanisms.mechanisms.len(), 1);
        assert_eq!(report.mechanisms.mechanisms[0].name, "CO2 corrosion");
        assert_eq!(
            report.recommendations.immediate,
            vec!["Isolate and depressurize line".to_string()]
        );
        // material/environment/observed_damage are populated; only time in
        // service is flagged.
        assert_eq!(
            report.recommendations.gaps,
            vec!["Missing time in service".to_string()]
        );
    }

    #[tokio::test]
    async fn generative_failures_still_yield_schema_valid_report() {
        // Both calls return garbage: reasoner falls back, recommender
        // degrades to a gap-only result.
        let model = ScriptedModel::new(vec![
            Ok("not json at all".to_string()),
            Ok("still not json".to_string()),
        ]);

        let report = analyze(
            &store().await,
            &catalog(),
            &model,
            Incident::default(),
            &AnalysisOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.rag_query, "");
        assert_eq!(report.mechanisms.mechanisms.len(), 1);
        assert_eq!(report.mechanisms.mechanisms[0].name, "CO2 corrosion");
        assert_eq!(report.mechanisms.mechanisms[0].confidence, 0.5);
        assert_eq!(report.recommendations.gaps.len(), 4);
    }

    #[tokio::test]
    async fn reference_mechanism_feeds_first_handbook_slot() {
        let model = ScriptedModel::new(vec![
            Ok(r#"{"mechanisms": [{"name": "CO2 corrosion", "confidence": 0.9,
                "reasoning": "r", "evidence": ["api571-3.2"]}]}"#
                .to_string()),
            Ok(r#"{"immediate": [], "medium_term": [], "long_term": [],
                "monitoring": [], "gaps": []}"#
                .to_string()),
        ]);

        let options = AnalysisOptions {
            reference_mechanism: Some("3.2".to_string()),
            ..Default::default()
        };
        let report = analyze(&store().await, &catalog(), &model, incident(), &options)
            .await
            .unwrap();

        assert_eq!(
            report.mechanisms.mechanisms[0].evidence,
            vec!["api571-3.2".to_string()]
        );
    }
}
