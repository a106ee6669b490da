use crate::error::Result;
use crate::query::build_query;
use rca_evidence_store::{EvidenceKind, EvidenceStore, MechanismCatalog};
use rca_protocol::{HandbookSnippet, Incident, SimilarCase};

/// Cap on similar cases handed to the generative steps.
pub const MAX_CASES: usize = 3;
/// Cap on handbook snippets (the injected reference entry is additive).
pub const MAX_HANDBOOK: usize = 5;
/// Combined retrieval depth before partitioning by corpus kind.
pub const DEFAULT_TOP_K: usize = 8;

/// Case-snippet length bound, chars.
const SNIPPET_CHARS: usize = 400;

/// Evidence handed to the reasoner and recommender for one request.
#[derive(Debug, Clone, Default)]
pub struct SelectedEvidence {
    pub cases: Vec<SimilarCase>,
    pub handbook: Vec<HandbookSnippet>,
}

/// Issues the incident query against the store, partitions hits by corpus
/// kind, caps each partition, and optionally injects the reference
/// catalog's definition ahead of retrieved handbook content so an
/// authoritative definition dominates over noisy snippets.
pub struct EvidenceSelector<'a> {
    store: &'a EvidenceStore,
    catalog: &'a MechanismCatalog,
}

impl<'a> EvidenceSelector<'a> {
    pub fn new(store: &'a EvidenceStore, catalog: &'a MechanismCatalog) -> Self {
        Self { store, catalog }
    }

    /// Retrieve and shape evidence for `incident`. An unresolvable
    /// `reference_mechanism` id passes the handbook list through unchanged;
    /// it is never an error.
    pub async fn select(
        &self,
        incident: &Incident,
        reference_mechanism: Option<&str>,
        top_k: usize,
    ) -> Result<SelectedEvidence> {
        let query = build_query(incident);
        let hits = self.store.retrieve(&query, top_k).await?;

        let mut cases = Vec::new();
        let mut handbook = Vec::new();

        for hit in &hits {
            match hit.chunk.kind {
                EvidenceKind::Case if cases.len() < MAX_CASES => {
                    cases.push(SimilarCase {
                        id: hit.chunk.id.clone(),
                        title: hit.chunk.source.clone(),
                        snippet: truncate_chars(&hit.chunk.text, SNIPPET_CHARS),
                        mechanism: hit.chunk.mechanism.clone(),
                        similarity: hit.score,
                        ref_id: Some(hit.chunk.id.clone()),
                    });
                }
                EvidenceKind::Handbook if handbook.len() < MAX_HANDBOOK => {
                    handbook.push(HandbookSnippet {
                        id: hit.chunk.id.clone(),
                        source: hit.chunk.source.clone(),
                        text: hit.chunk.text.clone(),
                    });
                }
                _ => {}
            }
        }

        if let Some(mech_id) = reference_mechanism {
            if let Some(reference) = self.catalog.to_evidence(mech_id) {
                log::debug!("Injecting catalog entry {} ahead of handbook hits", reference.id);
                handbook.insert(
                    0,
                    HandbookSnippet {
                        id: reference.id,
                        source: reference.source,
                        text: reference.text,
                    },
                );
            } else {
                log::debug!("Reference mechanism '{mech_id}' not in catalog; skipping injection");
            }
        }

        log::debug!(
            "Selected evidence: {} cases, {} handbook snippets",
            cases.len(),
            handbook.len()
        );
        Ok(SelectedEvidence { cases, handbook })
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
