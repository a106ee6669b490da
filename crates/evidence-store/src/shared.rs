use crate::error::Result;
use crate::store::EvidenceStore;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Process-wide handle that constructs the evidence store exactly once.
///
/// Retrieval itself is read-only, so concurrent requests can share the
/// `Arc<EvidenceStore>` freely; the only hazard is two requests racing the
/// expensive first load, which the `OnceCell` serializes. There is no
/// reload path: a rebuilt corpus needs a process restart.
#[derive(Default)]
pub struct SharedStore {
    cell: OnceCell<Arc<EvidenceStore>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared store, running `init` on the first call only.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<EvidenceStore>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<EvidenceStore>>,
    {
        let store = self
            .cell
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(store))
    }

    /// The store, if something already initialized it.
    pub fn get(&self) -> Option<Arc<EvidenceStore>> {
        self.cell.get().cloned()
    }
}
