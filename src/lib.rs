pub mod model;
pub mod error;
pub mod store;
pub mod vector;
pub mod index;
pub mod encoder;
pub mod generator;
pub mod composer;
pub mod config;
pub mod profile;
pub mod server;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::composer::ResponseComposer;
use crate::encoder::TextEncoder;
use crate::error::{StaffError, StaffResult};
use crate::index::FlatIndex;
use crate::model::EmployeeRecord;
use crate::store::RecordStore;

pub const DEFAULT_TOP_K: usize = 3;

/// The query orchestrator: roster, encoder, index and composer built once at
/// startup and shared read-only by every request.
pub struct StaffBot {
    store: RecordStore,
    encoder: Arc<dyn TextEncoder>,
    index: FlatIndex,
    composer: ResponseComposer,
}

impl fmt::Debug for StaffBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaffBot")
        .field("employees", &self.store.len())
        .field("model", &self.encoder.model())
        .field("dimension", &self.index.dimension())
        .field("generative", &self.composer.is_generative())
        .finish()
    }
}

impl StaffBot {
    /// Embeds every roster document and builds the index in one pass.
    pub async fn build(
        store: RecordStore,
        encoder: Arc<dyn TextEncoder>,
        composer: ResponseComposer,
    ) -> StaffResult<Self> {
        let started = Instant::now();
        let vectors = encoder.embed_batch(&store.documents()).await?;
        if vectors.len() != store.len() {
            return Err(StaffError::CountMismatch { records: store.len(), vectors: vectors.len() });
        }
        let index = FlatIndex::build(vectors)?;

        info!(
            employees = store.len(),
            model = encoder.model(),
            dimension = index.dimension(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "employee index built"
        );

        Ok(Self { store, encoder, index, composer })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Top-`k` records for `query` with their squared distances, nearest first.
    pub async fn retrieve(&self, query: &str, k: usize) -> StaffResult<Vec<(&EmployeeRecord, f32)>> {
        if k == 0 {
            return Err(StaffError::InvalidArgument("k must be positive".into()));
        }
        if query.trim().is_empty() {
            return Err(StaffError::InvalidArgument("query must not be empty".into()));
        }

        let vector = self.encoder.embed(query).await?;
        let hits = self.index.search(&vector, k)?;

        let mut matched = Vec::with_capacity(hits.len());
        for hit in hits {
            let record = self.store.get(hit.position).ok_or(StaffError::CountMismatch {
                records: self.store.len(),
                vectors: self.index.len(),
            })?;
            matched.push((record, hit.distance));
        }
        debug!(
            query,
            matches = ?matched.iter().map(|(e, d)| (e.name.as_str(), *d)).collect::<Vec<_>>(),
            "retrieved"
        );
        Ok(matched)
    }

    pub async fn answer(&self, query: &str, k: usize) -> StaffResult<String> {
        let matched = self.retrieve(query, k).await?;
        let records: Vec<&EmployeeRecord> = matched.into_iter().map(|(e, _)| e).collect();
        Ok(self.composer.compose(query, &records).await)
    }

    pub async fn answer_default(&self, query: &str) -> StaffResult<String> {
        self.answer(query, DEFAULT_TOP_K).await
    }
}
