use chrono::Utc;
use tracing::info;

use crate::db::StoreHandle;
use crate::db::models::Mapping;
use crate::error::TrackerError;
use crate::types::MappingRequest;

#[derive(Clone)]
pub struct MappingService {
    store: StoreHandle,
}

impl MappingService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Mapping>, TrackerError> {
        self.store.list_mappings().await
    }

    /// A repeated `(requirement_id, test_case_id)` pair is rejected with
    /// `Conflict`, never silently ignored.
    pub async fn create(&self, req: MappingRequest) -> Result<i64, TrackerError> {
        let id = self
            .store
            .insert_mapping(req.requirement_id, req.test_case_id, Utc::now())
            .await?;
        info!(
            id,
            requirement_id = req.requirement_id,
            test_case_id = req.test_case_id,
            "mapping created"
        );
        Ok(id)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TrackerError> {
        if self.store.delete_mapping(id).await? {
            Ok(())
        } else {
            Err(TrackerError::NotFound("Mapping"))
        }
    }
}
