use crate::db::StoreHandle;
use crate::db::models::DashboardSummary;
use crate::error::TrackerError;

#[derive(Clone)]
pub struct DashboardService {
    store: StoreHandle,
}

impl DashboardService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// All counts come from one store operation, so they agree with each other.
    pub async fn summary(&self) -> Result<DashboardSummary, TrackerError> {
        self.store.summary().await
    }
}
