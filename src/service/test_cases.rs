use chrono::Utc;
use tracing::info;

use super::{optional_title, parse_label, required_title};
use crate::auth::Identity;
use crate::db::StoreHandle;
use crate::db::models::{NewTestCase, Requirement, TestCase, TestCasePatch};
use crate::error::TrackerError;
use crate::types::TestCaseFields;

#[derive(Clone)]
pub struct TestCaseService {
    store: StoreHandle,
}

impl TestCaseService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<TestCase>, TrackerError> {
        self.store.list_test_cases().await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<TestCase, TrackerError> {
        self.store
            .get_test_case(id)
            .await?
            .ok_or(TrackerError::NotFound("Test case"))
    }

    pub async fn create(
        &self,
        fields: TestCaseFields,
        author: &Identity,
    ) -> Result<i64, TrackerError> {
        let new = NewTestCase {
            title: required_title(fields.title)?,
            description: fields.description,
            steps: fields.steps,
            expected_result: fields.expected_result,
            status: parse_label(fields.status.as_deref())?.unwrap_or_default(),
            created_by: Some(author.id),
        };
        let id = self.store.insert_test_case(new, Utc::now()).await?;
        info!(id, user = %author.username, "test case created");
        Ok(id)
    }

    pub async fn update(&self, id: i64, fields: TestCaseFields) -> Result<(), TrackerError> {
        let patch = TestCasePatch {
            title: optional_title(fields.title)?,
            description: fields.description,
            steps: fields.steps,
            expected_result: fields.expected_result,
            status: parse_label(fields.status.as_deref())?,
        };
        if self.store.update_test_case(id, patch, Utc::now()).await? {
            Ok(())
        } else {
            Err(TrackerError::NotFound("Test case"))
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), TrackerError> {
        if self.store.delete_test_case(id).await? {
            info!(id, "test case deleted");
            Ok(())
        } else {
            Err(TrackerError::NotFound("Test case"))
        }
    }

    pub async fn requirements(&self, id: i64) -> Result<Vec<Requirement>, TrackerError> {
        self.store.requirements_for_test_case(id).await
    }
}
