use chrono::Utc;
use tracing::info;

use super::{optional_title, parse_label, required_title};
use crate::auth::Identity;
use crate::db::StoreHandle;
use crate::db::models::{NewRequirement, Requirement, RequirementPatch, TestCase};
use crate::error::TrackerError;
use crate::types::RequirementFields;

#[derive(Clone)]
pub struct RequirementService {
    store: StoreHandle,
}

impl RequirementService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Newest first, with the creator's username when it still exists.
    pub async fn list(&self) -> Result<Vec<Requirement>, TrackerError> {
        self.store.list_requirements().await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Requirement, TrackerError> {
        self.store
            .get_requirement(id)
            .await?
            .ok_or(TrackerError::NotFound("Requirement"))
    }

    /// Omitted priority/status default to Medium/Draft. Returns the new id.
    pub async fn create(
        &self,
        fields: RequirementFields,
        author: &Identity,
    ) -> Result<i64, TrackerError> {
        let new = NewRequirement {
            title: required_title(fields.title)?,
            description: fields.description,
            priority: parse_label(fields.priority.as_deref())?.unwrap_or_default(),
            status: parse_label(fields.status.as_deref())?.unwrap_or_default(),
            created_by: Some(author.id),
        };
        let id = self.store.insert_requirement(new, Utc::now()).await?;
        info!(id, user = %author.username, "requirement created");
        Ok(id)
    }

    /// Only supplied fields change; `updated_at` always moves.
    pub async fn update(&self, id: i64, fields: RequirementFields) -> Result<(), TrackerError> {
        let patch = RequirementPatch {
            title: optional_title(fields.title)?,
            description: fields.description,
            priority: parse_label(fields.priority.as_deref())?,
            status: parse_label(fields.status.as_deref())?,
        };
        if self.store.update_requirement(id, patch, Utc::now()).await? {
            Ok(())
        } else {
            Err(TrackerError::NotFound("Requirement"))
        }
    }

    /// Removes the requirement together with its mappings.
    pub async fn delete(&self, id: i64) -> Result<(), TrackerError> {
        if self.store.delete_requirement(id).await? {
            info!(id, "requirement deleted");
            Ok(())
        } else {
            Err(TrackerError::NotFound("Requirement"))
        }
    }

    /// Test cases mapped to this requirement; empty for an unknown id.
    pub async fn test_cases(&self, id: i64) -> Result<Vec<TestCase>, TrackerError> {
        self.store.test_cases_for_requirement(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Priority, RequirementStatus};

    async fn service() -> RequirementService {
        let store = crate::db::spawn("sqlite::memory:").await.expect("store");
        RequirementService::new(store)
    }

    fn author() -> Identity {
        Identity {
            id: 7,
            username: "carol".to_string(),
            email: "c@x.com".to_string(),
        }
    }

    fn titled(title: &str) -> RequirementFields {
        RequirementFields {
            title: Some(title.to_string()),
            ..RequirementFields::default()
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_records_author() {
        let svc = service().await;
        let id = svc.create(titled("R1"), &author()).await.expect("create");
        let req = svc.get_by_id(id).await.expect("read back");
        assert_eq!(req.priority, Priority::Medium);
        assert_eq!(req.status, RequirementStatus::Draft);
        assert_eq!(req.created_by, Some(7));
        // no user row with id 7 exists
        assert_eq!(req.creator, None);
    }

    #[tokio::test]
    async fn blank_labels_on_update_keep_stored_values() {
        let svc = service().await;
        let fields = RequirementFields {
            priority: Some("Critical".to_string()),
            ..titled("R1")
        };
        let id = svc.create(fields, &author()).await.expect("create");

        let patch = RequirementFields {
            priority: Some("  ".to_string()),
            description: Some("now described".to_string()),
            ..RequirementFields::default()
        };
        svc.update(id, patch).await.expect("update");

        let req = svc.get_by_id(id).await.expect("read back");
        assert_eq!(req.priority, Priority::Critical);
        assert_eq!(req.title, "R1");
        assert_eq!(req.description.as_deref(), Some("now described"));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let svc = service().await;
        assert!(matches!(
            svc.update(99, titled("x")).await,
            Err(TrackerError::NotFound("Requirement"))
        ));
        assert!(matches!(
            svc.delete(99).await,
            Err(TrackerError::NotFound("Requirement"))
        ));
        assert!(svc.test_cases(99).await.expect("query").is_empty());
    }
}
