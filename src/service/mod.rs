//! Resource services: validation, defaults and timestamps over the store
//! actor. Every store interaction is one serialized actor call; nothing is
//! cached between calls.

pub mod dashboard;
pub mod mappings;
pub mod requirements;
pub mod test_cases;
pub mod users;

use std::str::FromStr;
use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::db::StoreHandle;
use crate::db::models::UnknownLabel;
use crate::error::TrackerError;

pub use dashboard::DashboardService;
pub use mappings::MappingService;
pub use requirements::RequirementService;
pub use test_cases::TestCaseService;
pub use users::UserService;

#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub requirements: RequirementService,
    pub test_cases: TestCaseService,
    pub mappings: MappingService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(
        store: StoreHandle,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users: UserService::new(store.clone(), hasher, tokens),
            requirements: RequirementService::new(store.clone()),
            test_cases: TestCaseService::new(store.clone()),
            mappings: MappingService::new(store.clone()),
            dashboard: DashboardService::new(store),
        }
    }
}

/// A title that is present and not blank.
fn required_title(title: Option<String>) -> Result<String, TrackerError> {
    match title {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(TrackerError::validation("Title is required")),
    }
}

/// `Some` title on update must still be non-blank.
fn optional_title(title: Option<String>) -> Result<Option<String>, TrackerError> {
    match title {
        None => Ok(None),
        some => required_title(some).map(Some),
    }
}

/// Blank or absent → `None`; anything else must name a known label.
fn parse_label<T>(raw: Option<&str>) -> Result<Option<T>, TrackerError>
where
    T: FromStr<Err = UnknownLabel>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| TrackerError::validation(e.to_string())),
    }
}
