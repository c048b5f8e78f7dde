//! HTTP handlers. Each one extracts, calls a single service operation and
//! shapes the response; status codes for failures come from `TrackerError`.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod mappings;
pub mod requirements;
pub mod test_cases;
pub mod users;
