use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Missing fields deserialize as empty and are rejected by validation, so the
/// client sees "All fields are required" rather than a JSON error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

/// Body of `POST`/`PUT /requirements`. On update, absent fields keep their
/// stored value; blank `priority`/`status` count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestCaseFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub steps: Option<String>,
    pub expected_result: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MappingRequest {
    pub requirement_id: i64,
    pub test_case_id: i64,
}
