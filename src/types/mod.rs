//! JSON bodies exchanged over HTTP.

pub mod requests;
pub mod responses;

pub use requests::{
    LoginRequest, MappingRequest, RegisterRequest, RequirementFields, TestCaseFields,
};
pub use responses::{Created, Health, LoginResponse, Message, RegisterResponse};
