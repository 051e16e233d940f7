//! Customer Identity Shared Library
//!
//! This crate contains the domain model, API payloads and validation rules
//! shared by the identity backend and its clients.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{Identity, Role};
pub use types::*;
pub use validation::RequestValidation;
