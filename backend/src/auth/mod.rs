//! Authentication and authorization
//!
//! JWT issuance/validation, argon2 credential hashing, the per-request
//! identity middleware and the role-based access policy.

mod jwt;
mod middleware;
mod password;
mod policy;

pub use jwt::{Claims, IssuedToken, SigningKeys, TokenCodec};
pub use middleware::{bearer_token, identity_middleware, resolve_identity, RequestIdentityContext};
pub use password::CredentialVerifier;
pub use policy::{AccessPolicy, AuthorizationResult, Operation, Requirement};
