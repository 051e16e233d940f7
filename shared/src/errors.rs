//! Error types shared between the service and its clients

use thiserror::Error;

/// Why a presented token could not be turned into an identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,
}
