//! Customer store
//!
//! The service only needs a handful of operations from persistence, captured
//! by [`CustomerStore`]. PostgreSQL backs production; the in-memory store
//! serves tests and local runs.

pub mod customer;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use customer_identity_shared::{CustomerResponse, Role};
use thiserror::Error;

pub use customer::PgCustomerStore;
pub use memory::InMemoryCustomerStore;

/// Durable customer record, including the stored credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<CustomerRecord> for CustomerResponse {
    fn from(record: CustomerRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            role: record.role,
        }
    }
}

/// Input for creating a customer. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Customer store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Customer already exists: {0}")]
    Duplicate(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence contract for customers, keyed by email
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRecord>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email or phone is taken
    async fn save(&self, customer: NewCustomer) -> Result<CustomerRecord, StoreError>;

    /// Returns `false` when no customer has this email
    async fn update_role(&self, email: &str, role: Role) -> Result<bool, StoreError>;

    /// All customers, ordered by id
    async fn find_all(&self) -> Result<Vec<CustomerRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
