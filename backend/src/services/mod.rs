//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! the customer store and the token codec.

pub mod customer;

pub use customer::{CustomerService, RegistrationPolicy};
