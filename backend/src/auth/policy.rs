//! Role-based access policy
//!
//! Access rules live in one table keyed by [`Operation`]. Handlers ask the
//! policy about the operation they implement before touching any data, so
//! the whole rule set can be tested without a running server.

use crate::error::ApiError;
use customer_identity_shared::{EndpointInfo, Identity, Role};
use std::collections::HashMap;
use std::fmt;

/// Every operation the customer API exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    Login,
    ApiDocs,
    ApiInfo,
    GetProfile,
    ListCustomers,
    PromoteToAdmin,
}

impl Operation {
    pub fn all() -> [Operation; 7] {
        [
            Operation::Register,
            Operation::Login,
            Operation::ApiDocs,
            Operation::ApiInfo,
            Operation::GetProfile,
            Operation::ListCustomers,
            Operation::PromoteToAdmin,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::Login => "login",
            Operation::ApiDocs => "api_docs",
            Operation::ApiInfo => "api_info",
            Operation::GetProfile => "get_profile",
            Operation::ListCustomers => "list_customers",
            Operation::PromoteToAdmin => "promote_to_admin",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Operation::Register | Operation::Login => "POST",
            Operation::PromoteToAdmin => "PUT",
            Operation::ApiDocs
            | Operation::ApiInfo
            | Operation::GetProfile
            | Operation::ListCustomers => "GET",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Operation::Register => "/api/v1/customers/register",
            Operation::Login => "/api/v1/customers/login",
            Operation::ApiDocs => "/api/v1/docs",
            Operation::ApiInfo => "/api/v1",
            Operation::GetProfile => "/api/v1/customers/profile",
            Operation::ListCustomers => "/api/v1/customers/admin/customers",
            Operation::PromoteToAdmin => "/api/v1/customers/admin/promote/{email}",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an operation demands of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Public,
    AnyRole,
    Roles(Vec<Role>),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Public => f.write_str("PUBLIC"),
            Requirement::AnyRole => f.write_str("ANY_ROLE"),
            Requirement::Roles(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                f.write_str(&names.join("|"))
            }
        }
    }
}

/// Outcome of evaluating a request against the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationResult {
    Public,
    Unauthenticated,
    Forbidden,
    Authorized,
}

impl AuthorizationResult {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthorizationResult::Public | AuthorizationResult::Authorized)
    }
}

// Operations missing from the table still need a caller
static AUTHENTICATED: Requirement = Requirement::AnyRole;

/// Operation → requirement table
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: HashMap<Operation, Requirement>,
}

impl AccessPolicy {
    /// A policy with no rules: every operation requires an authenticated caller
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, operation: Operation, requirement: Requirement) -> Self {
        self.rules.insert(operation, requirement);
        self
    }

    /// The rule set the customer API is served with.
    ///
    /// `ApiInfo` has no entry and gets the authenticated default.
    pub fn customer_api() -> Self {
        Self::empty()
            .with_rule(Operation::Register, Requirement::Public)
            .with_rule(Operation::Login, Requirement::Public)
            .with_rule(Operation::ApiDocs, Requirement::Public)
            .with_rule(
                Operation::GetProfile,
                Requirement::Roles(vec![Role::User, Role::Admin]),
            )
            .with_rule(Operation::ListCustomers, Requirement::Roles(vec![Role::Admin]))
            .with_rule(Operation::PromoteToAdmin, Requirement::Roles(vec![Role::Admin]))
    }

    pub fn requirement(&self, operation: Operation) -> &Requirement {
        self.rules.get(&operation).unwrap_or(&AUTHENTICATED)
    }

    /// Decide whether `identity` may perform `operation`
    pub fn authorize(&self, operation: Operation, identity: Option<&Identity>) -> AuthorizationResult {
        match (self.requirement(operation), identity) {
            (Requirement::Public, _) => AuthorizationResult::Public,
            (_, None) => AuthorizationResult::Unauthenticated,
            (Requirement::AnyRole, Some(_)) => AuthorizationResult::Authorized,
            (Requirement::Roles(roles), Some(identity)) => {
                if roles.contains(&identity.role) {
                    AuthorizationResult::Authorized
                } else {
                    AuthorizationResult::Forbidden
                }
            }
        }
    }

    /// [`authorize`](Self::authorize), with rejections turned into API errors
    pub fn enforce(&self, operation: Operation, identity: Option<&Identity>) -> Result<(), ApiError> {
        match self.authorize(operation, identity) {
            AuthorizationResult::Public | AuthorizationResult::Authorized => Ok(()),
            AuthorizationResult::Unauthenticated => Err(ApiError::Unauthenticated(
                "Full authentication is required to access this resource".to_string(),
            )),
            AuthorizationResult::Forbidden => Err(ApiError::Forbidden(format!(
                "Role {} may not perform {}",
                identity.map(|i| i.role.as_str()).unwrap_or("NONE"),
                operation
            ))),
        }
    }

    /// Enforce a protected operation and hand back the caller's identity
    pub fn authenticated<'a>(
        &self,
        operation: Operation,
        identity: Option<&'a Identity>,
    ) -> Result<&'a Identity, ApiError> {
        self.enforce(operation, identity)?;
        identity.ok_or_else(|| {
            ApiError::Unauthenticated("Full authentication is required to access this resource".to_string())
        })
    }

    /// Catalog of every operation and its access rule
    pub fn endpoints(&self) -> Vec<EndpointInfo> {
        Operation::all()
            .iter()
            .map(|op| EndpointInfo {
                operation: op.name().to_string(),
                method: op.method().to_string(),
                path: op.path().to_string(),
                access: self.requirement(*op).to_string(),
            })
            .collect()
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::customer_api()
    }
}
