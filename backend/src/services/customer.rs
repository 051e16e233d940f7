//! Customer service: registration, login, profile and role management
//!
//! Request payloads arrive already validated. Credential hashing and
//! verification run on the blocking thread pool.

use crate::auth::{CredentialVerifier, TokenCodec};
use crate::error::ApiError;
use crate::repositories::{CustomerStore, NewCustomer};
use customer_identity_shared::{
    CustomerResponse, LoginRequest, RegisterRequest, Role, TokenResponse,
};
use tracing::{info, warn};

/// Which role a newly registered customer receives
#[derive(Debug, Clone, Copy)]
pub struct RegistrationPolicy {
    pub default_role: Role,
    /// Honour the role requested in the payload
    pub allow_role_override: bool,
}

impl RegistrationPolicy {
    pub fn role_for(&self, requested: Option<Role>) -> Role {
        match requested {
            Some(role) if self.allow_role_override => role,
            _ => self.default_role,
        }
    }
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            default_role: Role::User,
            allow_role_override: false,
        }
    }
}

pub struct CustomerService;

impl CustomerService {
    /// Register a new customer.
    ///
    /// Fails with `DuplicateSubject` when the email is already present; in
    /// that case nothing is written.
    pub async fn register(
        store: &dyn CustomerStore,
        registration: &RegistrationPolicy,
        req: RegisterRequest,
    ) -> Result<CustomerResponse, ApiError> {
        info!(email = %req.email, "Registering new customer");

        if store.find_by_email(&req.email).await?.is_some() {
            warn!(email = %req.email, "Customer already exists");
            return Err(ApiError::DuplicateSubject(
                "Customer with this email already exists.".to_string(),
            ));
        }

        let role = registration.role_for(req.role);
        let password_hash = CredentialVerifier::hash_async(req.password).await?;

        let saved = store
            .save(NewCustomer {
                name: req.name,
                email: req.email,
                password_hash,
                phone: Some(req.phone),
                role,
            })
            .await?;

        info!(id = saved.id, role = %saved.role, "Customer registered");
        Ok(saved.into())
    }

    /// Verify credentials and issue a token carrying the stored role
    pub async fn login(
        store: &dyn CustomerStore,
        tokens: &TokenCodec,
        req: LoginRequest,
    ) -> Result<TokenResponse, ApiError> {
        info!(email = %req.email, "Login attempt");

        let Some(customer) = store.find_by_email(&req.email).await? else {
            warn!(email = %req.email, "Login failed: unknown email");
            return Err(ApiError::NotFound(format!(
                "Customer not found with email: {}",
                req.email
            )));
        };

        let matches =
            CredentialVerifier::verify_async(req.password, customer.password_hash.clone()).await?;
        if !matches {
            warn!(email = %req.email, "Login failed: invalid credentials");
            return Err(ApiError::InvalidCredentials);
        }

        let issued = tokens.issue(&customer.email, customer.role)?;
        info!(email = %customer.email, role = %customer.role, "Token issued");

        Ok(TokenResponse {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.ttl_secs(),
        })
    }

    /// Profile of the customer identified by `email`
    pub async fn get_profile(
        store: &dyn CustomerStore,
        email: &str,
    ) -> Result<CustomerResponse, ApiError> {
        store
            .find_by_email(email)
            .await?
            .map(CustomerResponse::from)
            .ok_or_else(|| {
                warn!(email, "Profile fetch failed: customer not found");
                ApiError::NotFound("Customer not found".to_string())
            })
    }

    pub async fn list_customers(
        store: &dyn CustomerStore,
    ) -> Result<Vec<CustomerResponse>, ApiError> {
        let customers = store.find_all().await?;
        Ok(customers.into_iter().map(CustomerResponse::from).collect())
    }

    /// Grant ADMIN to the customer with `email`.
    ///
    /// Tokens issued before the promotion keep their old role until they expire.
    pub async fn promote_to_admin(store: &dyn CustomerStore, email: &str) -> Result<(), ApiError> {
        if !store.update_role(email, Role::Admin).await? {
            return Err(ApiError::NotFound("Customer not found".to_string()));
        }

        info!(email, "Customer promoted to ADMIN");
        Ok(())
    }
}
