//! Application state management
//!
//! Shared resources handed to every request handler through Axum's state
//! extraction. Everything in here is built once at startup and is read-only
//! afterwards; cloning only bumps reference counts.

use crate::auth::{AccessPolicy, SigningKeys, TokenCodec};
use crate::config::AppConfig;
use crate::repositories::{CustomerStore, InMemoryCustomerStore};
use crate::services::RegistrationPolicy;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Customer persistence
    pub store: Arc<dyn CustomerStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Token codec holding the process-wide signing key
    pub tokens: TokenCodec,
    /// Access rules for every API operation
    pub policy: Arc<AccessPolicy>,
    pub registration: RegistrationPolicy,
}

impl AppState {
    /// Create the application state.
    ///
    /// Signing keys come from `jwt.secret` when configured; otherwise a
    /// random key is generated here and lives as long as the process.
    pub fn new(store: Arc<dyn CustomerStore>, config: AppConfig) -> Self {
        let keys = match &config.jwt.secret {
            Some(secret) => SigningKeys::from_secret(secret.expose_secret().as_bytes()),
            None => {
                warn!("No JWT secret configured; generated a per-process signing key");
                SigningKeys::generate()
            }
        };
        let tokens = TokenCodec::new(keys, config.jwt.token_ttl_secs);

        let registration = RegistrationPolicy {
            default_role: config.registration.default_role,
            allow_role_override: config.role_override_enabled(),
        };

        Self {
            store,
            config: Arc::new(config),
            tokens,
            policy: Arc::new(AccessPolicy::customer_api()),
            registration,
        }
    }

    /// State over a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(Arc::new(InMemoryCustomerStore::new()), config)
    }

    #[inline]
    pub fn store(&self) -> &dyn CustomerStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    #[inline]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use customer_identity_shared::Role;
    use secrecy::Secret;

    #[test]
    fn test_generated_key_is_shared_by_clones() {
        let state = AppState::in_memory(AppConfig::default());
        let cloned = state.clone();

        let issued = state.tokens().issue("a@x.com", Role::User).unwrap();
        assert!(cloned.tokens().is_valid(&issued.token));
    }

    #[test]
    fn test_separate_states_have_separate_generated_keys() {
        let first = AppState::in_memory(AppConfig::default());
        let second = AppState::in_memory(AppConfig::default());

        let issued = first.tokens().issue("a@x.com", Role::User).unwrap();
        assert!(!second.tokens().is_valid(&issued.token));
    }

    #[test]
    fn test_configured_secret_is_used() {
        let mut config = AppConfig::default();
        config.jwt.secret = Some(Secret::new("a-configured-secret-of-sufficient-length".to_string()));

        let first = AppState::in_memory(config.clone());
        let second = AppState::in_memory(config);

        let issued = first.tokens().issue("a@x.com", Role::Admin).unwrap();
        assert!(second.tokens().is_valid(&issued.token));
    }

    #[test]
    fn test_ttl_comes_from_config() {
        let mut config = AppConfig::default();
        config.jwt.token_ttl_secs = 60;

        let state = AppState::in_memory(config);
        assert_eq!(state.tokens().ttl_secs(), 60);
    }
}
