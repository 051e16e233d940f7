//! Authentication middleware
//!
//! Runs once per request, before any handler. A `Bearer` token in the
//! `Authorization` header is decoded with the shared [`TokenCodec`] and the
//! result is stored in the request's extensions as a
//! [`RequestIdentityContext`]. The middleware never rejects a request: a
//! missing, expired or malformed token simply leaves the context empty, and
//! the access policy decides later whether that matters.

use crate::auth::TokenCodec;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use customer_identity_shared::{Identity, TokenError};
use std::convert::Infallible;
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Identity established for the current request, if any.
///
/// Extract it in a handler to read the caller's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentityContext {
    identity: Option<Identity>,
}

impl RequestIdentityContext {
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current_identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestIdentityContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestIdentityContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Strip the bearer scheme from an `Authorization` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Turn an optional `Authorization` header into an identity context
pub fn resolve_identity(codec: &TokenCodec, header: Option<&str>, path: &str) -> RequestIdentityContext {
    let Some(token) = bearer_token(header) else {
        return RequestIdentityContext::anonymous();
    };

    match codec.decode(token) {
        Ok(identity) => {
            debug!(
                subject = %identity.subject,
                role = %identity.role,
                path,
                "JWT validated"
            );
            RequestIdentityContext::authenticated(identity)
        }
        Err(TokenError::Expired) => {
            warn!(path, "Expired JWT token");
            RequestIdentityContext::anonymous()
        }
        Err(TokenError::Malformed) => {
            warn!(path, "Invalid JWT token");
            RequestIdentityContext::anonymous()
        }
    }
}

/// Middleware that populates [`RequestIdentityContext`] and always continues
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = resolve_identity(
        state.tokens(),
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
        request.uri().path(),
    );

    request.extensions_mut().insert(context);

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SigningKeys;
    use chrono::{Duration, Utc};
    use customer_identity_shared::Role;

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningKeys::generate(), 3600)
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(Some("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        let context = resolve_identity(&codec(), None, "/");
        assert!(!context.is_authenticated());
    }

    #[test]
    fn test_valid_token_populates_context() {
        let codec = codec();
        let issued = codec.issue("a@x.com", Role::User).unwrap();
        let header = format!("Bearer {}", issued.token);

        let context = resolve_identity(&codec, Some(&header), "/api/v1/customers/profile");

        assert_eq!(
            context.current_identity(),
            Some(&Identity::new("a@x.com", Role::User))
        );
    }

    #[test]
    fn test_expired_token_is_anonymous() {
        let codec = codec();
        let issued = codec
            .issue_at("a@x.com", Role::Admin, Utc::now() - Duration::hours(2))
            .unwrap();
        let header = format!("Bearer {}", issued.token);

        let context = resolve_identity(&codec, Some(&header), "/");
        assert_eq!(context, RequestIdentityContext::anonymous());
    }

    #[test]
    fn test_malformed_token_is_anonymous() {
        let context = resolve_identity(&codec(), Some("Bearer not-a-jwt"), "/");
        assert!(context.current_identity().is_none());
    }

    #[test]
    fn test_token_without_scheme_is_ignored() {
        let codec = codec();
        let issued = codec.issue("a@x.com", Role::User).unwrap();

        let context = resolve_identity(&codec, Some(&issued.token), "/");
        assert!(!context.is_authenticated());
    }
}
