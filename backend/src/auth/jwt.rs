//! JWT issuance and validation
//!
//! Tokens are HS256-signed and carry the customer's email as `sub` plus a
//! custom `role` claim. The signing key is built once at startup and shared
//! read-only by every request.

use anyhow::Result;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use customer_identity_shared::{Identity, Role, TokenError};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (customer email)
    pub sub: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly signed token and its validity window
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Symmetric signing keys, derived once and shared behind `Arc`
#[derive(Clone)]
pub struct SigningKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl SigningKeys {
    /// Keys from a configured secret
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
        }
    }

    /// Fresh 256-bit key from the OS RNG.
    ///
    /// Tokens signed with it are only valid for the lifetime of the process.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::from_secret(&secret)
    }
}

/// Signs and parses identity tokens
#[derive(Clone)]
pub struct TokenCodec {
    keys: SigningKeys,
    ttl: Duration,
    validation: Arc<Validation>,
}

impl TokenCodec {
    pub fn new(keys: SigningKeys, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys,
            ttl: Duration::seconds(ttl_secs),
            validation: Arc::new(validation),
        }
    }

    /// Issue a token for `subject` valid from now until now + TTL
    #[inline]
    pub fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, role: Role, now: DateTime<Utc>) -> Result<IssuedToken> {
        // JWT timestamps have second precision
        let issued_at = Utc
            .timestamp_opt(now.timestamp(), 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("Issue time out of range"))?;
        let expires_at = issued_at + self.ttl;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {}", e))?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature and expiry, returning the raw claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }

    /// Verify a token and extract the identity it carries
    pub fn decode(&self, token: &str) -> Result<Identity, TokenError> {
        let claims = self.decode_claims(token)?;
        Ok(Identity::new(claims.sub, claims.role))
    }

    /// `true` iff [`decode`](Self::decode) would succeed
    #[inline]
    pub fn is_valid(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }

    /// Token lifetime in seconds
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TOKEN_TTL_SECS;
    use proptest::prelude::*;

    fn create_test_codec() -> TokenCodec {
        TokenCodec::new(SigningKeys::generate(), DEFAULT_TOKEN_TTL_SECS)
    }

    fn tamper_signature(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let first = if signature.starts_with('A') { 'B' } else { 'A' };
        format!("{}.{}{}", head, first, &signature[1..])
    }

    #[test]
    fn test_issue_then_decode() {
        let codec = create_test_codec();

        let issued = codec.issue("a@x.com", Role::User).unwrap();
        let identity = codec.decode(&issued.token).unwrap();

        assert_eq!(identity, Identity::new("a@x.com", Role::User));
    }

    #[test]
    fn test_ttl_is_ten_hours() {
        let codec = create_test_codec();

        let issued = codec.issue("a@x.com", Role::Admin).unwrap();
        let claims = codec.decode_claims(&issued.token).unwrap();

        assert_eq!((claims.exp - claims.iat) * 1000, 36_000_000);
        assert_eq!(issued.expires_at - issued.issued_at, Duration::hours(10));
        assert_eq!(codec.ttl_secs(), 36_000);
    }

    #[test]
    fn test_token_has_three_segments() {
        let codec = create_test_codec();
        let issued = codec.issue("a@x.com", Role::User).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = create_test_codec();

        let issued = codec
            .issue_at("a@x.com", Role::User, Utc::now() - Duration::hours(11))
            .unwrap();

        assert_eq!(codec.decode(&issued.token), Err(TokenError::Expired));
        assert!(!codec.is_valid(&issued.token));
    }

    #[test]
    fn test_token_just_inside_ttl_accepted() {
        let codec = create_test_codec();

        let issued = codec
            .issue_at("a@x.com", Role::User, Utc::now() - Duration::hours(9))
            .unwrap();

        assert!(codec.is_valid(&issued.token));
    }

    #[test]
    fn test_altered_signature_is_malformed() {
        let codec = create_test_codec();
        let issued = codec.issue("a@x.com", Role::User).unwrap();

        let tampered = tamper_signature(&issued.token);

        assert_eq!(codec.decode(&tampered), Err(TokenError::Malformed));
    }

    #[test]
    fn test_foreign_key_is_malformed() {
        let ours = create_test_codec();
        let theirs = create_test_codec();

        let issued = theirs.issue("a@x.com", Role::Admin).unwrap();

        assert_eq!(ours.decode(&issued.token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_configured_secret_survives_restart() {
        let first = TokenCodec::new(SigningKeys::from_secret(b"shared-secret"), 60);
        let second = TokenCodec::new(SigningKeys::from_secret(b"shared-secret"), 60);

        let issued = first.issue("a@x.com", Role::User).unwrap();
        assert!(second.is_valid(&issued.token));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = create_test_codec();
        assert_eq!(codec.decode("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_codec_clone_shares_keys() {
        let codec = create_test_codec();
        let cloned = codec.clone();

        let issued = codec.issue("a@x.com", Role::User).unwrap();
        assert!(cloned.is_valid(&issued.token));
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::User), Just(Role::Admin)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_decode_returns_issued_identity(
            subject in "[a-z0-9._]{1,20}@[a-z]{1,10}\\.com",
            role in role_strategy(),
        ) {
            let codec = create_test_codec();
            let issued = codec.issue(&subject, role).unwrap();
            prop_assert_eq!(codec.decode(&issued.token).unwrap(), Identity::new(subject, role));
        }

        #[test]
        fn prop_is_valid_matches_decode(token in "[A-Za-z0-9_.-]{0,80}") {
            let codec = create_test_codec();
            prop_assert_eq!(codec.is_valid(&token), codec.decode(&token).is_ok());
        }
    }
}
