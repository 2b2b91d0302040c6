//! JWT token generation and verification.
//!
//! Tokens are stateless: validity is decided by signature and expiry alone,
//! so there is no way to revoke one before it expires.

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::Deserialize;

use super::AuthError;
use crate::models::auth::{IdentityClaims, Role, TokenClaims, TokenKind};

/// Default access token lifetime: 1 hour.
pub const DEFAULT_ACCESS_TOKEN_TTL: StdDuration = StdDuration::from_secs(60 * 60);

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL: StdDuration = StdDuration::from_secs(7 * 24 * 60 * 60);

/// Signs and verifies HS256 tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec. Fails if a lifetime cannot be added to the current time.
    pub fn new(
        secret: &[u8],
        access_ttl: StdDuration,
        refresh_ttl: StdDuration,
    ) -> Result<Self, AuthError> {
        let to_chrono = |ttl: StdDuration| {
            Duration::from_std(ttl)
                .ok()
                .filter(|ttl| expiry(*ttl).is_some())
                .ok_or_else(|| {
                    AuthError::TokenError(format!("token lifetime out of range: {ttl:?}"))
                })
        };
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: to_chrono(access_ttl)?,
            refresh_ttl: to_chrono(refresh_ttl)?,
        })
    }

    /// Access token lifetime in whole seconds.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign a short-lived access token.
    pub fn sign_access(&self, identity: &IdentityClaims) -> Result<String, AuthError> {
        self.sign(identity, TokenKind::Access, self.access_ttl)
    }

    /// Sign a long-lived refresh token.
    pub fn sign_refresh(&self, identity: &IdentityClaims) -> Result<String, AuthError> {
        self.sign(identity, TokenKind::Refresh, self.refresh_ttl)
    }

    fn sign(
        &self,
        identity: &IdentityClaims,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::TokenError("token expiry out of range".into()))?;
        let claims = TokenClaims {
            sub: identity.user_id.clone(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            role: identity.role,
            kind,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// Verify signature and expiry of any token this codec issued.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        self.verify_claims(token).map(IdentityClaims::from)
    }

    /// Verify a token and require that it was minted as an access token.
    pub fn verify_access(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        let claims = self.verify_claims(token)?;
        if claims.kind != TokenKind::Access {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims.into())
    }

    fn verify_claims(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Read the identity of a token without checking signature, algorithm,
    /// expiry, or token kind.
    ///
    /// For display only; never base an authorization decision on this.
    pub fn decode(token: &str) -> Option<IdentityClaims> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| IdentityClaims {
                user_id: data.claims.sub,
                username: data.claims.username,
                email: data.claims.email,
                role: data.claims.role,
            })
    }
}

/// The identity subset of [`TokenClaims`]; anything else in the payload is ignored.
#[derive(Deserialize)]
struct UnverifiedClaims {
    sub: String,
    username: String,
    email: String,
    role: Role,
}

fn expiry(ttl: Duration) -> Option<DateTime<Utc>> {
    Utc::now().checked_add_signed(ttl)
}

/// Generate a random 64-character signing secret.
pub fn generate_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(
            b"test-secret",
            DEFAULT_ACCESS_TOKEN_TTL,
            DEFAULT_REFRESH_TOKEN_TTL,
        )
        .unwrap()
    }

    fn identity() -> IdentityClaims {
        IdentityClaims {
            user_id: "0193a1b2-0000-7000-8000-000000000001".into(),
            username: "manager".into(),
            email: "manager@clinic.com".into(),
            role: Role::Manager,
        }
    }

    #[test]
    fn access_token_round_trips() {
        let codec = codec();
        let token = codec.sign_access(&identity()).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), identity());
        assert_eq!(codec.verify_access(&token).unwrap(), identity());
    }

    #[test]
    fn refresh_token_verifies_but_is_not_an_access_token() {
        let codec = codec();
        let token = codec.sign_refresh(&identity()).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), identity());
        assert!(matches!(
            codec.verify_access(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let token = codec
            .sign(&identity(), TokenKind::Access, Duration::seconds(-10))
            .unwrap();
        assert!(matches!(codec.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = codec().sign_access(&identity()).unwrap();
        let other = TokenCodec::new(
            b"another-secret",
            DEFAULT_ACCESS_TOKEN_TTL,
            DEFAULT_REFRESH_TOKEN_TTL,
        )
        .unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            codec().verify("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn decode_skips_signature_check() {
        let token = codec().sign_access(&identity()).unwrap();
        assert_eq!(TokenCodec::decode(&token), Some(identity()));
        assert_eq!(TokenCodec::decode("garbage"), None);
    }

    #[test]
    fn decode_reads_foreign_tokens_without_kind() {
        let payload = serde_json::json!({
            "sub": "legacy-user",
            "username": "doctor",
            "email": "doctor@clinic.com",
            "role": "DOCTOR",
        });
        let token = encode(
            &Header::new(Algorithm::HS512),
            &payload,
            &EncodingKey::from_secret(b"somebody-else"),
        )
        .unwrap();

        let identity = TokenCodec::decode(&token).unwrap();
        assert_eq!(identity.user_id, "legacy-user");
        assert_eq!(identity.role, Role::Doctor);
        assert!(matches!(codec().verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn unrepresentable_lifetime_is_rejected_up_front() {
        let million_years = StdDuration::from_secs(1_000_000 * 365 * 24 * 60 * 60);
        let err = TokenCodec::new(b"test-secret", million_years, DEFAULT_REFRESH_TOKEN_TTL)
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenError(_)));
        assert!(
            TokenCodec::new(b"test-secret", DEFAULT_ACCESS_TOKEN_TTL, million_years).is_err()
        );
    }

    #[test]
    fn signing_past_the_calendar_is_an_error() {
        let result = codec().sign(
            &identity(),
            TokenKind::Access,
            Duration::days(1_000_000 * 365),
        );
        assert!(matches!(result, Err(AuthError::TokenError(_))));
    }

    #[test]
    fn access_ttl_is_reported_in_seconds() {
        assert_eq!(codec().access_ttl_secs(), 3600);
    }

    #[test]
    fn generated_secrets_are_distinct() {
        let a = generate_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, generate_secret());
    }
}
