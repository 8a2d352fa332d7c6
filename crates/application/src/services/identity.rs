//! Password hashing and access tokens.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::{Role, UserId};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared_kernel::Enumeration;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::authorization::Actor;

type HmacSha256 = Hmac<Sha256>;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

/// Derives an independent 32-byte key for `purpose` from a master secret.
///
/// The password pepper and the token signing key both come from the one
/// configured secret; each gets its own key so neither can stand in for
/// the other.
pub fn derive_key(master: &[u8], purpose: &str) -> Result<[u8; 32], IdentityError> {
    let mut mac = HmacSha256::new_from_slice(master).map_err(|_| IdentityError::InvalidKey)?;
    mac.update(b"storefront:");
    mac.update(purpose.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&mac.finalize().into_bytes());
    Ok(key)
}

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Invalid key material")]
    InvalidKey,

    #[error("Could not issue token: {0}")]
    Issue(String),

    #[error("{0}")]
    InvalidToken(String),
}

/// Hashes and verifies passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;

    fn verify(&self, password: &str, encoded: &str) -> bool;
}

/// Peppered PBKDF2-HMAC-SHA256 password hasher.
///
/// The password is first keyed with the application pepper, then stretched
/// with a random salt. The encoded form is
/// `pbkdf2-sha256$<iterations>$<salt hex>$<digest hex>`, so the iteration
/// count can be raised without invalidating stored hashes.
#[derive(Clone)]
pub struct HmacPasswordHasher {
    keyed: HmacSha256,
    iterations: u32,
}

impl HmacPasswordHasher {
    pub const DEFAULT_ITERATIONS: u32 = 100_000;

    /// Creates a hasher keyed with a pepper.
    pub fn new(secret: &[u8], iterations: u32) -> Result<Self, IdentityError> {
        let keyed = HmacSha256::new_from_slice(secret).map_err(|_| IdentityError::InvalidKey)?;
        Ok(Self {
            keyed,
            iterations: iterations.max(1),
        })
    }

    fn derive(&self, salt: &[u8], password: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
        let mut peppered = self.keyed.clone();
        peppered.update(password);
        let peppered = peppered.finalize().into_bytes();

        let mut digest = [0u8; DIGEST_LEN];
        pbkdf2_hmac::<Sha256>(&peppered, salt, iterations, &mut digest);
        digest
    }
}

impl fmt::Debug for HmacPasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacPasswordHasher")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher for HmacPasswordHasher {
    fn hash(&self, password: &str) -> String {
        let salt: [u8; SALT_LEN] = rand::random();
        let digest = self.derive(&salt, password.as_bytes(), self.iterations);
        format!(
            "{HASH_SCHEME}${}${}${}",
            self.iterations,
            to_hex(&salt),
            to_hex(&digest)
        )
    }

    fn verify(&self, password: &str, encoded: &str) -> bool {
        let mut parts = encoded.split('$');
        let (Some(HASH_SCHEME), Some(iterations), Some(salt), Some(digest), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        let (Ok(iterations), Some(salt), Some(expected)) =
            (iterations.parse::<u32>(), from_hex(salt), from_hex(digest))
        else {
            return false;
        };
        if iterations == 0 {
            return false;
        }

        let actual = self.derive(&salt, password.as_bytes(), iterations);
        actual.as_slice().ct_eq(&expected).into()
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

/// A signed access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies bearer tokens.
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: UserId, role: Role) -> Result<IssuedToken, IdentityError>;

    /// Resolves a token to the actor it was issued for.
    fn verify(&self, token: &str) -> Result<Actor, IdentityError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// HS256 JSON Web Tokens.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation
    }
}

impl fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: UserId, role: Role) -> Result<IssuedToken, IdentityError> {
        // Token expiry is checked against wall-clock time, so issue against it too.
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.name().to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| IdentityError::Issue(e.to_string()))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);

        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<Actor, IdentityError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation())
            .map_err(|e| IdentityError::InvalidToken(format!("Invalid token: {e}")))?;

        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| IdentityError::InvalidToken("Invalid token subject".to_string()))?;
        let role = Role::from_name(&data.claims.role)
            .ok_or_else(|| IdentityError::InvalidToken("Invalid token role".to_string()))?;

        Ok(Actor::user(UserId::from_uuid(id), role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> HmacPasswordHasher {
        HmacPasswordHasher::new(b"test-secret", 16).unwrap()
    }

    #[test]
    fn hash_and_verify() {
        let hasher = hasher();
        let encoded = hasher.hash("correct horse");
        assert!(encoded.starts_with("pbkdf2-sha256$16$"));
        assert!(hasher.verify("correct horse", &encoded));
        assert!(!hasher.verify("battery staple", &encoded));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = hasher();
        assert_ne!(hasher.hash("same"), hasher.hash("same"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let hasher = hasher();
        for encoded in [
            "",
            "plain",
            "pbkdf2-sha256$x$00$00",
            "md5$1$00$00",
            "pbkdf2-sha256$1$0$00",
            "pbkdf2-sha256$0$00$00",
        ] {
            assert!(!hasher.verify("pw", encoded), "{encoded}");
        }
    }

    #[test]
    fn other_secret_rejects_hash() {
        let encoded = hasher().hash("secret-pw");
        let other = HmacPasswordHasher::new(b"another-secret", 16).unwrap();
        assert!(!other.verify("secret-pw", &encoded));
    }

    #[test]
    fn derived_keys_are_stable_and_separate() {
        let pepper = derive_key(b"master", "password-pepper").unwrap();
        let signing = derive_key(b"master", "token-signing").unwrap();

        assert_eq!(pepper, derive_key(b"master", "password-pepper").unwrap());
        assert_ne!(pepper, signing);
        assert_ne!(pepper, derive_key(b"other-master", "password-pepper").unwrap());
        assert_ne!(&pepper[..], b"master".as_slice());
    }

    #[test]
    fn token_round_trip() {
        let tokens = JwtTokenService::new(b"jwt-secret", "storefront", Duration::minutes(5));
        let user = UserId::new();
        let issued = tokens.issue(user, Role::Admin).unwrap();

        assert_eq!(tokens.verify(&issued.token).unwrap(), Actor::user(user, Role::Admin));
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn rejects_foreign_or_tampered_tokens() {
        let tokens = JwtTokenService::new(b"jwt-secret", "storefront", Duration::minutes(5));
        let foreign = JwtTokenService::new(b"other-secret", "storefront", Duration::minutes(5));
        let other_issuer = JwtTokenService::new(b"jwt-secret", "elsewhere", Duration::minutes(5));

        let token = foreign.issue(UserId::new(), Role::Customer).unwrap().token;
        assert!(tokens.verify(&token).is_err());

        let token = other_issuer.issue(UserId::new(), Role::Customer).unwrap().token;
        assert!(tokens.verify(&token).is_err());

        assert!(tokens.verify("not.a.token").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = JwtTokenService::new(b"jwt-secret", "storefront", Duration::minutes(-10));
        let token = tokens.issue(UserId::new(), Role::Customer).unwrap().token;
        assert!(matches!(
            tokens.verify(&token),
            Err(IdentityError::InvalidToken(_))
        ));
    }
}
