//! Handles user authentication and bearer sessions. Authentication is proven
//! by possession of a session token issued at login; every authenticated
//! operation carries a [`Grant`] naming the user it acts for.

use crate::{hex::Hex, user};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::Digest;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("access denied")]
pub struct AccessDenied;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

/// Proof that a request was made with a live session for this user.
#[derive(Debug)]
pub struct Grant {
    pub session_id: SessionId,
    pub user_id: user::Id,
}

/// A freshly issued session token. The plaintext leaves the process exactly
/// once, in the login response; only its hash is stored.
#[derive(Debug)]
pub struct SessionToken(String);

impl SessionToken {
    pub(crate) fn generate() -> Self {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        Self(Hex::encode(&bytes).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A hash of the session token.
///
/// SHA-256 without salting is good enough here because tokens are generated
/// randomly and therefore have high entropy.
pub struct TokenHash(Hex);

impl TokenHash {
    pub(crate) fn generate(token: &str) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(token);
        let sha = hasher.finalize();
        Self(Hex::encode(&sha))
    }

    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A salted hash of a user password, stored as `salt$digest` with both parts
/// hex encoded. Unlike session tokens, passwords are low entropy, so a
/// per-user random salt is mixed in before hashing.
#[derive(Debug)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub(crate) fn generate(password: &str) -> Self {
        let salt: [u8; 16] = rand::thread_rng().gen();
        let salt = Hex::encode(&salt).into_string();
        let digest = Self::digest(&salt, password);
        Self(format!("{}${}", salt, digest))
    }

    pub(crate) fn from_stored(stored: String) -> Self {
        Self(stored)
    }

    pub(crate) fn verify(&self, password: &str) -> bool {
        match self.0.split_once('$') {
            Some((salt, digest)) => Self::digest(salt, password) == digest,
            None => false,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = sha2::Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        Hex::encode(&hasher.finalize()).into_string()
    }
}

/// A stored login session. Sessions expire; an expired session yields no
/// grant and behaves exactly like an unknown token.
#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) user_id: user::Id,
    pub(crate) created: DateTime<Utc>,
    pub(crate) expires: DateTime<Utc>,
}

impl Session {
    pub(crate) fn create(user_id: user::Id, ttl: std::time::Duration) -> Self {
        let created = Utc::now();
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(12));
        Self {
            id: SessionId(Uuid::new_v4()),
            user_id,
            created,
            expires: created + ttl,
        }
    }

    pub(crate) fn grant(&self) -> Result<Grant, AccessDenied> {
        if self.is_expired() {
            return Err(AccessDenied);
        }
        Ok(Grant {
            session_id: self.id,
            user_id: self.user_id,
        })
    }

    fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[test]
    fn password_hash_verifies_the_original_password() {
        let hash = PasswordHash::generate("correct horse battery");
        assert!(hash.verify("correct horse battery"));
        assert!(!hash.verify("correct horse buttery"));
    }

    #[test]
    fn password_hashes_are_salted() {
        let a = PasswordHash::generate("same password");
        let b = PasswordHash::generate("same password");
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        let hash = PasswordHash::from_stored("no-dollar-separator".to_owned());
        assert!(!hash.verify("anything"));
    }

    #[test]
    fn token_hash_is_deterministic() {
        let token = SessionToken::generate();
        assert_eq!(
            TokenHash::generate(token.as_str()).as_str(),
            TokenHash::generate(token.as_str()).as_str()
        );
    }

    #[test]
    fn live_session_yields_a_grant() {
        let session = Session::create(user::Id(Uuid::from_u128(1)), StdDuration::from_secs(60));
        let grant = session.grant().unwrap();
        assert_eq!(grant.user_id, user::Id(Uuid::from_u128(1)));
        assert_eq!(grant.session_id, session.id);
    }

    #[test]
    fn expired_session_is_denied() {
        let session = Session::create(user::Id(Uuid::from_u128(1)), StdDuration::from_secs(0));
        assert!(session.grant().is_err());
    }
}
