//! Credential store: password hashing and bearer tokens.
//!
//! Passwords are hashed with bcrypt at the configured cost. Tokens are
//! HS-signed JWTs carrying the account email as subject plus an absolute
//! expiry; the algorithm and secret are fixed at startup via [`CoreConfig`].
//! Every token failure — bad signature, expiry, malformed claims, unknown or
//! deactivated subject — collapses into [`RecordError::Unauthenticated`] so
//! callers cannot tell which check failed.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::error::{RecordError, RecordResult};
use crate::models::{Role, User};
use crate::repository::{LookupKey, Repository};
use crate::store::DocumentStore;

/// Claims embedded in an access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account email.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct CredentialStore {
    secret: String,
    algorithm: Algorithm,
    token_ttl_minutes: i64,
    bcrypt_cost: u32,
    users: Repository<User>,
}

impl CredentialStore {
    pub fn new(cfg: &CoreConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            secret: cfg.auth_secret().to_string(),
            algorithm: cfg.auth_algorithm(),
            token_ttl_minutes: cfg.token_ttl_minutes(),
            bcrypt_cost: cfg.bcrypt_cost(),
            users: Repository::new(store),
        }
    }

    /// One-way, salted password hash at the configured cost.
    pub fn hash(&self, password: &str) -> RecordResult<String> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(RecordError::PasswordHash)
    }

    /// Verify a password against a stored hash. Malformed hashes verify as
    /// false rather than erroring.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Issue a signed token for `user`, expiring after the configured TTL.
    pub fn issue_token(&self, user: &User) -> RecordResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.token_ttl_minutes)).timestamp(),
        };
        jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(RecordError::TokenSign)
    }

    /// Validate a token's signature and expiry and return its claims.
    pub fn decode_token(&self, token: &str) -> RecordResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| RecordError::Unauthenticated)
    }

    /// Resolve a token to the active account it names.
    pub fn current_user(&self, token: &str) -> RecordResult<User> {
        let claims = self.decode_token(token)?;
        self.users
            .get(LookupKey::Email(&claims.sub), true)?
            .ok_or(RecordError::Unauthenticated)
    }

    /// Check an email/password pair. Unknown email and wrong password are
    /// indistinguishable to the caller: both are `Ok(None)`.
    pub fn authenticate(&self, email: &str, password: &str) -> RecordResult<Option<User>> {
        let Some(user) = self.users.get(LookupKey::Email(email), true)? else {
            return Ok(None);
        };
        if !self.verify(password, &user.password_hash) {
            return Ok(None);
        }
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    // Minimum bcrypt cost keeps the tests fast.
    fn credentials() -> (CredentialStore, Repository<User>) {
        let store: Arc<dyn DocumentStore> =
            Arc::new(MemoryStore::new().with_unique_index("users", "email"));
        let cfg = CoreConfig::new("test-secret".into(), Algorithm::HS256, 30, 4).unwrap();
        (
            CredentialStore::new(&cfg, store.clone()),
            Repository::new(store),
        )
    }

    fn seed_user(credentials: &CredentialStore, users: &Repository<User>, password: &str) -> User {
        let hash = credentials.hash(password).unwrap();
        users
            .create(&User::new(
                "ada@example.com".into(),
                hash,
                Role::Admin,
                "Ada".into(),
                "Lovelace".into(),
            ))
            .unwrap()
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let (credentials, _) = credentials();
        let hash = credentials.hash("hunter2").unwrap();

        assert_ne!(hash, "hunter2");
        assert!(credentials.verify("hunter2", &hash));
        assert!(!credentials.verify("hunter3", &hash));
        assert!(!credentials.verify("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn issued_tokens_resolve_to_the_user() {
        let (credentials, users) = credentials();
        let user = seed_user(&credentials, &users, "hunter2");

        let token = credentials.issue_token(&user).unwrap();
        let resolved = credentials.current_user(&token).unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, "ada@example.com");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let (credentials, users) = credentials();
        let user = seed_user(&credentials, &users, "hunter2");

        let stale = Claims {
            sub: user.email.clone(),
            role: user.role,
            iat: (Utc::now() - Duration::hours(2)).timestamp(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &stale,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            credentials.current_user(&token),
            Err(RecordError::Unauthenticated)
        ));
    }

    #[test]
    fn tampered_and_foreign_tokens_are_rejected() {
        let (credentials, users) = credentials();
        let user = seed_user(&credentials, &users, "hunter2");
        let token = credentials.issue_token(&user).unwrap();

        let tampered = format!("{token}x");
        assert!(matches!(
            credentials.current_user(&tampered),
            Err(RecordError::Unauthenticated)
        ));

        let claims = Claims {
            sub: user.email.clone(),
            role: user.role,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let foreign = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("other-secret".as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            credentials.current_user(&foreign),
            Err(RecordError::Unauthenticated)
        ));
    }

    #[test]
    fn tokens_of_deactivated_users_stop_working() {
        let (credentials, users) = credentials();
        let user = seed_user(&credentials, &users, "hunter2");
        let token = credentials.issue_token(&user).unwrap();

        users
            .delete(LookupKey::Id(user.id.unwrap()), true)
            .unwrap();
        assert!(matches!(
            credentials.current_user(&token),
            Err(RecordError::Unauthenticated)
        ));
    }

    #[test]
    fn authenticate_does_not_reveal_which_check_failed() {
        let (credentials, users) = credentials();
        seed_user(&credentials, &users, "hunter2");

        let ok = credentials.authenticate("ada@example.com", "hunter2").unwrap();
        assert!(ok.is_some());

        let wrong_password = credentials
            .authenticate("ada@example.com", "hunter3")
            .unwrap();
        let unknown_email = credentials
            .authenticate("nobody@example.com", "hunter2")
            .unwrap();
        assert!(wrong_password.is_none());
        assert!(unknown_email.is_none());
    }
}
