//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.

use jsonwebtoken::Algorithm;

use crate::{RecordError, RecordResult};

/// Default bcrypt work factor when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Default bearer-token lifetime in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Core configuration resolved at startup.
///
/// The signing algorithm and secret are fixed here for the lifetime of the
/// process; tokens signed under a different secret or algorithm are rejected.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    auth_secret: String,
    auth_algorithm: Algorithm,
    token_ttl_minutes: i64,
    bcrypt_cost: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        auth_secret: String,
        auth_algorithm: Algorithm,
        token_ttl_minutes: i64,
        bcrypt_cost: u32,
    ) -> RecordResult<Self> {
        if auth_secret.trim().is_empty() {
            return Err(RecordError::InvalidInput(
                "auth secret cannot be empty".into(),
            ));
        }
        if token_ttl_minutes <= 0 {
            return Err(RecordError::InvalidInput(
                "token ttl must be a positive number of minutes".into(),
            ));
        }
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(RecordError::InvalidInput(format!(
                "bcrypt cost {bcrypt_cost} is outside the supported 4..=31 range"
            )));
        }

        Ok(Self {
            auth_secret,
            auth_algorithm,
            token_ttl_minutes,
            bcrypt_cost,
        })
    }

    pub fn auth_secret(&self) -> &str {
        &self.auth_secret
    }

    pub fn auth_algorithm(&self) -> Algorithm {
        self.auth_algorithm
    }

    pub fn token_ttl_minutes(&self) -> i64 {
        self.token_ttl_minutes
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

/// Parse a signing algorithm from an environment value.
///
/// `None` falls back to HS256; anything `jsonwebtoken` does not recognise is
/// rejected rather than silently defaulted.
pub fn auth_algorithm_from_env_value(value: Option<String>) -> RecordResult<Algorithm> {
    match value.as_deref() {
        None => Ok(Algorithm::HS256),
        Some(raw) => raw
            .parse()
            .map_err(|_| RecordError::InvalidInput(format!("unsupported auth algorithm: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_secret() {
        let result = CoreConfig::new("   ".into(), Algorithm::HS256, 30, 12);
        assert!(matches!(result, Err(RecordError::InvalidInput(_))));
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let result = CoreConfig::new("secret".into(), Algorithm::HS256, 0, 12);
        assert!(matches!(result, Err(RecordError::InvalidInput(_))));
    }

    #[test]
    fn rejects_out_of_range_bcrypt_cost() {
        let result = CoreConfig::new("secret".into(), Algorithm::HS256, 30, 3);
        assert!(matches!(result, Err(RecordError::InvalidInput(_))));
    }

    #[test]
    fn algorithm_defaults_to_hs256() {
        assert_eq!(
            auth_algorithm_from_env_value(None).unwrap(),
            Algorithm::HS256
        );
        assert_eq!(
            auth_algorithm_from_env_value(Some("HS512".into())).unwrap(),
            Algorithm::HS512
        );
    }

    #[test]
    fn algorithm_rejects_unknown_value() {
        assert!(auth_algorithm_from_env_value(Some("ROT13".into())).is_err());
    }
}
