use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::Error;

pub(crate) type Username = String;

/// Lifetime of a session token, in seconds.
pub(crate) const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub(crate) struct Identity {
    pub(crate) id: Uuid,
    pub(crate) username: Username,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) balance: Decimal,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Identity {
    pub(crate) fn new(username: &str, email: &str, password_hash: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The verified caller of a request, placed in the request extensions by
/// [`crate::utils::auth::authorize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AuthContext {
    pub(crate) username: Username,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Claims {
    pub(crate) username: Username,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

impl Claims {
    pub(crate) fn new(username: &str, issued_at: DateTime<Utc>) -> Result<Self, Error> {
        if username.is_empty() {
            return Err(Error::Validation("username must not be empty".into()));
        }

        Ok(Self {
            username: username.into(),
            iat: issued_at.timestamp(),
            exp: issued_at.timestamp() + TOKEN_LIFETIME_SECS,
        })
    }

    /// Shape check for claims that came off the wire.
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.username.is_empty() && self.exp > self.iat
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn claims_expire_a_day_after_issue() {
        let now = Utc::now();
        let claims = Claims::new("alice", now).unwrap();

        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
        assert!(!claims.is_expired_at(now));
        assert!(!claims.is_expired_at(now + Duration::hours(23)));
        assert!(claims.is_expired_at(now + Duration::hours(24)));
    }

    #[test]
    fn claims_require_a_username() {
        assert!(matches!(
            Claims::new("", Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn claims_with_inverted_window_are_malformed() {
        let claims = Claims {
            username: "alice".into(),
            iat: 100,
            exp: 100,
        };

        assert!(!claims.is_well_formed());
    }
}
