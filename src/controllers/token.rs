use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::core::error::Error;
use crate::types::user::{Claims, Identity, Username};

/// Issues and validates HS256 session tokens under a secret supplied at
/// construction.
#[derive(Clone)]
pub(crate) struct TokenController {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenController")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenController {
    pub(crate) fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock in `validate_at`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub(crate) fn issue(&self, identity: &Identity) -> Result<String, Error> {
        self.issue_at(&identity.username, Utc::now())
    }

    pub(crate) fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<String, Error> {
        let claims = Claims::new(username, now)?;

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| {
                tracing::error!("Failed to sign token: {:?}", e);
                Error::Internal
            },
        )
    }

    pub(crate) fn validate(&self, token: &str) -> Result<Username, Error> {
        self.validate_at(token, Utc::now())
    }

    /// Every rejection collapses into [`Error::Unauthorized`].
    pub(crate) fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Username, Error> {
        let token_data =
            match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
                Ok(token_data) => token_data,
                Err(e) => {
                    tracing::debug!("Rejected token: {:?}", e.kind());
                    return Err(Error::Unauthorized);
                }
            };

        let claims = token_data.claims;

        if !claims.is_well_formed() {
            tracing::debug!("Rejected token: malformed claims");
            return Err(Error::Unauthorized);
        }

        if claims.is_expired_at(now) {
            tracing::debug!("Rejected token: expired");
            return Err(Error::Unauthorized);
        }

        Ok(claims.username)
    }
}
