use regex::Regex;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::controllers::token::TokenController;
use crate::core::error::{self, Error};
use crate::store::{IdentityStore, StoreError};
use crate::types::user::Identity;
use crate::utils::password::PasswordHasher;

const MIN_PASSWORD_LENGTH: usize = 8;
// bcrypt ignores everything past 72 bytes.
const MAX_PASSWORD_LENGTH: usize = 72;
const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Clone)]
pub(crate) struct UserController {
    identities: Arc<dyn IdentityStore>,
    tokens: TokenController,
    hasher: PasswordHasher,
    username_pattern: Regex,
}

impl std::fmt::Debug for UserController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserController")
            .field("username_pattern", &self.username_pattern.as_str())
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl UserController {
    pub(crate) fn new(
        identities: Arc<dyn IdentityStore>,
        tokens: TokenController,
        hasher: PasswordHasher,
    ) -> Result<Self, error::ConfigError> {
        Ok(Self {
            identities,
            tokens,
            hasher,
            username_pattern: Regex::new(r"^[a-zA-Z0-9_-]{3,20}$")?,
        })
    }

    #[instrument(skip(self, password))]
    pub(crate) async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(Identity, String), Error> {
        if !self.username_pattern.is_match(username) {
            return Err(Error::Validation(
                "Username must be 3-20 characters of letters, digits, '_' or '-'".to_owned(),
            ));
        }

        if email.len() > MAX_EMAIL_LENGTH || !email.contains('@') {
            return Err(Error::Validation("Invalid email address".to_owned()));
        }

        validate_password(password)?;

        if self
            .identities
            .exists(username)
            .await
            .map_err(Error::store("check username"))?
        {
            return Err(Error::AlreadyExists);
        }

        let password_hash = self.hasher.hash_blocking(password.to_owned()).await?;

        let identity = Identity::new(username, email, password_hash);

        match self.identities.create(&identity).await {
            Ok(()) => (),
            // lost a race with a concurrent registration of the same name
            Err(StoreError::Duplicate) => return Err(Error::AlreadyExists),
            Err(e) => return Err(Error::CreationFailed(e)),
        }

        tracing::info!(id = %identity.id, "Registered user");

        let token = self.tokens.issue(&identity)?;

        Ok((identity, token))
    }

    #[instrument(skip(self, password))]
    pub(crate) async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Identity, String), Error> {
        let identity = self
            .identities
            .get_by_username(username)
            .await
            .map_err(Error::store("load user"))?
            .ok_or(Error::InvalidCredentials)?;

        if !self
            .hasher
            .verify_blocking(password.to_owned(), identity.password_hash.clone())
            .await?
        {
            return Err(Error::InvalidCredentials);
        }

        let token = self.tokens.issue(&identity)?;

        Ok((identity, token))
    }

    #[instrument(skip(self))]
    pub(crate) async fn list(&self) -> Result<Vec<Identity>, Error> {
        self.identities
            .list()
            .await
            .map_err(Error::store("list users"))
    }

    #[instrument(skip(self))]
    pub(crate) async fn get(&self, id: Uuid) -> Result<Identity, Error> {
        self.identities
            .get_by_id(id)
            .await
            .map_err(Error::store("load user"))?
            .ok_or(Error::NotFound)
    }

    pub(crate) async fn get_by_username(&self, username: &str) -> Result<Identity, Error> {
        self.identities
            .get_by_username(username)
            .await
            .map_err(Error::store("load user"))?
            .ok_or(Error::NotFound)
    }

    #[instrument(skip(self, new_password))]
    pub(crate) async fn change_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        validate_password(new_password)?;

        let mut identity = self.get_by_username(username).await?;
        identity.password_hash = self.hasher.hash_blocking(new_password.to_owned()).await?;

        self.identities
            .update(&identity)
            .await
            .map_err(Error::store("update user"))
    }

    #[instrument(skip(self))]
    pub(crate) async fn remove(&self, username: &str) -> Result<(), Error> {
        let identity = self.get_by_username(username).await?;

        match self.identities.delete(identity.id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(Error::NotFound),
            Err(e) => Err(Error::store("delete user")(e)),
        }
    }
}

fn validate_password(password: &str) -> Result<(), Error> {
    if password.len() < MIN_PASSWORD_LENGTH || password.len() > MAX_PASSWORD_LENGTH {
        return Err(Error::Validation(format!(
            "Password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} bytes"
        )));
    }

    Ok(())
}
