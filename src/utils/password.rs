use crate::core::error::Error;

/// Work factor used outside of tests.
pub(crate) const HASH_COST: u32 = 12;

/// Cheapest cost bcrypt accepts; keeps the test suite fast.
#[cfg(test)]
pub(crate) const TEST_COST: u32 = 4;

/// One-way bcrypt hashing at a fixed cost.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(HASH_COST)
    }
}

impl PasswordHasher {
    pub(crate) fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub(crate) fn hash(&self, password: &str) -> Result<String, Error> {
        bcrypt::hash(password, self.cost).map_err(Error::Hashing)
    }

    /// `Ok(false)` on mismatch; errors only when the stored hash itself is
    /// unusable.
    pub(crate) fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        bcrypt::verify(password, hash).map_err(Error::Hashing)
    }

    /// [`Self::hash`] on the blocking pool.
    pub(crate) async fn hash_blocking(&self, password: String) -> Result<String, Error> {
        let hasher = *self;

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!("Password hashing task failed: {:?}", e);
                Error::Internal
            })?
    }

    /// [`Self::verify`] on the blocking pool.
    pub(crate) async fn verify_blocking(
        &self,
        password: String,
        hash: String,
    ) -> Result<bool, Error> {
        let hasher = *self;

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| {
                tracing::error!("Password verification task failed: {:?}", e);
                Error::Internal
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(TEST_COST)
    }

    #[test]
    fn verifies_matching_password() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse").unwrap();

        assert_ne!(hash, "correct horse");
        assert!(hasher.verify("correct horse", &hash).unwrap());
    }

    #[test]
    fn mismatch_is_false_not_an_error() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(!hasher.verify("battery staple", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let hasher = hasher();

        assert_ne!(
            hasher.hash("correct horse").unwrap(),
            hasher.hash("correct horse").unwrap()
        );
    }

    #[test]
    fn unusable_hash_is_an_error() {
        assert!(matches!(
            hasher().verify("correct horse", "not-a-bcrypt-hash"),
            Err(Error::Hashing(_))
        ));
    }

    #[tokio::test]
    async fn blocking_variants_agree() {
        let hasher = hasher();
        let hash = hasher.hash_blocking("correct horse".into()).await.unwrap();

        assert!(
            hasher
                .verify_blocking("correct horse".into(), hash)
                .await
                .unwrap()
        );
    }
}
