use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::store::{IdentityStore, StoreError};
use crate::types::user::Identity;

#[derive(Clone, Debug)]
pub(crate) struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub(crate) async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    #[instrument(skip_all, fields(username = %identity.username))]
    async fn create(&self, identity: &Identity) -> Result<(), StoreError> {
        match sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7);",
        )
        .bind(identity.id)
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.balance)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Duplicate)
            }
            Err(e) => Err(StoreError::Sql(e)),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        match sqlx::query(
            "SELECT id, username, email, password_hash, balance, created_at, updated_at
            FROM users
            WHERE id = $1;",
        )
        .bind(id)
        .map(map_identity)
        .fetch_one(&self.pool)
        .await
        {
            Ok(identity) => Ok(Some(identity)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(StoreError::Sql(e)),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        match sqlx::query(
            "SELECT id, username, email, password_hash, balance, created_at, updated_at
            FROM users
            WHERE username = $1;",
        )
        .bind(username)
        .map(map_identity)
        .fetch_one(&self.pool)
        .await
        {
            Ok(identity) => Ok(Some(identity)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(e) => Err(StoreError::Sql(e)),
        }
    }

    #[instrument(skip_all, fields(id = %identity.id))]
    async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let result = match sqlx::query(
            "UPDATE users
            SET username = $1,
                email = $2,
                password_hash = $3,
                updated_at = NOW()
            WHERE id = $4;",
        )
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.id)
        .execute(&self.pool)
        .await
        {
            Ok(result) => result,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(StoreError::Duplicate);
            }
            Err(e) => return Err(StoreError::Sql(e)),
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1;")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        let identities = sqlx::query(
            "SELECT id, username, email, password_hash, balance, created_at, updated_at
            FROM users
            ORDER BY created_at;",
        )
        .map(map_identity)
        .fetch_all(&self.pool)
        .await?;

        Ok(identities)
    }

    #[instrument(skip(self))]
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1);")
            .bind(username)
            .map(|row: PgRow| row.get::<bool, _>(0))
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn adjust_balance(&self, id: Uuid, delta: Decimal) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users
            SET balance = balance + $1,
                updated_at = NOW()
            WHERE id = $2;",
        )
        .bind(delta)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

fn map_identity(row: PgRow) -> Identity {
    Identity {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        balance: row.get("balance"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
