//! In-process stores used by the test suite, with switches for injecting
//! failures at the points the purchase flow cares about.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;
use uuid::Uuid;

use crate::store::{CatalogStore, IdentityStore, StoreError};
use crate::types::report::Report;
use crate::types::user::Identity;

fn unavailable() -> StoreError {
    StoreError::Sql(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub(crate) struct MemoryIdentityStore {
    identities: Mutex<HashMap<Uuid, Identity>>,
    pub(crate) fail_creates: AtomicBool,
    pub(crate) fail_credits: AtomicBool,
    pub(crate) fail_debits: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryIdentityStore {
    pub(crate) fn insert(&self, identity: Identity) {
        self.identities
            .lock()
            .unwrap()
            .insert(identity.id, identity);
    }

    pub(crate) fn balance_of(&self, id: Uuid) -> Decimal {
        self.identities.lock().unwrap()[&id].balance
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, identity: &Identity) -> Result<(), StoreError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut identities = self.identities.lock().unwrap();

        if identities
            .values()
            .any(|existing| existing.username == identity.username)
        {
            return Err(StoreError::Duplicate);
        }

        identities.insert(identity.id, identity.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .values()
            .find(|identity| identity.username == username)
            .cloned())
    }

    async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut identities = self.identities.lock().unwrap();

        let Some(existing) = identities.get_mut(&identity.id) else {
            return Err(StoreError::NotFound);
        };

        existing.username = identity.username.clone();
        existing.email = identity.email.clone();
        existing.password_hash = identity.password_hash.clone();
        existing.updated_at = chrono::Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.identities.lock().unwrap().remove(&id) {
            Some(_) => {
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        let mut identities: Vec<Identity> =
            self.identities.lock().unwrap().values().cloned().collect();
        identities.sort_by_key(|identity| identity.created_at);

        Ok(identities)
    }

    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .values()
            .any(|identity| identity.username == username))
    }

    async fn adjust_balance(&self, id: Uuid, delta: Decimal) -> Result<(), StoreError> {
        if delta.is_sign_positive() && self.fail_credits.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        if delta.is_sign_negative() && self.fail_debits.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut identities = self.identities.lock().unwrap();

        let Some(identity) = identities.get_mut(&id) else {
            return Err(StoreError::NotFound);
        };

        identity.balance += delta;
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryCatalogStore {
    reports: Mutex<HashMap<String, Report>>,
    pub(crate) fail_commits: AtomicBool,
    /// Drops the report right before the compare-and-set runs.
    pub(crate) vanish_on_commit: AtomicBool,
    /// Holds every commit until this many callers have reached it.
    commit_barrier: Option<Arc<Barrier>>,
    writes: AtomicUsize,
}

impl MemoryCatalogStore {
    pub(crate) fn with_commit_barrier(parties: usize) -> Self {
        Self {
            commit_barrier: Some(Arc::new(Barrier::new(parties))),
            ..Self::default()
        }
    }

    pub(crate) fn insert(&self, report: Report) {
        self.reports
            .lock()
            .unwrap()
            .insert(report.report_id.clone(), report);
    }

    pub(crate) fn get(&self, report_id: &str) -> Option<Report> {
        self.reports.lock().unwrap().get(report_id).cloned()
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn create(&self, report: &Report) -> Result<(), StoreError> {
        let mut reports = self.reports.lock().unwrap();

        if reports.contains_key(&report.report_id) {
            return Err(StoreError::Duplicate);
        }

        reports.insert(report.report_id.clone(), report.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn list_by_identity(&self, identity_id: Uuid) -> Result<Vec<Report>, StoreError> {
        let mut reports: Vec<Report> = self
            .reports
            .lock()
            .unwrap()
            .values()
            .filter(|report| report.identity_id == Some(identity_id))
            .cloned()
            .collect();
        reports.sort_by_key(|report| report.created_at);

        Ok(reports)
    }

    async fn claim_anonymous(
        &self,
        client_generated_id: &str,
        identity_id: Uuid,
    ) -> Result<u64, StoreError> {
        let mut claimed = 0;

        for report in self.reports.lock().unwrap().values_mut() {
            if report.client_generated_id == client_generated_id && report.identity_id.is_none() {
                report.identity_id = Some(identity_id);
                claimed += 1;
            }
        }

        if claimed > 0 {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }

        Ok(claimed)
    }

    async fn lookup_owner_and_price(
        &self,
        report_id: &str,
    ) -> Result<Option<(Option<Uuid>, Decimal)>, StoreError> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .get(report_id)
            .map(|report| (report.identity_id, report.price)))
    }

    async fn mark_purchased(&self, report_id: &str) -> Result<u64, StoreError> {
        if let Some(barrier) = &self.commit_barrier {
            barrier.wait().await;
        }

        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut reports = self.reports.lock().unwrap();

        if self.vanish_on_commit.load(Ordering::SeqCst) {
            reports.remove(report_id);
        }

        match reports.get_mut(report_id) {
            Some(report) if !report.purchased => {
                report.purchased = true;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
