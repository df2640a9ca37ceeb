//! In-memory `DraftStore` for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::storage::DraftStore;
use super::types::{DraftLocation, DraftOrganization, DraftStatus, RegistrationDraft};
use super::STEP_ACCOUNT;

const TIMESTAMP: &str = "2026-01-01T00:00:00Z";

#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<Uuid, RegistrationDraft>>,
    unavailable: AtomicBool,
}

impl MemoryDraftStore {
    /// Make every call fail, as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn insert(&self, draft: RegistrationDraft) {
        self.drafts.lock().await.insert(draft.id, draft);
    }

    pub async fn get(&self, draft_id: Uuid) -> Option<RegistrationDraft> {
        self.drafts.lock().await.get(&draft_id).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("database unavailable"));
        }
        Ok(())
    }

    async fn update<F>(&self, draft_id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut RegistrationDraft) + Send,
    {
        self.check()?;
        if let Some(draft) = self.drafts.lock().await.get_mut(&draft_id) {
            apply(draft);
        }
        Ok(())
    }

    async fn find_by_user<F>(&self, user_id: &str, wanted: F) -> Result<Option<RegistrationDraft>>
    where
        F: Fn(DraftStatus) -> bool + Send,
    {
        self.check()?;
        Ok(self
            .drafts
            .lock()
            .await
            .values()
            .find(|draft| draft.ext_user_id == user_id && wanted(draft.status))
            .cloned())
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn find_completed_by_user(&self, user_id: &str) -> Result<Option<RegistrationDraft>> {
        self.find_by_user(user_id, |status| status == DraftStatus::Completed)
            .await
    }

    async fn find_active_by_user(&self, user_id: &str) -> Result<Option<RegistrationDraft>> {
        self.find_by_user(user_id, DraftStatus::is_open).await
    }

    async fn create(&self, user_id: &str) -> Result<RegistrationDraft> {
        self.check()?;
        let mut drafts = self.drafts.lock().await;
        if let Some(open) = drafts
            .values()
            .find(|draft| draft.ext_user_id == user_id && draft.status.is_open())
        {
            return Ok(open.clone());
        }
        let draft = RegistrationDraft {
            id: Uuid::new_v4(),
            ext_user_id: user_id.to_string(),
            status: DraftStatus::InProgress,
            current_step: STEP_ACCOUNT,
            org_id: None,
            created_at: TIMESTAMP.to_string(),
            updated_at: TIMESTAMP.to_string(),
            organization: None,
            locations: Vec::new(),
        };
        drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn find_by_id(&self, draft_id: Uuid) -> Result<Option<RegistrationDraft>> {
        self.check()?;
        Ok(self.get(draft_id).await)
    }

    async fn upsert_organization(&self, draft_id: Uuid, org: &DraftOrganization) -> Result<()> {
        let org = org.clone();
        self.update(draft_id, |draft| draft.organization = Some(org))
            .await
    }

    async fn replace_locations(&self, draft_id: Uuid, locations: &[DraftLocation]) -> Result<()> {
        let locations = locations.to_vec();
        self.update(draft_id, |draft| draft.locations = locations)
            .await
    }

    async fn update_step(&self, draft_id: Uuid, step: i32) -> Result<()> {
        self.update(draft_id, |draft| {
            draft.current_step = draft.current_step.max(step);
        })
        .await
    }

    async fn claim_for_submit(&self, draft_id: Uuid) -> Result<bool> {
        self.check()?;
        match self.drafts.lock().await.get_mut(&draft_id) {
            Some(draft) if draft.status == DraftStatus::InProgress => {
                draft.status = DraftStatus::Submitting;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_status(
        &self,
        draft_id: Uuid,
        status: DraftStatus,
        org_id: Option<i64>,
    ) -> Result<()> {
        self.update(draft_id, |draft| {
            draft.status = status;
            if org_id.is_some() {
                draft.org_id = org_id;
            }
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_returns_the_open_draft() {
        let store = MemoryDraftStore::default();
        let first = store.create("u-1").await.expect("draft");
        let second = store.create("u-1").await.expect("draft");
        assert_eq!(first.id, second.id);

        assert!(store.claim_for_submit(first.id).await.expect("claim"));
        assert!(!store.claim_for_submit(first.id).await.expect("claim"));
        let claimed = store.create("u-1").await.expect("draft");
        assert_eq!(claimed.id, first.id);
        assert_eq!(claimed.status, DraftStatus::Submitting);

        store
            .update_status(first.id, DraftStatus::Failed, None)
            .await
            .expect("status");
        let fresh = store.create("u-1").await.expect("draft");
        assert_ne!(fresh.id, first.id);
    }
}
