use std::sync::Arc;

use tracing::info;

use crate::store::{read_json, write_json, KvStore};
use crate::{PolicyPatch, Result, SeoPolicy};

pub const POLICY_KEY: &str = "seo-policy";

/// Persistent operator policy, one record under [`POLICY_KEY`].
#[derive(Clone)]
pub struct PolicyStore {
    store: Arc<dyn KvStore>,
}

impl PolicyStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// The stored policy, or the defaults when nothing has been stored yet.
    /// Reading never writes.
    pub fn get_policy(&self) -> Result<SeoPolicy> {
        Ok(read_json(&*self.store, POLICY_KEY)?.unwrap_or_default())
    }

    /// Merge `patch` into the current policy, persist, and return the result.
    /// Ranges are not validated.
    pub fn update_policy(&self, patch: &PolicyPatch) -> Result<SeoPolicy> {
        let _guard = self.store.write_lock();
        let mut policy = self.get_policy()?;
        policy.apply(patch);
        write_json(&*self.store, POLICY_KEY, &policy)?;
        info!(?patch, "policy updated");
        Ok(policy)
    }

    /// Persist the defaults if no policy is stored. Returns whether it wrote.
    pub fn ensure_defaults(&self) -> Result<bool> {
        let _guard = self.store.write_lock();
        if self.store.get(POLICY_KEY)?.is_some() {
            return Ok(false);
        }
        write_json(&*self.store, POLICY_KEY, &SeoPolicy::default())?;
        Ok(true)
    }
}
