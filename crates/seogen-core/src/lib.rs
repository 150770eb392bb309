pub mod catalog;
mod error;
pub mod policy;
pub mod store;
pub mod updates;
pub mod versions;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

pub use error::{Error, Result};
pub use policy::PolicyStore;
pub use store::{FileStore, KvStore, MemoryStore};
pub use updates::UpdateRegistry;
pub use versions::{TrafficSettings, Version, VersionData, VersionStore};

// --- Types (matching the dashboard's persisted JSON) ---

/// Provenance of a suggested rule change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UpdateCategory {
    Classic,
    Trend,
    Experimental,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Critical,
    High,
    Medium,
    Low,
}

impl Impact {
    /// Sort rank, most severe first.
    pub fn rank(self) -> u8 {
        match self {
            Impact::Critical => 0,
            Impact::High => 1,
            Impact::Medium => 2,
            Impact::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Limit,
    Structure,
    Keyword,
    Style,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Change {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// The instruction line that ends up in enhanced prompts.
    pub after: String,
    #[serde(default)]
    pub reasoning: String,
}

/// A suggested change to content-generation guidance.
///
/// `applied_to_prompts` implies `approved`; the registry refuses to store a
/// record that breaks this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeoUpdate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    pub category: UpdateCategory,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub impact: Impact,
    #[serde(default)]
    pub affected_fields: Vec<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub applied_to_prompts: bool,
}

/// Operator thresholds for auto-applying updates.
///
/// `prioritize_yandex` and `classic_seo_weight` are stored and displayed
/// only; no rule reads them.
///
/// Percentages are `u8` and not range checked, so anything from 0 to 255
/// loads. A stored value above 255, negative or fractional fails to decode and
/// the whole record reads as [`Error::Corrupt`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeoPolicy {
    pub innovation_level: u8,
    pub auto_apply_classic: bool,
    pub require_approval_for_trends: bool,
    pub require_approval_for_experimental: bool,
    pub prioritize_yandex: bool,
    #[serde(rename = "classicSEOWeight")]
    pub classic_seo_weight: u8,
}

impl Default for SeoPolicy {
    fn default() -> Self {
        Self {
            innovation_level: 50,
            auto_apply_classic: true,
            require_approval_for_trends: true,
            require_approval_for_experimental: true,
            prioritize_yandex: true,
            classic_seo_weight: 70,
        }
    }
}

impl SeoPolicy {
    /// Shallow merge: every field present in `patch` replaces the current one.
    pub fn apply(&mut self, patch: &PolicyPatch) {
        if let Some(v) = patch.innovation_level {
            self.innovation_level = v;
        }
        if let Some(v) = patch.auto_apply_classic {
            self.auto_apply_classic = v;
        }
        if let Some(v) = patch.require_approval_for_trends {
            self.require_approval_for_trends = v;
        }
        if let Some(v) = patch.require_approval_for_experimental {
            self.require_approval_for_experimental = v;
        }
        if let Some(v) = patch.prioritize_yandex {
            self.prioritize_yandex = v;
        }
        if let Some(v) = patch.classic_seo_weight {
            self.classic_seo_weight = v;
        }
    }

    /// Whether an unapproved update of this category may proceed without
    /// an operator saying yes.
    pub fn allows_without_approval(&self, category: UpdateCategory) -> bool {
        match category {
            UpdateCategory::Classic => self.auto_apply_classic,
            UpdateCategory::Trend => !self.require_approval_for_trends,
            UpdateCategory::Experimental => !self.require_approval_for_experimental,
        }
    }
}

/// Partial policy update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPatch {
    /// Weight given to trend/experimental updates, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innovation_level: Option<u8>,
    /// Let unapproved classic updates through automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_apply_classic: Option<bool>,
    /// Hold trend updates until approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_approval_for_trends: Option<bool>,
    /// Hold experimental updates until approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_approval_for_experimental: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioritize_yandex: Option<bool>,
    /// Display weight of classic SEO, 0-100
    #[serde(
        default,
        rename = "classicSEOWeight",
        skip_serializing_if = "Option::is_none"
    )]
    pub classic_seo_weight: Option<u8>,
}

// --- Storage ---

/// Resolve the data directory: `$SEOGEN_HOME`, else `~/.seogen/`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SEOGEN_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".seogen")
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What [`initialize`] had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Initialized {
    pub policy_seeded: bool,
    pub updates_seeded: bool,
}

/// One-time startup step: write the default policy and the default update
/// list for any record that does not exist yet. Existing records are left
/// untouched, so running it on every start is fine.
pub fn initialize(store: &Arc<dyn KvStore>, now_ms: i64) -> Result<Initialized> {
    let policy_seeded = PolicyStore::new(Arc::clone(store)).ensure_defaults()?;
    let updates_seeded = UpdateRegistry::new(Arc::clone(store)).seed_defaults(now_ms)?;
    if policy_seeded || updates_seeded {
        info!(policy_seeded, updates_seeded, "initialized knowledge base");
    }
    Ok(Initialized {
        policy_seeded,
        updates_seeded,
    })
}
