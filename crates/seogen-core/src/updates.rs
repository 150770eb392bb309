use std::sync::Arc;

use tracing::{info, warn};

use crate::store::{read_json, write_json, KvStore};
use crate::{Change, ChangeKind, Error, Impact, Result, SeoPolicy, SeoUpdate, UpdateCategory};

pub const UPDATES_KEY: &str = "seo-knowledge-updates";

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// The four updates a fresh knowledge base starts with. Timestamps are
/// relative to `now_ms`.
pub fn default_updates(now_ms: i64) -> Vec<SeoUpdate> {
    vec![
        SeoUpdate {
            id: "upd_1".to_string(),
            title: "Обновлены лимиты Title для Яндекса".to_string(),
            description: "Яндекс изменил оптимальную длину Title с 60 до 65 символов".to_string(),
            source: "Яндекс.Вебмастер".to_string(),
            category: UpdateCategory::Classic,
            timestamp: now_ms - 5 * DAY_MS,
            impact: Impact::High,
            affected_fields: vec!["title".to_string()],
            changes: vec![Change {
                kind: ChangeKind::Limit,
                before: Some("60 символов".to_string()),
                after: "65 символов".to_string(),
                reasoning: "Яндекс теперь показывает более длинные заголовки в поиске без обрезки"
                    .to_string(),
            }],
            approved: true,
            applied_to_prompts: true,
        },
        SeoUpdate {
            id: "upd_2".to_string(),
            title: "Новые рекомендации по структуре описаний".to_string(),
            description: "Акцент на маркированные списки и подзаголовки улучшает CTR".to_string(),
            source: "VC.ru/SEO".to_string(),
            category: UpdateCategory::Trend,
            timestamp: now_ms - 12 * DAY_MS,
            impact: Impact::Medium,
            affected_fields: vec!["product_desc".to_string(), "category_desc".to_string()],
            changes: vec![Change {
                kind: ChangeKind::Structure,
                before: None,
                after: "Структурируйте текст с подзаголовками (##), маркированными списками и короткими абзацами"
                    .to_string(),
                reasoning: "Исследования показывают рост CTR на 15% при структурированных описаниях"
                    .to_string(),
            }],
            approved: true,
            applied_to_prompts: false,
        },
        SeoUpdate {
            id: "upd_3".to_string(),
            title: "Эмодзи в Title повышают CTR".to_string(),
            description: "Эксперименты показывают рост кликов на 8-12% при использовании эмодзи"
                .to_string(),
            source: "SearchEngines.ru".to_string(),
            category: UpdateCategory::Experimental,
            timestamp: now_ms - 3 * DAY_MS,
            impact: Impact::Low,
            affected_fields: vec!["title".to_string(), "h1".to_string()],
            changes: vec![Change {
                kind: ChangeKind::Style,
                before: None,
                after: "Можно добавить релевантный эмодзи в начале или конце заголовка (опционально)"
                    .to_string(),
                reasoning: "Эмодзи привлекают внимание, но могут выглядеть непрофессионально в B2B"
                    .to_string(),
            }],
            approved: false,
            applied_to_prompts: false,
        },
        SeoUpdate {
            id: "upd_4".to_string(),
            title: "Семантическое ядро: переход на LSI-ключи".to_string(),
            description: "Яндекс лучше ранжирует тексты с LSI и синонимами, чем с точным вхождением"
                .to_string(),
            source: "Яндекс.Вебмастер".to_string(),
            category: UpdateCategory::Classic,
            timestamp: now_ms - 20 * DAY_MS,
            impact: Impact::Critical,
            affected_fields: vec![
                "product_desc".to_string(),
                "category_desc".to_string(),
                "blog_post".to_string(),
            ],
            changes: vec![Change {
                kind: ChangeKind::Keyword,
                before: Some("Точное вхождение ключа 3-5 раз".to_string()),
                after: "Естественное использование ключа + синонимы + LSI-слова".to_string(),
                reasoning: "Алгоритм YATI распознаёт переспам и понижает страницы с избыточным повторением"
                    .to_string(),
            }],
            approved: true,
            applied_to_prompts: true,
        },
    ]
}

/// Whether an update is eligible for processing without manual steps.
///
/// Approved updates qualify until they are applied. Unapproved ones qualify
/// only when the policy lets their category skip approval. Applied updates
/// never qualify.
pub fn is_applicable(update: &SeoUpdate, policy: &SeoPolicy) -> bool {
    if update.applied_to_prompts {
        return false;
    }
    update.approved || policy.allows_without_approval(update.category)
}

/// Persistent list of SEO updates, one JSON array under [`UPDATES_KEY`].
#[derive(Clone)]
pub struct UpdateRegistry {
    store: Arc<dyn KvStore>,
}

impl UpdateRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// All stored updates, in stored order. Empty until seeded.
    pub fn get_updates(&self) -> Result<Vec<SeoUpdate>> {
        Ok(read_json(&*self.store, UPDATES_KEY)?.unwrap_or_default())
    }

    pub fn get_update(&self, id: &str) -> Result<SeoUpdate> {
        self.get_updates()?
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::UpdateNotFound(id.to_string()))
    }

    fn save_all(&self, updates: &[SeoUpdate]) -> Result<()> {
        write_json(&*self.store, UPDATES_KEY, updates)
    }

    /// Write [`default_updates`] if no list is stored. Returns whether it wrote.
    pub fn seed_defaults(&self, now_ms: i64) -> Result<bool> {
        let _guard = self.store.write_lock();
        if self.store.get(UPDATES_KEY)?.is_some() {
            return Ok(false);
        }
        let defaults = default_updates(now_ms);
        self.save_all(&defaults)?;
        info!(count = defaults.len(), "seeded default updates");
        Ok(true)
    }

    /// Insert or replace by id. New records go to the front of the list.
    pub fn save_update(&self, update: SeoUpdate) -> Result<()> {
        if update.applied_to_prompts && !update.approved {
            warn!(id = %update.id, "refusing to store applied but unapproved update");
            return Err(Error::UpdateNotApproved(update.id));
        }
        let _guard = self.store.write_lock();
        let mut updates = self.get_updates()?;
        match updates.iter_mut().find(|u| u.id == update.id) {
            Some(existing) => *existing = update,
            None => updates.insert(0, update),
        }
        self.save_all(&updates)
    }

    /// Mark an update approved and return it. Approving twice is harmless.
    pub fn approve_update(&self, id: &str) -> Result<SeoUpdate> {
        let _guard = self.store.write_lock();
        let mut updates = self.get_updates()?;
        let Some(update) = updates.iter_mut().find(|u| u.id == id) else {
            warn!(id, "approve: update not found");
            return Err(Error::UpdateNotFound(id.to_string()));
        };
        update.approved = true;
        let approved = update.clone();
        self.save_all(&updates)?;
        info!(id, "update approved");
        Ok(approved)
    }

    /// Mark an approved update as applied to prompts and return it.
    pub fn apply_update_to_prompts(&self, id: &str) -> Result<SeoUpdate> {
        let _guard = self.store.write_lock();
        let mut updates = self.get_updates()?;
        let Some(update) = updates.iter_mut().find(|u| u.id == id) else {
            warn!(id, "apply: update not found");
            return Err(Error::UpdateNotFound(id.to_string()));
        };
        if !update.approved {
            warn!(id, "apply: update not approved");
            return Err(Error::UpdateNotApproved(id.to_string()));
        }
        update.applied_to_prompts = true;
        let applied = update.clone();
        self.save_all(&updates)?;
        info!(id, "update applied to prompts");
        Ok(applied)
    }

    /// Updates eligible for autonomous processing under `policy`. Pure read.
    pub fn get_applicable_updates(&self, policy: &SeoPolicy) -> Result<Vec<SeoUpdate>> {
        Ok(self
            .get_updates()?
            .into_iter()
            .filter(|u| is_applicable(u, policy))
            .collect())
    }
}
