use seogen_core::{SeoPolicy, SeoUpdate, UpdateCategory};

pub const ADDITIONS_HEADER: &str = "Дополнительные рекомендации:";
pub const OPTIONAL_PREFIX: &str = "[Опционально] ";

/// Updates whose multiplier does not exceed this are dropped.
const INCLUDE_THRESHOLD: f64 = 0.3;
/// Non-classic updates at or below this are marked optional.
const MANDATORY_THRESHOLD: f64 = 0.6;

/// How much weight an update category gets at the policy's innovation level.
///
/// Classic is always 1.0, trend ranges over [0.5, 1.0] and experimental over
/// [0.0, 1.0].
pub fn innovation_multiplier(policy: &SeoPolicy, category: UpdateCategory) -> f64 {
    let level = f64::from(policy.innovation_level) / 100.0;
    match category {
        UpdateCategory::Classic => 1.0,
        UpdateCategory::Trend => 0.5 + level * 0.5,
        UpdateCategory::Experimental => level,
    }
}

/// Instruction lines contributed by approved updates, most severe first.
pub fn additions(updates: &[SeoUpdate], policy: &SeoPolicy) -> Vec<String> {
    let mut approved: Vec<&SeoUpdate> = updates.iter().filter(|u| u.approved).collect();
    // Stable, so equal impacts keep their input order.
    approved.sort_by_key(|u| u.impact.rank());

    let mut lines = Vec::new();
    for update in approved {
        let multiplier = innovation_multiplier(policy, update.category);
        if multiplier <= INCLUDE_THRESHOLD {
            continue;
        }
        let optional =
            update.category != UpdateCategory::Classic && multiplier <= MANDATORY_THRESHOLD;
        for change in &update.changes {
            if optional {
                lines.push(format!("{}{}", OPTIONAL_PREFIX, change.after));
            } else {
                lines.push(change.after.clone());
            }
        }
    }
    lines
}

/// Append approved update guidance to `base` as a numbered list. Returns
/// `base` unchanged when nothing qualifies.
pub fn generate_enhanced_prompt(base: &str, updates: &[SeoUpdate], policy: &SeoPolicy) -> String {
    let lines = additions(updates, policy);
    if lines.is_empty() {
        return base.to_string();
    }

    let mut out = String::with_capacity(base.len() + 64 * lines.len());
    out.push_str(base);
    out.push_str("\n\n");
    out.push_str(ADDITIONS_HEADER);
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use seogen_core::updates::default_updates;

    fn policy(level: u8) -> SeoPolicy {
        SeoPolicy {
            innovation_level: level,
            ..SeoPolicy::default()
        }
    }

    #[test]
    fn multiplier_ranges() {
        assert_eq!(innovation_multiplier(&policy(0), UpdateCategory::Classic), 1.0);
        assert_eq!(innovation_multiplier(&policy(0), UpdateCategory::Trend), 0.5);
        assert_eq!(innovation_multiplier(&policy(100), UpdateCategory::Trend), 1.0);
        assert_eq!(innovation_multiplier(&policy(0), UpdateCategory::Experimental), 0.0);
        assert_eq!(innovation_multiplier(&policy(50), UpdateCategory::Experimental), 0.5);
    }

    #[test]
    fn seeded_updates_at_default_policy() {
        let updates = default_updates(0);
        let base = "База";
        let enhanced = generate_enhanced_prompt(base, &updates, &SeoPolicy::default());
        // critical classic, high classic, then the medium trend at 0.75.
        assert_eq!(
            enhanced,
            "База\n\nДополнительные рекомендации:\n\
1. Естественное использование ключа + синонимы + LSI-слова\n\
2. 65 символов\n\
3. Структурируйте текст с подзаголовками (##), маркированными списками и короткими абзацами"
        );
    }

    #[test]
    fn low_innovation_marks_trends_optional() {
        let updates = default_updates(0);
        let lines = additions(&updates, &policy(0));
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with(OPTIONAL_PREFIX));
        assert!(!lines[0].starts_with(OPTIONAL_PREFIX));
    }

    #[test]
    fn unapproved_updates_contribute_nothing() {
        let mut updates = default_updates(0);
        for update in &mut updates {
            update.approved = false;
        }
        assert_eq!(generate_enhanced_prompt("t", &updates, &policy(100)), "t");
    }
}
