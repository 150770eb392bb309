pub mod enhance;
pub mod generate;

use seogen_core::{catalog, SeoPolicy, SeoUpdate};

pub use enhance::{additions, generate_enhanced_prompt, innovation_multiplier};
pub use generate::{generate, generate_field, GenerateError};

/// Enhance one of the catalog prompts by id. `None` if the id is unknown.
pub fn enhance_catalog_prompt(
    prompt_id: &str,
    updates: &[SeoUpdate],
    policy: &SeoPolicy,
) -> Option<String> {
    let prompt = catalog::find_prompt(prompt_id)?;
    let enhanced = generate_enhanced_prompt(prompt.template, updates, policy);
    tracing::debug!(
        prompt_id,
        added = enhanced.len() - prompt.template.len(),
        "enhanced catalog prompt"
    );
    Some(enhanced)
}
