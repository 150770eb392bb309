use seogen_core::{Change, ChangeKind, Impact, SeoPolicy, SeoUpdate, UpdateCategory};
use seogen_prompt::enhance::{ADDITIONS_HEADER, OPTIONAL_PREFIX};
use seogen_prompt::{enhance_catalog_prompt, generate_enhanced_prompt};

fn update(id: &str, category: UpdateCategory, impact: Impact, after: &[&str]) -> SeoUpdate {
    SeoUpdate {
        id: id.to_string(),
        title: id.to_string(),
        description: String::new(),
        source: String::new(),
        category,
        timestamp: 0,
        impact,
        affected_fields: vec![],
        changes: after
            .iter()
            .map(|a| Change {
                kind: ChangeKind::Style,
                before: None,
                after: a.to_string(),
                reasoning: String::new(),
            })
            .collect(),
        approved: true,
        applied_to_prompts: false,
    }
}

fn policy(level: u8) -> SeoPolicy {
    SeoPolicy {
        innovation_level: level,
        ..SeoPolicy::default()
    }
}

#[test]
fn no_updates_leaves_template_untouched() {
    for level in [0, 50, 100] {
        assert_eq!(generate_enhanced_prompt("Шаблон {x}", &[], &policy(level)), "Шаблон {x}");
    }
}

#[test]
fn classic_lines_are_never_optional() {
    let updates = [update("c", UpdateCategory::Classic, Impact::Low, &["classic rule"])];
    for level in 0..=100 {
        let out = generate_enhanced_prompt("t", &updates, &policy(level));
        assert!(out.ends_with("\n1. classic rule"), "level {level}: {out}");
        assert!(!out.contains(OPTIONAL_PREFIX));
    }
}

#[test]
fn experimental_depends_on_innovation_level() {
    let updates = [update("e", UpdateCategory::Experimental, Impact::High, &["try emoji"])];

    assert_eq!(generate_enhanced_prompt("t", &updates, &policy(0)), "t");
    assert_eq!(
        generate_enhanced_prompt("t", &updates, &policy(50)),
        format!("t\n\n{}\n1. {}try emoji", ADDITIONS_HEADER, OPTIONAL_PREFIX)
    );
    assert_eq!(
        generate_enhanced_prompt("t", &updates, &policy(100)),
        format!("t\n\n{}\n1. try emoji", ADDITIONS_HEADER)
    );
}

#[test]
fn threshold_edges_are_inclusive() {
    let excluded = "t".to_string();
    let optional = format!("t\n\n{}\n1. {}rule", ADDITIONS_HEADER, OPTIONAL_PREFIX);
    let mandatory = format!("t\n\n{}\n1. rule", ADDITIONS_HEADER);

    let trend = [update("tr", UpdateCategory::Trend, Impact::Medium, &["rule"])];
    // 0.5 + 0.2 * 0.5 lands exactly on the optional ceiling.
    assert_eq!(generate_enhanced_prompt("t", &trend, &policy(20)), optional);
    assert_eq!(generate_enhanced_prompt("t", &trend, &policy(21)), mandatory);

    let experimental = [update("ex", UpdateCategory::Experimental, Impact::Medium, &["rule"])];
    for (level, expected) in [
        (30, &excluded),
        (31, &optional),
        (60, &optional),
        (61, &mandatory),
    ] {
        assert_eq!(
            &generate_enhanced_prompt("t", &experimental, &policy(level)),
            expected,
            "level {level}"
        );
    }
}

#[test]
fn sorted_by_impact_then_input_order() {
    let updates = [
        update("low", UpdateCategory::Classic, Impact::Low, &["low"]),
        update("crit", UpdateCategory::Classic, Impact::Critical, &["critical a", "critical b"]),
        update("med1", UpdateCategory::Classic, Impact::Medium, &["medium one"]),
        update("med2", UpdateCategory::Classic, Impact::Medium, &["medium two"]),
    ];
    let out = generate_enhanced_prompt("base", &updates, &policy(50));
    let expected = format!(
        "base\n\n{}\n1. critical a\n2. critical b\n3. medium one\n4. medium two\n5. low",
        ADDITIONS_HEADER
    );
    assert_eq!(out, expected);
}

#[test]
fn unapproved_updates_are_skipped_even_when_applicable() {
    let mut pending = update("p", UpdateCategory::Classic, Impact::Critical, &["pending"]);
    pending.approved = false;
    let approved = update("a", UpdateCategory::Trend, Impact::Low, &["trend"]);
    let out = generate_enhanced_prompt("t", &[pending, approved], &policy(100));
    assert_eq!(out, format!("t\n\n{}\n1. trend", ADDITIONS_HEADER));
}

#[test]
fn catalog_prompt_lookup() {
    let updates = [update("c", UpdateCategory::Classic, Impact::High, &["rule"])];
    let out = enhance_catalog_prompt("h1", &updates, &policy(50)).unwrap();
    assert!(out.starts_with("Создай SEO-оптимизированный H1"));
    assert!(out.ends_with("1. rule"));
    assert!(enhance_catalog_prompt("missing", &updates, &policy(50)).is_none());
}
