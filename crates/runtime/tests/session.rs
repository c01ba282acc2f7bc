use std::sync::Arc;

use sheet_content::ClassCatalog;
use sheet_core::{
    AbilityScores, CacheConfig, Character, CharacterSnapshot, ClassData, ClassLevel,
    EnablementRule, FeatureDefinition, FeatureKind, Formula, ResetKind, UsagePatch, usage,
};
use sheet_runtime::{CatalogFeatureLoader, FeatureDefinitionCache, seed_character_features};

fn catalog() -> ClassCatalog {
    ClassCatalog::new(vec![
        ClassData::new("class-cleric", "Cleric").with_feature(
            FeatureDefinition::new(
                "channel_divinity",
                "Channel Divinity",
                "Cleric",
                FeatureKind::Slots {
                    uses: Formula::breakpoints([(2, 1), (6, 2), (18, 3)]),
                    reset: ResetKind::ShortRest,
                },
            )
            .with_enablement(EnablementRule::at_level(2)),
        ),
        ClassData::new("class-bard", "Bard").with_feature(FeatureDefinition::new(
            "bardic_inspiration",
            "Bardic Inspiration",
            "Bard",
            FeatureKind::Slots {
                uses: Formula::token("cha"),
                reset: ResetKind::LongRest,
            },
        )),
    ])
}

fn cache() -> FeatureDefinitionCache {
    FeatureDefinitionCache::start(
        Arc::new(CatalogFeatureLoader::new(catalog())),
        CacheConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn seeds_records_for_every_class() {
    let cache = cache();
    let character = Character::new(
        "hero",
        CharacterSnapshot::new(AbilityScores::default().with_score(sheet_core::Ability::Cha, 16), 0)
            .with_class(ClassLevel::new("Cleric", 6))
            .with_class(ClassLevel::new("Bard", 1))
            .with_class(ClassLevel::new("Artificer", 3)),
    );

    let seeded = seed_character_features(&cache, &character).await.unwrap();

    let channel = usage::get(&seeded.feature_usage, "channel_divinity").unwrap();
    assert_eq!(channel.state.max(), Some(2));
    let inspiration = usage::get(&seeded.feature_usage, "bardic_inspiration").unwrap();
    assert_eq!(inspiration.state.max(), Some(3));
    assert_eq!(seeded.feature_usage.len(), 2);
    assert_eq!(cache.get_stats().keys, ["class-bard:1:", "class-cleric:6:"]);
}

#[tokio::test(start_paused = true)]
async fn keeps_existing_usage() {
    let cache = cache();
    let character = Character::new(
        "cleric",
        CharacterSnapshot::single_class(AbilityScores::default(), ClassLevel::new("Cleric", 6)),
    );
    let first = seed_character_features(&cache, &character).await.unwrap();
    let spent = first.clone().with_usage(
        usage::update_feature_usage(&first, "channel_divinity", &UsagePatch::uses(1), None)
            .unwrap(),
    );

    let again = seed_character_features(&cache, &spent).await.unwrap();
    assert_eq!(again.feature_usage["channel_divinity"].current_uses(), Some(1));
}
