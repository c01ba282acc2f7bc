use proptest::prelude::*;
use sheet_core::usage::{self, add_feature_option, remove_feature_option, update_feature_usage};
use sheet_core::{
    Ability, AbilityScores, Character, CharacterSnapshot, ClassLevel, FeatureDefinition,
    FeatureKind, Formula, ResetKind, SelectedOption, UsagePatch, evaluate,
};

fn ability() -> impl Strategy<Value = Ability> {
    prop_oneof![
        Just(Ability::Str),
        Just(Ability::Dex),
        Just(Ability::Con),
        Just(Ability::Int),
        Just(Ability::Wis),
        Just(Ability::Cha),
    ]
}

fn snapshot() -> impl Strategy<Value = CharacterSnapshot> {
    (
        prop::array::uniform6(1i32..=30),
        prop::collection::vec(("[A-Z][a-z]{2,6}", 1u32..=20), 0..3),
    )
        .prop_map(|(scores, classes)| {
            let [str, dex, con, int, wis, cha] = scores;
            classes.into_iter().fold(
                CharacterSnapshot::new(AbilityScores::new(str, dex, con, int, wis, cha), 0),
                |snapshot, (name, level)| snapshot.with_class(ClassLevel::new(name, level)),
            )
        })
}

fn formula() -> impl Strategy<Value = Formula> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Formula::Constant),
        "[a-z0-9+ ]{0,8}".prop_map(Formula::Token),
        Just(Formula::token("prof")),
        Just(Formula::token("d8")),
        prop::collection::btree_map("-?[0-9]{1,2}|[a-z]{1,3}", any::<i64>(), 0..5)
            .prop_map(Formula::Breakpoints),
    ];
    leaf.prop_recursive(2, 16, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Formula::Progression)
    })
}

fn class_level(name: &str, level: u32) -> CharacterSnapshot {
    CharacterSnapshot::single_class(AbilityScores::default(), ClassLevel::new(name, level))
}

fn slots_feature(uses: Formula) -> FeatureDefinition {
    FeatureDefinition::new(
        "channel_divinity",
        "Channel Divinity",
        "Cleric",
        FeatureKind::Slots {
            uses,
            reset: ResetKind::ShortRest,
        },
    )
}

fn ki_feature() -> FeatureDefinition {
    FeatureDefinition::new(
        "ki_points",
        "Ki Points",
        "Monk",
        FeatureKind::PointsPool {
            points: Formula::progression((0..=20).map(Formula::Constant)),
            reset: ResetKind::ShortRest,
        },
    )
}

fn inspiration_feature() -> FeatureDefinition {
    FeatureDefinition::new(
        "heroic_inspiration",
        "Heroic Inspiration",
        "",
        FeatureKind::AvailabilityToggle {
            default_available: true,
        },
    )
}

proptest! {
    #[test]
    fn evaluation_never_panics_and_fits_u32(
        f in formula(),
        snapshot in snapshot(),
        class in prop::option::of("[A-Z][a-z]{2,6}"),
    ) {
        // The result type already rules out negatives; this guards against panics.
        let _ = evaluate(&f, &snapshot, class.as_deref());
    }

    #[test]
    fn ability_token_is_floored_modifier(ability in ability(), score in 1i32..=30) {
        let scores = AbilityScores::default().with_score(ability, score);
        let snapshot = CharacterSnapshot::new(scores, 1);
        let expected = u32::try_from(((score - 10).div_euclid(2)).max(0)).unwrap();
        prop_assert_eq!(evaluate(&Formula::token(ability.to_string()), &snapshot, None), expected);
    }

    #[test]
    fn prof_matches_proficiency_bonus(level in 1u32..=20) {
        let snapshot = class_level("Bard", level);
        prop_assert_eq!(
            evaluate(&Formula::token("prof"), &snapshot, Some("Bard")),
            snapshot.proficiency_bonus()
        );
    }

    #[test]
    fn uses_stay_within_cap(
        cap in 0i64..6,
        cleric_level in 1u32..=20,
        patches in prop::collection::vec(-10i64..20, 1..12),
    ) {
        let definition = slots_feature(Formula::constant(cap));
        let mut character = Character::new("c", class_level("Cleric", cleric_level));

        for uses in patches {
            let usage = update_feature_usage(
                &character,
                "channel_divinity",
                &UsagePatch::uses(uses),
                Some(&definition),
            )
            .unwrap();
            character = character.with_usage(usage);

            let record = usage::get(&character.feature_usage, "channel_divinity").unwrap();
            let max = record.state.max().unwrap();
            prop_assert!(record.current_uses().unwrap() <= max);
            prop_assert_eq!(i64::from(max), cap);
        }
    }

    #[test]
    fn options_never_exceed_cap(
        warlock_level in 1u32..=20,
        ops in prop::collection::vec((any::<bool>(), 0usize..12), 1..30),
    ) {
        let definition = FeatureDefinition::new(
            "eldritch_invocations",
            "Eldritch Invocations",
            "Warlock",
            FeatureKind::OptionsList {
                selections: Formula::breakpoints([(2, 2), (5, 3), (7, 4), (9, 5)]),
                options: Vec::new(),
            },
        );
        let character = Character::new("w", class_level("Warlock", warlock_level));
        let mut map =
            usage::add_single_feature(&character, "eldritch_invocations", &definition).unwrap();
        let cap = definition.limit_for(&character.snapshot).unwrap() as usize;

        for (add, n) in ops {
            map = if add {
                add_feature_option(
                    &map,
                    &character.snapshot,
                    "eldritch_invocations",
                    SelectedOption::new(format!("opt-{n}"), format!("Option {n}")),
                )
                .unwrap()
            } else {
                remove_feature_option(&map, &character.snapshot, "eldritch_invocations", n % 4)
                    .unwrap()
            };
            let selected = map["eldritch_invocations"].selected_options().unwrap();
            prop_assert!(selected.len() <= cap);
        }
    }

    #[test]
    fn points_stay_within_pool_across_level_changes(
        steps in prop::collection::vec((1u32..=20, -10i64..30), 1..12),
    ) {
        let definition = ki_feature();
        let mut character = Character::new("m", class_level("Monk", 1));

        for (monk_level, spent) in steps {
            character.snapshot = class_level("Monk", monk_level);
            let usage = update_feature_usage(
                &character,
                "ki_points",
                &UsagePatch::points(spent),
                Some(&definition),
            )
            .unwrap();
            character = character.with_usage(usage);

            let record = usage::get(&character.feature_usage, "ki_points").unwrap();
            let max = record.state.max().unwrap();
            prop_assert_eq!(max, definition.limit_for(&character.snapshot).unwrap());
            prop_assert!(record.current_points().unwrap() <= max);
        }
    }

    #[test]
    fn toggle_follows_last_patch(flags in prop::collection::vec(any::<bool>(), 1..8)) {
        let definition = inspiration_feature();
        let mut character = Character::new("h", class_level("Bard", 3));

        for flag in flags {
            let usage = update_feature_usage(
                &character,
                "heroic_inspiration",
                &UsagePatch::available(flag),
                Some(&definition),
            )
            .unwrap();
            character = character.with_usage(usage);

            let record = usage::get(&character.feature_usage, "heroic_inspiration").unwrap();
            prop_assert_eq!(record.is_available(), Some(flag));
            prop_assert_eq!(record.state.max(), None);
        }
    }
}
