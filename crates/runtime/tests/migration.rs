use serde_json::json;
use sheet_core::{
    AbilityScores, CURRENT_SCHEMA_VERSION, Character, CharacterSnapshot, ClassLevel,
    MigrationConfig, needs_migration,
};
use sheet_runtime::{
    MigrationBatch, MigrationProgress, MigrationStatus, RuntimeError, next_progress,
};

fn character(id: &str) -> Character {
    let mut character = Character::new(
        id,
        CharacterSnapshot::single_class(AbilityScores::default(), ClassLevel::new("Monk", 5)),
    );
    character.schema_version = 1;
    character
}

fn drain(
    rx: &mut tokio::sync::broadcast::Receiver<MigrationProgress>,
) -> Vec<(String, MigrationStatus)> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push((event.character_id, event.status));
    }
    events
}

#[tokio::test]
async fn emits_progress_and_isolates_failures() {
    let good = character("good").with_legacy_field("ki_points_used", json!(3));
    let bad = character("bad")
        .with_legacy_field("wild_shape_state", json!("wolf"))
        .with_legacy_field("heroic_inspiration", json!(true));
    let clean = character("clean");

    let batch = MigrationBatch::new(&MigrationConfig::default());
    let mut rx = batch.subscribe();
    let outcomes = batch.run(vec![good, bad, clean]).await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[2].is_success());

    let good = outcomes[0].character().unwrap();
    assert_eq!(good.schema_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(good.feature_usage["ki_points"].current_points(), Some(3));
    assert!(!needs_migration(good));

    // The failed character still keeps the fields that did map.
    let bad = outcomes[1].character().unwrap();
    assert!(bad.feature_usage.contains_key("heroic_inspiration"));
    assert!(needs_migration(bad));

    let events = drain(&mut rx);
    let pending: Vec<_> = events[..3].iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(pending, ["good", "bad", "clean"]);
    assert!(events[..3].iter().all(|(_, s)| *s == MigrationStatus::Pending));

    let bad_events: Vec<_> = events
        .iter()
        .filter(|(id, _)| id == "bad")
        .map(|(_, status)| status.clone())
        .collect();
    assert_eq!(bad_events.len(), 3);
    assert_eq!(bad_events[1], MigrationStatus::Migrating);
    let MigrationStatus::Error(message) = &bad_events[2] else {
        panic!("expected error status, got {:?}", bad_events[2]);
    };
    assert_eq!(
        message,
        &RuntimeError::IncompleteMigration {
            character_id: "bad".into(),
            count: 1
        }
        .to_string()
    );

    assert_eq!(
        events.last(),
        Some(&("clean".to_string(), MigrationStatus::Completed))
    );
}

#[tokio::test]
async fn runs_without_subscribers() {
    let batch = MigrationBatch::new(&MigrationConfig::default());
    let outcomes = batch
        .run(vec![character("solo").with_legacy_field("sorcery_points_used", json!(1))])
        .await;
    assert!(outcomes[0].is_success());
}

#[tokio::test]
async fn listener_survives_batches_larger_than_the_channel() {
    let config = MigrationConfig::default();
    let characters: Vec<_> = (0..config.progress_capacity + 6)
        .map(|i| character(&format!("monk-{i}")).with_legacy_field("ki_points_used", json!(1)))
        .collect();
    let last_id = characters.last().unwrap().id.clone();

    let batch = MigrationBatch::new(&config);
    let mut rx = batch.subscribe();
    let listener = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = next_progress(&mut rx).await {
            events.push(event);
        }
        events
    });

    let outcomes = batch.run(characters).await;
    drop(batch);
    let events = listener.await.unwrap();

    assert_eq!(outcomes.len(), config.progress_capacity + 6);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert!(!events.is_empty());
    assert_eq!(
        events.last(),
        Some(&MigrationProgress {
            character_id: last_id,
            status: MigrationStatus::Completed,
        })
    );
}
