//! Seeding a character's usage map from cached definitions.

use sheet_core::Character;
use sheet_core::usage::{add_single_feature, refresh_caps};
use tracing::{debug, warn};

use crate::api::Result;
use crate::cache::FeatureDefinitionCache;

/// Add a usage record for every feature the character's classes grant.
///
/// Existing records are kept as they are, then every cap is refreshed for
/// the current snapshot. Classes the loader does not know are skipped.
pub async fn seed_character_features(
    cache: &FeatureDefinitionCache,
    character: &Character,
) -> Result<Character> {
    let mut character = character.clone();

    for class in character.snapshot.classes.clone() {
        let subclass = class.subclass.as_deref();
        let class_id = match cache.resolve_class_id(&class.class_name, subclass).await {
            Ok(id) => id,
            Err(err) => {
                warn!(class = %class.class_name, error = %err, "skipping unknown class");
                continue;
            }
        };

        let features = cache.get_or_load(&class_id, class.level, subclass).await?;
        debug!(%class_id, level = class.level, count = features.len(), "seeding features");
        for feature in features.iter() {
            let usage = add_single_feature(&character, &feature.id, feature)?;
            character = character.with_usage(usage);
        }
    }

    let usage = refresh_caps(&character);
    Ok(character.with_usage(usage))
}
