//! Usage records - the per-feature entries of the unified usage map.
//!
//! A record is split the same way a definition is:
//! - common fields (name, notes, retained config, timestamps)
//! - [`UsageState`], tagged by `feature_type`, holding the type-specific
//!   counters
//!
//! The tag is fixed when the record is created. Patches only ever touch the
//! fields of the existing variant, so a record's feature type cannot change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::character::CharacterSnapshot;
use crate::feature::{FeatureDefinition, FeatureKind, FeatureType};
use crate::formula::{self, Formula};

/// JSON object used for opaque custom state.
pub type CustomState = serde_json::Map<String, serde_json::Value>;

/// An option chosen on an options-list feature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, bool>,
}

impl SelectedOption {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            flags: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>, value: bool) -> Self {
        self.flags.insert(flag.into(), value);
        self
    }
}

/// Configuration a record was created from.
///
/// Records keep their source so caps can be recomputed later without going
/// back to the definition loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureConfig {
    /// Seeded from a loaded feature definition.
    Definition(FeatureDefinition),
    /// Folded in from pre-unification character fields.
    Legacy(LegacyConfig),
}

/// Retained source of a record produced by the migration engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyConfig {
    pub feature_type: FeatureType,
    /// Raw legacy values, keyed by their original field names.
    pub values: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl FeatureConfig {
    /// Formula bounding the resource and the class whose level it reads.
    fn limit(&self) -> Option<(&Formula, Option<&str>)> {
        match self {
            Self::Definition(def) => {
                let class_name = (!def.is_feat_feature && !def.class_name.is_empty())
                    .then_some(def.class_name.as_str());
                def.kind.limit_formula().map(|f| (f, class_name))
            }
            Self::Legacy(legacy) => legacy
                .formula
                .as_ref()
                .map(|f| (f, legacy.class_name.as_deref())),
        }
    }
}

/// Type-specific state of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature_type", rename_all = "snake_case")]
pub enum UsageState {
    Slots {
        current_uses: u32,
        max_uses: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_reset: Option<DateTime<Utc>>,
    },
    PointsPool {
        current_points: u32,
        max_points: u32,
    },
    OptionsList {
        #[serde(default)]
        selected_options: Vec<SelectedOption>,
        max_selections: u32,
    },
    SpecialUx {
        #[serde(default)]
        custom_state: CustomState,
    },
    AvailabilityToggle {
        is_available: bool,
    },
}

impl UsageState {
    pub const fn feature_type(&self) -> FeatureType {
        match self {
            Self::Slots { .. } => FeatureType::Slots,
            Self::PointsPool { .. } => FeatureType::PointsPool,
            Self::OptionsList { .. } => FeatureType::OptionsList,
            Self::SpecialUx { .. } => FeatureType::SpecialUx,
            Self::AvailabilityToggle { .. } => FeatureType::AvailabilityToggle,
        }
    }

    /// Initial state for a freshly granted feature.
    fn seed(kind: &FeatureKind, limit: Option<u32>) -> Self {
        let limit = limit.unwrap_or(0);
        match kind {
            FeatureKind::Slots { .. } => Self::Slots {
                current_uses: 0,
                max_uses: limit,
                last_reset: None,
            },
            FeatureKind::PointsPool { .. } => Self::PointsPool {
                current_points: 0,
                max_points: limit,
            },
            FeatureKind::OptionsList { .. } => Self::OptionsList {
                selected_options: Vec::new(),
                max_selections: limit,
            },
            FeatureKind::SpecialUx { initial_state } => Self::SpecialUx {
                custom_state: initial_state.clone(),
            },
            FeatureKind::AvailabilityToggle { default_available } => Self::AvailabilityToggle {
                is_available: *default_available,
            },
        }
    }

    /// Stored cap, if the shape has one.
    pub const fn max(&self) -> Option<u32> {
        match self {
            Self::Slots { max_uses, .. } => Some(*max_uses),
            Self::PointsPool { max_points, .. } => Some(*max_points),
            Self::OptionsList { max_selections, .. } => Some(*max_selections),
            Self::SpecialUx { .. } | Self::AvailabilityToggle { .. } => None,
        }
    }

    /// Install a new cap and pull the current value back inside it.
    fn apply_max(&mut self, max: u32) {
        match self {
            Self::Slots {
                current_uses,
                max_uses,
                ..
            } => {
                *max_uses = max;
                *current_uses = (*current_uses).min(max);
            }
            Self::PointsPool {
                current_points,
                max_points,
            } => {
                *max_points = max;
                *current_points = (*current_points).min(max);
            }
            Self::OptionsList {
                selected_options,
                max_selections,
            } => {
                *max_selections = max;
                selected_options.truncate(max as usize);
            }
            Self::SpecialUx { .. } | Self::AvailabilityToggle { .. } => {}
        }
    }
}

/// One entry of the unified usage map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub feature_name: String,
    #[serde(flatten)]
    pub state: UsageState,
    pub config: FeatureConfig,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_feat_feature: bool,
    pub last_updated: DateTime<Utc>,
}

impl UsageRecord {
    /// Seed a record from a definition, evaluating its cap for the character.
    pub fn from_definition(
        definition: &FeatureDefinition,
        character: &CharacterSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        let limit = definition.limit_for(character);
        Self {
            feature_name: definition.name.clone(),
            state: UsageState::seed(&definition.kind, limit),
            config: FeatureConfig::Definition(definition.clone()),
            notes: String::new(),
            is_feat_feature: definition.is_feat_feature,
            last_updated: now,
        }
    }

    pub const fn feature_type(&self) -> FeatureType {
        self.state.feature_type()
    }

    /// Cap recomputed from the retained config.
    ///
    /// Falls back to the stored cap when the config carries no formula.
    pub fn recompute_max(&self, character: &CharacterSnapshot) -> Option<u32> {
        let stored = self.state.max()?;
        Some(
            self.config
                .limit()
                .map(|(formula, class_name)| formula::evaluate(formula, character, class_name))
                .unwrap_or(stored),
        )
    }

    /// Recompute the cap and clamp the current value into `[0, max]`.
    pub fn clamp_to(&mut self, character: &CharacterSnapshot) {
        if let Some(max) = self.recompute_max(character) {
            self.state.apply_max(max);
        }
    }

    pub fn current_uses(&self) -> Option<u32> {
        match &self.state {
            UsageState::Slots { current_uses, .. } => Some(*current_uses),
            _ => None,
        }
    }

    pub fn current_points(&self) -> Option<u32> {
        match &self.state {
            UsageState::PointsPool { current_points, .. } => Some(*current_points),
            _ => None,
        }
    }

    pub fn selected_options(&self) -> Option<&[SelectedOption]> {
        match &self.state {
            UsageState::OptionsList {
                selected_options, ..
            } => Some(selected_options),
            _ => None,
        }
    }

    pub fn custom_state(&self) -> Option<&CustomState> {
        match &self.state {
            UsageState::SpecialUx { custom_state } => Some(custom_state),
            _ => None,
        }
    }

    pub fn is_available(&self) -> Option<bool> {
        match &self.state {
            UsageState::AvailabilityToggle { is_available } => Some(*is_available),
            _ => None,
        }
    }
}

/// Shallow patch applied by `update_feature_usage`.
///
/// Counters are signed so out-of-range input is clamped rather than rejected.
/// Fields that do not belong to the record's shape are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsagePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_uses: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<Vec<SelectedOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<DateTime<Utc>>,
}

impl UsagePatch {
    pub fn uses(current_uses: i64) -> Self {
        Self {
            current_uses: Some(current_uses),
            ..Self::default()
        }
    }

    pub fn points(current_points: i64) -> Self {
        Self {
            current_points: Some(current_points),
            ..Self::default()
        }
    }

    pub fn available(is_available: bool) -> Self {
        Self {
            is_available: Some(is_available),
            ..Self::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Merge into a record. Counters saturate at 0 here; the upper bound is
    /// applied by the caller after the cap is recomputed.
    pub(crate) fn merge_into(&self, record: &mut UsageRecord) {
        if let Some(notes) = &self.notes {
            record.notes = notes.clone();
        }
        match &mut record.state {
            UsageState::Slots {
                current_uses,
                last_reset,
                ..
            } => {
                if let Some(value) = self.current_uses {
                    *current_uses = saturate(value);
                }
                if let Some(reset) = self.last_reset {
                    *last_reset = Some(reset);
                }
            }
            UsageState::PointsPool { current_points, .. } => {
                if let Some(value) = self.current_points {
                    *current_points = saturate(value);
                }
            }
            UsageState::OptionsList {
                selected_options, ..
            } => {
                if let Some(options) = &self.selected_options {
                    *selected_options = options.clone();
                }
            }
            UsageState::AvailabilityToggle { is_available } => {
                if let Some(value) = self.is_available {
                    *is_available = value;
                }
            }
            UsageState::SpecialUx { .. } => {}
        }
    }
}

fn saturate(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
