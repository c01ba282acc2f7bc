//! Feature definitions: what a class grants and how its resource scales.
//!
//! # Design: Base + Kind Pattern
//!
//! - [`FeatureDefinition`] holds the common fields (id, name, owning class,
//!   enablement rule)
//! - [`FeatureKind`] holds the type-specific formulas, tagged by
//!   `feature_type` so a definition file names the shape explicitly
//!
//! Definitions come from an external loader and are immutable here; usage
//! records keep a copy so they can recompute caps without the loader.

pub mod class;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::character::CharacterSnapshot;
use crate::formula::{self, Formula};

pub use class::ClassData;

/// The five resource shapes a feature can have.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureType {
    /// Limited uses per rest (Channel Divinity, Bardic Inspiration).
    Slots,
    /// A pool spent in variable amounts (Ki, Sorcery Points).
    PointsPool,
    /// A capped pick-list (Eldritch Invocations, Metamagic).
    OptionsList,
    /// Free-form state owned by a dedicated UI (Wild Shape).
    SpecialUx,
    /// A single on/off availability flag (Heroic Inspiration).
    AvailabilityToggle,
}

/// When a rest-based resource comes back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResetKind {
    ShortRest,
    #[default]
    LongRest,
    Dawn,
    Manual,
}

/// A selectable option offered by an options-list feature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Type-specific part of a feature definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature_type", rename_all = "snake_case")]
pub enum FeatureKind {
    Slots {
        uses: Formula,
        #[serde(default)]
        reset: ResetKind,
    },
    PointsPool {
        points: Formula,
        #[serde(default)]
        reset: ResetKind,
    },
    OptionsList {
        selections: Formula,
        #[serde(default)]
        options: Vec<OptionDefinition>,
    },
    SpecialUx {
        #[serde(default)]
        initial_state: serde_json::Map<String, serde_json::Value>,
    },
    AvailabilityToggle {
        #[serde(default = "default_available")]
        default_available: bool,
    },
}

fn default_available() -> bool {
    true
}

impl FeatureKind {
    pub const fn feature_type(&self) -> FeatureType {
        match self {
            Self::Slots { .. } => FeatureType::Slots,
            Self::PointsPool { .. } => FeatureType::PointsPool,
            Self::OptionsList { .. } => FeatureType::OptionsList,
            Self::SpecialUx { .. } => FeatureType::SpecialUx,
            Self::AvailabilityToggle { .. } => FeatureType::AvailabilityToggle,
        }
    }

    /// Formula that bounds the resource, if the shape has one.
    pub const fn limit_formula(&self) -> Option<&Formula> {
        match self {
            Self::Slots { uses, .. } => Some(uses),
            Self::PointsPool { points, .. } => Some(points),
            Self::OptionsList { selections, .. } => Some(selections),
            Self::SpecialUx { .. } | Self::AvailabilityToggle { .. } => None,
        }
    }
}

/// Minimum level and optional subclass gate for a feature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnablementRule {
    #[serde(default)]
    pub min_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
}

impl EnablementRule {
    pub const fn at_level(min_level: u32) -> Self {
        Self {
            min_level,
            subclass: None,
        }
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclass = Some(subclass.into());
        self
    }

    /// Whether a class level (and chosen subclass) satisfies the rule.
    pub fn admits(&self, level: u32, subclass: Option<&str>) -> bool {
        if level < self.min_level {
            return false;
        }
        match (&self.subclass, subclass) {
            (None, _) => true,
            (Some(required), Some(chosen)) => required.eq_ignore_ascii_case(chosen),
            (Some(_), None) => false,
        }
    }
}

/// A feature granted by a class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    pub id: String,
    pub name: String,
    pub class_name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
    #[serde(default)]
    pub enablement: EnablementRule,
    #[serde(default)]
    pub is_feat_feature: bool,
    #[serde(default)]
    pub description: String,
}

impl FeatureDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        class_name: impl Into<String>,
        kind: FeatureKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class_name: class_name.into(),
            kind,
            enablement: EnablementRule::default(),
            is_feat_feature: false,
            description: String::new(),
        }
    }

    pub fn with_enablement(mut self, enablement: EnablementRule) -> Self {
        self.enablement = enablement;
        self
    }

    pub fn as_feat(mut self) -> Self {
        self.is_feat_feature = true;
        self
    }

    pub const fn feature_type(&self) -> FeatureType {
        self.kind.feature_type()
    }

    /// Current cap for this feature, or `None` for uncapped shapes.
    ///
    /// Feat features are not tied to a class, so they read the total level.
    pub fn limit_for(&self, character: &CharacterSnapshot) -> Option<u32> {
        let class_name = (!self.is_feat_feature && !self.class_name.is_empty())
            .then_some(self.class_name.as_str());
        self.kind
            .limit_formula()
            .map(|formula| formula::evaluate(formula, character, class_name))
    }
}
