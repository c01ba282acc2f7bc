//! Unified usage map: the single source of truth for feature consumption.
//!
//! Every mutation goes through [`store`], which recomputes the cap from the
//! record's retained config and then clamps the current value, so a level-up
//! or ability change can never leave a stale cap behind.

pub mod error;
pub mod record;
pub mod store;

use std::collections::BTreeMap;

pub use error::UsageError;
pub use record::{
    CustomState, FeatureConfig, LegacyConfig, SelectedOption, UsagePatch, UsageRecord, UsageState,
};
pub use store::{
    OptionRef, add_feature_option, add_single_feature, get, refresh_caps, remove_feature_option,
    reset_feature, update_feature_custom_state, update_feature_usage,
};

/// Feature id → usage record. Owned by exactly one character.
pub type UsageMap = BTreeMap<String, UsageRecord>;
