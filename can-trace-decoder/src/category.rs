//! Lift side derivation from node names

use crate::types::CategoryTag;
use serde::{Deserialize, Serialize};

/// Which records receive a category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryScope {
    /// Every record whose identifier resolved
    #[default]
    AllRecords,
    /// Only records that also carry decoded payload signals
    SignalRecords,
}

/// Derive the lift side from source/destination names
///
/// Case-insensitive substring match; "right" is tested before "left" and an
/// absent name never matches.
pub fn derive_category(source: Option<&str>, destination: Option<&str>) -> CategoryTag {
    let source = source.unwrap_or_default().to_lowercase();
    let destination = destination.unwrap_or_default().to_lowercase();
    let mentions = |needle: &str| source.contains(needle) || destination.contains(needle);

    if mentions("right") {
        CategoryTag::RightLift
    } else if mentions("left") {
        CategoryTag::LeftLift
    } else {
        CategoryTag::UnknownLift
    }
}
