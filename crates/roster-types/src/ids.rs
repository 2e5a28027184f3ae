//! Identifier types.
//!
//! Minion identifiers are human-readable strings (`MINION-001`) derived from
//! the creation index, so two runs seeded identically produce identical ids
//! and therefore identical activity logs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Prefix shared by every minion identifier.
const MINION_PREFIX: &str = "MINION-";

/// Stable unique identifier of a minion. Assigned once, never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct MinionId(String);

impl MinionId {
    /// Build the identifier for the `index`-th minion (1-based), zero padded
    /// to three digits.
    pub fn from_index(index: u32) -> Self {
        Self(format!("{MINION_PREFIX}{index:03}"))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier has the expected `MINION-` shape.
    pub fn is_well_formed(&self) -> bool {
        self.0
            .strip_prefix(MINION_PREFIX)
            .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
    }
}

impl core::fmt::Display for MinionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MinionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for MinionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_zero_padded() {
        assert_eq!(MinionId::from_index(7).as_str(), "MINION-007");
        assert_eq!(MinionId::from_index(120).as_str(), "MINION-120");
    }

    #[test]
    fn ids_order_by_index_within_padding() {
        assert!(MinionId::from_index(2) < MinionId::from_index(10));
    }

    #[test]
    fn well_formed_check() {
        assert!(MinionId::from_index(1).is_well_formed());
        assert!(!MinionId::from("AGENT-1").is_well_formed());
        assert!(!MinionId::from("MINION-").is_well_formed());
    }
}
