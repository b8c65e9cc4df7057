//! Catalog generator configuration
//!
//! This module defines the knobs of a catalog generation run: the module ID
//! range, reserved IDs, typo detection and the metadata written into XML
//! collateral.

use crate::types::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for a catalog generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Largest module ID that fits the header's module field
    #[serde(default = "default_module_id_max")]
    pub module_id_max: u32,

    /// IDs that must never be allocated
    #[serde(default)]
    pub reserved_ids: ReservedIds,

    /// Maximum edit distance that counts as a typo (0 = disabled)
    #[serde(default)]
    pub typo_threshold: usize,

    /// What to do when a typo is detected
    #[serde(default)]
    pub typo_policy: TypoPolicy,

    /// Drop seed entries that the current build no longer declares
    #[serde(default)]
    pub forget_old_ids: bool,

    /// Metadata for XML collateral
    #[serde(default)]
    pub collateral: CollateralInfo,
}

fn default_module_id_max() -> u32 {
    127
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_id_max: default_module_id_max(),
            reserved_ids: ReservedIds::default(),
            typo_threshold: 0,
            typo_policy: TypoPolicy::default(),
            forget_old_ids: false,
            collateral: CollateralInfo::default(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the maximum module ID
    pub fn with_module_id_max(mut self, max: u32) -> Self {
        self.module_id_max = max;
        self
    }

    /// Builder method: set the reserved ID intervals
    pub fn with_reserved_ids(mut self, reserved: ReservedIds) -> Self {
        self.reserved_ids = reserved;
        self
    }

    /// Builder method: enable typo detection
    pub fn with_typo_detection(mut self, threshold: usize, policy: TypoPolicy) -> Self {
        self.typo_threshold = threshold;
        self.typo_policy = policy;
        self
    }

    /// Builder method: drop stale seed entries from the output
    pub fn with_forget_old_ids(mut self, forget: bool) -> Self {
        self.forget_old_ids = forget;
        self
    }

    /// Builder method: set collateral metadata
    pub fn with_collateral(mut self, collateral: CollateralInfo) -> Self {
        self.collateral = collateral;
        self
    }

    /// True if typo detection is enabled
    pub fn detects_typos(&self) -> bool {
        self.typo_threshold > 0
    }
}

/// Reaction to a new message that closely resembles a known one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypoPolicy {
    /// Fail the run
    #[default]
    Error,
    /// Log a warning and allocate a new ID
    Warn,
    /// Log a warning and reuse the known message's ID
    Fix,
    /// Reuse the known message's ID without logging
    FixQuiet,
}

impl TypoPolicy {
    /// True if the known message's ID is reused
    pub fn reuses_id(self) -> bool {
        matches!(self, TypoPolicy::Fix | TypoPolicy::FixQuiet)
    }
}

impl FromStr for TypoPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "error" => Ok(TypoPolicy::Error),
            "warn" => Ok(TypoPolicy::Warn),
            "fix" => Ok(TypoPolicy::Fix),
            "fix_quiet" => Ok(TypoPolicy::FixQuiet),
            other => Err(format!(
                "unknown typo behavior '{}' (expected error, warn, fix or fix_quiet)",
                other
            )),
        }
    }
}

impl fmt::Display for TypoPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypoPolicy::Error => write!(f, "error"),
            TypoPolicy::Warn => write!(f, "warn"),
            TypoPolicy::Fix => write!(f, "fix"),
            TypoPolicy::FixQuiet => write!(f, "fix_quiet"),
        }
    }
}

/// A set of inclusive ID intervals, written as `"1-5,10-15,20"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReservedIds {
    intervals: Vec<(u32, u32)>,
}

impl ReservedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: reserve `first..=last`
    pub fn with_range(mut self, first: u32, last: u32) -> Self {
        self.intervals.push((first.min(last), first.max(last)));
        self
    }

    pub fn contains(&self, id: u32) -> bool {
        self.interval_of(id).is_some()
    }

    /// The reserved interval containing `id`, if any
    pub fn interval_of(&self, id: u32) -> Option<(u32, u32)> {
        self.intervals
            .iter()
            .copied()
            .filter(|(first, last)| (*first..=*last).contains(&id))
            .max_by_key(|(_, last)| *last)
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl FromStr for ReservedIds {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CatalogError::InvalidReservedIds(s.to_string());
        let mut intervals = Vec::new();

        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let interval = match item.split_once('-') {
                Some((first, last)) => {
                    let first: u32 = first.trim().parse().map_err(|_| invalid())?;
                    let last: u32 = last.trim().parse().map_err(|_| invalid())?;
                    if first > last {
                        return Err(invalid());
                    }
                    (first, last)
                }
                None => {
                    let id: u32 = item.parse().map_err(|_| invalid())?;
                    (id, id)
                }
            };
            intervals.push(interval);
        }

        Ok(Self { intervals })
    }
}

impl TryFrom<String> for ReservedIds {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ReservedIds> for String {
    fn from(value: ReservedIds) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ReservedIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self
            .intervals
            .iter()
            .map(|(first, last)| {
                if first == last {
                    first.to_string()
                } else {
                    format!("{}-{}", first, last)
                }
            })
            .collect();
        write!(f, "{}", items.join(","))
    }
}

/// Metadata written into XML collateral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralInfo {
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_fw_version")]
    pub fw_version: String,
    #[serde(default = "default_guid")]
    pub guid: String,
    #[serde(default = "default_guid_mask")]
    pub guid_mask: String,
}

fn default_client_name() -> String {
    "CIB Framework FW".to_string()
}

fn default_fw_version() -> String {
    "VERSION".to_string()
}

fn default_guid() -> String {
    "{00000000-0017-0001-0000-000000000000}".to_string()
}

fn default_guid_mask() -> String {
    "{00000000-FFFF-FFFF-8000-000000000000}".to_string()
}

impl Default for CollateralInfo {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            fw_version: default_fw_version(),
            guid: default_guid(),
            guid_mask: default_guid_mask(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_INTS: &str = "1-5,8-10,15";

    #[test]
    fn test_intervals() {
        let m: ReservedIds = TEST_INTS.parse().unwrap();
        assert!(m.contains(1));
        assert!(m.contains(5));
        assert!(!m.contains(6));
        assert!(m.contains(8));
        assert!(m.contains(10));
        assert!(m.contains(15));
        assert_eq!(m.interval_of(9), Some((8, 10)));
    }

    #[test]
    fn test_empty_intervals() {
        let m: ReservedIds = "".parse().unwrap();
        assert!(!m.contains(1));
        assert!(m.is_empty());
    }

    #[test]
    fn test_intervals_display() {
        let m: ReservedIds = TEST_INTS.parse().unwrap();
        assert_eq!(m.to_string(), TEST_INTS);
    }

    #[test]
    fn test_invalid_intervals() {
        assert!("5-1".parse::<ReservedIds>().is_err());
        assert!("a-b".parse::<ReservedIds>().is_err());
        assert!("-3".parse::<ReservedIds>().is_err());
    }

    #[test]
    fn test_generator_config_builder() {
        let config = GeneratorConfig::new()
            .with_module_id_max(63)
            .with_reserved_ids(ReservedIds::new().with_range(5, 10))
            .with_typo_detection(2, TypoPolicy::Fix)
            .with_forget_old_ids(true);

        assert_eq!(config.module_id_max, 63);
        assert!(config.reserved_ids.contains(7));
        assert!(config.detects_typos());
        assert!(config.typo_policy.reuses_id());
        assert!(config.forget_old_ids);
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"reserved_ids": "1-3", "typo_policy": "fix_quiet"}"#).unwrap();
        assert_eq!(config.module_id_max, 127);
        assert!(config.reserved_ids.contains(2));
        assert_eq!(config.typo_policy, TypoPolicy::FixQuiet);
        assert_eq!(config.collateral, CollateralInfo::default());

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""reserved_ids":"1-3""#));
    }

    #[test]
    fn test_typo_policy_parse() {
        assert_eq!("warn".parse::<TypoPolicy>().unwrap(), TypoPolicy::Warn);
        assert_eq!(TypoPolicy::FixQuiet.to_string(), "fix_quiet");
        assert!("loud".parse::<TypoPolicy>().is_err());
    }
}
