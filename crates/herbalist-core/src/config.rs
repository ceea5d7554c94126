use crate::fixed::Ticks;
use crate::ledger::{MAX_MATERIAL_KINDS, MAX_UNITS_PER_KIND};
use serde::{Deserialize, Serialize};

/// Brewing progress required before a brew may be finished.
pub const BREWING_THRESHOLD: Ticks = 200;

/// Observers are re-synced every this many ticks of long-running progress.
pub const SYNC_INTERVAL: Ticks = 20;

/// Duration of every infusing job.
pub const INFUSING_TICKS: Ticks = 100;

/// Processing time of a transform recipe that does not set one.
pub const DEFAULT_TRANSFORM_TICKS: Ticks = 200;

/// Default number of events retained per station.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Station tuning shared by every station built from one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub brewing_threshold: Ticks,
    pub sync_interval: Ticks,
    pub infusing_ticks: Ticks,
    pub max_material_kinds: usize,
    pub max_units_per_kind: u32,
    pub event_capacity: usize,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            brewing_threshold: BREWING_THRESHOLD,
            sync_interval: SYNC_INTERVAL,
            infusing_ticks: INFUSING_TICKS,
            max_material_kinds: MAX_MATERIAL_KINDS,
            max_units_per_kind: MAX_UNITS_PER_KIND,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl StationConfig {
    /// Returns the name of the first field that would make a station unusable.
    pub fn first_invalid_field(&self) -> Option<&'static str> {
        if self.sync_interval == 0 {
            return Some("sync_interval");
        }
        if self.infusing_ticks == 0 {
            return Some("infusing_ticks");
        }
        if self.max_material_kinds == 0 {
            return Some("max_material_kinds");
        }
        if self.max_units_per_kind == 0 {
            return Some("max_units_per_kind");
        }
        None
    }
}
