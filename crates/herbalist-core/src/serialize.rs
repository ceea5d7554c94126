//! Persistence for station state.
//!
//! Stations persist through a logical schema ([`PersistedStation`]) that
//! names kinds and effects instead of storing registry ids, so content can
//! be reordered between saves. Restoring never fails on content: unknown
//! names are dropped, counts are clamped to capacity, inconsistent fields
//! fall back to defaults, and each degradation is logged.
//!
//! Two encodings are provided: a compact `bitcode` snapshot behind a
//! versioned header, and (with the `json` feature) a tolerant JSON form.

use crate::fixed::{Fixed64, Ticks};
use crate::id::PropertyId;
use crate::item::ResourceStack;
use crate::ledger::CountedMap;
use crate::property::{NEUTRAL_COLOR, PotionProperties};
use crate::registry::Registry;
use crate::station::{BrewingStation, CraftingJob, JobKind, Phase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a station snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x4E2B_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("json encoding failed: {0}")]
    Json(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("json decoding failed: {0}")]
    Json(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every binary snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }
}

impl SnapshotHeader {
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StationSnapshot {
    header: SnapshotHeader,
    station: PersistedStation,
}

// ---------------------------------------------------------------------------
// Logical schema
// ---------------------------------------------------------------------------

/// A stack as persisted: kind by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedStack {
    pub kind: String,
    pub count: u32,
    pub properties: BTreeMap<u16, Fixed64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedPotion {
    pub color: u32,
    pub duration_seconds: u32,
    pub level: u32,
    /// Effect name. Empty means no effect.
    pub type_id: String,
}

impl Default for PersistedPotion {
    fn default() -> Self {
        Self {
            color: NEUTRAL_COLOR,
            duration_seconds: 0,
            level: 0,
            type_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedJob {
    pub input: PersistedStack,
    pub output: PersistedStack,
    pub progress_ticks: Ticks,
    pub total_ticks: Ticks,
    pub active: bool,
    pub kind: String,
}

/// The persisted form of a [`BrewingStation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedStation {
    pub phase: String,
    pub has_primary_fluid: bool,
    /// Written for observers; ignored on restore.
    pub has_heat_source: bool,
    pub materials: Vec<PersistedStack>,
    pub herbs: BTreeMap<String, u32>,
    pub potion: PersistedPotion,
    pub brewing_progress_ticks: Ticks,
    pub crafting_job: Option<PersistedJob>,
    pub last_brewed_herbs: BTreeMap<String, u32>,
}

fn capture_stack(stack: &ResourceStack, registry: &Registry) -> PersistedStack {
    PersistedStack {
        kind: registry.kind_name(stack.kind).to_string(),
        count: stack.count,
        properties: stack.properties.iter().map(|(k, v)| (k.0, *v)).collect(),
    }
}

fn capture_counts(map: &CountedMap, registry: &Registry) -> BTreeMap<String, u32> {
    map.iter()
        .map(|(k, c)| (registry.kind_name(k).to_string(), c))
        .collect()
}

impl PersistedStation {
    pub fn capture(station: &BrewingStation, registry: &Registry) -> Self {
        let potion = station.potion();
        Self {
            phase: station.phase().name().to_string(),
            has_primary_fluid: station.has_primary_fluid(),
            has_heat_source: station.has_heat_source(),
            materials: station
                .materials()
                .iter()
                .map(|s| capture_stack(s, registry))
                .collect(),
            herbs: capture_counts(station.herbs(), registry),
            potion: PersistedPotion {
                color: potion.color,
                duration_seconds: potion.duration_seconds,
                level: potion.level,
                type_id: potion
                    .effect
                    .map(|e| registry.effect_name(e).to_string())
                    .unwrap_or_default(),
            },
            brewing_progress_ticks: station.brewing_progress_ticks(),
            crafting_job: station.crafting().map(|job| PersistedJob {
                input: capture_stack(&job.input, registry),
                output: capture_stack(&job.output, registry),
                progress_ticks: job.progress_ticks,
                total_ticks: job.total_ticks,
                active: job.active,
                kind: job.kind.name().to_string(),
            }),
            last_brewed_herbs: capture_counts(station.last_brewed_herbs(), registry),
        }
    }

    /// Rebuild a station, degrading bad data to defaults.
    pub fn restore(self, registry: &Registry) -> BrewingStation {
        let mut station = BrewingStation::new(registry.station_config());

        let phase = match Phase::from_name(&self.phase) {
            Some(p) => p,
            None => {
                if !self.phase.is_empty() {
                    tracing::warn!(phase = %self.phase, "unknown persisted phase, using empty");
                }
                Phase::Empty
            }
        };
        station.phase = phase;
        station.has_primary_fluid = phase != Phase::Empty;
        if self.has_primary_fluid != station.has_primary_fluid {
            tracing::warn!(
                phase = phase.name(),
                persisted = self.has_primary_fluid,
                "persisted fluid flag disagrees with phase, following phase"
            );
        }

        for stack in self.materials {
            let Some(stack) = restore_stack(stack, registry) else {
                continue;
            };
            let added = station.materials.try_add(&stack);
            if added < stack.count {
                tracing::warn!(
                    kind = registry.kind_name(stack.kind),
                    persisted = stack.count,
                    kept = added,
                    "persisted material exceeds capacity, truncating"
                );
            }
        }
        restore_counts(&mut station.herbs, self.herbs, registry, "herbs");
        restore_counts(
            &mut station.last_brewed_herbs,
            self.last_brewed_herbs,
            registry,
            "last_brewed_herbs",
        );

        let effect = if self.potion.type_id.is_empty() {
            None
        } else {
            let found = registry.effect_id(&self.potion.type_id);
            if found.is_none() {
                tracing::warn!(effect = %self.potion.type_id, "unknown persisted effect, dropping");
            }
            found
        };
        station.potion = PotionProperties {
            color: self.potion.color,
            duration_seconds: self.potion.duration_seconds,
            level: self.potion.level,
            effect,
        };
        station.brewing_progress_ticks = self.brewing_progress_ticks;

        if let Some(job) = self.crafting_job {
            if phase == Phase::Complete {
                station.crafting = restore_job(job, registry);
            } else {
                tracing::warn!(phase = phase.name(), "crafting job outside complete phase, dropping");
            }
        }
        station
    }
}

fn restore_stack(stack: PersistedStack, registry: &Registry) -> Option<ResourceStack> {
    let Some(kind) = registry.kind_id(&stack.kind) else {
        tracing::warn!(kind = %stack.kind, "unknown persisted kind, dropping");
        return None;
    };
    if stack.count == 0 {
        return None;
    }
    let mut out = ResourceStack::new(kind, stack.count);
    for (prop, value) in stack.properties {
        out.set_property(PropertyId(prop), value);
    }
    Some(out)
}

fn restore_counts(
    into: &mut CountedMap,
    counts: BTreeMap<String, u32>,
    registry: &Registry,
    field: &'static str,
) {
    for (name, count) in counts {
        let Some(kind) = registry.kind_id(&name) else {
            tracing::warn!(field, kind = %name, "unknown persisted kind, dropping");
            continue;
        };
        let added = into.try_add(kind, count);
        if added < count {
            tracing::warn!(field, kind = %name, persisted = count, kept = added, "persisted count exceeds cap, clamping");
        }
    }
}

fn restore_job(job: PersistedJob, registry: &Registry) -> Option<CraftingJob> {
    let kind = JobKind::from_name(&job.kind).unwrap_or_else(|| {
        tracing::warn!(job_kind = %job.kind, "unknown persisted job kind, using transform");
        JobKind::Transform
    });
    let output = restore_stack(job.output, registry)?;
    let input = match restore_stack(job.input.clone(), registry) {
        Some(stack) => stack,
        // A finished job has an emptied input; keep its kind when known.
        None => ResourceStack::new(registry.kind_id(&job.input.kind).unwrap_or(output.kind), 0),
    };
    let total_ticks = job.total_ticks.max(1);
    Some(CraftingJob {
        input,
        output,
        progress_ticks: job.progress_ticks.min(total_ticks),
        total_ticks,
        active: job.active && job.progress_ticks < total_ticks,
        kind,
    })
}

// ---------------------------------------------------------------------------
// Binary snapshots
// ---------------------------------------------------------------------------

/// Encode a station as a headered bitcode snapshot.
pub fn snapshot(station: &BrewingStation, registry: &Registry) -> Result<Vec<u8>, SerializeError> {
    let snap = StationSnapshot {
        header: SnapshotHeader::default(),
        station: PersistedStation::capture(station, registry),
    };
    bitcode::serialize(&snap).map_err(|e| SerializeError::Encode(e.to_string()))
}

/// Decode a snapshot. Header or encoding problems are errors; content
/// problems degrade as described on [`PersistedStation::restore`].
pub fn restore_snapshot(data: &[u8], registry: &Registry) -> Result<BrewingStation, DeserializeError> {
    let snap: StationSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    snap.header.validate()?;
    Ok(snap.station.restore(registry))
}

/// Decode a snapshot, falling back to a fresh station on any error.
pub fn load_snapshot_or_default(data: &[u8], registry: &Registry) -> BrewingStation {
    restore_snapshot(data, registry).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unreadable station snapshot, starting empty");
        BrewingStation::new(registry.station_config())
    })
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[cfg(feature = "json")]
pub fn to_json(station: &BrewingStation, registry: &Registry) -> Result<String, SerializeError> {
    serde_json::to_string_pretty(&PersistedStation::capture(station, registry))
        .map_err(|e| SerializeError::Json(e.to_string()))
}

#[cfg(feature = "json")]
pub fn from_json(json: &str, registry: &Registry) -> Result<BrewingStation, DeserializeError> {
    let persisted: PersistedStation =
        serde_json::from_str(json).map_err(|e| DeserializeError::Json(e.to_string()))?;
    Ok(persisted.restore(registry))
}

#[cfg(feature = "json")]
pub fn load_json_or_default(json: &str, registry: &Registry) -> BrewingStation {
    from_json(json, registry).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unreadable station json, starting empty");
        BrewingStation::new(registry.station_config())
    })
}
