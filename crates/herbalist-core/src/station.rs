//! The master cell's payload: a plain record of station state.
//!
//! Mutation goes through [`crate::machine::PhaseStateMachine`]; this module
//! only exposes reads.

use crate::config::StationConfig;
use crate::fixed::{Fixed64, Ticks, progress_fraction};
use crate::id::EffectId;
use crate::item::ResourceStack;
use crate::ledger::{CountedMap, OrderedSlotList};
use crate::property::PotionProperties;
use serde::{Deserialize, Serialize};

/// Ordered station lifecycle stages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Phase {
    #[default]
    Empty,
    Water,
    Brewing,
    Complete,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Empty, Phase::Water, Phase::Brewing, Phase::Complete];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Empty => "empty",
            Phase::Water => "water",
            Phase::Brewing => "brewing",
            Phase::Complete => "complete",
        }
    }

    /// Parse a persisted phase name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Phase> {
        Phase::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// Which recipe family started a crafting job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobKind {
    /// Advances only while heated.
    #[default]
    Transform,
    /// Advances regardless of heat.
    Infusing,
}

impl JobKind {
    pub fn name(self) -> &'static str {
        match self {
            JobKind::Transform => "transform",
            JobKind::Infusing => "infusing",
        }
    }

    pub fn from_name(name: &str) -> Option<JobKind> {
        [JobKind::Transform, JobKind::Infusing]
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    pub fn needs_heat(self) -> bool {
        matches!(self, JobKind::Transform)
    }
}

/// An item being processed in the finished potion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingJob {
    /// Units taken from the caller for a transform. Emptied once the job
    /// finishes. Infusion inputs stay staged in the materials list, so an
    /// infusing job holds an empty stack here.
    pub input: ResourceStack,
    pub output: ResourceStack,
    pub progress_ticks: Ticks,
    pub total_ticks: Ticks,
    pub active: bool,
    #[serde(default)]
    pub kind: JobKind,
}

impl CraftingJob {
    /// Finished and holding an output to extract.
    pub fn is_ready(&self) -> bool {
        !self.active && !self.output.is_empty()
    }

    pub fn progress(&self) -> Fixed64 {
        progress_fraction(self.progress_ticks, self.total_ticks)
    }

    /// Whole percent complete, rounded down.
    pub fn percent(&self) -> u32 {
        if self.total_ticks == 0 {
            return 0;
        }
        let done = u64::from(self.progress_ticks.min(self.total_ticks));
        (done * 100 / u64::from(self.total_ticks)) as u32
    }

    /// Stacks to hand back if the job is abandoned.
    pub fn into_returned(self) -> Vec<ResourceStack> {
        let mut out = Vec::new();
        if !self.input.is_empty() {
            out.push(self.input);
        }
        if !self.active && !self.output.is_empty() {
            out.push(self.output);
        }
        out
    }
}

/// Read-only snapshot pushed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StationView {
    pub phase: Phase,
    pub has_primary_fluid: bool,
    pub has_heat_source: bool,
    pub color: u32,
    pub duration_seconds: u32,
    pub level: u32,
    pub effect: Option<EffectId>,
    pub material_slots: usize,
    pub herb_units: u32,
    pub brewing_progress_ticks: Ticks,
    pub crafting_percent: Option<u32>,
}

/// Authoritative state of one brewing station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrewingStation {
    pub(crate) phase: Phase,
    pub(crate) has_primary_fluid: bool,
    pub(crate) has_heat_source: bool,
    pub(crate) materials: OrderedSlotList,
    pub(crate) herbs: CountedMap,
    pub(crate) potion: PotionProperties,
    pub(crate) brewing_progress_ticks: Ticks,
    pub(crate) crafting: Option<CraftingJob>,
    pub(crate) last_brewed_herbs: CountedMap,
}

impl Default for BrewingStation {
    fn default() -> Self {
        Self::new(&StationConfig::default())
    }
}

impl BrewingStation {
    pub fn new(config: &StationConfig) -> Self {
        Self {
            phase: Phase::Empty,
            has_primary_fluid: false,
            has_heat_source: false,
            materials: OrderedSlotList::new(config.max_material_kinds, config.max_units_per_kind),
            herbs: CountedMap::new(config.max_units_per_kind),
            potion: PotionProperties::default(),
            brewing_progress_ticks: 0,
            crafting: None,
            last_brewed_herbs: CountedMap::new(config.max_units_per_kind),
        }
    }

    /// Back to a fresh Empty station, keeping capacities.
    pub(crate) fn reset(&mut self) {
        self.phase = Phase::Empty;
        self.has_primary_fluid = false;
        self.materials.clear();
        self.herbs.clear();
        self.potion = PotionProperties::default();
        self.brewing_progress_ticks = 0;
        self.crafting = None;
        self.last_brewed_herbs.clear();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_primary_fluid(&self) -> bool {
        self.has_primary_fluid
    }

    /// Heat as of the last guard check or tick.
    pub fn has_heat_source(&self) -> bool {
        self.has_heat_source
    }

    pub fn materials(&self) -> &OrderedSlotList {
        &self.materials
    }

    pub fn herbs(&self) -> &CountedMap {
        &self.herbs
    }

    pub fn potion(&self) -> &PotionProperties {
        &self.potion
    }

    pub fn brewing_progress_ticks(&self) -> Ticks {
        self.brewing_progress_ticks
    }

    pub fn crafting(&self) -> Option<&CraftingJob> {
        self.crafting.as_ref()
    }

    /// Herbs of the last finished brew.
    pub fn last_brewed_herbs(&self) -> &CountedMap {
        &self.last_brewed_herbs
    }

    /// Crafting progress in whole percent, 0 when no job exists.
    pub fn crafting_progress_percent(&self) -> u32 {
        self.crafting.as_ref().map_or(0, CraftingJob::percent)
    }

    /// Crafting progress as a fraction in `[0, 1]`.
    pub fn crafting_progress(&self) -> Fixed64 {
        self.crafting
            .as_ref()
            .map_or(Fixed64::ZERO, CraftingJob::progress)
    }

    pub fn view(&self) -> StationView {
        StationView {
            phase: self.phase,
            has_primary_fluid: self.has_primary_fluid,
            has_heat_source: self.has_heat_source,
            color: self.potion.color,
            duration_seconds: self.potion.duration_seconds,
            level: self.potion.level,
            effect: self.potion.effect,
            material_slots: self.materials.len(),
            herb_units: self.herbs.total(),
            brewing_progress_ticks: self.brewing_progress_ticks,
            crafting_percent: self.crafting.as_ref().map(CraftingJob::percent),
        }
    }

    /// Consume the station, returning its materials, herbs, and job stacks.
    pub fn into_contents(mut self) -> Vec<ResourceStack> {
        let mut out = self.materials.drain();
        out.extend(self.herbs.drain());
        if let Some(job) = self.crafting.take() {
            out.extend(job.into_returned());
        }
        out
    }
}
