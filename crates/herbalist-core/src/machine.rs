//! Guarded phase transitions over a [`BrewingStation`].
//!
//! The machine borrows the station record, the registry, a heat oracle, and
//! the station's event buffer for the duration of one operation. A failed
//! guard returns `false`, `0`, or `None` and leaves the station unchanged
//! apart from the cached heat reading.
//!
//! ```text
//! Empty --add_primary_fluid--> Water --begin_processing--> Brewing
//!   ^                                                         |
//!   |                                              finish_processing
//!   |                                                         v
//!   +----------- extract_output / force_reset ----------- Complete
//! ```

use crate::config::StationConfig;
use crate::event::{EventBuffer, StationEvent};
use crate::fixed::Fixed64;
use crate::item::{ResourceStack, bound};
use crate::id::{KindId, RecipeId};
use crate::matcher::RecipeMatcher;
use crate::property::{HerbRates, PotionProperties, compute_final, compute_initial};
use crate::recipe::InfusingOutput;
use crate::registry::Registry;
use crate::station::{BrewingStation, CraftingJob, JobKind, Phase};

/// Answers whether the station is currently heated.
pub trait HeatSource {
    fn has_heat(&self) -> bool;
}

impl HeatSource for bool {
    fn has_heat(&self) -> bool {
        *self
    }
}

/// Orchestrates one station through its lifecycle.
pub struct PhaseStateMachine<'a, H: HeatSource> {
    station: &'a mut BrewingStation,
    registry: &'a Registry,
    heat: H,
    events: &'a mut EventBuffer,
}

impl<'a, H: HeatSource> PhaseStateMachine<'a, H> {
    pub fn new(
        station: &'a mut BrewingStation,
        registry: &'a Registry,
        heat: H,
        events: &'a mut EventBuffer,
    ) -> Self {
        Self {
            station,
            registry,
            heat,
            events,
        }
    }

    pub fn station(&self) -> &BrewingStation {
        self.station
    }

    fn config(&self) -> &'a StationConfig {
        self.registry.station_config()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn sync(&mut self) {
        self.events.push(StationEvent::Synced(self.station.view()));
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.station.phase;
        self.station.phase = to;
        self.record_phase_change(from, to);
    }

    fn record_phase_change(&mut self, from: Phase, to: Phase) {
        if from == to {
            return;
        }
        tracing::debug!(from = from.name(), to = to.name(), "station phase changed");
        self.events.push(StationEvent::PhaseChanged { from, to });
    }

    /// Re-read the heat oracle and cache the answer on the station.
    pub fn refresh_heat(&mut self) -> bool {
        let has_heat = self.heat.has_heat();
        if has_heat != self.station.has_heat_source {
            self.station.has_heat_source = has_heat;
            self.events.push(StationEvent::HeatChanged { has_heat });
        }
        has_heat
    }

    // -----------------------------------------------------------------------
    // Water phase
    // -----------------------------------------------------------------------

    /// Fill an empty station. Fails if it already holds fluid.
    pub fn add_primary_fluid(&mut self) -> bool {
        if self.station.phase != Phase::Empty || self.station.has_primary_fluid {
            return false;
        }
        self.station.has_primary_fluid = true;
        self.set_phase(Phase::Water);
        self.sync();
        true
    }

    /// Add materials while in Water. Returns the units accepted.
    #[must_use = "returns the quantity actually added, which may be less than offered"]
    pub fn add_material(&mut self, stack: &ResourceStack) -> u32 {
        if self.station.phase != Phase::Water {
            return 0;
        }
        let added = self.station.materials.try_add(stack);
        if added > 0 {
            self.events.push(StationEvent::MaterialAdded {
                kind: stack.kind,
                count: added,
            });
            self.sync();
        }
        added
    }

    /// Take from the most recently added material slot: one unit, or the
    /// whole slot when `bulk`. Works in Water, and in Complete on items
    /// staged for an infusion that has not started.
    pub fn take_material(&mut self, bulk: bool) -> Option<ResourceStack> {
        let staging = self.station.phase == Phase::Complete && self.station.crafting.is_none();
        if self.station.phase != Phase::Water && !staging {
            return None;
        }
        let taken = self.station.materials.take_last(bulk)?;
        self.events.push(StationEvent::MaterialTaken {
            kind: taken.kind,
            count: taken.count,
        });
        self.sync();
        Some(taken)
    }

    /// Start brewing. Needs materials and heat.
    pub fn begin_processing(&mut self) -> bool {
        if self.station.phase != Phase::Water || self.station.materials.is_empty() {
            return false;
        }
        if !self.refresh_heat() {
            return false;
        }
        let initial = compute_initial(&self.station.materials, self.registry);
        self.station.potion = PotionProperties {
            color: initial.color,
            effect: initial.effect,
            ..PotionProperties::default()
        };
        self.station.brewing_progress_ticks = 0;
        self.set_phase(Phase::Brewing);
        self.sync();
        true
    }

    // -----------------------------------------------------------------------
    // Brewing phase
    // -----------------------------------------------------------------------

    /// Add herbs while brewing. Non-herb kinds are refused.
    #[must_use = "returns the quantity actually added, which may be less than offered"]
    pub fn add_herb(&mut self, kind: KindId, amount: u32) -> u32 {
        if self.station.phase != Phase::Brewing || !self.registry.is_herb(kind) {
            return 0;
        }
        let added = self.station.herbs.try_add(kind, amount);
        if added > 0 {
            self.events.push(StationEvent::HerbAdded { kind, count: added });
            self.sync();
        }
        added
    }

    /// Finish brewing once enough heated ticks have passed.
    pub fn finish_processing(&mut self) -> bool {
        if self.station.phase != Phase::Brewing
            || self.station.brewing_progress_ticks < self.config().brewing_threshold
        {
            return false;
        }
        let matched = RecipeMatcher::new(self.registry).find_brewing(&self.station.materials);
        let (rates, effect) = match matched {
            Some((_, recipe)) => (recipe.rates, Some(recipe.effect)),
            None => (HerbRates::default(), self.station.potion.effect),
        };
        let finals = compute_final(&self.station.herbs, self.registry, &rates, effect);
        self.station.potion.effect = effect;
        self.station.potion.duration_seconds = finals.duration_seconds;
        self.station.potion.level = finals.level;
        self.station.last_brewed_herbs = self.station.herbs.clone();
        self.station.materials.clear();
        self.station.herbs.clear();
        self.set_phase(Phase::Complete);
        self.sync();
        true
    }

    // -----------------------------------------------------------------------
    // Complete phase
    // -----------------------------------------------------------------------

    /// Offer an item to the finished potion. With nothing staged, a
    /// transform recipe for the item is tried first. Otherwise the item is
    /// staged toward an infusion, which starts once the staged kinds equal
    /// a recipe's kinds. Returns the units taken from `stack`.
    #[must_use = "returns the quantity taken from the offered stack"]
    pub fn accept_transform_input(&mut self, stack: &ResourceStack) -> u32 {
        if self.station.phase != Phase::Complete
            || self.station.crafting.is_some()
            || stack.is_empty()
        {
            return 0;
        }
        let matcher = RecipeMatcher::new(self.registry);
        let potion = self.station.potion;

        let transform = if self.station.materials.is_empty() {
            matcher.find_transform(stack, &potion)
        } else {
            None
        };
        if let Some((id, r)) = transform {
            let job = CraftingJob {
                input: stack.with_count(r.input.count),
                output: r.output.clone(),
                progress_ticks: 0,
                total_ticks: r.processing_ticks.max(1),
                active: true,
                kind: JobKind::Transform,
            };
            let taken = job.input.count;
            self.start_job(id, job);
            return taken;
        }

        let staged = &self.station.materials;
        let Some((_, _, need)) = matcher.infusing_demand(staged, stack.kind, &potion) else {
            return 0;
        };
        let want = need
            .saturating_sub(self.station.materials.count_of(stack.kind))
            .min(stack.count);
        let taken = self.station.materials.try_add(&stack.with_count(want));
        if taken == 0 {
            return 0;
        }
        self.events.push(StationEvent::MaterialAdded {
            kind: stack.kind,
            count: taken,
        });

        if let Some((id, r)) = matcher.find_infusing(&self.station.materials, &potion) {
            let first = self.station.materials.get(0).map_or(stack.kind, |s| s.kind);
            let output = match &r.output {
                InfusingOutput::Item(out) => out.clone(),
                InfusingOutput::BindPotion => self.bind_potion(first),
                InfusingOutput::Unbind => ResourceStack::new(first, 1),
            };
            // Staged inputs stay in the materials list until the job finishes.
            let job = CraftingJob {
                input: ResourceStack::new(first, 0),
                output,
                progress_ticks: 0,
                total_ticks: self.config().infusing_ticks,
                active: true,
                kind: JobKind::Infusing,
            };
            self.start_job(id, job);
        } else {
            self.sync();
        }
        taken
    }

    fn start_job(&mut self, recipe: RecipeId, job: CraftingJob) {
        let total_ticks = job.total_ticks;
        self.station.crafting = Some(job);
        self.events.push(StationEvent::CraftingStarted {
            recipe,
            total_ticks,
        });
        self.sync();
    }

    /// One unit of `kind` carrying the station's potion and herb cost.
    fn bind_potion(&self, kind: KindId) -> ResourceStack {
        let potion = &self.station.potion;
        let mut out = ResourceStack::new(kind, 1);
        if let Some(effect) = potion.effect {
            out.set_property(bound::EFFECT, Fixed64::from_num(effect.0));
        }
        out.set_property(bound::COLOR, Fixed64::from_num(potion.color));
        out.set_property(bound::DURATION, Fixed64::from_num(potion.duration_seconds));
        out.set_property(bound::LEVEL, Fixed64::from_num(potion.level));
        for (herb, count) in self.station.last_brewed_herbs.iter() {
            match bound::herb_cost(herb) {
                Some(prop) => out.set_property(prop, Fixed64::from_num(count)),
                None => tracing::warn!(herb = herb.0, "herb id too large to record as a cost"),
            }
        }
        out
    }

    /// Hand out a finished job's output and reset the station.
    pub fn extract_output(&mut self) -> Option<ResourceStack> {
        if self.station.phase != Phase::Complete {
            return None;
        }
        if !self.station.crafting.as_ref().is_some_and(CraftingJob::is_ready) {
            return None;
        }
        let job = self.station.crafting.take()?;
        let output = job.output;
        self.events.push(StationEvent::OutputExtracted {
            kind: output.kind,
            count: output.count,
        });
        self.station.reset();
        self.record_phase_change(Phase::Complete, Phase::Empty);
        self.sync();
        Some(output)
    }

    /// Empty the station from any phase. Returns the stacks handed back:
    /// materials in slot order, then any crafting job stacks.
    pub fn force_reset(&mut self) -> Vec<ResourceStack> {
        let mut returned: Vec<ResourceStack> = self.station.materials.drain();
        if let Some(job) = self.station.crafting.take() {
            returned.extend(job.into_returned());
        }
        let from = self.station.phase;
        self.station.reset();
        self.record_phase_change(from, Phase::Empty);
        self.events.push(StationEvent::Reset {
            returned: returned.len(),
        });
        self.sync();
        returned
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// Advance one simulation tick.
    pub fn tick(&mut self) {
        let has_heat = self.refresh_heat();
        let interval = self.config().sync_interval.max(1);
        match self.station.phase {
            Phase::Brewing if has_heat => {
                self.station.brewing_progress_ticks =
                    self.station.brewing_progress_ticks.saturating_add(1);
                if self.station.brewing_progress_ticks % interval == 0 {
                    self.sync();
                }
            }
            Phase::Complete => self.tick_crafting(has_heat, interval),
            _ => {}
        }
    }

    fn tick_crafting(&mut self, has_heat: bool, interval: u32) {
        let Some(job) = self.station.crafting.as_mut() else {
            return;
        };
        if !job.active || (job.kind.needs_heat() && !has_heat) {
            return;
        }
        job.progress_ticks = job.progress_ticks.saturating_add(1);
        if job.progress_ticks >= job.total_ticks {
            job.active = false;
            job.input.count = 0;
            let (output, count) = (job.output.kind, job.output.count);
            if job.kind == JobKind::Infusing {
                self.station.materials.clear();
            }
            self.events.push(StationEvent::CraftingFinished { output, count });
            self.sync();
        } else if job.progress_ticks % interval == 0 {
            self.sync();
        }
    }
}
