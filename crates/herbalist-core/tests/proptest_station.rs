//! Property-based tests for the brewing station.
//!
//! Uses proptest to drive random operation sequences through the phase
//! state machine, then verify ledger and lifecycle invariants hold.

use herbalist_core::event::EventBuffer;
use herbalist_core::id::KindId;
use herbalist_core::item::ResourceStack;
use herbalist_core::ledger::CountedMap;
use herbalist_core::machine::PhaseStateMachine;
use herbalist_core::property::{HerbRates, compute_final};
use herbalist_core::registry::Registry;
use herbalist_core::station::{BrewingStation, Phase};
use herbalist_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Operations a player (or automation) can attempt on a station.
#[derive(Debug, Clone)]
enum StationOp {
    AddFluid,
    AddMaterial(u32, u32),
    TakeMaterial(bool),
    Begin,
    AddHerb(u32, u32),
    Tick(u32),
    Finish,
    Accept(u32, u32),
    Extract,
    Reset,
}

impl StationOp {
    fn leaves_phase(&self) -> bool {
        matches!(self, StationOp::Extract | StationOp::Reset)
    }
}

fn arb_op() -> impl Strategy<Value = StationOp> {
    prop_oneof![
        Just(StationOp::AddFluid),
        (0..12u32, 1..100u32).prop_map(|(k, c)| StationOp::AddMaterial(k, c)),
        any::<bool>().prop_map(StationOp::TakeMaterial),
        Just(StationOp::Begin),
        (0..12u32, 1..100u32).prop_map(|(k, c)| StationOp::AddHerb(k, c)),
        (1..250u32).prop_map(StationOp::Tick),
        Just(StationOp::Finish),
        (0..12u32, 1..10u32).prop_map(|(k, c)| StationOp::Accept(k, c)),
        Just(StationOp::Extract),
        Just(StationOp::Reset),
    ]
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<StationOp>> {
    proptest::collection::vec(arb_op(), 1..=max_ops)
}

/// Apply one op. Returns whether it reported success.
fn apply(m: &mut PhaseStateMachine<'_, bool>, op: &StationOp) -> bool {
    match *op {
        StationOp::AddFluid => m.add_primary_fluid(),
        StationOp::AddMaterial(k, c) => m.add_material(&ResourceStack::new(KindId(k), c)) > 0,
        StationOp::TakeMaterial(bulk) => m.take_material(bulk).is_some(),
        StationOp::Begin => m.begin_processing(),
        StationOp::AddHerb(k, c) => m.add_herb(KindId(k), c) > 0,
        StationOp::Tick(n) => {
            for _ in 0..n {
                m.tick();
            }
            true
        }
        StationOp::Finish => m.finish_processing(),
        StationOp::Accept(k, c) => m.accept_transform_input(&ResourceStack::new(KindId(k), c)) > 0,
        StationOp::Extract => m.extract_output().is_some(),
        StationOp::Reset => {
            let _ = m.force_reset();
            true
        }
    }
}

fn assert_capacity(station: &BrewingStation) -> Result<(), TestCaseError> {
    prop_assert!(station.materials().len() <= 9);
    for slot in station.materials().iter() {
        prop_assert!(slot.count <= 64);
    }
    for (_, count) in station.herbs().iter() {
        prop_assert!(count <= 64);
    }
    Ok(())
}

fn same_except_heat(a: &BrewingStation, b: &BrewingStation) -> bool {
    a.phase() == b.phase()
        && a.has_primary_fluid() == b.has_primary_fluid()
        && a.materials() == b.materials()
        && a.herbs() == b.herbs()
        && a.potion() == b.potion()
        && a.brewing_progress_ticks() == b.brewing_progress_ticks()
        && a.crafting() == b.crafting()
        && a.last_brewed_herbs() == b.last_brewed_herbs()
}

fn herbs_of(kind: KindId, n: u32) -> CountedMap {
    let mut map = CountedMap::default();
    let _ = map.try_add(kind, n);
    map
}

fn registry() -> Registry {
    brewing_registry()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Ledger capacities hold after any operation sequence.
    #[test]
    fn capacity_invariant(ops in arb_ops(60)) {
        let reg = registry();
        let mut station = BrewingStation::default();
        let mut events = EventBuffer::new(32);
        let mut m = PhaseStateMachine::new(&mut station, &reg, true, &mut events);
        for op in &ops {
            apply(&mut m, op);
            assert_capacity(m.station())?;
        }
    }

    /// Without extract or reset, the phase never moves backwards.
    #[test]
    fn phase_monotonic(ops in arb_ops(60)) {
        let reg = registry();
        let mut station = BrewingStation::default();
        let mut events = EventBuffer::new(32);
        let mut m = PhaseStateMachine::new(&mut station, &reg, true, &mut events);
        let mut last = Phase::Empty;
        for op in ops.iter().filter(|op| !op.leaves_phase()) {
            apply(&mut m, op);
            let now = m.station().phase();
            prop_assert!(now >= last, "phase went from {:?} to {:?} on {:?}", last, now, op);
            last = now;
        }
    }

    /// A refused operation leaves the station exactly as it was.
    #[test]
    fn failed_guards_are_no_ops(ops in arb_ops(60)) {
        let reg = registry();
        let mut station = BrewingStation::default();
        let mut events = EventBuffer::new(32);
        let mut m = PhaseStateMachine::new(&mut station, &reg, true, &mut events);
        m.refresh_heat();
        for op in &ops {
            let before = m.station().clone();
            if !apply(&mut m, op) {
                prop_assert_eq!(m.station(), &before, "refused {:?} mutated the station", op);
            }
        }
    }

    /// With heat flickering between ops, a refused operation changes at most
    /// the cached heat reading, and only to the current answer.
    #[test]
    fn cold_refusals_only_touch_heat_reading(
        steps in proptest::collection::vec((arb_op(), any::<bool>()), 1..=60)
    ) {
        let reg = registry();
        let mut station = BrewingStation::default();
        let mut events = EventBuffer::new(32);
        for (op, heat) in &steps {
            let before = station.clone();
            let ok = apply(&mut PhaseStateMachine::new(&mut station, &reg, *heat, &mut events), op);
            if !ok {
                prop_assert!(
                    same_except_heat(&station, &before),
                    "refused {:?} mutated the station", op
                );
                prop_assert!(
                    station.has_heat_source() == before.has_heat_source()
                        || station.has_heat_source() == *heat
                );
            }
        }
    }

    /// Each overworld herb adds duration up to the cap and never removes any.
    #[test]
    fn duration_monotonic(n in 0..64u32) {
        let reg = registry();
        let rates = HerbRates::default();
        let a = compute_final(&herbs_of(scaleplate(), n), &reg, &rates, None).duration_seconds;
        let b = compute_final(&herbs_of(scaleplate(), n + 1), &reg, &rates, None).duration_seconds;
        prop_assert!(a <= b);
        prop_assert!(b <= rates.max_duration);
        prop_assert!(a >= rates.base_duration);
    }

    /// Level is a step function of nether/end herbs, capped per effect.
    #[test]
    fn level_step_function(n in 0..=64u32) {
        let reg = registry();
        let rates = HerbRates::default();
        let level = compute_final(&herbs_of(burnt_node(), n), &reg, &rates, Some(speed())).level;
        prop_assert_eq!(level, (1 + n / 12).min(4));
        let capped = compute_final(&herbs_of(burnt_node(), n), &reg, &rates, Some(regeneration())).level;
        prop_assert_eq!(capped, (1 + n / 12).min(2));
    }
}
