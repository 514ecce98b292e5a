//! Property-based tests for the time model and the timezone set
//!
//! Fixed-offset zones are used where the property only holds away from DST
//! transitions.

use std::sync::Arc;

use proptest::prelude::*;
use worldclock_core::testing::ManualClock;
use worldclock_core::{
    project, CityData, EntryId, LocalStore, MemoryStore, StaticCityTable, TimeModel,
    TimezoneSetController,
};

const MINUTE_MS: i64 = 60_000;

/// Zones without daylight saving time
const FIXED_ZONES: &[&str] = &[
    "UTC",
    "Asia/Dhaka",
    "Asia/Tokyo",
    "Asia/Kolkata",
    "Asia/Kathmandu",
    "Asia/Singapore",
    "Africa/Nairobi",
    "America/Bogota",
    "Pacific/Honolulu",
    "Etc/GMT+6",
];

// ============================================================================
// Strategies
// ============================================================================

/// Instants between 2000-01-01 and 2040-01-01
fn instant_strategy() -> impl Strategy<Value = i64> {
    946_684_800_000i64..2_208_988_800_000i64
}

fn zone_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FIXED_ZONES.to_vec())
}

fn slider_strategy() -> impl Strategy<Value = i64> {
    0i64..1440
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
    Update(usize, usize),
    Select(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..64).prop_map(Op::Add),
        2 => (0usize..16).prop_map(Op::Remove),
        1 => (0usize..16, 0usize..64).prop_map(|(i, c)| Op::Update(i, c)),
        1 => (0usize..16).prop_map(Op::Select),
    ]
}

fn pick(controller: &TimezoneSetController, i: usize) -> EntryId {
    let entries = controller.entries();
    entries[i % entries.len()].id.clone()
}

fn apply(controller: &mut TimezoneSetController, table: &StaticCityTable, op: &Op) {
    let cities: Vec<&CityData> = table.iter().collect();
    match op {
        Op::Add(c) => {
            let _ = controller.add(cities[c % cities.len()].clone());
        }
        Op::Remove(i) => {
            let id = pick(controller, *i);
            let _ = controller.remove(&id);
        }
        Op::Update(i, c) => {
            let id = pick(controller, *i);
            let patch = worldclock_core::EntryPatch::from_city(cities[c % cities.len()]);
            let _ = controller.update(&id, patch);
        }
        Op::Select(i) => {
            let id = pick(controller, *i);
            controller.set_selected(Some(id));
        }
    }
}

// ============================================================================
// Time Model Properties
// ============================================================================

proptest! {
    /// After dragging A to `m`, A shows `m` and every other zone moved by the
    /// same number of milliseconds.
    #[test]
    fn prop_offset_consistency(
        now in instant_strategy(),
        zone_a in zone_strategy(),
        zone_b in zone_strategy(),
        minutes in slider_strategy(),
    ) {
        let clock = ManualClock::new(now);
        let mut model = TimeModel::new(Arc::new(clock));
        let before = model.base_time();
        let current_a = model.slider_minutes(zone_a).unwrap();
        let before_b = project(before, zone_b).unwrap();

        model.drag_slider(zone_a, minutes).unwrap();

        let after = model.base_time();
        prop_assert_eq!(model.project(zone_a).unwrap().minutes_of_day(), minutes);
        prop_assert_eq!(after - before, (minutes - current_a) * MINUTE_MS);
        prop_assert_eq!(model.time_offset(), after - now);

        let after_b = project(after, zone_b).unwrap();
        let moved = (after_b.minutes_of_day() - before_b.minutes_of_day()).rem_euclid(1440);
        prop_assert_eq!(moved, (minutes - current_a).rem_euclid(1440));
    }

    #[test]
    fn prop_unchanged_drag_is_noop(
        now in instant_strategy(),
        zone in zone_strategy(),
    ) {
        let mut model = TimeModel::new(Arc::new(ManualClock::new(now)));
        let current = model.slider_minutes(zone).unwrap();

        prop_assert!(!model.drag_slider(zone, current).unwrap());
        prop_assert_eq!(model.time_offset(), 0);
        prop_assert_eq!(model.base_time(), now);
    }

    #[test]
    fn prop_reset_is_idempotent(
        now in instant_strategy(),
        zone in zone_strategy(),
        minutes in slider_strategy(),
    ) {
        let mut model = TimeModel::new(Arc::new(ManualClock::new(now)));
        model.drag_slider(zone, minutes).unwrap();

        model.reset();
        let once = (model.base_time(), model.time_offset());
        model.reset();

        prop_assert_eq!((model.base_time(), model.time_offset()), once);
        prop_assert_eq!(once, (now, 0));
    }
}

// ============================================================================
// Timezone Set Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No sequence of operations removes the home entry or empties the set.
    #[test]
    fn prop_home_entry_always_present(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let table = StaticCityTable::builtin();
        let clock = ManualClock::new(1_705_298_400_000);
        let mut controller = TimezoneSetController::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticCityTable::builtin()),
            Arc::new(clock),
        );
        controller.initialize("Asia/Dhaka");

        for op in &ops {
            apply(&mut controller, &table, op);
            prop_assert!(!controller.is_empty());
            prop_assert!(controller.get(&EntryId::home()).is_some());
            if let Some(selected) = controller.selected() {
                prop_assert!(controller.get(selected).is_some());
            }
        }
    }

    /// Whatever the set ends up as, reloading from the same store yields it.
    #[test]
    fn prop_persistence_round_trip(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let table = StaticCityTable::builtin();
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_705_298_400_000);
        let mut controller = TimezoneSetController::new(
            Arc::new(store.clone()),
            Arc::new(StaticCityTable::builtin()),
            Arc::new(clock.clone()),
        );
        controller.initialize("Asia/Dhaka");
        for op in &ops {
            apply(&mut controller, &table, op);
        }

        let stored = store.load_entries().unwrap().unwrap();
        prop_assert_eq!(stored.as_slice(), controller.entries());

        let mut reloaded = TimezoneSetController::new(
            Arc::new(store.clone()),
            Arc::new(StaticCityTable::builtin()),
            Arc::new(clock),
        );
        reloaded.initialize("Asia/Dhaka");
        prop_assert_eq!(reloaded.entries(), controller.entries());
    }
}
