//! End-to-end scenarios for the dashboard core
//!
//! These drive the time model and the controller together the way a mounted
//! timezone view does, with an injected clock and paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use worldclock_core::testing::{ManualClock, MemoryRemote};
use worldclock_core::{
    CityData, ClockError, Dashboard, EntryId, LocalStore, MemoryStore, StaticCityTable, Storage,
    SyncEvent, TimezoneEntry, TimezoneSetController,
};

/// 2024-01-15T06:00:00Z: 12:00 in Dhaka
const NOON_DHAKA: i64 = 1_705_298_400_000;

const QUIET: Duration = Duration::from_secs(1);

// ============================================================================
// Test Utilities
// ============================================================================

fn controller(store: Arc<dyn LocalStore>, clock: &ManualClock) -> TimezoneSetController {
    TimezoneSetController::new(
        store,
        Arc::new(StaticCityTable::builtin()),
        Arc::new(clock.clone()),
    )
}

fn dhaka_dashboard() -> (Dashboard, ManualClock) {
    let clock = ManualClock::new(NOON_DHAKA);
    let mut controller = controller(Arc::new(MemoryStore::new()), &clock);
    controller.initialize("Asia/Dhaka");
    (
        Dashboard::new(controller, Arc::new(clock.clone()), Duration::from_secs(1)),
        clock,
    )
}

fn new_york() -> CityData {
    CityData::new("New York", "United States", "America/New_York")
}

// ============================================================================
// Time Model Scenarios
// ============================================================================

/// Home is Dhaka at 12:00; New York shows 01:00; dragging Dhaka to 15:00
/// moves New York to 04:00 and the offset to exactly three hours.
#[test]
fn test_dhaka_new_york_drag() {
    let (mut dashboard, _clock) = dhaka_dashboard();
    let ny = dashboard.controller_mut().add(new_york()).unwrap();

    assert_eq!(dashboard.card(&ny).unwrap().time.hh_mm(), "01:00");

    dashboard.drag(&EntryId::home(), 15 * 60).unwrap();

    assert_eq!(dashboard.card(&EntryId::home()).unwrap().time.hh_mm(), "15:00");
    assert_eq!(dashboard.card(&ny).unwrap().time.hh_mm(), "04:00");
    assert_eq!(dashboard.time_offset(), 10_800_000);
}

#[tokio::test(start_paused = true)]
async fn test_dragged_time_keeps_running() {
    let (mut dashboard, clock) = dhaka_dashboard();
    dashboard.mount().await;
    dashboard.drag(&EntryId::home(), 15 * 60).unwrap();

    clock.advance(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let home = dashboard.card(&EntryId::home()).unwrap();
    assert_eq!(home.time.hh_mm(), "15:01");
    assert_eq!(dashboard.time_offset(), 10_800_000);
    dashboard.unmount();
}

#[test]
fn test_reset_twice_returns_to_real_time() {
    let (mut dashboard, clock) = dhaka_dashboard();
    dashboard.drag(&EntryId::home(), 3 * 60).unwrap();
    clock.advance(Duration::from_millis(700));

    dashboard.reset_time();
    assert_eq!(dashboard.time_offset(), 0);
    dashboard.reset_time();
    assert_eq!(dashboard.time_offset(), 0);
    assert_eq!(dashboard.base_time(), NOON_DHAKA + 700);
}

#[test]
fn test_repeated_identical_drag_does_not_jitter() {
    let (mut dashboard, _clock) = dhaka_dashboard();

    assert!(dashboard.drag(&EntryId::home(), 15 * 60).unwrap());
    let offset = dashboard.time_offset();
    for _ in 0..10 {
        assert!(!dashboard.drag(&EntryId::home(), 15 * 60).unwrap());
    }
    assert_eq!(dashboard.time_offset(), offset);
}

// ============================================================================
// Collection Scenarios
// ============================================================================

#[test]
fn test_home_entry_survives_any_removal_sequence() {
    let (mut dashboard, _clock) = dhaka_dashboard();
    let table = StaticCityTable::builtin();
    let mut ids = Vec::new();
    for city in table.iter().take(8) {
        ids.push(dashboard.controller_mut().add(city.clone()).unwrap());
    }

    for id in &ids {
        assert!(matches!(
            dashboard.controller_mut().remove(&EntryId::home()),
            Err(ClockError::RemovalRefused(_))
        ));
        dashboard.controller_mut().remove(id).unwrap();
    }

    let controller = dashboard.controller();
    assert_eq!(controller.len(), 1);
    assert!(controller.entries()[0].is_home());
    assert!(dashboard.controller_mut().remove(&EntryId::home()).is_err());
}

#[test]
fn test_persisted_set_reloads_identically() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::new(NOON_DHAKA);

    let saved = {
        let storage = Storage::open_in(temp_dir.path()).unwrap();
        let mut controller = controller(Arc::new(storage), &clock);
        controller.initialize("Asia/Dhaka");
        controller.add(new_york()).unwrap();
        clock.advance(Duration::from_millis(5));
        let tokyo = controller
            .add(CityData::new("Tokyo", "Japan", "Asia/Tokyo"))
            .unwrap();
        controller
            .update(
                &tokyo,
                worldclock_core::EntryPatch::from_city(&CityData::new(
                    "Osaka",
                    "Japan",
                    "Asia/Tokyo",
                )),
            )
            .unwrap();
        controller.entries().to_vec()
    };

    let storage = Storage::open_in(temp_dir.path()).unwrap();
    let mut reloaded = controller(Arc::new(storage), &clock);
    reloaded.initialize("Europe/London");

    assert_eq!(reloaded.entries(), saved.as_slice());
}

// ============================================================================
// Sync Scenarios
// ============================================================================

/// Without a remote, edits only touch the local tier.
#[tokio::test(start_paused = true)]
async fn test_unauthenticated_session_makes_no_network_calls() {
    let remote = MemoryRemote::new();
    let store = MemoryStore::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut controller = controller(Arc::new(store.clone()), &clock);
    controller.initialize("Asia/Dhaka");

    let id = controller.add(new_york()).unwrap();
    controller.set_selected(Some(EntryId::home()));
    controller.remove(&id).unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(remote.fetch_calls(), 0);
    assert_eq!(remote.push_count(), 0);
    assert_eq!(store.load_entries().unwrap().unwrap().len(), 1);
}

/// Empty remote on first load gets the local set once; a later edit is
/// pushed once after a second of inactivity.
#[tokio::test(start_paused = true)]
async fn test_authenticated_empty_remote_seed_then_one_push() {
    let remote = MemoryRemote::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut controller = controller(Arc::new(MemoryStore::new()), &clock);
    controller.initialize("Asia/Dhaka");

    controller.attach_remote(Arc::new(remote.clone()), QUIET).await;
    assert_eq!(remote.fetch_calls(), 1);
    assert_eq!(remote.push_count(), 1);

    controller.add(new_york()).unwrap();
    tokio::time::sleep(QUIET + Duration::from_millis(100)).await;

    assert_eq!(remote.push_count(), 2);
    assert_eq!(remote.pushes()[1], controller.entries().to_vec());

    tokio::time::sleep(QUIET * 5).await;
    assert_eq!(remote.push_count(), 2);
}

/// N edits inside the quiet window produce one push carrying the final state.
#[tokio::test(start_paused = true)]
async fn test_rapid_edits_coalesce_into_final_state() {
    let remote = MemoryRemote::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut controller = controller(Arc::new(MemoryStore::new()), &clock);
    controller.initialize("Asia/Dhaka");
    controller.attach_remote(Arc::new(remote.clone()), QUIET).await;
    let mut events = controller.subscribe_sync().unwrap();
    let seeded = remote.push_count();

    let table = StaticCityTable::builtin();
    for city in table.iter().skip(3).take(6) {
        controller.add(city.clone()).unwrap();
        clock.advance(Duration::from_millis(200));
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    let first = controller.entries()[1].id.clone();
    controller.remove(&first).unwrap();

    tokio::time::sleep(QUIET * 3).await;

    assert_eq!(remote.push_count(), seeded + 1);
    let pushed = remote.pushes().pop().unwrap();
    assert_eq!(pushed, controller.entries().to_vec());
    assert_eq!(pushed.len(), 6);
    assert_eq!(events.recv().await.unwrap(), SyncEvent::Pushed { count: 6 });
}

/// A non-empty remote wins over whatever was stored locally.
#[tokio::test(start_paused = true)]
async fn test_non_empty_remote_replaces_local() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut controller = controller(Arc::new(store.clone()), &clock);
    controller.initialize("Asia/Dhaka");
    controller.add(new_york()).unwrap();

    let remote_set = vec![
        TimezoneEntry::new(EntryId::home(), "Dhaka", "Bangladesh", "Asia/Dhaka"),
        TimezoneEntry::new(EntryId::from("cairo-7"), "Cairo", "Egypt", "Africa/Cairo"),
        TimezoneEntry::new(EntryId::from("lagos-8"), "Lagos", "Nigeria", "Africa/Lagos"),
    ];
    let remote = MemoryRemote::with_entries(&remote_set);

    controller.attach_remote(Arc::new(remote.clone()), QUIET).await;

    assert_eq!(controller.entries(), remote_set.as_slice());
    assert_eq!(store.load_entries().unwrap().unwrap(), remote_set);
    assert_eq!(remote.push_count(), 0);
}

/// A failed push leaves local state alone; the next edit reconciles.
#[tokio::test(start_paused = true)]
async fn test_failed_push_recovers_on_next_edit() {
    let remote = MemoryRemote::new();
    let store = MemoryStore::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut controller = controller(Arc::new(store.clone()), &clock);
    controller.initialize("Asia/Dhaka");
    controller.attach_remote(Arc::new(remote.clone()), QUIET).await;

    remote.set_failing(true);
    controller.add(new_york()).unwrap();
    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(remote.push_count(), 1);
    assert_eq!(store.load_entries().unwrap().unwrap().len(), 2);

    remote.set_failing(false);
    controller
        .add(CityData::new("Tokyo", "Japan", "Asia/Tokyo"))
        .unwrap();
    tokio::time::sleep(QUIET * 2).await;

    assert_eq!(remote.push_count(), 2);
    assert_eq!(remote.records().len(), 3);
}

fn synced_dashboard(remote: &MemoryRemote, clock: &ManualClock) -> Dashboard {
    let mut controller = controller(Arc::new(MemoryStore::new()), clock);
    controller.initialize("Asia/Dhaka");
    Dashboard::new(controller, Arc::new(clock.clone()), Duration::from_secs(1))
        .with_remote(Arc::new(remote.clone()), QUIET)
}

/// Unmounting cancels the pending push.
#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_pending_push() {
    let remote = MemoryRemote::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut dashboard = synced_dashboard(&remote, &clock);
    dashboard.mount().await;
    assert_eq!(remote.push_count(), 1);

    dashboard.controller_mut().add(new_york()).unwrap();
    dashboard.unmount();
    tokio::time::sleep(QUIET * 3).await;

    assert_eq!(remote.push_count(), 1);
    assert!(!dashboard.is_mounted());
    assert!(!dashboard.controller().is_remote_attached());
}

/// Nothing is fetched before the first mount.
#[tokio::test(start_paused = true)]
async fn test_remote_is_untouched_until_mount() {
    let remote = MemoryRemote::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut dashboard = synced_dashboard(&remote, &clock);

    assert_eq!(remote.fetch_calls(), 0);
    dashboard.mount().await;
    assert_eq!(remote.fetch_calls(), 1);
    assert!(dashboard.controller().is_remote_attached());
}

/// A remounted dashboard fetches again and keeps pushing edits.
#[tokio::test(start_paused = true)]
async fn test_remount_resumes_sync() {
    let remote = MemoryRemote::new();
    let clock = ManualClock::new(NOON_DHAKA);
    let mut dashboard = synced_dashboard(&remote, &clock);

    dashboard.mount().await;
    dashboard.unmount();
    dashboard.mount().await;

    assert_eq!(remote.fetch_calls(), 2);
    assert!(dashboard.controller().is_remote_attached());
    // The second fetch adopted the seeded set without pushing it back
    assert_eq!(remote.push_count(), 1);

    dashboard
        .controller_mut()
        .add(CityData::new("Tokyo", "Japan", "Asia/Tokyo"))
        .unwrap();
    tokio::time::sleep(QUIET * 5).await;

    assert_eq!(remote.push_count(), 2);
    assert_eq!(remote.pushes()[1], dashboard.controller().entries().to_vec());
}
