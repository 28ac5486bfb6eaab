//! Tests for ConnectionPool
//!
//! These tests verify:
//! - Slot reuse for sequential connections
//! - Capacity doubling on overflow
//! - Reaping and tail trimming
//! - Slot release when a connection thread panics

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender};
use linewire::network::{ConnectionPool, SlotState};

// =============================================================================
// Helper Functions
// =============================================================================

/// Reap until `done` holds, panicking after a deadline
fn reap_until<F: Fn(&ConnectionPool) -> bool>(pool: &mut ConnectionPool, done: F) {
    let start = Instant::now();
    while !done(pool) {
        assert!(start.elapsed() < Duration::from_secs(5), "pool did not settle");
        pool.reap();
        thread::sleep(Duration::from_millis(1));
    }
}

/// Spawn a connection thread that runs until its sender is dropped
fn spawn_held(pool: &mut ConnectionPool) -> (usize, Sender<()>) {
    let (release_tx, release_rx) = channel::bounded::<()>(0);
    let slot = pool
        .spawn(move |_finished| {
            let _ = release_rx.recv();
        })
        .unwrap();
    (slot, release_tx)
}

// =============================================================================
// Slot Reuse Tests
// =============================================================================

#[test]
fn test_new_pool_is_empty() {
    let pool = ConnectionPool::with_capacity(8);

    assert_eq!(pool.live(), 0);
    assert_eq!(pool.active(), 0);
    assert_eq!(pool.capacity(), 8);
    assert_eq!(pool.growths(), 0);
}

#[test]
fn test_sequential_connections_reuse_slot() {
    let mut pool = ConnectionPool::with_capacity(4);

    for _ in 0..4 {
        let slot = pool.spawn(|finished| finished.finish()).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(pool.live(), 1);

        reap_until(&mut pool, |p| p.live() == 0);
    }

    assert_eq!(pool.capacity(), 4);
    assert_eq!(pool.growths(), 0);
}

#[test]
fn test_many_sequential_connections_never_grow() {
    let mut pool = ConnectionPool::with_capacity(2);

    for _ in 0..20 {
        pool.spawn(|_finished| {}).unwrap();
        reap_until(&mut pool, |p| p.live() == 0);
    }

    assert_eq!(pool.capacity(), 2);
    assert_eq!(pool.growths(), 0);
}

#[test]
fn test_reusable_slot_inside_live_range_is_reused() {
    let mut pool = ConnectionPool::with_capacity(4);
    let (first, release_first) = spawn_held(&mut pool);
    let (_second, _hold_second) = spawn_held(&mut pool);

    drop(release_first);
    reap_until(&mut pool, |p| p.slot_state(first) == Some(SlotState::Reusable));
    assert_eq!(pool.live(), 2);

    let (reused, _hold_reused) = spawn_held(&mut pool);
    assert_eq!(reused, first);
    assert_eq!(pool.live(), 2);
    assert_eq!(pool.active(), 2);
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_overflow_doubles_capacity_once() {
    let mut pool = ConnectionPool::with_capacity(4);
    let mut held = Vec::new();

    for _ in 0..4 {
        held.push(spawn_held(&mut pool));
    }
    assert_eq!(pool.capacity(), 4);
    assert_eq!(pool.growths(), 0);

    held.push(spawn_held(&mut pool));
    assert_eq!(pool.capacity(), 8);
    assert_eq!(pool.growths(), 1);
    assert_eq!(pool.live(), 5);

    for _ in 0..3 {
        held.push(spawn_held(&mut pool));
    }
    assert_eq!(pool.growths(), 1);

    held.push(spawn_held(&mut pool));
    assert_eq!(pool.capacity(), 16);
    assert_eq!(pool.growths(), 2);
    assert_eq!(pool.active(), 9);

    held.clear();
    reap_until(&mut pool, |p| p.live() == 0);
    assert_eq!(pool.capacity(), 16);
}

#[test]
fn test_slot_ids_are_distinct_while_active() {
    let mut pool = ConnectionPool::with_capacity(2);
    let held: Vec<_> = (0..6).map(|_| spawn_held(&mut pool)).collect();

    let mut ids: Vec<usize> = held.iter().map(|(slot, _)| *slot).collect();
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
}

// =============================================================================
// Reap Tests
// =============================================================================

#[test]
fn test_reap_trims_only_trailing_slots() {
    let mut pool = ConnectionPool::with_capacity(4);
    let (_a, _hold_a) = spawn_held(&mut pool);
    let (b, release_b) = spawn_held(&mut pool);
    let (c, release_c) = spawn_held(&mut pool);

    // Middle slot finishing keeps the live range
    drop(release_b);
    reap_until(&mut pool, |p| p.slot_state(b) == Some(SlotState::Reusable));
    assert_eq!(pool.live(), 3);

    // Tail slot finishing trims back past the reusable middle slot
    drop(release_c);
    reap_until(&mut pool, |p| p.slot_state(c).is_none());
    assert_eq!(pool.live(), 1);
    assert_eq!(pool.slot_state(0), Some(SlotState::Active));
}

#[test]
fn test_reap_reports_joined_count() {
    let mut pool = ConnectionPool::with_capacity(4);
    let (release_tx, release_rx) = channel::unbounded::<()>();
    let (done_tx, done_rx) = channel::unbounded::<()>();

    for _ in 0..3 {
        let release_rx = release_rx.clone();
        let done_tx = done_tx.clone();
        pool.spawn(move |finished| {
            let _ = release_rx.recv();
            finished.finish();
            let _ = done_tx.send(());
        })
        .unwrap();
    }

    assert_eq!(pool.reap(), 0);

    drop(release_tx);
    for _ in 0..3 {
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    assert_eq!(pool.reap(), 3);
    assert_eq!(pool.live(), 0);
}

#[test]
fn test_unbound_slot_stays_reusable() {
    let mut pool = ConnectionPool::with_capacity(4);

    let id = pool.acquire_slot().id();
    assert_eq!(id, 0);
    assert_eq!(pool.slot_state(0), Some(SlotState::Reusable));
    assert_eq!(pool.active(), 0);

    pool.reap();
    assert_eq!(pool.live(), 0);
}

#[test]
fn test_stale_finish_signal_ignored_after_reuse() {
    let mut pool = ConnectionPool::with_capacity(4);

    // Signal from an acquisition that never got bound
    {
        let vacant = pool.acquire_slot();
        drop(vacant.finish_signal());
    }

    let (slot, release) = spawn_held(&mut pool);
    assert_eq!(slot, 0);

    assert_eq!(pool.reap(), 0);
    assert_eq!(pool.slot_state(0), Some(SlotState::Active));
    assert_eq!(pool.active(), 1);

    drop(release);
    reap_until(&mut pool, |p| p.live() == 0);
}

#[test]
fn test_finish_signal_from_previous_tenant_ignored() {
    let mut pool = ConnectionPool::with_capacity(4);

    let stale = pool.acquire_slot().finish_signal();
    let (slot, release) = spawn_held(&mut pool);
    assert_eq!(slot, 0);

    stale.finish();
    assert_eq!(pool.reap(), 0);
    assert_eq!(pool.slot_state(0), Some(SlotState::Active));

    drop(release);
    reap_until(&mut pool, |p| p.live() == 0);
}

#[test]
fn test_panicking_connection_releases_slot() {
    let mut pool = ConnectionPool::with_capacity(4);

    pool.spawn(|_finished| panic!("connection handler failed")).unwrap();

    reap_until(&mut pool, |p| p.live() == 0);
    assert_eq!(pool.active(), 0);
}
