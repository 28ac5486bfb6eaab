//! Connection Pool
//!
//! Arena of connection-thread slots indexed by slot id.
//!
//! ## Slot lifecycle
//! ```text
//!   Reusable ──bind──▶ Active ──finish signal──▶ Finished ──reap/join──▶ Reusable
//! ```
//!
//! The pool itself is owned by the accepting thread. Connection threads only
//! report completion, through a channel, so no slot is ever shared mutably.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::{LinewireError, Result};

/// Index of a slot in the pool
pub type SlotId = usize;

/// Slot id plus the acquisition it belongs to
type Tenancy = (SlotId, u64);

/// Lifecycle state of a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Bound to a running connection thread
    Active,
    /// Connection ended, thread not yet joined
    Finished,
    /// Joined (or never bound); free for a new connection
    Reusable,
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    handle: Option<JoinHandle<()>>,

    /// Bumped on every acquisition; stale finish signals carry an older value
    generation: u64,
}

impl Slot {
    fn vacant() -> Self {
        Self {
            state: SlotState::Reusable,
            handle: None,
            generation: 0,
        }
    }
}

/// Tells the pool that the connection in a slot has ended
///
/// Sent exactly once: explicitly via [`FinishSignal::finish`] or on drop, so a
/// panicking connection thread still releases its slot. A signal only
/// affects the acquisition it was created for; once the slot has been handed
/// out again, the pool ignores it.
#[derive(Debug)]
pub struct FinishSignal {
    slot: SlotId,
    generation: u64,
    tx: Option<Sender<Tenancy>>,
}

impl FinishSignal {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn finish(mut self) {
        self.send();
    }

    fn send(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The pool may already be gone after Server::close
            let _ = tx.send((self.slot, self.generation));
        }
    }
}

impl Drop for FinishSignal {
    fn drop(&mut self) {
        self.send();
    }
}

/// A slot reserved by [`ConnectionPool::acquire_slot`]
///
/// Must be bound to a thread handle to become active. Dropping it unbound
/// leaves the slot reusable.
#[derive(Debug)]
pub struct VacantSlot<'a> {
    pool: &'a mut ConnectionPool,
    id: SlotId,
}

impl VacantSlot<'_> {
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Signal the thread bound to this slot must fire when it ends
    pub fn finish_signal(&self) -> FinishSignal {
        FinishSignal {
            slot: self.id,
            generation: self.pool.slots[self.id].generation,
            tx: Some(self.pool.finished_tx.clone()),
        }
    }

    /// Mark the slot active and take ownership of its thread handle
    pub fn bind(self, handle: JoinHandle<()>) -> SlotId {
        let slot = &mut self.pool.slots[self.id];
        slot.state = SlotState::Active;
        slot.handle = Some(handle);
        self.id
    }
}

/// Tracks live connection threads and recycles their slots
#[derive(Debug)]
pub struct ConnectionPool {
    /// Physical slot storage; only `slots[..live]` is scanned
    slots: Vec<Slot>,

    /// Logical number of slots in use (trailing reusable slots trimmed)
    live: usize,

    /// Current capacity; doubles when exhausted
    capacity: usize,

    /// Number of capacity doublings so far
    growths: usize,

    finished_tx: Sender<Tenancy>,
    finished_rx: Receiver<Tenancy>,
}

impl ConnectionPool {
    /// Create a pool with the given initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (finished_tx, finished_rx) = channel::unbounded();

        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
            capacity,
            growths: 0,
            finished_tx,
            finished_rx,
        }
    }

    /// Reserve a slot for a new connection
    ///
    /// Reuses the first reusable slot in the live range. Otherwise extends the
    /// live range by one, doubling capacity first if the pool is full.
    pub fn acquire_slot(&mut self) -> VacantSlot<'_> {
        let reusable = self.slots[..self.live]
            .iter()
            .position(|slot| slot.state == SlotState::Reusable);

        let id = match reusable {
            Some(id) => id,
            None => {
                if self.live >= self.capacity {
                    self.grow();
                }
                if self.live == self.slots.len() {
                    self.slots.push(Slot::vacant());
                }
                self.live += 1;
                self.live - 1
            }
        };

        self.slots[id].generation += 1;
        VacantSlot { pool: self, id }
    }

    /// Acquire a slot and run `f` on a new thread bound to it
    ///
    /// `f` receives the slot's finish signal; it fires when `f` returns or
    /// unwinds, whichever comes first.
    pub fn spawn<F>(&mut self, f: F) -> Result<SlotId>
    where
        F: FnOnce(FinishSignal) + Send + 'static,
    {
        let vacant = self.acquire_slot();
        let signal = vacant.finish_signal();

        let handle = thread::Builder::new()
            .name(format!("linewire-conn-{}", vacant.id()))
            .spawn(move || f(signal))
            .map_err(LinewireError::Spawn)?;

        Ok(vacant.bind(handle))
    }

    /// Join finished connection threads and reclaim their slots
    ///
    /// Trailing reusable slots are then trimmed from the live range. Returns
    /// the number of threads joined.
    pub fn reap(&mut self) -> usize {
        for (id, generation) in self.finished_rx.try_iter() {
            if let Some(slot) = self.slots.get_mut(id) {
                if slot.state == SlotState::Active && slot.generation == generation {
                    slot.state = SlotState::Finished;
                }
            }
        }

        let mut joined = 0;
        for (id, slot) in self.slots[..self.live].iter_mut().enumerate() {
            if slot.state != SlotState::Finished {
                continue;
            }

            if let Some(handle) = slot.handle.take() {
                if handle.join().is_err() {
                    tracing::warn!(slot = id, "Connection thread panicked");
                }
            }
            slot.state = SlotState::Reusable;
            joined += 1;
        }

        while self.live > 0 && self.slots[self.live - 1].state == SlotState::Reusable {
            self.live -= 1;
        }

        if joined > 0 {
            tracing::trace!(joined, live = self.live, "Reaped connection slots");
        }

        joined
    }

    fn grow(&mut self) {
        self.capacity *= 2;
        self.slots.reserve_exact(self.capacity - self.slots.len());
        self.growths += 1;
        tracing::debug!(capacity = self.capacity, "Connection pool grew");
    }

    /// Logical number of slots in use
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of times the capacity has doubled
    pub fn growths(&self) -> usize {
        self.growths
    }

    /// Number of slots bound to a connection that has not been reaped
    pub fn active(&self) -> usize {
        self.slots[..self.live]
            .iter()
            .filter(|slot| slot.state != SlotState::Reusable)
            .count()
    }

    /// State of a slot, if it is inside the live range
    pub fn slot_state(&self, id: SlotId) -> Option<SlotState> {
        self.slots[..self.live].get(id).map(|slot| slot.state)
    }
}
