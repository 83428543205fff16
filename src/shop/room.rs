use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::clock::{VectorClock, SERVER_SLOT};
use crate::error::{SimulationError, SimulationResult};

/// When an admitted client's waiting slot is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotRelease {
    /// The server frees one slot when it starts serving *someone*.
    ///
    /// Slots are pooled: the freed slot is not necessarily the one taken by the client being
    /// served.
    #[default]
    OnServiceStart,
    /// Each client frees its own slot after its clock exchange with the server.
    OnClientDone,
}

/// What the server observed when it began a service cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStart {
    /// Occupancy after the server claimed its customer.
    pub occupancy: usize,
    /// Server clock after its local increment.
    pub server_clock: VectorClock,
}

struct RoomState {
    occupancy: usize,
    server_clock: VectorClock,
}

/// Bounded waiting room.
///
/// Occupancy and the server's vector clock live behind one mutex, so admission, service start
/// and clock exchange are serialized against each other. No caller holds this lock across a
/// blocking wait.
pub struct WaitingRoom {
    capacity: usize,
    state: Mutex<RoomState>,
}

impl WaitingRoom {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            capacity,
            state: Mutex::new(RoomState {
                occupancy: 0,
                server_clock: VectorClock::pair(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn occupancy(&self) -> usize {
        self.lock().occupancy
    }

    pub fn server_clock(&self) -> VectorClock {
        self.lock().server_clock.clone()
    }

    /// Take a slot without blocking.
    ///
    /// Returns the occupancy including the new arrival, or [`SimulationError::RoomFull`].
    pub fn try_enter(&self) -> SimulationResult<usize> {
        let mut g = self.lock();
        if g.occupancy < self.capacity {
            g.occupancy += 1;
            Ok(g.occupancy)
        } else {
            Err(SimulationError::RoomFull {
                capacity: self.capacity,
            })
        }
    }

    /// Hand back a slot previously taken with [`Self::try_enter`].
    ///
    /// Returns the remaining occupancy, or [`SimulationError::EmptyRoom`] if there was no slot to
    /// hand back.
    pub fn leave(&self) -> SimulationResult<usize> {
        let mut g = self.lock();
        if g.occupancy == 0 {
            return Err(SimulationError::EmptyRoom);
        }
        g.occupancy -= 1;
        Ok(g.occupancy)
    }

    /// Server-side start of a service cycle.
    pub fn begin_service(&self, release: SlotRelease) -> ServiceStart {
        let mut g = self.lock();
        if release == SlotRelease::OnServiceStart {
            // An arrival signal always follows a successful try_enter, so a slot is held here.
            g.occupancy = g.occupancy.saturating_sub(1);
        }
        g.server_clock.increment(SERVER_SLOT);
        ServiceStart {
            occupancy: g.occupancy,
            server_clock: g.server_clock.clone(),
        }
    }

    /// Merge `client_clock` into the server clock, then the server clock back into
    /// `client_clock`, as one critical section.
    ///
    /// Returns `(server_clock, client_clock)` after the exchange.
    pub fn exchange_clocks(&self, client_clock: &mut VectorClock) -> (VectorClock, VectorClock) {
        let mut g = self.lock();
        g.server_clock.merge(client_clock);
        client_clock.merge(&g.server_clock);
        (g.server_clock.clone(), client_clock.clone())
    }

    fn lock(&self) -> MutexGuard<'_, RoomState> {
        // Every critical section leaves the state consistent, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
