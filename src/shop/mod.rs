//! Shared state of the barbershop.
//!
//! - [`WaitingRoom`]: bounded admission plus the server's vector clock, behind one mutex
//! - [`RendezvousChannel`]: arrival/completion handoff between clients and the server
//! - [`Shop`]: the context every actor holds (`Arc<Shop>`), adding the release policy, metrics
//!   and an optional observer

mod rendezvous;
mod room;

use std::fmt;
use std::sync::Arc;

pub use rendezvous::RendezvousChannel;
pub use room::{ServiceStart, SlotRelease, WaitingRoom};

use crate::simulation::{SimulationEvent, SimulationMetrics, SimulationObserver};

/// Everything the server and clients share.
pub struct Shop {
    room: WaitingRoom,
    channel: RendezvousChannel,
    release: SlotRelease,
    metrics: Arc<SimulationMetrics>,
    observer: Option<Arc<dyn SimulationObserver>>,
}

impl Shop {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize, release: SlotRelease) -> Self {
        Self {
            room: WaitingRoom::new(capacity),
            channel: RendezvousChannel::new(),
            release,
            metrics: Arc::new(SimulationMetrics::new()),
            observer: None,
        }
    }

    /// Attach an observer for shop events.
    pub fn with_observer(mut self, observer: Arc<dyn SimulationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Report into an existing metrics handle instead of a fresh one.
    pub fn with_metrics(mut self, metrics: Arc<SimulationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn room(&self) -> &WaitingRoom {
        &self.room
    }

    pub fn channel(&self) -> &RendezvousChannel {
        &self.channel
    }

    pub fn release(&self) -> SlotRelease {
        self.release
    }

    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    pub(crate) fn emit(&self, event: SimulationEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

impl fmt::Debug for Shop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shop")
            .field("capacity", &self.room.capacity())
            .field("occupancy", &self.room.occupancy())
            .field("release", &self.release)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}
