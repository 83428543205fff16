use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::clock::{VectorClock, CLIENT_SLOT};
use crate::shop::{Shop, SlotRelease};
use crate::simulation::SimulationEvent;

/// How a client's visit ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClientStatus {
    /// Admitted, served, and clocks exchanged with the server.
    Served { waited: Duration },
    /// The room was full on arrival.
    Balked,
    /// Admitted, but the shop closed before service completed.
    Abandoned,
}

/// Result of [`ClientActor::visit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientOutcome {
    pub id: usize,
    pub status: ClientStatus,
    /// The client's clock at the end of the visit.
    pub clock: VectorClock,
}

impl ClientOutcome {
    pub fn is_served(&self) -> bool {
        matches!(self.status, ClientStatus::Served { .. })
    }

    pub fn is_balked(&self) -> bool {
        matches!(self.status, ClientStatus::Balked)
    }
}

/// A short-lived customer.
///
/// `Arrived -> (Admitted | Balked) -> Waiting -> Served -> Done`.
pub struct ClientActor {
    id: usize,
    shop: Arc<Shop>,
    clock: VectorClock,
}

impl ClientActor {
    pub fn new(id: usize, shop: Arc<Shop>) -> Self {
        Self {
            id,
            shop,
            clock: VectorClock::pair(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Try to get served once. A full room is not retried.
    pub fn visit(mut self) -> ClientOutcome {
        let id = self.id;
        self.shop.metrics().on_arrival();
        self.shop.emit(SimulationEvent::ClientArrived { client: id });

        let Ok(occupancy) = self.shop.room().try_enter() else {
            // RoomFull is the only rejection, so the room sits at capacity.
            let capacity = self.shop.room().capacity();
            return self.balk(capacity);
        };

        self.clock.increment(CLIENT_SLOT);
        self.shop.metrics().on_admitted(occupancy);
        self.shop.emit(SimulationEvent::ClientAdmitted {
            client: id,
            occupancy,
            clock: self.clock.clone(),
        });
        let wait_start = Instant::now();

        self.shop.channel().signal_arrival();
        if self.shop.channel().wait_completion().is_err() {
            self.shop.metrics().on_abandoned();
            self.shop.emit(SimulationEvent::ClientAbandoned { client: id });
            return self.finish(ClientStatus::Abandoned);
        }

        let waited = wait_start.elapsed();
        self.shop.metrics().on_client_served(waited);
        self.shop.emit(SimulationEvent::ClientServed { client: id, waited });

        let (server_clock, client_clock) = self.shop.room().exchange_clocks(&mut self.clock);
        self.shop.emit(SimulationEvent::ClocksMerged {
            client: id,
            server_clock,
            client_clock,
        });

        if self.shop.release() == SlotRelease::OnClientDone {
            self.release_slot();
        }

        self.finish(ClientStatus::Served { waited })
    }

    /// Hand back the slot taken by this client's own `try_enter`.
    fn release_slot(&self) {
        let left = self.shop.room().leave();
        debug_assert!(
            left.is_ok(),
            "client c{} released a slot it did not hold: {left:?}",
            self.id
        );
    }

    fn balk(self, occupancy: usize) -> ClientOutcome {
        self.shop.metrics().on_balked();
        self.shop.emit(SimulationEvent::ClientBalked {
            client: self.id,
            occupancy,
        });
        self.finish(ClientStatus::Balked)
    }

    fn finish(self, status: ClientStatus) -> ClientOutcome {
        ClientOutcome {
            id: self.id,
            status,
            clock: self.clock,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ClientActor, ClientStatus};
    use crate::shop::{Shop, SlotRelease};

    #[test]
    fn full_room_balks_without_touching_the_clock() {
        let shop = Arc::new(Shop::new(1, SlotRelease::OnServiceStart));
        shop.room().try_enter().unwrap();

        let out = ClientActor::new(7, Arc::clone(&shop)).visit();
        assert_eq!(out.id, 7);
        assert_eq!(out.status, ClientStatus::Balked);
        assert_eq!(out.clock.as_slice(), &[0, 0]);
        assert_eq!(shop.room().occupancy(), 1);
        assert_eq!(shop.channel().pending_arrivals(), 0);
    }

    #[test]
    fn closed_shop_abandons_an_admitted_client() {
        let shop = Arc::new(Shop::new(1, SlotRelease::OnServiceStart));
        shop.channel().close();

        let out = ClientActor::new(0, Arc::clone(&shop)).visit();
        assert_eq!(out.status, ClientStatus::Abandoned);
        assert_eq!(out.clock.as_slice(), &[0, 1]);
        assert_eq!(shop.metrics().snapshot().abandoned, 1);
    }

    #[test]
    fn buffered_completion_serves_without_a_running_server() {
        let shop = Arc::new(Shop::new(1, SlotRelease::OnClientDone));
        shop.channel().signal_completion();

        let out = ClientActor::new(3, Arc::clone(&shop)).visit();
        assert!(out.is_served());
        assert_eq!(out.clock.as_slice(), &[0, 1]);
        assert_eq!(shop.room().server_clock().as_slice(), &[0, 1]);
        assert_eq!(shop.room().occupancy(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "released a slot it did not hold")]
    fn releasing_an_unheld_slot_is_caught() {
        let shop = Arc::new(Shop::new(1, SlotRelease::OnClientDone));
        ClientActor::new(5, shop).release_slot();
    }
}
