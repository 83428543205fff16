use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::VectorClock;
use crate::error::{SimulationError, SimulationResult};
use crate::shop::Shop;
use crate::simulation::{DurationRange, SimulationEvent};

/// What the server reports when it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSummary {
    /// Completed service cycles.
    pub served: u64,
    /// Server clock at shutdown.
    pub clock: VectorClock,
}

/// The single long-lived worker.
///
/// Each cycle blocks for an arrival, claims a customer (see [`crate::shop::SlotRelease`]),
/// advances the server's clock slot, serves for a sampled duration and signals completion.
pub struct ServerActor {
    shop: Arc<Shop>,
    service_duration: DurationRange,
    time_unit: Duration,
    rng: StdRng,
    served: u64,
}

impl ServerActor {
    pub fn new(shop: Arc<Shop>, service_duration: DurationRange, time_unit: Duration) -> Self {
        Self {
            shop,
            service_duration,
            time_unit,
            rng: StdRng::from_entropy(),
            served: 0,
        }
    }

    /// Use a deterministic RNG for service durations.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn served(&self) -> u64 {
        self.served
    }

    /// Run one `Idle -> Serving -> Idle` cycle.
    ///
    /// Blocks until an arrival is outstanding. Fails with [`SimulationError::ChannelClosed`] once
    /// the shop's channel is closed.
    pub fn serve_one(&mut self) -> SimulationResult<()> {
        self.shop.channel().wait_arrival()?;

        let start = Instant::now();
        let begun = self.shop.room().begin_service(self.shop.release());
        self.shop.emit(SimulationEvent::ServiceStarted {
            occupancy: begun.occupancy,
            clock: begun.server_clock,
        });

        let work = self.service_duration.sample(&mut self.rng, self.time_unit);
        if !work.is_zero() {
            thread::sleep(work);
        }

        let elapsed = start.elapsed();
        self.served += 1;
        self.shop.metrics().on_service_finished(elapsed);
        self.shop.emit(SimulationEvent::ServiceFinished { elapsed });

        self.shop.channel().signal_completion();
        Ok(())
    }

    /// Serve until the channel is closed.
    pub fn run(mut self) -> ServerSummary {
        // serve_one only fails once the channel is closed.
        while self.serve_one().is_ok() {}
        let clock = self.shop.room().server_clock();
        self.shop.emit(SimulationEvent::ServerStopped {
            served: self.served,
            clock: clock.clone(),
        });
        ServerSummary {
            served: self.served,
            clock,
        }
    }

    /// Run the serve loop on a background thread named `server`.
    pub fn spawn(self) -> SimulationResult<ServerHandle> {
        let shop = Arc::clone(&self.shop);
        let join = thread::Builder::new()
            .name("server".to_string())
            .spawn(move || self.run())?;
        Ok(ServerHandle { shop, join })
    }
}

/// Owner of the background server thread.
///
/// Closing the shop's channel is the cancellation signal; [`Self::shutdown`] sends it and joins.
pub struct ServerHandle {
    shop: Arc<Shop>,
    join: JoinHandle<ServerSummary>,
}

impl ServerHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Close the channel and wait for the server to stop.
    ///
    /// A service cycle already in progress runs to completion first.
    pub fn shutdown(self) -> SimulationResult<ServerSummary> {
        self.shop.channel().close();
        self.join.join().map_err(|_| SimulationError::ActorPanicked {
            actor: "server".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::ServerActor;
    use crate::shop::{Shop, SlotRelease};
    use crate::simulation::DurationRange;

    #[test]
    fn serve_one_claims_a_slot_and_signals_completion() {
        let shop = Arc::new(Shop::new(2, SlotRelease::OnServiceStart));
        shop.room().try_enter().unwrap();
        shop.channel().signal_arrival();

        let mut server = ServerActor::new(Arc::clone(&shop), DurationRange::zero(), Duration::ZERO);
        server.serve_one().unwrap();

        assert_eq!(server.served(), 1);
        assert_eq!(shop.room().occupancy(), 0);
        assert_eq!(shop.room().server_clock().as_slice(), &[1, 0]);
        assert_eq!(shop.channel().pending_completions(), 1);
        assert_eq!(shop.metrics().snapshot().served, 1);
    }

    #[test]
    fn shutdown_stops_an_idle_server() {
        let shop = Arc::new(Shop::new(1, SlotRelease::OnServiceStart));
        let handle = ServerActor::new(Arc::clone(&shop), DurationRange::zero(), Duration::ZERO)
            .with_seed(1)
            .spawn()
            .unwrap();

        std::thread::sleep(Duration::from_millis(10));
        assert!(!handle.is_finished());

        let summary = handle.shutdown().unwrap();
        assert_eq!(summary.served, 0);
        assert_eq!(summary.clock.as_slice(), &[0, 0]);
    }
}
