//! Simulation driver.
//!
//! [`Simulation::run`] wires one server and `client_count` clients around a fresh
//! [`crate::shop::Shop`]:
//!
//! - spawns the server as a background thread
//! - spawns each client on its own thread after a sampled arrival stagger
//! - joins clients per [`JoinPolicy`]
//! - shuts the server down (close + join) rather than leaving it running

mod config;
mod observer;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::actors::{ClientActor, ClientOutcome, ServerActor, ServerSummary};
use crate::error::{SimulationError, SimulationResult};
use crate::shop::Shop;

pub use config::{DurationRange, JoinPolicy, SimulationConfig, SlotRelease};
pub use observer::{
    CompositeObserver, JsonLinesObserver, SimulationEvent, SimulationMetrics,
    SimulationMetricsSnapshot, SimulationObserver, StdOutObserver,
};

/// Everything a finished run reports.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Outcomes of the joined clients, ordered by id.
    pub outcomes: Vec<ClientOutcome>,
    pub server: ServerSummary,
    pub metrics: SimulationMetricsSnapshot,
}

impl SimulationReport {
    pub fn served(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_served()).count()
    }

    pub fn balked(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_balked()).count()
    }
}

/// A configured, reusable simulation.
pub struct Simulation {
    config: SimulationConfig,
    observer: Option<Arc<dyn SimulationObserver>>,
    metrics: Arc<SimulationMetrics>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: None,
            metrics: Arc::new(SimulationMetrics::new()),
        })
    }

    /// Attach an observer for simulation events.
    pub fn with_observer(mut self, observer: Arc<dyn SimulationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Live metrics handle. Counters are reset at the start of every [`Self::run`].
    pub fn metrics(&self) -> Arc<SimulationMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn run(&self) -> SimulationResult<SimulationReport> {
        let cfg = &self.config;
        self.metrics.begin_run();
        let mut shop = Shop::new(cfg.capacity, cfg.slot_release).with_metrics(self.metrics());
        if let Some(obs) = &self.observer {
            shop = shop.with_observer(Arc::clone(obs));
        }
        let shop = Arc::new(shop);

        let (mut driver_rng, server) = match cfg.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                ServerActor::new(Arc::clone(&shop), cfg.service_duration, cfg.time_unit)
                    .with_seed(seed.wrapping_add(1)),
            ),
            None => (
                StdRng::from_entropy(),
                ServerActor::new(Arc::clone(&shop), cfg.service_duration, cfg.time_unit),
            ),
        };
        let server = server.spawn()?;

        let mut clients: Vec<JoinHandle<ClientOutcome>> = Vec::with_capacity(cfg.client_count);
        for id in 0..cfg.client_count {
            let stagger = cfg.arrival_stagger.sample(&mut driver_rng, cfg.time_unit);
            if !stagger.is_zero() {
                thread::sleep(stagger);
            }
            let actor = ClientActor::new(id, Arc::clone(&shop));
            let spawned = thread::Builder::new()
                .name(format!("client-{id}"))
                .spawn(move || actor.visit());
            match spawned {
                Ok(handle) => clients.push(handle),
                Err(e) => {
                    // Closing the shop releases any waiting clients as abandoned.
                    let _ = server.shutdown();
                    return Err(SimulationError::Spawn(e));
                }
            }
        }

        let to_join = match cfg.join_policy {
            JoinPolicy::All => clients.len(),
            JoinPolicy::Prefix(n) => n.min(clients.len()),
        };
        let mut outcomes = Vec::with_capacity(to_join);
        let mut panicked = None;
        // Handles past `to_join` are dropped, which detaches those threads.
        for (id, handle) in clients.into_iter().take(to_join).enumerate() {
            match handle.join() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => {
                    panicked.get_or_insert(id);
                }
            }
        }

        let summary = server.shutdown()?;
        if let Some(id) = panicked {
            return Err(SimulationError::ActorPanicked {
                actor: format!("client-{id}"),
            });
        }

        Ok(SimulationReport {
            outcomes,
            server: summary,
            metrics: self.metrics.snapshot(),
        })
    }
}
