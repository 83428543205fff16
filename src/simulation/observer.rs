use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::clock::VectorClock;

/// Events emitted by the server and clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    ClientArrived {
        client: usize,
    },
    ClientAdmitted {
        client: usize,
        occupancy: usize,
        clock: VectorClock,
    },
    ClientBalked {
        client: usize,
        occupancy: usize,
    },
    ServiceStarted {
        occupancy: usize,
        clock: VectorClock,
    },
    ServiceFinished {
        elapsed: Duration,
    },
    ClientServed {
        client: usize,
        waited: Duration,
    },
    ClocksMerged {
        client: usize,
        server_clock: VectorClock,
        client_clock: VectorClock,
    },
    /// The channel closed while the client was still waiting for service.
    ClientAbandoned {
        client: usize,
    },
    ServerStopped {
        served: u64,
        clock: VectorClock,
    },
}

impl fmt::Display for SimulationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientArrived { client } => write!(f, "[shop][arrive] client=c{client}"),
            Self::ClientAdmitted {
                client,
                occupancy,
                clock,
            } => write!(
                f,
                "[shop][admit] client=c{client} occupancy={occupancy} clock={clock}"
            ),
            Self::ClientBalked { client, occupancy } => write!(
                f,
                "[shop][balk] client=c{client} occupancy={occupancy} (no free slots)"
            ),
            Self::ServiceStarted { occupancy, clock } => write!(
                f,
                "[shop][serve] server started occupancy={occupancy} clock={clock}"
            ),
            Self::ServiceFinished { elapsed } => {
                write!(f, "[shop][serve] server finished elapsed={elapsed:?}")
            }
            Self::ClientServed { client, waited } => {
                write!(f, "[shop][served] client=c{client} waited={waited:?}")
            }
            Self::ClocksMerged {
                client,
                server_clock,
                client_clock,
            } => write!(
                f,
                "[shop][merge] client=c{client} server_clock={server_clock} client_clock={client_clock}"
            ),
            Self::ClientAbandoned { client } => {
                write!(f, "[shop][abandon] client=c{client} (shop closed)")
            }
            Self::ServerStopped { served, clock } => {
                write!(f, "[shop][stop] server served={served} clock={clock}")
            }
        }
    }
}

/// Observer hook for simulation events.
pub trait SimulationObserver: Send + Sync {
    fn on_event(&self, event: &SimulationEvent);
}

/// Prints the human-readable trace to stdout.
#[derive(Debug, Default)]
pub struct StdOutObserver;

impl SimulationObserver for StdOutObserver {
    fn on_event(&self, event: &SimulationEvent) {
        println!("{event}");
    }
}

/// Writes one JSON object per event to `W`.
///
/// Writes are best-effort; serialization or I/O failures are dropped.
pub struct JsonLinesObserver<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonLinesObserver<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> SimulationObserver for JsonLinesObserver<W> {
    fn on_event(&self, event: &SimulationEvent) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if serde_json::to_writer(&mut *out, event).is_ok() {
            let _ = out.write_all(b"\n");
        }
    }
}

/// Fans events out to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn SimulationObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn SimulationObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl SimulationObserver for CompositeObserver {
    fn on_event(&self, event: &SimulationEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Live counters for a simulation.
///
/// Actors update these as they go; callers can snapshot them at any time.
pub struct SimulationMetrics {
    arrivals: AtomicU64,
    admitted: AtomicU64,
    balked: AtomicU64,
    served: AtomicU64,
    clients_served: AtomicU64,
    abandoned: AtomicU64,
    max_occupancy: AtomicUsize,
    wait_ns: AtomicU64,
    service_ns: AtomicU64,
}

impl SimulationMetrics {
    pub fn new() -> Self {
        Self {
            arrivals: AtomicU64::new(0),
            admitted: AtomicU64::new(0),
            balked: AtomicU64::new(0),
            served: AtomicU64::new(0),
            clients_served: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
            max_occupancy: AtomicUsize::new(0),
            wait_ns: AtomicU64::new(0),
            service_ns: AtomicU64::new(0),
        }
    }

    /// Zero every counter at the start of a run.
    pub fn begin_run(&self) {
        self.arrivals.store(0, Ordering::SeqCst);
        self.admitted.store(0, Ordering::SeqCst);
        self.balked.store(0, Ordering::SeqCst);
        self.served.store(0, Ordering::SeqCst);
        self.clients_served.store(0, Ordering::SeqCst);
        self.abandoned.store(0, Ordering::SeqCst);
        self.max_occupancy.store(0, Ordering::SeqCst);
        self.wait_ns.store(0, Ordering::SeqCst);
        self.service_ns.store(0, Ordering::SeqCst);
    }

    pub fn on_arrival(&self) {
        let _ = self.arrivals.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_admitted(&self, occupancy: usize) {
        let _ = self.admitted.fetch_add(1, Ordering::SeqCst);
        let _ = self.max_occupancy.fetch_max(occupancy, Ordering::SeqCst);
    }

    pub fn on_balked(&self) {
        let _ = self.balked.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_service_finished(&self, elapsed: Duration) {
        let _ = self.served.fetch_add(1, Ordering::SeqCst);
        let _ = self.service_ns.fetch_add(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub fn on_client_served(&self, waited: Duration) {
        let _ = self.clients_served.fetch_add(1, Ordering::SeqCst);
        let _ = self.wait_ns.fetch_add(saturating_nanos(waited), Ordering::SeqCst);
    }

    pub fn on_abandoned(&self) {
        let _ = self.abandoned.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> SimulationMetricsSnapshot {
        SimulationMetricsSnapshot {
            arrivals: self.arrivals.load(Ordering::SeqCst),
            admitted: self.admitted.load(Ordering::SeqCst),
            balked: self.balked.load(Ordering::SeqCst),
            served: self.served.load(Ordering::SeqCst),
            clients_served: self.clients_served.load(Ordering::SeqCst),
            abandoned: self.abandoned.load(Ordering::SeqCst),
            max_occupancy: self.max_occupancy.load(Ordering::SeqCst),
            total_wait: Duration::from_nanos(self.wait_ns.load(Ordering::SeqCst)),
            total_service: Duration::from_nanos(self.service_ns.load(Ordering::SeqCst)),
        }
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

/// Immutable snapshot of [`SimulationMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationMetricsSnapshot {
    pub arrivals: u64,
    pub admitted: u64,
    pub balked: u64,
    /// Completed service cycles.
    pub served: u64,
    /// Clients woken by a completion.
    pub clients_served: u64,
    pub abandoned: u64,
    pub max_occupancy: usize,
    pub total_wait: Duration,
    pub total_service: Duration,
}

impl fmt::Display for SimulationMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arrivals={}, admitted={}, balked={}, served={}, clients_served={}, abandoned={}, max_occupancy={}, total_wait={:?}, total_service={:?}",
            self.arrivals,
            self.admitted,
            self.balked,
            self.served,
            self.clients_served,
            self.abandoned,
            self.max_occupancy,
            self.total_wait,
            self.total_service
        )
    }
}
