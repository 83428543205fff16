//! `barbershop-sim` simulates the bounded-waiting-room rendezvous known as the "sleeping barber":
//! one server thread and many client threads contend for a fixed number of waiting slots, hand
//! control back and forth through blocking signals, and keep small vector clocks recording the
//! causal order between each client and the server.
//!
//! ## Protocol
//!
//! 1. A client calls [`shop::WaitingRoom::try_enter`]. A full room makes it balk and leave.
//! 2. An admitted client bumps its own clock slot, signals an arrival on the
//!    [`shop::RendezvousChannel`] and blocks for a completion.
//! 3. The server wakes on the arrival, claims a slot, bumps its own clock slot, serves for a
//!    sampled duration and signals a completion.
//! 4. The woken client exchanges clocks with the server under the room lock.
//!
//! Signals carry no identity: the completion that wakes a client may belong to the service cycle
//! started for a different client. By default the server frees a slot when it *starts* service
//! ([`shop::SlotRelease::OnServiceStart`]); [`shop::SlotRelease::OnClientDone`] frees it when the
//! admitted client finishes instead.
//!
//! ## Running a simulation
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use barbershop_sim::simulation::{DurationRange, Simulation, SimulationConfig, StdOutObserver};
//!
//! # fn main() -> Result<(), barbershop_sim::SimulationError> {
//! let config = SimulationConfig {
//!     capacity: 2,
//!     client_count: 4,
//!     service_duration: DurationRange::new(1, 3),
//!     arrival_stagger: DurationRange::zero(),
//!     time_unit: Duration::from_millis(1),
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let report = Simulation::new(config)?
//!     .with_observer(Arc::new(StdOutObserver))
//!     .run()?;
//! assert_eq!(report.served() + report.balked(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`clock`]: vector clocks and the server/client slot layout
//! - [`shop`]: waiting room, rendezvous channel and the shared shop context
//! - [`actors`]: the server and client state machines
//! - [`simulation`]: configuration, event observers, metrics and the driver
//! - [`error`]: error type shared across the crate

pub mod actors;
pub mod clock;
pub mod error;
pub mod shop;
pub mod simulation;

pub use error::{SimulationError, SimulationResult};
