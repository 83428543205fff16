//! The server and client actors.
//!
//! Both hold an `Arc<Shop>`. Their only blocking points are the rendezvous waits: the server in
//! `wait_arrival`, a client in `wait_completion`.

mod client;
mod server;

pub use client::{ClientActor, ClientOutcome, ClientStatus};
pub use server::{ServerActor, ServerHandle, ServerSummary};
