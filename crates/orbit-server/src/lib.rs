//! Orbit-Live server library: tick/broadcast scheduling and the HTTP and
//! WebSocket surfaces around it.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod handler;
pub mod scheduler;

pub use config::ServerConfig;
pub use scheduler::{BroadcastScheduler, SimulationStatus, SnapshotSink, SubscriberId};
