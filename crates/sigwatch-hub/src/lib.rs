//! sigwatch-hub - The change-detection broadcast hub.
//!
//! A long-lived actor that polls the signal store on a fixed cadence, diffs
//! the fresh snapshot against the last broadcast one, and pushes the full
//! state document to every registered subscriber connection when and only
//! when something changed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     poll-detect-broadcast task              │
//! │                                                             │
//! │   SignalSource ──fetch──▶ snapshot_changed? ──yes──▶        │
//! │                                │                   │        │
//! │                               no                serialize   │
//! │                                │                  once      │
//! │                             (sleep)                │        │
//! │                                          ┌─────────▼──────┐ │
//! │                                          │ ConnectionReg. │ │
//! │                                          │ fan out, prune │ │
//! │                                          └────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Connection lifecycle events (register/deregister) arrive concurrently
//! from the server crate; the registry is the shared-state seam and is
//! mutex-guarded. The poll-detect-broadcast cycle runs in one task, which
//! makes broadcasts strictly ordered per hub instance.

pub mod config;
pub mod detect;
pub mod error;
pub mod hub;
pub mod poller;
pub mod registry;

pub use config::PollerConfig;
pub use detect::snapshot_changed;
pub use error::{HubError, HubResult};
pub use hub::Hub;
pub use poller::{poll_once, run_poller};
pub use registry::{ConnectionId, ConnectionRegistry, OutboundSender};
