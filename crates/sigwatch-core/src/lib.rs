//! Core domain types for the sigwatch signal hub.
//!
//! This crate provides the fundamental types shared by the store, hub and
//! server crates:
//! - `SignalId`: stable identity of one monitored signal
//! - `SignalStatus`: red / yellow / green
//! - `Signal`, `Snapshot`: last-known world state
//! - `SignalPatch`: validated partial update for the write endpoint
//! - `SignalSource`: the fetch seam the poller runs against

pub mod error;
pub mod signal;
pub mod source;

pub use error::{CoreError, Result};
pub use signal::{
    validate_distance_cm, Signal, SignalId, SignalPatch, SignalStatus, Snapshot, StateDocument,
    DISTANCE_UNKNOWN,
};
pub use source::SignalSource;
