//! Signal domain types.
//!
//! A `Signal` is one monitored status entity: identity, traffic-light
//! status, a distance measurement in centimeters (or the `-1` "no
//! measurement" sentinel) and the store-assigned `last_updated` timestamp.
//! A `Snapshot` is the full mapping of signal ids to their last-known state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Sentinel distance meaning "no measurement available".
///
/// Distinct from `0.0`, which is a valid measurement.
pub const DISTANCE_UNKNOWN: f64 = -1.0;

/// Stable identity of one monitored signal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SignalId(pub u32);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Traffic-light status of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Red,
    Yellow,
    Green,
}

impl SignalStatus {
    /// Store/wire text form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Self::Red),
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// Validate a distance value: non-negative and finite, or the `-1` sentinel.
pub fn validate_distance_cm(value: f64) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::InvalidDistance(format!(
            "{value} is not a finite number"
        )));
    }
    if value < 0.0 && value != DISTANCE_UNKNOWN {
        return Err(CoreError::InvalidDistance(format!(
            "{value} is negative (only the {DISTANCE_UNKNOWN} sentinel is allowed)"
        )));
    }
    Ok(())
}

/// One monitored signal as last seen by the hub.
///
/// `last_updated` is set by the store on every write and is advisory only:
/// the hub never assumes monotonicity, it only participates in equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub distance_cm: f64,
    pub status: SignalStatus,
    #[serde(with = "sql_timestamp")]
    pub last_updated: NaiveDateTime,
}

/// World state as last seen by the hub: signal id -> signal.
///
/// The ids present are exactly those returned by the most recent successful
/// poll; ids that vanish from the store vanish from the snapshot.
pub type Snapshot = BTreeMap<SignalId, Signal>;

/// The JSON document pushed to subscribers and served over REST.
///
/// Top-level keys are the string-encoded signal ids, with one process-level
/// metadata field (`generated_at_ms`) alongside them.
#[derive(Debug, Serialize)]
pub struct StateDocument<'a> {
    #[serde(flatten)]
    pub signals: &'a Snapshot,
    pub generated_at_ms: i64,
}

/// Partial update for one signal, as accepted by the write endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalPatch {
    #[serde(default)]
    pub status: Option<SignalStatus>,
    #[serde(default)]
    pub distance_cm: Option<f64>,
}

impl SignalPatch {
    /// Validate the patch: at least one field, and a legal distance value.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.status.is_none() && self.distance_cm.is_none() {
            return Err(CoreError::EmptyPatch);
        }
        if let Some(d) = self.distance_cm {
            validate_distance_cm(d)?;
        }
        Ok(())
    }
}

/// Serde adapter matching the store's `CURRENT_TIMESTAMP` text form
/// (`YYYY-MM-DD HH:MM:SS`).
pub mod sql_timestamp {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
