//! Unix timestamps with sub-second precision.
//!
//! Products and orders carry `created_at` as fractional seconds since the
//! epoch. The search index sorts on it, so it must be a plain float.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch, as a float.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(f64);

impl UnixTimestamp {
    /// Wrap a raw float timestamp.
    #[must_use]
    pub const fn from_secs_f64(secs: f64) -> Self {
        Self(secs)
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Raw seconds.
    #[must_use]
    pub const fn as_secs_f64(&self) -> f64 {
        self.0
    }
}

impl From<DateTime<Utc>> for UnixTimestamp {
    #[allow(clippy::cast_precision_loss)] // microsecond timestamps fit comfortably in f64
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_micros() as f64 / 1_000_000.0)
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
