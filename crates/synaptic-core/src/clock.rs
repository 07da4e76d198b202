//! Time sources.
//!
//! All timestamps in the engine are seconds as `f64`. The graph reads time
//! through the [`Clock`] trait so tests can drive decay and novelty without
//! sleeping.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in seconds.
pub trait Clock: Send + Sync + fmt::Debug {
	/// Current time in seconds.
	fn now(&self) -> f64;
}

/// Wall clock (seconds since the Unix epoch).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> f64 {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_or(0.0, |d| d.as_secs_f64())
	}
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
	bits: Arc<AtomicU64>,
}

impl ManualClock {
	/// Create a clock frozen at `start` seconds.
	#[must_use]
	pub fn new(start: f64) -> Self {
		Self {
			bits: Arc::new(AtomicU64::new(start.to_bits())),
		}
	}

	/// Set the absolute time.
	pub fn set(&self, seconds: f64) {
		self.bits.store(seconds.to_bits(), Ordering::SeqCst);
	}

	/// Move the clock forward.
	pub fn advance(&self, seconds: f64) {
		self.set(self.now() + seconds);
	}

	/// Move the clock forward by whole hours.
	pub fn advance_hours(&self, hours: f64) {
		self.advance(hours * 3600.0);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> f64 {
		f64::from_bits(self.bits.load(Ordering::SeqCst))
	}
}

/// Hours elapsed between two timestamps in seconds, never negative.
#[inline]
#[must_use]
pub fn hours_between(earlier: f64, later: f64) -> f64 {
	// Guard against clock skew and corrupted timestamps
	let hours = (later - earlier) / 3600.0;
	if hours.is_finite() {
		hours.max(0.0)
	} else {
		0.0
	}
}
