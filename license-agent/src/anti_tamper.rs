//! The anti-tamper submodule: bounds how long the agent may stay in
//! degraded mode using a monotonic clock, so advancing wall time can never
//! extend the grace window, and any backward wall-time jump is treated as
//! an attack.
//!
//! Both clocks are passed in rather than read from `Instant::now()`/
//! `chrono::Utc::now()` internally, so the decision logic is a pure
//! function of its inputs and can be driven deterministically in tests.

use std::time::{Duration, Instant};

/// Tracks the last successful verification and, once offline, how long
/// we've been offline, using [`Instant`], which cannot be moved backward
/// by a clock change the way wall time can.
#[derive(Debug, Clone)]
pub struct AntiTamper {
    last_verify_wall_ms: i64,
    last_verify_mono: Instant,
    offline_since: Option<Instant>,
    grace: Duration,
}

impl AntiTamper {
    /// Creates a fresh block as of `now_wall_ms`/`now_mono`, not offline.
    #[must_use]
    pub fn new(grace: Duration, now_wall_ms: i64, now_mono: Instant) -> Self {
        Self {
            last_verify_wall_ms: now_wall_ms,
            last_verify_mono: now_mono,
            offline_since: None,
            grace,
        }
    }

    /// Rebuilds a block from a cached wall timestamp after a restart. The
    /// process has no memory of how long it was offline before this
    /// instant, so `offline_since` is set to `now_mono`, degradation
    /// starts counting from the moment we notice we're relying on cache.
    #[must_use]
    pub fn from_cached_wall_time(grace: Duration, cached_wall_ms: i64, now_mono: Instant) -> Self {
        Self {
            last_verify_wall_ms: cached_wall_ms,
            last_verify_mono: now_mono,
            offline_since: Some(now_mono),
            grace,
        }
    }

    #[must_use]
    pub fn last_verify_wall_ms(&self) -> i64 {
        self.last_verify_wall_ms
    }

    /// Records a successful online verification, clearing any offline mark.
    pub fn record_online_verify(&mut self, now_wall_ms: i64, now_mono: Instant) {
        self.last_verify_wall_ms = now_wall_ms;
        self.last_verify_mono = now_mono;
        self.offline_since = None;
    }

    /// Marks the start of an offline period. Idempotent, a second call
    /// while already offline does not reset the clock.
    pub fn mark_offline(&mut self, now_mono: Instant) {
        if self.offline_since.is_none() {
            self.offline_since = Some(now_mono);
        }
    }

    /// Whether degraded mode may continue given the current wall and
    /// monotonic time.
    ///
    /// A wall-clock jump backward relative to the last verification is a
    /// hard reject regardless of monotonic elapsed time; a wall-clock jump
    /// forward alone cannot shorten the grace window, only the monotonic
    /// clock can.
    #[must_use]
    pub fn is_degradation_valid(&self, now_wall_ms: i64, now_mono: Instant) -> bool {
        if now_wall_ms < self.last_verify_wall_ms {
            return false;
        }

        let Some(offline_since) = self.offline_since else {
            return true;
        };

        let mono_elapsed = now_mono.saturating_duration_since(offline_since);
        if mono_elapsed > self.grace {
            return false;
        }

        let wall_elapsed_ms = now_wall_ms - self.last_verify_wall_ms;
        let mono_elapsed_since_verify = now_mono.saturating_duration_since(self.last_verify_mono);
        let drift = (wall_elapsed_ms as i128 - mono_elapsed_since_verify.as_millis() as i128).abs();
        if drift > Duration::from_secs(5 * 60).as_millis() as i128 {
            tracing::warn!(drift_ms = drift as i64, "wall/monotonic clock drift exceeds 5 minutes");
        }

        true
    }

    /// Remaining grace, in whole hours, floored at zero.
    #[must_use]
    pub fn remaining_grace_hours(&self, now_mono: Instant) -> f64 {
        let Some(offline_since) = self.offline_since else {
            return self.grace.as_secs_f64() / 3600.0;
        };
        let elapsed = now_mono.saturating_duration_since(offline_since);
        let remaining = self.grace.saturating_sub(elapsed);
        remaining.as_secs_f64() / 3600.0
    }
}
