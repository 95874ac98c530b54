//! Periodic sweep scheduler for sessions that never fill.
//!
//! Sessions have no deadline of their own: one that nobody joins stays
//! open until the process exits. The [`SweepScheduler`] wakes on a fixed
//! cadence and hands the caller a [`SweepInfo`] carrying the age limit to
//! apply. It knows nothing about sessions; the server pairs it with
//! `SessionStore::expire_idle`.
//!
//! # Disabled mode
//!
//! With an `interval` of zero, [`SweepScheduler::wait_for_sweep`] pends
//! forever, so it can sit in a `tokio::select!` unconditionally.
//!
//! ```ignore
//! let mut scheduler = SweepScheduler::new(config);
//! loop {
//!     let info = scheduler.wait_for_sweep().await;
//!     store.expire_idle(info.ttl);
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Sweep cadence and age limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweeps. Zero disables sweeping.
    pub interval: Duration,
    /// Sessions at least this old are expired by a sweep.
    pub ttl: Duration,
    /// Upper bound of the random delay added before the first sweep, so
    /// several servers started together don't sweep in lockstep.
    pub initial_jitter: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            ttl: Duration::from_secs(30 * 60),
            initial_jitter: Duration::from_secs(2),
        }
    }
}

impl SweepConfig {
    /// Sweeps every `interval`, expiring sessions older than `ttl`.
    pub fn every(interval: Duration, ttl: Duration) -> Self {
        Self {
            interval,
            ttl,
            ..Default::default()
        }
    }

    /// A config that never sweeps.
    pub fn disabled() -> Self {
        Self {
            interval: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }
}

// ---------------------------------------------------------------------------
// SweepInfo
// ---------------------------------------------------------------------------

/// Returned by [`SweepScheduler::wait_for_sweep`] each time a sweep is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepInfo {
    /// Sweep number, starting at 1.
    pub sweep: u64,
    /// Age limit to apply in this sweep.
    pub ttl: Duration,
    /// Sweeps that were due while the caller was busy and got folded into
    /// this one instead of firing back to back.
    pub skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-cadence sweep timer.
pub struct SweepScheduler {
    config: SweepConfig,
    next_sweep: Option<Instant>,
    sweep_count: u64,
    paused: bool,
}

impl SweepScheduler {
    /// Creates a scheduler. The first sweep is due after one interval plus
    /// a random share of `initial_jitter`.
    pub fn new(config: SweepConfig) -> Self {
        let next_sweep = config.is_enabled().then(|| {
            let jitter_ms = config.initial_jitter.as_millis() as u64;
            let jitter = if jitter_ms > 0 {
                Duration::from_millis(rand::rng().random_range(0..jitter_ms))
            } else {
                Duration::ZERO
            };
            Instant::now() + config.interval + jitter
        });

        if config.is_enabled() {
            debug!(
                interval_secs = config.interval.as_secs(),
                ttl_secs = config.ttl.as_secs(),
                "sweep scheduler created"
            );
        } else {
            debug!("sweep scheduler created disabled");
        }

        Self {
            config,
            next_sweep,
            sweep_count: 0,
            paused: false,
        }
    }

    /// Waits until the next sweep is due.
    ///
    /// Pends forever while disabled or paused. If the caller fell behind
    /// by more than one interval, the missed sweeps are skipped rather
    /// than fired in a burst.
    pub async fn wait_for_sweep(&mut self) -> SweepInfo {
        let next = match self.next_sweep {
            Some(next) if !self.paused => next,
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let interval = self.config.interval;
        let late_by = Instant::now().saturating_duration_since(next);
        let skipped = (late_by.as_nanos() / interval.as_nanos()) as u64;
        if skipped > 0 {
            warn!(skipped, "sweep ran late, skipping missed sweeps");
        }

        self.sweep_count += 1;
        self.next_sweep = Some(next + interval * (skipped as u32 + 1));

        SweepInfo {
            sweep: self.sweep_count,
            ttl: self.config.ttl,
            skipped,
        }
    }

    /// Stops sweeps until [`resume`](Self::resume) is called.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(sweep = self.sweep_count, "sweep scheduler paused");
        }
    }

    /// Resumes sweeping; the next sweep is one full interval from now.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if self.config.is_enabled() {
                self.next_sweep = Some(Instant::now() + self.config.interval);
            }
            debug!(sweep = self.sweep_count, "sweep scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Number of sweeps fired so far.
    pub fn sweep_count(&self) -> u64 {
        self.sweep_count
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.interval, Duration::from_secs(60));
        assert_eq!(cfg.ttl, Duration::from_secs(1800));
        assert!(cfg.is_enabled());
    }

    #[test]
    fn test_disabled_config() {
        let cfg = SweepConfig::disabled();
        assert!(!cfg.is_enabled());
        assert_eq!(cfg.ttl, SweepConfig::default().ttl);
    }

    #[test]
    fn test_every_keeps_default_jitter() {
        let cfg = SweepConfig::every(Duration::from_secs(5), Duration::from_secs(50));
        assert_eq!(cfg.interval, Duration::from_secs(5));
        assert_eq!(cfg.ttl, Duration::from_secs(50));
        assert_eq!(cfg.initial_jitter, Duration::from_secs(2));
    }
}
