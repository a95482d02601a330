use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Generation of the countdown, bumped every time it is restarted or cancelled.
///
/// Hosts tag scheduled ticks and continuations with the epoch current at scheduling time; anything carrying an older
/// epoch is ignored.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u32);

impl Epoch {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick from a previous epoch, or the countdown is not running.
    Stale,
    Running,
    Expired,
}

impl TickOutcome {
    pub const fn is_expired(self) -> bool {
        matches!(self, Self::Expired)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    duration: Duration,
    remaining: Duration,
    epoch: Epoch,
    running: bool,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: duration,
            epoch: Epoch::default(),
            running: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Share of the full duration still left, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.remaining.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Refills the clock and starts a new epoch.
    pub fn restart(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        self.remaining = self.duration;
        self.running = true;
        self.epoch
    }

    /// Stops the clock where it is and starts a new epoch, outstanding ticks become stale.
    pub fn cancel(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        self.running = false;
        self.epoch
    }

    pub fn tick(&mut self, epoch: Epoch, elapsed: Duration) -> TickOutcome {
        if epoch != self.epoch || !self.running {
            return TickOutcome::Stale;
        }
        self.set_remaining(self.remaining.saturating_sub(elapsed))
    }

    /// Overwrites the time left, expiring the countdown when it reaches zero.
    pub fn set_remaining(&mut self, remaining: Duration) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stale;
        }
        self.remaining = remaining.min(self.duration);
        if self.remaining.is_zero() {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running
        }
    }
}
