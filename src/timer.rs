//! Countdown for an attempt's time budget.
//!
//! The owner feeds it elapsed wall time (frame deltas); it turns that into whole-second
//! ticks and reports expiry once. After expiry or cancellation it never ticks again.

use std::time::Duration;

const SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running,
    Expired,
    Cancelled,
}

/// What a call to [`Countdown::advance`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Less than a second accumulated, or the countdown is stopped.
    Idle,
    /// One or more seconds passed; holds the seconds left.
    Ticked(u32),
    /// Reached zero during this call.
    Expired,
}

/// How urgent the remaining time looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBand {
    /// More than half left.
    Calm,
    /// More than a quarter left.
    Hurry,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
    carry: Duration,
    state: CountdownState,
}

impl Countdown {
    pub fn start(limit_secs: u32) -> Self {
        Self {
            limit: limit_secs,
            remaining: limit_secs,
            carry: Duration::ZERO,
            state: CountdownState::Running,
        }
    }

    pub fn advance(&mut self, elapsed: Duration) -> CountdownTick {
        if self.state != CountdownState::Running {
            return CountdownTick::Idle;
        }
        self.carry += elapsed;
        let mut ticked = false;
        while self.carry >= SECOND {
            self.carry -= SECOND;
            self.remaining = self.remaining.saturating_sub(1);
            ticked = true;
            if self.remaining == 0 {
                self.state = CountdownState::Expired;
                self.carry = Duration::ZERO;
                return CountdownTick::Expired;
            }
        }
        if ticked {
            CountdownTick::Ticked(self.remaining)
        } else {
            CountdownTick::Idle
        }
    }

    /// Stops the countdown for good. Has no effect once expired.
    pub fn cancel(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Cancelled;
            self.carry = Duration::ZERO;
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn fraction_remaining(&self) -> f32 {
        if self.limit == 0 {
            return 0.0;
        }
        self.remaining as f32 / self.limit as f32
    }

    pub fn band(&self) -> TimeBand {
        let fraction = self.fraction_remaining();
        if fraction > 0.5 {
            TimeBand::Calm
        } else if fraction > 0.25 {
            TimeBand::Hurry
        } else {
            TimeBand::Critical
        }
    }
}
