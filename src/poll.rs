//! Bounded wait for the completion flag.
//!
//! [`PollLoop`] holds the per-exchange retry state and decides, one flag
//! sample at a time, whether to keep polling, reset the peripheral, or give
//! up. It never touches hardware itself, so the caller controls what a
//! "tick" is.
//!
//! Each reset is preceded by a full window of failed samples. The sample
//! right after the last reset is the final one: if the flag is still clear
//! the exchange times out.

use crate::config::RetryPolicy;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the completion flag.
    Polling,
    /// The current window ran out; the caller must reset the peripheral and
    /// then call [`PollLoop::escalated`].
    Escalating,
    /// The flag was observed set.
    Succeeded,
    /// The reset budget is spent and the flag is still clear.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct PollLoop {
    policy: RetryPolicy,
    state: PollState,
    countdown: u8,
    escalations: u8,
    polls: u32,
}

impl PollLoop {
    pub fn new(policy: RetryPolicy) -> Self {
        let policy = RetryPolicy {
            window: policy.window.max(1),
            ..policy
        };
        Self {
            policy,
            state: PollState::Polling,
            countdown: policy.window,
            escalations: 0,
            polls: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Resets performed so far.
    pub fn escalations(&self) -> u8 {
        self.escalations
    }

    /// Flag samples consumed so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Feed one sample of the completion flag.
    ///
    /// Samples are only consumed in [`PollState::Polling`]; in any other
    /// state this returns the current state unchanged.
    pub fn step(&mut self, complete: bool) -> PollState {
        if self.state != PollState::Polling {
            return self.state;
        }

        self.polls += 1;
        if complete {
            self.state = PollState::Succeeded;
            return self.state;
        }

        // After the last reset there is no further window: one incomplete
        // sample ends the exchange.
        if self.escalations > 0 && self.escalations == self.policy.max_escalations {
            self.state = PollState::TimedOut;
            return self.state;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.state = if self.escalations < self.policy.max_escalations {
                PollState::Escalating
            } else {
                PollState::TimedOut
            };
        }
        self.state
    }

    /// Record a finished peripheral reset and open a fresh window.
    pub fn escalated(&mut self) {
        debug_assert_eq!(self.state, PollState::Escalating);
        if self.state == PollState::Escalating {
            self.escalations += 1;
            self.countdown = self.policy.window;
            self.state = PollState::Polling;
        }
    }
}
