// Poll scheduling for per-entity tables: the first poll is deliberately
// delayed after the first data arrival so a batch of near-simultaneous
// records can accumulate, then polls run at the steady interval.
// Pure state machine; the widget task supplies the timers.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Delayed,
    Polling,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct PollSchedule {
    state: PollState,
    first_delay: Duration,
    interval: Duration,
}

impl PollSchedule {
    pub fn new(first_delay: Duration, interval: Duration) -> Self {
        PollSchedule {
            state: PollState::Idle,
            first_delay,
            interval,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Arms the delayed first poll. Only the first data arrival in Idle has
    /// any effect; returns the delay until the first poll should fire.
    pub fn on_first_data(&mut self) -> Option<Duration> {
        match self.state {
            PollState::Idle => {
                self.state = PollState::Delayed;
                Some(self.first_delay)
            }
            _ => None,
        }
    }

    /// Advances past a fired poll; returns the delay until the next one.
    pub fn on_poll_fired(&mut self) -> Option<Duration> {
        match self.state {
            PollState::Delayed | PollState::Polling => {
                self.state = PollState::Polling;
                Some(self.interval)
            }
            PollState::Idle | PollState::Cancelled => None,
        }
    }

    /// Terminal: a cancelled schedule never arms again.
    pub fn cancel(&mut self) {
        self.state = PollState::Cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == PollState::Cancelled
    }
}
