use crate::services::attempt_session::SessionEvent;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining: u32 },
    Expired,
    /// The clock was cancelled or has already expired.
    Idle,
}

/// Countdown for one attempt. The remaining time only moves through
/// [`Timer::tick`]; the optional background task just delivers
/// `SessionEvent::Tick` once per period into the session's event channel.
#[derive(Debug)]
pub struct Timer {
    duration: u32,
    remaining: u32,
    expired: bool,
    cancelled: bool,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration: duration_secs,
            remaining: duration_secs,
            expired: false,
            cancelled: false,
            task: None,
        }
    }

    /// Spawns the ticking task. Must be called from within a tokio runtime.
    pub fn start(&mut self, events: UnboundedSender<SessionEvent>) {
        if self.task.is_some() || self.cancelled || self.expired {
            return;
        }
        let ticks = self.remaining.max(1);
        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for _ in 0..ticks {
                interval.tick().await;
                if events.send(SessionEvent::Tick).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!(seconds = self.remaining, "Timer started");
    }

    pub fn tick(&mut self) -> TimerEvent {
        if self.cancelled || self.expired {
            return TimerEvent::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            self.stop_task();
            TimerEvent::Expired
        } else {
            TimerEvent::Tick {
                remaining: self.remaining,
            }
        }
    }

    /// Stops the clock. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            tracing::debug!(remaining = self.remaining, "Timer cancelled");
        }
        self.cancelled = true;
        self.stop_task();
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled && !self.expired
    }

    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop_task();
    }
}
