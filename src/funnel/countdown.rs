//! Flash-sale countdown shown on the offer stage.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Hours, minutes and seconds left on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Countdown {
    /// Value the display jumps to after reaching zero.
    pub const RELOAD: Countdown = Countdown::new(23, 59, 59);

    /// Value shown when the offer first appears.
    pub const INITIAL: Countdown = Countdown::new(23, 47, 12);

    pub const fn new(hours: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    /// One second down, borrowing from minutes then hours. Zero reloads.
    pub fn tick(&mut self) {
        if self.is_zero() {
            *self = Self::RELOAD;
        } else if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        } else {
            self.hours -= 1;
            self.minutes = 59;
            self.seconds = 59;
        }
    }

    /// Parse `HH:MM:SS`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hours: u8 = parts.next()?.parse().ok()?;
        let minutes: u8 = parts.next()?.parse().ok()?;
        let seconds: u8 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || hours > 23 || minutes > 59 || seconds > 59 {
            return None;
        }
        Some(Self::new(hours, minutes, seconds))
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// Background task ticking a [`Countdown`] and publishing each value.
///
/// The task is aborted when the timer is dropped.
pub struct CountdownTimer {
    rx: watch::Receiver<Countdown>,
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Start ticking once per second. Needs a tokio runtime.
    pub fn start(initial: Countdown) -> Self {
        Self::with_period(initial, Duration::from_secs(1))
    }

    pub fn with_period(initial: Countdown, period: Duration) -> Self {
        let (tx, rx) = watch::channel(initial);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            let mut current = initial;
            loop {
                interval.tick().await;
                current.tick();
                if tx.send(current).is_err() {
                    break;
                }
            }
        });
        Self { rx, handle }
    }

    pub fn current(&self) -> Countdown {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.rx.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Countdown timer stopped");
    }
}
