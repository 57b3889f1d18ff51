//! Rest countdown between sets.
//!
//! [`RestTimer`] is the countdown state itself and is advanced by explicit
//! ticks. In the browser, [`RestCountdown`] drives it with a one-second
//! `gloo-timers` interval.

use log::debug;

/// Result of advancing the countdown by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing changed.
    Idle,
    Running { remaining_secs: u32 },
    /// Reached zero on this tick and stopped.
    Finished,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestTimer {
    remaining_secs: u32,
    running: bool,
    /// Bumped on every start/stop so a stale driver can tell it was replaced.
    generation: u64,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new countdown, replacing any running one.
    pub fn start(&mut self, duration_secs: u32) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.remaining_secs = duration_secs;
        self.running = duration_secs > 0;
        debug!("Rest timer started: {}s", duration_secs);
        self.generation
    }

    /// Cancel the countdown and reset the remaining time to zero.
    pub fn stop(&mut self) {
        if self.running {
            debug!("Rest timer stopped with {}s left", self.remaining_secs);
        }
        self.generation = self.generation.wrapping_add(1);
        self.remaining_secs = 0;
        self.running = false;
    }

    /// Advance by exactly one second.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            debug!("Rest timer finished");
            Tick::Finished
        } else {
            Tick::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Format seconds as `m:ss`.
pub fn format_secs(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub use browser::RestCountdown;

mod browser {
    use super::{RestTimer, Tick};
    use crate::config::TICK_MS;
    use gloo_timers::callback::Interval;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Browser driver for a single [`RestTimer`].
    ///
    /// Holding the `Interval` is what keeps it alive; replacing or dropping
    /// it cancels the previous countdown.
    pub struct RestCountdown {
        timer: Rc<RefCell<RestTimer>>,
        interval: Option<Interval>,
    }

    impl RestCountdown {
        pub fn new() -> Self {
            Self {
                timer: Rc::new(RefCell::new(RestTimer::new())),
                interval: None,
            }
        }

        /// Start counting down. `on_tick` sees every tick including the final one.
        pub fn start(&mut self, duration_secs: u32, on_tick: impl Fn(Tick) + 'static) {
            self.interval = None;
            let generation = self.timer.borrow_mut().start(duration_secs);
            if duration_secs == 0 {
                on_tick(Tick::Finished);
                return;
            }
            let timer = self.timer.clone();
            self.interval = Some(Interval::new(TICK_MS, move || {
                let tick = {
                    let mut timer = timer.borrow_mut();
                    if timer.generation() != generation {
                        return;
                    }
                    timer.tick()
                };
                on_tick(tick);
            }));
        }

        pub fn stop(&mut self) {
            self.interval = None;
            self.timer.borrow_mut().stop();
        }

        pub fn remaining_secs(&self) -> u32 {
            self.timer.borrow().remaining_secs()
        }

        pub fn is_running(&self) -> bool {
            self.timer.borrow().is_running()
        }
    }

    impl Default for RestCountdown {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_completion() {
        let mut timer = RestTimer::new();
        timer.start(3);
        assert!(timer.is_running());
        assert_eq!(timer.tick(), Tick::Running { remaining_secs: 2 });
        assert_eq!(timer.tick(), Tick::Running { remaining_secs: 1 });
        assert_eq!(timer.tick(), Tick::Finished);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.tick(), Tick::Idle);
    }

    #[test]
    fn start_replaces_running_countdown() {
        let mut timer = RestTimer::new();
        let first = timer.start(90);
        timer.tick();
        let second = timer.start(30);
        assert_ne!(first, second);
        assert_eq!(timer.remaining_secs(), 30);
        assert_eq!(timer.tick(), Tick::Running { remaining_secs: 29 });
    }

    #[test]
    fn stop_resets_to_zero() {
        let mut timer = RestTimer::new();
        timer.start(60);
        timer.tick();
        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.tick(), Tick::Idle);
    }

    #[test]
    fn zero_duration_never_runs() {
        let mut timer = RestTimer::new();
        timer.start(0);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(), Tick::Idle);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_secs(0), "0:00");
        assert_eq!(format_secs(75), "1:15");
        assert_eq!(format_secs(600), "10:00");
    }
}
