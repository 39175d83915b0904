//! Animation clock.
//!
//! A [`Clock`] measures time through a [`TimeSource`] and emits a [`FrameTick`]
//! per frame. [`Clock::run`] drives frames until the clock is stopped, pacing
//! itself with a [`FrameScheduler`].

use std::cell::Cell;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::info;

use crate::events::{EventEmitter, SubscriptionId};

pub trait TimeSource {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<Duration>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Blocks until the next frame is due.
pub trait FrameScheduler {
    fn wait_for_next_frame(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Time since the previous tick (zero for the first one).
    pub dt: Duration,
    /// Time since [`Clock::start`].
    pub elapsed: Duration,
    /// Zero-based tick counter.
    pub frame: u64,
}

impl FrameTick {
    pub fn dt_seconds(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

pub struct Clock<T: TimeSource = MonotonicTime> {
    time: T,
    events: EventEmitter<FrameTick>,
    running: Rc<Cell<bool>>,
    started_at: Duration,
    last: Duration,
    frame: u64,
}

impl Default for Clock<MonotonicTime> {
    fn default() -> Self {
        Self::new(MonotonicTime::default())
    }
}

impl<T: TimeSource> Clock<T> {
    pub fn new(time: T) -> Self {
        Self {
            time,
            events: EventEmitter::new(),
            running: Rc::new(Cell::new(false)),
            started_at: Duration::ZERO,
            last: Duration::ZERO,
            frame: 0,
        }
    }

    pub fn on_tick<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&FrameTick) + 'static,
    {
        self.events.on(callback)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.events.off(id)
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Shared flag; clearing it from anywhere stops [`run`](Self::run) before
    /// the next frame is scheduled.
    pub fn stop_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.running)
    }

    /// Marks the clock running, resets the counters and emits the first tick.
    pub fn start(&mut self) -> FrameTick {
        info!("clock started");
        self.running.set(true);
        let now = self.time.now();
        self.started_at = now;
        self.last = now;
        self.frame = 0;
        self.tick()
    }

    pub fn stop(&mut self) {
        if self.running.replace(false) {
            info!("clock stopped after {} frames", self.frame);
        }
    }

    /// Measures the time since the previous tick and notifies subscribers.
    pub fn tick(&mut self) -> FrameTick {
        let now = self.time.now();
        let tick = FrameTick {
            dt: now.saturating_sub(self.last),
            elapsed: now.saturating_sub(self.started_at),
            frame: self.frame,
        };
        self.last = now;
        self.frame += 1;
        self.events.emit(&tick);
        tick
    }

    /// Starts the clock and runs `frame` once per tick until it breaks or the
    /// clock is stopped. The stop flag is checked before each wait.
    pub fn run<S, F>(&mut self, scheduler: &mut S, mut frame: F)
    where
        S: FrameScheduler,
        F: FnMut(&FrameTick) -> ControlFlow<()>,
    {
        let mut tick = self.start();
        loop {
            if frame(&tick).is_break() {
                self.stop();
            }
            if !self.is_running() {
                break;
            }
            scheduler.wait_for_next_frame();
            tick = self.tick();
        }
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct StepScheduler {
        time: ManualTime,
        step: Duration,
        waits: usize,
    }

    impl FrameScheduler for StepScheduler {
        fn wait_for_next_frame(&mut self) {
            self.waits += 1;
            self.time.advance(self.step);
        }
    }

    #[test]
    fn tick_reports_delta_and_elapsed() {
        let time = ManualTime::new();
        let mut clock = Clock::new(time.clone());
        let first = clock.start();
        assert_eq!(first.dt, Duration::ZERO);
        assert_eq!(first.frame, 0);

        time.advance(Duration::from_millis(16));
        let second = clock.tick();
        assert_eq!(second.dt, Duration::from_millis(16));
        time.advance(Duration::from_millis(20));
        let third = clock.tick();
        assert_eq!(third.dt, Duration::from_millis(20));
        assert_eq!(third.elapsed, Duration::from_millis(36));
        assert_eq!(third.frame, 2);
    }

    #[test]
    fn run_stops_when_frame_breaks() {
        let time = ManualTime::new();
        let mut clock = Clock::new(time.clone());
        let mut scheduler = StepScheduler {
            time,
            step: Duration::from_millis(10),
            waits: 0,
        };
        let mut frames = 0;
        clock.run(&mut scheduler, |tick| {
            frames += 1;
            if tick.frame == 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(frames, 5);
        assert_eq!(scheduler.waits, 4);
        assert!(!clock.is_running());
    }

    #[test]
    fn stop_handle_halts_run_from_a_subscriber() {
        let time = ManualTime::new();
        let mut clock = Clock::new(time.clone());
        let handle = clock.stop_handle();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        clock.on_tick(move |tick| {
            sink.borrow_mut().push(tick.frame);
            if tick.frame == 2 {
                handle.set(false);
            }
        });
        let mut scheduler = StepScheduler {
            time,
            step: Duration::from_millis(5),
            waits: 0,
        };
        clock.run(&mut scheduler, |_| ControlFlow::Continue(()));
        assert_eq!(*seen.borrow(), [0, 1, 2]);
        assert_eq!(scheduler.waits, 2);
    }
}
