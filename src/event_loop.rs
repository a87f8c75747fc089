//! Single-threaded virtual event loop.
//!
//! Autoplay is the only time-driven behavior on a page, so the loop only
//! knows about repeating intervals. Time is virtual: nothing happens until
//! [`EventLoop::next_due`] is polled up to a deadline, which makes every
//! tick deterministic and lets tests step through minutes of autoplay
//! instantly.
//!
//! Ticks are delivered strictly one at a time in due order (ties broken by
//! creation order), so a callback can never overlap with itself or with
//! another gallery's callback. [`EventLoop::run_until`] collapses every
//! firing of an interval inside a window into one [`TickRun`], so an hour of
//! autoplay costs one step per live timer.

use crate::gallery::GalleryId;
use serde::Serialize;
use std::time::Duration;

/// Shortest period an interval can run at. Guards against zero-period loops.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Opaque handle to a repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerHandle(u64);

/// Something that can start and cancel repeating timers on behalf of a gallery.
pub trait Scheduler {
    /// Start a repeating timer owned by `owner`. First tick is one `period` from now.
    fn set_interval(&mut self, owner: GalleryId, period: Duration) -> TimerHandle;

    /// Cancel a timer. Returns `false` if it was not live.
    fn clear_interval(&mut self, handle: TimerHandle) -> bool;
}

/// A single due timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub handle: TimerHandle,
    pub owner: GalleryId,
    /// Virtual time at which the tick fired.
    pub at: Duration,
}

/// All firings of one interval inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRun {
    pub handle: TimerHandle,
    pub owner: GalleryId,
    pub count: u64,
    /// Virtual time of the last firing.
    pub last: Duration,
}

#[derive(Debug, Clone)]
struct Interval {
    handle: TimerHandle,
    owner: GalleryId,
    period: Duration,
    due: Duration,
}

#[derive(Debug, Default)]
pub struct EventLoop {
    now: Duration,
    next_handle: u64,
    intervals: Vec<Interval>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the page loaded.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.intervals.iter().any(|i| i.handle == handle)
    }

    /// Number of live timers across all owners.
    pub fn active_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of live timers held by one owner.
    pub fn active_for(&self, owner: GalleryId) -> usize {
        self.intervals.iter().filter(|i| i.owner == owner).count()
    }

    /// Pop the earliest tick due at or before `deadline`.
    ///
    /// Moves the clock to the tick's due time and reschedules the interval one
    /// period later. Returns `None` once nothing is due before the deadline;
    /// the caller then settles the clock with [`EventLoop::advance_to`].
    pub fn next_due(&mut self, deadline: Duration) -> Option<Tick> {
        let interval = self
            .intervals
            .iter_mut()
            .filter(|i| i.due <= deadline)
            .min_by_key(|i| (i.due, i.handle))?;
        let tick = Tick {
            handle: interval.handle,
            owner: interval.owner,
            at: interval.due,
        };
        interval.due += interval.period;
        self.now = tick.at;
        Some(tick)
    }

    /// Fire every interval due at or before `deadline` as many times as it
    /// falls due, one [`TickRun`] per interval in creation order, and move the
    /// clock to `deadline`.
    ///
    /// Same firings as draining [`EventLoop::next_due`], for callers whose
    /// ticks never start or cancel timers.
    pub fn run_until(&mut self, deadline: Duration) -> Vec<TickRun> {
        let mut runs = Vec::new();
        for interval in self.intervals.iter_mut().filter(|i| i.due <= deadline) {
            let elapsed = (deadline - interval.due).as_nanos() / interval.period.as_nanos();
            let count = u64::try_from(elapsed).unwrap_or(u64::MAX - 1) + 1;
            runs.push(TickRun {
                handle: interval.handle,
                owner: interval.owner,
                count,
                last: interval.due.saturating_add(periods(interval.period, count - 1)),
            });
            interval.due = interval.due.saturating_add(periods(interval.period, count));
        }
        self.advance_to(deadline);
        runs
    }

    /// Move the clock forward to `deadline`. Never moves backwards.
    pub fn advance_to(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

impl Scheduler for EventLoop {
    fn set_interval(&mut self, owner: GalleryId, period: Duration) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.intervals.push(Interval {
            handle,
            owner,
            period,
            due: self.now + period,
        });
        handle
    }

    fn clear_interval(&mut self, handle: TimerHandle) -> bool {
        let before = self.intervals.len();
        self.intervals.retain(|i| i.handle != handle);
        self.intervals.len() != before
    }
}

/// `period * n`, saturating.
fn periods(period: Duration, n: u64) -> Duration {
    let nanos = period.as_nanos().saturating_mul(u128::from(n));
    let secs = u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % 1_000_000_000) as u32)
}
