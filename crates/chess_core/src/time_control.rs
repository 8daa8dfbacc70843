//! Search limits and the clock that enforces them.
//!
//! Engines stop at whichever limit is hit first: the depth limit between
//! iterations, or the time limit inside an iteration. The clock is only
//! consulted every [`CHECK_INTERVAL`] nodes so the check stays off the hot
//! path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Nodes between clock checks. Must be a power of two.
pub const CHECK_INTERVAL: u64 = 4096;

/// Subtracted from a fixed `movetime` to leave room for I/O.
pub const MOVE_OVERHEAD: Duration = Duration::from_millis(10);

/// Deepest iteration an unlimited search will start.
pub const MAX_DEPTH: u8 = 64;

/// Search limits that control when an engine should stop searching.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Maximum search depth in plies
    pub depth: u8,
    /// Maximum time allowed for this move (None = infinite)
    pub move_time: Option<Duration>,
    /// Stop flag shared with whoever may want to interrupt the search
    pub time_control: TimeControl,
}

impl SearchLimits {
    /// Depth limit only.
    pub fn depth(depth: u8) -> Self {
        Self {
            depth,
            move_time: None,
            time_control: TimeControl::new(None),
        }
    }

    /// Both limits; the search ends at whichever comes first.
    pub fn depth_and_time(depth: u8, move_time: Duration) -> Self {
        Self {
            depth,
            move_time: Some(move_time),
            time_control: TimeControl::new(Some(move_time)),
        }
    }

    /// Time limit only.
    pub fn time(move_time: Duration) -> Self {
        Self::depth_and_time(MAX_DEPTH, move_time)
    }

    /// A fixed per-move time as requested by `go movetime`, less
    /// [`MOVE_OVERHEAD`].
    pub fn move_time(move_time: Duration) -> Self {
        Self::time(move_time.saturating_sub(MOVE_OVERHEAD))
    }

    /// Budget for one move out of the remaining clock: a twentieth of the
    /// remaining time plus half the increment.
    pub fn from_clock(remaining: Duration, increment: Duration) -> Self {
        Self::time(remaining / 20 + increment / 2)
    }

    /// Keep the time limit but cap the depth.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.time_control.is_stopped()
    }

    /// Start the clock. Call this when the search begins.
    pub fn start(&mut self) {
        self.time_control.start();
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::depth(6)
    }
}

/// Wall-clock budget plus a stop flag that other threads can raise.
///
/// Clones share the stop flag, so a controller can keep one and call
/// [`TimeControl::stop`] while the search runs on another thread.
#[derive(Debug, Clone)]
pub struct TimeControl {
    stopped: Arc<AtomicBool>,
    started: Option<Instant>,
    time_limit: Option<Duration>,
}

impl TimeControl {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            started: None,
            time_limit,
        }
    }

    /// Start the clock. A stop requested before this still applies.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Ask the search to stop as soon as it next checks.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// True when the time is up or a stop was requested. Latches the stop
    /// flag once the limit has passed.
    pub fn check_time(&self) -> bool {
        if self.is_stopped() {
            return true;
        }
        if let (Some(limit), Some(started)) = (self.time_limit, self.started)
            && started.elapsed() >= limit
        {
            self.stop();
            return true;
        }
        false
    }

    /// Whether `nodes` lands on a clock-check boundary.
    #[inline(always)]
    pub fn should_check_time(nodes: u64) -> bool {
        nodes & (CHECK_INTERVAL - 1) == 0
    }

    pub fn elapsed(&self) -> Duration {
        self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// Remaining time (None if no limit).
    pub fn remaining(&self) -> Option<Duration> {
        let limit = self.time_limit?;
        Some(limit.saturating_sub(self.elapsed()))
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
