//! Time-based repaint scheduling.
//!
//! The engine is driven entirely by host callbacks, so nothing here owns a
//! timer. Instead each scheduler records deadlines and the host calls
//! [`crate::engine::EngineCore::tick`] from `requestAnimationFrame` (or any
//! periodic callback) with the current time in milliseconds.
//!
//! - [`Debouncer`] coalesces bursts: only the most recent request fires, once
//!   the input has been quiet for the configured delay.
//! - [`SettleSchedule`] fires once per configured offset after a start time,
//!   absorbing layout reflow after a view-mode change.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

/// Trailing-edge debouncer carrying the latest requested value.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: f64,
    pending: Option<(f64, T)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub fn new(delay_ms: f64) -> Self {
        Self { delay_ms, pending: None }
    }

    /// Replace any pending value and restart the quiet period at `now`.
    pub fn request(&mut self, value: T, now: f64) {
        self.pending = Some((now + self.delay_ms, value));
    }

    /// The pending value, if its deadline has passed.
    pub fn poll(&mut self, now: f64) -> Option<T> {
        match self.pending {
            Some((due, _)) if now >= due => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Staggered one-shot repaints relative to a start time.
#[derive(Debug, Clone)]
pub struct SettleSchedule {
    delays_ms: Vec<f64>,
    started_at: Option<f64>,
    fired: usize,
}

impl SettleSchedule {
    #[must_use]
    pub fn new(mut delays_ms: Vec<f64>) -> Self {
        delays_ms.sort_by(f64::total_cmp);
        Self { delays_ms, started_at: None, fired: 0 }
    }

    /// Restart the schedule at `now`. Offsets not yet fired from an earlier
    /// start are dropped.
    pub fn start(&mut self, now: f64) {
        self.started_at = Some(now);
        self.fired = 0;
    }

    /// Whether at least one offset elapsed since the last poll.
    pub fn poll(&mut self, now: f64) -> bool {
        let Some(start) = self.started_at else {
            return false;
        };
        let due = self.delays_ms[self.fired..].iter().take_while(|d| start + **d <= now).count();
        self.fired += due;
        if self.fired >= self.delays_ms.len() {
            self.started_at = None;
        }
        due > 0
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
#[must_use]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
#[must_use]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}
