/// Minimum-interval gate: an action passes only if strictly more than
/// `interval_ms` has elapsed since the last pass.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval_ms: i64,
    last: Option<i64>,
}

impl Throttle {
    pub fn new(interval_ms: i64) -> Self {
        Self { interval_ms, last: None }
    }

    pub fn ready(&self, now: i64) -> bool {
        self.last.map_or(true, |last| now - last > self.interval_ms)
    }

    /// Pass and record `now` if ready.
    pub fn try_pass(&mut self, now: i64) -> bool {
        if self.ready(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    /// Record an unconditional pass.
    pub fn stamp(&mut self, now: i64) {
        self.last = Some(now);
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
