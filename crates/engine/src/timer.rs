use std::time::Instant;

/// A single cancelable scheduled instant. Re-arming supersedes the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn arm(&mut self, at: Instant) { self.at = Some(at); }

    pub fn cancel(&mut self) { self.at = None; }

    pub fn at(&self) -> Option<Instant> { self.at }

    /// True exactly once when `now` reaches the armed instant; disarms on fire.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.at {
            Some(t) if now >= t => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of two optional instants.
pub(crate) fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
