//! Visibility State Machine for the result panel.
//!
//! `closed`/`open`, plus the active category and a blur grace timer. Outside
//! clicks close immediately and cancel any pending blur close; the query
//! clearing that goes with them is the engine's job.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::event::EngineEvent;
use crate::timer::Deadline;

#[derive(Debug, Clone)]
pub struct Visibility {
    open: bool,
    focused: bool,
    active: String,
    grace: Option<Duration>,
    blur_close: Deadline,
}

impl Visibility {
    pub fn new(all_label: &str, grace: Option<Duration>) -> Self {
        Self { open: false, focused: false, active: all_label.to_string(), grace, blur_close: Deadline::default() }
    }

    pub fn is_open(&self) -> bool { self.open }

    pub fn is_focused(&self) -> bool { self.focused }

    pub fn active(&self) -> &str { &self.active }

    pub fn blur_deadline(&self) -> Option<Instant> { self.blur_close.at() }

    /// Changes state and reports it; repeated requests for the same state are silent.
    pub fn set_open(&mut self, open: bool, out: &mut Vec<EngineEvent>) {
        if self.open != open {
            self.open = open;
            debug!(open, "panel visibility changed");
            out.push(EngineEvent::VisibilityChanged(open));
        }
    }

    pub fn focus(&mut self, out: &mut Vec<EngineEvent>) {
        self.focused = true;
        self.blur_close.cancel();
        self.set_open(true, out);
    }

    /// Schedule a close after the grace period; no grace configured means blur is ignored.
    pub fn blur(&mut self, now: Instant) {
        self.focused = false;
        if let Some(grace) = self.grace {
            self.blur_close.arm(now + grace);
        }
    }

    /// A click or pointer-down inside the component keeps the panel alive.
    pub fn interact(&mut self) { self.blur_close.cancel(); }

    pub fn outside_click(&mut self, out: &mut Vec<EngineEvent>) {
        self.blur_close.cancel();
        self.focused = false;
        self.set_open(false, out);
    }

    pub fn poll(&mut self, now: Instant, out: &mut Vec<EngineEvent>) {
        if self.blur_close.fire(now) {
            self.set_open(false, out);
        }
    }

    /// Returns false when `category` was already active.
    pub fn select(&mut self, category: &str) -> bool {
        if self.active == category { return false; }
        self.active = category.to_string();
        true
    }

    /// Keep the active category only if it still has a bucket.
    pub fn reconcile(&mut self, all_label: &str, exists: impl Fn(&str) -> bool) {
        if self.active != all_label && !exists(&self.active) {
            debug!(from = %self.active, "active category vanished; falling back");
            self.active = all_label.to_string();
        }
    }

    pub fn cancel_timers(&mut self) { self.blur_close.cancel(); }
}
