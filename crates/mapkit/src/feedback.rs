use std::time::{Duration, Instant};

use crate::projection::WorldPoint;

pub const RIPPLE_LIFETIME: Duration = Duration::from_secs(1);
pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);
pub const TOOLTIP_LIFETIME: Duration = Duration::from_secs(5);
pub const WELCOME_DELAY: Duration = Duration::from_millis(500);
/// Ripple circle radius in world units.
pub const RIPPLE_RADIUS_WORLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub position: WorldPoint,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WelcomeState {
    Pending { show_at: Instant },
    Showing,
    Dismissed,
}

/// Short-lived visual cues. Everything is deadline based and expired by
/// `tick`, so no timers outlive the frame loop.
#[derive(Debug, Clone)]
pub struct Feedback {
    ripple: Option<Ripple>,
    toast: Option<Toast>,
    tooltip_until: Option<Instant>,
    welcome: WelcomeState,
}

impl Feedback {
    pub fn new(started_at: Instant) -> Self {
        Self {
            ripple: None,
            toast: None,
            tooltip_until: Some(started_at + TOOLTIP_LIFETIME),
            welcome: WelcomeState::Pending {
                show_at: started_at + WELCOME_DELAY,
            },
        }
    }

    pub fn ripple(&self) -> Option<&Ripple> {
        self.ripple.as_ref()
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn tooltip_visible(&self) -> bool {
        self.tooltip_until.is_some()
    }

    pub fn welcome_visible(&self) -> bool {
        self.welcome == WelcomeState::Showing
    }

    pub fn show_ripple(&mut self, position: WorldPoint, now: Instant) {
        self.ripple = Some(Ripple {
            position,
            expires_at: now + RIPPLE_LIFETIME,
        });
    }

    /// Replaces any toast still on screen.
    pub fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: now + TOAST_LIFETIME,
        });
    }

    pub fn hide_tooltip(&mut self) {
        self.tooltip_until = None;
    }

    pub fn dismiss_welcome(&mut self) {
        self.welcome = WelcomeState::Dismissed;
    }

    pub fn tick(&mut self, now: Instant) {
        if self.ripple.is_some_and(|ripple| now >= ripple.expires_at) {
            self.ripple = None;
        }
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| now >= toast.expires_at)
        {
            self.toast = None;
        }
        if self.tooltip_until.is_some_and(|until| now >= until) {
            self.tooltip_until = None;
        }
        if let WelcomeState::Pending { show_at } = self.welcome {
            if now >= show_at {
                self.welcome = WelcomeState::Showing;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ripple_and_toast_expire_on_their_own_schedules() {
        let start = Instant::now();
        let mut feedback = Feedback::new(start);
        feedback.show_ripple(WorldPoint::new(1.0, 2.0), start);
        feedback.show_toast("hello", start);

        feedback.tick(start + Duration::from_millis(999));
        assert!(feedback.ripple().is_some());

        feedback.tick(start + Duration::from_secs(1));
        assert!(feedback.ripple().is_none());
        assert!(feedback.toast().is_some());

        feedback.tick(start + Duration::from_secs(3));
        assert!(feedback.toast().is_none());
    }

    #[test]
    fn new_toast_supersedes_old_one() {
        let start = Instant::now();
        let mut feedback = Feedback::new(start);
        feedback.show_toast("first", start);
        feedback.show_toast("second", start + Duration::from_secs(2));

        feedback.tick(start + Duration::from_secs(4));

        let toast = feedback.toast().expect("second toast alive");
        assert_eq!(toast.message, "second");
    }

    #[test]
    fn tooltip_hides_after_timeout_or_on_demand() {
        let start = Instant::now();
        let mut feedback = Feedback::new(start);
        assert!(feedback.tooltip_visible());
        feedback.tick(start + TOOLTIP_LIFETIME);
        assert!(!feedback.tooltip_visible());

        let mut feedback = Feedback::new(start);
        feedback.hide_tooltip();
        assert!(!feedback.tooltip_visible());
    }

    #[test]
    fn welcome_appears_after_delay_and_stays_dismissed() {
        let start = Instant::now();
        let mut feedback = Feedback::new(start);
        feedback.tick(start + Duration::from_millis(100));
        assert!(!feedback.welcome_visible());

        feedback.tick(start + WELCOME_DELAY);
        assert!(feedback.welcome_visible());

        feedback.dismiss_welcome();
        feedback.tick(start + Duration::from_secs(10));
        assert!(!feedback.welcome_visible());
    }
}
