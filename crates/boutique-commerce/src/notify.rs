//! Transient notifications.
//!
//! Each notification lives through two timers of its own: it is visible for
//! the display duration, then leaves for the exit duration, then is removed.
//! There is no queue. Overlapping notifications are shown side by side.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::effect::{Effect, Timer};

/// Default time a notification stays visible.
pub const DEFAULT_DISPLAY: Duration = Duration::from_millis(3000);

/// Default exit animation length.
pub const DEFAULT_EXIT: Duration = Duration::from_millis(300);

/// Notification identifier, unique for the presenter's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification-{}", self.0)
    }
}

/// Lifecycle stage of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStage {
    Visible,
    Leaving,
}

/// A message currently in the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub stage: NotificationStage,
}

/// Notification presenter.
#[derive(Debug, Clone)]
pub struct Notifications {
    active: Vec<Notification>,
    next_id: u64,
    display: Duration,
    exit: Duration,
}

impl Notifications {
    /// Create a presenter with the default durations.
    pub fn new() -> Self {
        Self::with_durations(DEFAULT_DISPLAY, DEFAULT_EXIT)
    }

    /// Create a presenter with custom durations.
    pub fn with_durations(display: Duration, exit: Duration) -> Self {
        Self {
            active: Vec::new(),
            next_id: 0,
            display,
            exit,
        }
    }

    /// Show a message. The returned effect schedules its expiry.
    pub fn show(&mut self, message: impl Into<String>) -> (NotificationId, Effect) {
        self.next_id += 1;
        let id = NotificationId(self.next_id);
        let message = message.into();
        debug!(%id, %message, "notification shown");

        self.active.push(Notification {
            id,
            message,
            stage: NotificationStage::Visible,
        });

        (
            id,
            Effect::Schedule {
                after: self.display,
                timer: Timer::NotificationExpired(id),
            },
        )
    }

    /// Handle one of this presenter's timers.
    ///
    /// Timers for notifications that are already gone (or in an unexpected
    /// stage) are ignored. Timers that do not belong to the presenter yield
    /// nothing.
    pub fn on_timer(&mut self, timer: Timer) -> Option<Effect> {
        match timer {
            Timer::NotificationExpired(id) => {
                let notification = self
                    .active
                    .iter_mut()
                    .find(|n| n.id == id && n.stage == NotificationStage::Visible)?;
                notification.stage = NotificationStage::Leaving;
                Some(Effect::Schedule {
                    after: self.exit,
                    timer: Timer::NotificationRemoved(id),
                })
            }
            Timer::NotificationRemoved(id) => {
                self.active.retain(|n| n.id != id);
                debug!(%id, "notification removed");
                None
            }
            Timer::OrderConfirmed(_) | Timer::FinalizeOrder(_) => None,
        }
    }

    /// Notifications currently in the view, oldest first.
    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    /// Check if nothing is shown.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}
