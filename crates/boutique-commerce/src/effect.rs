//! Side effects requested by the checkout coordinator and the notification
//! presenter.
//!
//! Handlers in this crate never sleep, spawn or call out. They return
//! effects and the application root carries them out, feeding results back
//! as new events.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::checkout::{AttemptId, CardInput, OrderSummary};
use crate::notify::NotificationId;

/// Deferred callbacks.
///
/// Timers are fire-and-forget: once scheduled they are never cancelled, so
/// each handler re-checks that the state it expects still holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Order processing finished; show the success message.
    OrderConfirmed(AttemptId),
    /// Remove the paid items and close the modal after a successful payment.
    FinalizeOrder(AttemptId),
    /// Start the exit animation of a notification.
    NotificationExpired(NotificationId),
    /// Remove a notification from the view.
    NotificationRemoved(NotificationId),
}

/// Work for the application root.
pub enum Effect {
    /// Load the payment gateway and attach its card input.
    InitializeGateway,
    /// Ask the attached card input for a token.
    Tokenize {
        attempt: AttemptId,
        card: Arc<dyn CardInput>,
    },
    /// Hand a token to the order-confirmation step.
    ConfirmOrder {
        attempt: AttemptId,
        token: String,
        summary: OrderSummary,
    },
    /// Run `timer` after `after` has elapsed.
    Schedule { after: Duration, timer: Timer },
    /// Show a transient message.
    Notify(String),
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializeGateway => write!(f, "InitializeGateway"),
            Self::Tokenize { attempt, .. } => {
                f.debug_struct("Tokenize").field("attempt", attempt).finish()
            }
            Self::ConfirmOrder {
                attempt, summary, ..
            } => f
                .debug_struct("ConfirmOrder")
                .field("attempt", attempt)
                .field("total", &summary.total)
                .finish_non_exhaustive(),
            Self::Schedule { after, timer } => f
                .debug_struct("Schedule")
                .field("after", after)
                .field("timer", timer)
                .finish(),
            Self::Notify(message) => f.debug_tuple("Notify").field(message).finish(),
        }
    }
}
