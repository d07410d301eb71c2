//! Checkout coordinator state machine.
//!
//! ```text
//! Idle -> CartOpen -> CheckoutOpen -> Tokenizing -> Success -> Idle
//!                          ^              |
//!                          +--- failed ---+
//! ```
//!
//! A token is handed to order confirmation as soon as it arrives; the phase
//! stays `Tokenizing` for the confirm delay and then moves to `Success`.
//!
//! Closing the modal returns to `Idle` from any modal phase without touching
//! the cart. Once a token has been issued the order is finalized regardless:
//! the paid lines leave the cart and anything added since stays. The
//! coordinator owns the card input once it has been attached and never
//! creates a second one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::cart::CartStore;
use crate::checkout::{CardInput, GatewayError, OrderSummary, TokenizeResult};
use crate::effect::{Effect, Timer};
use crate::error::CommerceError;
use crate::view::CartView;

/// Pay control label while idle.
pub const PAY_LABEL: &str = "Pay Now";
/// Pay control label while a tokenize call is in flight.
pub const PROCESSING_LABEL: &str = "Processing...";

pub const MSG_PAYMENT_SUCCESS: &str = "Payment successful! Thank you for your purchase.";
pub const MSG_DECLINED: &str = "Payment failed. Please try again.";
pub const MSG_PAYMENT_ERROR: &str = "Payment error. Please try again.";
pub const MSG_GATEWAY_UNAVAILABLE: &str = "Failed to load payment form. Please refresh the page.";
pub const MSG_ORDER_CONFIRMED: &str = "Order confirmed! Check your email for details.";

/// Order processing between a token arriving and the success message.
pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_millis(1500);
/// How long the success message stays up before the order is finalized.
pub const DEFAULT_SUCCESS_DISPLAY: Duration = Duration::from_millis(2000);

/// Phases of the cart review and payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// Neither overlay is open.
    Idle,
    /// Cart overlay is open.
    CartOpen,
    /// Payment modal is open and waiting for the user.
    CheckoutOpen,
    /// A tokenize call is in flight.
    Tokenizing,
    /// Payment succeeded; the order is about to be finalized.
    Success,
}

impl CheckoutPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutPhase::Idle => "idle",
            CheckoutPhase::CartOpen => "cart_open",
            CheckoutPhase::CheckoutOpen => "checkout_open",
            CheckoutPhase::Tokenizing => "tokenizing",
            CheckoutPhase::Success => "success",
        }
    }

    /// Check if the payment modal is showing.
    pub fn is_modal(&self) -> bool {
        matches!(
            self,
            CheckoutPhase::CheckoutOpen | CheckoutPhase::Tokenizing | CheckoutPhase::Success
        )
    }
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one press of the pay control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// Message in the modal's status area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// State of the pay control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayControl {
    pub enabled: bool,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub name: String,
    pub price: String,
}

/// Rendered payment modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutView {
    pub phase: CheckoutPhase,
    pub rows: Vec<SummaryRow>,
    pub total: String,
    pub status: Option<StatusMessage>,
    pub pay: PayControl,
}

enum GatewayState {
    Uninitialized,
    Initializing,
    Ready(Arc<dyn CardInput>),
    Unavailable(String),
}

impl fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Ready(_) => write!(f, "Ready"),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// A paid order waiting for its finalize timer.
#[derive(Debug)]
struct PaidOrder {
    attempt: AttemptId,
    summary: OrderSummary,
}

/// Drives the cart overlay and payment modal.
#[derive(Debug)]
pub struct CheckoutCoordinator {
    phase: CheckoutPhase,
    gateway: GatewayState,
    summary: Option<OrderSummary>,
    status: Option<StatusMessage>,
    next_attempt: u64,
    in_flight: Option<AttemptId>,
    confirming: Option<AttemptId>,
    paid: Option<PaidOrder>,
    confirm_delay: Duration,
    success_display: Duration,
}

impl CheckoutCoordinator {
    /// Create a coordinator with the default delays.
    pub fn new() -> Self {
        Self::with_delays(DEFAULT_CONFIRM_DELAY, DEFAULT_SUCCESS_DISPLAY)
    }

    /// Create a coordinator with custom confirm and success display delays.
    pub fn with_delays(confirm_delay: Duration, success_display: Duration) -> Self {
        Self {
            phase: CheckoutPhase::Idle,
            gateway: GatewayState::Uninitialized,
            summary: None,
            status: None,
            next_attempt: 0,
            in_flight: None,
            confirming: None,
            paid: None,
            confirm_delay,
            success_display,
        }
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Current status-area message.
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Summary captured when checkout began.
    pub fn summary(&self) -> Option<&OrderSummary> {
        self.summary.as_ref()
    }

    /// Check if the card input is attached and usable.
    pub fn is_gateway_ready(&self) -> bool {
        matches!(self.gateway, GatewayState::Ready(_))
    }

    /// Check if a paid order is still waiting to be finalized.
    pub fn has_pending_order(&self) -> bool {
        self.paid.is_some()
    }

    /// Check if gateway initialization failed for this page.
    pub fn is_gateway_unavailable(&self) -> bool {
        matches!(self.gateway, GatewayState::Unavailable(_))
    }

    /// Current pay control state.
    pub fn pay_control(&self) -> PayControl {
        match self.phase {
            CheckoutPhase::Tokenizing => PayControl {
                enabled: false,
                label: PROCESSING_LABEL,
            },
            CheckoutPhase::CheckoutOpen => PayControl {
                enabled: self.is_gateway_ready() && self.paid.is_none(),
                label: PAY_LABEL,
            },
            _ => PayControl {
                enabled: false,
                label: PAY_LABEL,
            },
        }
    }

    /// Render the payment modal, if it is open.
    pub fn view(&self) -> Option<CheckoutView> {
        if !self.phase.is_modal() {
            return None;
        }
        let summary = self.summary.as_ref()?;
        Some(CheckoutView {
            phase: self.phase,
            rows: summary
                .rows()
                .into_iter()
                .map(|(name, price)| SummaryRow { name, price })
                .collect(),
            total: summary.total.display(),
            status: self.status.clone(),
            pay: self.pay_control(),
        })
    }

    /// Start gateway initialization if it has never been started.
    pub fn preload_gateway(&mut self) -> Vec<Effect> {
        match self.gateway {
            GatewayState::Uninitialized => {
                self.gateway = GatewayState::Initializing;
                info!("initializing payment gateway");
                vec![Effect::InitializeGateway]
            }
            _ => Vec::new(),
        }
    }

    /// Record the outcome of gateway initialization.
    ///
    /// A failure is final for the page: the modal stays unusable until a
    /// reload.
    pub fn gateway_initialized(&mut self, result: Result<Arc<dyn CardInput>, GatewayError>) {
        if !matches!(self.gateway, GatewayState::Initializing) {
            warn!(state = ?self.gateway, "ignoring unexpected gateway initialization result");
            return;
        }

        match result {
            Ok(card) => {
                info!("payment gateway ready");
                self.gateway = GatewayState::Ready(card);
            }
            Err(e) => {
                error!(error = %e, "failed to initialize payment gateway");
                self.gateway = GatewayState::Unavailable(e.to_string());
                if self.phase.is_modal() {
                    self.status = Some(StatusMessage::error(MSG_GATEWAY_UNAVAILABLE));
                }
            }
        }
    }

    /// Open the cart overlay.
    pub fn open_cart(&mut self, cart: &CartStore) -> Result<CartView, CommerceError> {
        match self.phase {
            CheckoutPhase::Idle | CheckoutPhase::CartOpen => {
                self.transition(CheckoutPhase::CartOpen);
                Ok(CartView::render(cart))
            }
            other => Err(CommerceError::InvalidCheckoutTransition {
                from: other.as_str(),
                to: CheckoutPhase::CartOpen.as_str(),
            }),
        }
    }

    /// Close the cart overlay. Returns whether it was open.
    pub fn close_cart(&mut self) -> bool {
        if self.phase != CheckoutPhase::CartOpen {
            return false;
        }
        self.transition(CheckoutPhase::Idle);
        true
    }

    /// Leave the cart overlay for the payment modal.
    ///
    /// Requires a non-empty cart. Captures the order summary and starts
    /// gateway initialization on first use.
    pub fn proceed_to_checkout(&mut self, cart: &CartStore) -> Result<Vec<Effect>, CommerceError> {
        if self.phase != CheckoutPhase::CartOpen {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.phase.as_str(),
                to: CheckoutPhase::CheckoutOpen.as_str(),
            });
        }

        let summary = OrderSummary::capture(cart)?;
        info!(
            items = summary.lines.len(),
            total_cents = summary.total.amount_cents(),
            "checkout started"
        );
        self.summary = Some(summary);
        self.status = None;
        self.transition(CheckoutPhase::CheckoutOpen);

        if self.is_gateway_unavailable() {
            self.status = Some(StatusMessage::error(MSG_GATEWAY_UNAVAILABLE));
        }
        Ok(self.preload_gateway())
    }

    /// Handle the pay control.
    pub fn pay(&mut self) -> Result<Vec<Effect>, CommerceError> {
        match self.phase {
            CheckoutPhase::CheckoutOpen => {}
            CheckoutPhase::Tokenizing => return Err(CommerceError::PaymentInProgress),
            other => {
                return Err(CommerceError::InvalidCheckoutTransition {
                    from: other.as_str(),
                    to: CheckoutPhase::Tokenizing.as_str(),
                })
            }
        }

        let card = match &self.gateway {
            GatewayState::Ready(card) => Arc::clone(card),
            GatewayState::Unavailable(reason) => {
                return Err(CommerceError::GatewayUnavailable(reason.clone()))
            }
            GatewayState::Uninitialized | GatewayState::Initializing => {
                return Err(CommerceError::GatewayNotReady)
            }
        };
        // The previous order's lines are still in the cart until it finalizes.
        if self.paid.is_some() {
            return Err(CommerceError::PaymentInProgress);
        }

        self.next_attempt += 1;
        let attempt = AttemptId(self.next_attempt);
        self.in_flight = Some(attempt);
        self.status = None;
        self.transition(CheckoutPhase::Tokenizing);

        Ok(vec![Effect::Tokenize { attempt, card }])
    }

    /// Handle the outcome of a tokenize call.
    ///
    /// Results for attempts abandoned by closing the modal are discarded.
    pub fn tokenize_finished(
        &mut self,
        attempt: AttemptId,
        outcome: Result<TokenizeResult, GatewayError>,
    ) -> Vec<Effect> {
        if self.in_flight != Some(attempt) {
            warn!(%attempt, "discarding tokenize result for abandoned attempt");
            return Vec::new();
        }
        self.in_flight = None;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                error!(%attempt, error = %e, "tokenize call failed");
                return self.fail(MSG_PAYMENT_ERROR);
            }
        };

        if !result.status.is_ok() {
            let message = result
                .joined_messages()
                .unwrap_or_else(|| MSG_DECLINED.to_string());
            warn!(%attempt, status = %result.status, %message, "card rejected");
            return self.fail(message);
        }

        let Some(token) = result.token else {
            error!(%attempt, "gateway returned OK without a token");
            return self.fail(MSG_PAYMENT_ERROR);
        };

        let Some(summary) = self.summary.clone() else {
            error!(%attempt, "tokenized without an order summary");
            return self.fail(MSG_PAYMENT_ERROR);
        };

        self.paid = Some(PaidOrder {
            attempt,
            summary: summary.clone(),
        });
        self.confirming = Some(attempt);

        let mut effects = vec![Effect::ConfirmOrder {
            attempt,
            token,
            summary,
        }];
        if self.confirm_delay.is_zero() {
            effects.extend(self.order_confirmed(attempt));
        } else {
            effects.push(Effect::Schedule {
                after: self.confirm_delay,
                timer: Timer::OrderConfirmed(attempt),
            });
        }
        effects
    }

    /// Order processing for `attempt` finished: show the success message
    /// and schedule finalization.
    ///
    /// If the modal was closed in the meantime nothing is shown, but the
    /// order is still finalized.
    pub fn order_confirmed(&mut self, attempt: AttemptId) -> Vec<Effect> {
        if self.paid.as_ref().map(|order| order.attempt) != Some(attempt) {
            warn!(%attempt, "ignoring confirmation for an order that is not pending");
            return Vec::new();
        }

        if self.confirming == Some(attempt) && self.phase == CheckoutPhase::Tokenizing {
            self.status = Some(StatusMessage::success(MSG_PAYMENT_SUCCESS));
            self.transition(CheckoutPhase::Success);
        }
        self.confirming = None;

        vec![Effect::Schedule {
            after: self.success_display,
            timer: Timer::FinalizeOrder(attempt),
        }]
    }

    /// Finalize a successful order: take the paid lines out of the cart and
    /// close the modal.
    ///
    /// Runs even if the user already closed the modal, since the payment
    /// went through. If the cart changed after checkout began only the paid
    /// lines are removed. Does nothing if `attempt` is not pending.
    pub fn finalize_order(&mut self, attempt: AttemptId, cart: &mut CartStore) -> Vec<Effect> {
        let order = match self.paid.take() {
            Some(order) if order.attempt == attempt => order,
            other => {
                self.paid = other;
                warn!(%attempt, "ignoring finalize timer for an order that is not pending");
                return Vec::new();
            }
        };

        let removed = if cart.revision() == order.summary.revision {
            cart.clear()
        } else {
            cart.remove_lines(&order.summary.lines)
        };
        info!(%attempt, removed, remaining = cart.count(), "order finalized");

        // A modal reopened before finalization shows lines that are now gone.
        if self.phase.is_modal() {
            self.close_modal();
        }
        vec![Effect::Notify(MSG_ORDER_CONFIRMED.to_string())]
    }

    /// Close the payment modal. Returns whether it was open.
    ///
    /// The cart is left alone. An in-flight tokenize call is abandoned and
    /// its result will be ignored.
    pub fn close_modal(&mut self) -> bool {
        if !self.phase.is_modal() {
            return false;
        }
        if let Some(attempt) = self.in_flight.take() {
            warn!(%attempt, "payment modal closed while tokenizing; result will be ignored");
        }
        if let Some(attempt) = self.confirming.take() {
            info!(%attempt, "payment modal closed before confirmation; order will still finalize");
        }
        self.status = None;
        self.summary = None;
        self.transition(CheckoutPhase::Idle);
        true
    }

    fn fail(&mut self, message: impl Into<String>) -> Vec<Effect> {
        self.status = Some(StatusMessage::error(message));
        self.transition(CheckoutPhase::CheckoutOpen);
        Vec::new()
    }

    fn transition(&mut self, to: CheckoutPhase) {
        if self.phase != to {
            info!(from = %self.phase, %to, "checkout transition");
            self.phase = to;
        }
    }
}

impl Default for CheckoutCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
