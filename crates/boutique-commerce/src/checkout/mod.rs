//! Checkout module.
//!
//! Contains the checkout coordinator, the order summary it captures and the
//! payment gateway seam it drives.

mod coordinator;
mod gateway;
mod summary;

pub use coordinator::{
    AttemptId, CheckoutCoordinator, CheckoutPhase, CheckoutView, PayControl, StatusKind,
    StatusMessage, SummaryRow, DEFAULT_CONFIRM_DELAY, DEFAULT_SUCCESS_DISPLAY, MSG_DECLINED,
    MSG_GATEWAY_UNAVAILABLE, MSG_ORDER_CONFIRMED, MSG_PAYMENT_ERROR, MSG_PAYMENT_SUCCESS,
    PAY_LABEL, PROCESSING_LABEL,
};
pub use gateway::{
    initialize_card, CardInput, GatewayCredentials, GatewayError, GatewayFieldError,
    GatewayLoader, PaymentGateway, TokenStatus, TokenizeResult,
};
pub use summary::OrderSummary;
