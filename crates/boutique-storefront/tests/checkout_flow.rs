//! End-to-end storefront flows against the sandbox gateway.
//!
//! Every test runs with tokio's clock paused, so timers fire as soon as the
//! runtime is otherwise idle and elapsed times are exact.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boutique_storefront::commerce::checkout::{
    CardInput, CheckoutPhase, GatewayCredentials, GatewayError, GatewayLoader, PaymentGateway,
    StatusKind, TokenizeResult, MSG_GATEWAY_UNAVAILABLE, MSG_ORDER_CONFIRMED, MSG_PAYMENT_ERROR,
    MSG_PAYMENT_SUCCESS, PAY_LABEL, PROCESSING_LABEL,
};
use boutique_storefront::commerce::notify::NotificationStage;
use boutique_storefront::commerce::CommerceError;
use boutique_storefront::{
    SandboxGateway, SandboxLoader, SandboxResponse, Storefront, StorefrontConfig, UiEvent,
    BUY_ADDED_LABEL, BUY_LABEL,
};
use tokio::time::Instant;

fn storefront_with(gateway: SandboxGateway) -> Storefront {
    let mut store = Storefront::new(
        StorefrontConfig::default(),
        Arc::new(SandboxLoader::Available(gateway)),
    );
    store.page_loaded();
    store
}

fn fill_cart(store: &mut Storefront) {
    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();
    store
        .dispatch(UiEvent::add_to_cart("Tote Bag", "30.00"))
        .unwrap();
}

/// Open the payment modal and wait for the card input.
async fn open_checkout(store: &mut Storefront) {
    store.dispatch(UiEvent::OpenCart).unwrap();
    store.dispatch(UiEvent::Checkout).unwrap();
    assert!(store.run_until(|s| s.checkout().is_gateway_ready()).await);
}

/// Where a [`CrashingLoader`]'s card widget panics.
#[derive(Clone, Copy)]
enum Crash {
    OnCreate,
    OnTokenize,
}

struct CrashingLoader(Crash);

struct CrashingGateway(Crash);

struct CrashingCard;

impl GatewayLoader for CrashingLoader {
    fn load(
        &self,
        _credentials: &GatewayCredentials,
    ) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        Ok(Arc::new(CrashingGateway(self.0)))
    }
}

#[async_trait]
impl PaymentGateway for CrashingGateway {
    async fn card(&self) -> Result<Box<dyn CardInput>, GatewayError> {
        match self.0 {
            Crash::OnCreate => panic!("card widget failed to construct"),
            Crash::OnTokenize => Ok(Box::new(CrashingCard)),
        }
    }
}

#[async_trait]
impl CardInput for CrashingCard {
    async fn attach(&mut self, _mount_point: &str) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn tokenize(&self) -> Result<TokenizeResult, GatewayError> {
        panic!("card widget crashed")
    }
}

fn crashing_storefront(crash: Crash) -> Storefront {
    let mut store = Storefront::new(
        StorefrontConfig::default(),
        Arc::new(CrashingLoader(crash)),
    );
    store.page_loaded();
    store
}

#[tokio::test(start_paused = true)]
async fn test_cart_totals_and_badge() {
    let mut store = storefront_with(SandboxGateway::new());
    fill_cart(&mut store);

    let view = store.cart_view();
    assert_eq!(view.total, "$75.00");
    assert_eq!(view.rows.len(), 2);
    assert_eq!(store.badge().label(), "2");

    let messages: Vec<&str> = store
        .notifications()
        .iter()
        .map(|n| n.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec!["Silk Scarf added to cart!", "Tote Bag added to cart!"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_are_separate_items() {
    let mut store = storefront_with(SandboxGateway::new());
    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();
    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();

    assert_eq!(store.cart().count(), 2);
    assert_eq!(store.cart_view().total, "$90.00");
}

#[tokio::test(start_paused = true)]
async fn test_remove_item_from_open_cart() {
    let mut store = storefront_with(SandboxGateway::new());
    fill_cart(&mut store);
    store.dispatch(UiEvent::OpenCart).unwrap();

    let view = store.cart_view();
    store
        .dispatch(UiEvent::RemoveItem(view.rows[0].remove))
        .unwrap();

    let view = store.cart_view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].name, "Tote Bag");
    assert_eq!(view.total, "$30.00");
    assert_eq!(store.badge().count(), 1);
    assert_eq!(store.checkout().phase(), CheckoutPhase::CartOpen);
}

#[tokio::test(start_paused = true)]
async fn test_stale_remove_is_rejected() {
    let mut store = storefront_with(SandboxGateway::new());
    fill_cart(&mut store);
    let stale = store.cart_view();

    store
        .dispatch(UiEvent::RemoveItem(stale.rows[0].remove))
        .unwrap();
    let err = store
        .dispatch(UiEvent::RemoveItem(stale.rows[1].remove))
        .unwrap_err();

    assert!(matches!(
        err.as_commerce(),
        Some(CommerceError::StaleView { .. })
    ));
    assert_eq!(store.cart().count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_cart_cannot_check_out() {
    let mut store = storefront_with(SandboxGateway::new());
    store.dispatch(UiEvent::OpenCart).unwrap();

    let view = store.cart_view();
    assert_eq!(view.empty_message(), Some("Your cart is empty"));
    assert!(!view.checkout_enabled);

    let err = store.dispatch(UiEvent::Checkout).unwrap_err();
    assert_eq!(err.as_commerce(), Some(&CommerceError::EmptyCart));
    assert_eq!(store.checkout().phase(), CheckoutPhase::CartOpen);
    assert!(store.checkout_view().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_successful_payment_clears_cart() {
    let gateway = SandboxGateway::new();
    let mut store = storefront_with(gateway.clone());
    fill_cart(&mut store);
    open_checkout(&mut store).await;

    let view = store.checkout_view().unwrap();
    assert_eq!(view.total, "$75.00");
    assert_eq!(view.pay.label, PAY_LABEL);
    assert!(view.pay.enabled);

    store.dispatch(UiEvent::PayNow).unwrap();
    let view = store.checkout_view().unwrap();
    assert_eq!(view.pay.label, PROCESSING_LABEL);
    assert!(!view.pay.enabled);

    let started = Instant::now();
    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::Success)
            .await
    );
    let status = store.checkout().status().unwrap();
    assert_eq!(status.kind, StatusKind::Success);
    assert_eq!(status.text, MSG_PAYMENT_SUCCESS);
    // The cart survives until the success message has been read.
    assert_eq!(store.cart().count(), 2);
    assert_eq!(store.receipts().len(), 1);
    assert_eq!(store.receipts()[0].token, "tok_sandbox_1");
    assert_eq!(store.receipts()[0].total.amount_cents(), 7500);

    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::Idle)
            .await
    );
    // Confirmation delay plus success display.
    assert!(started.elapsed() >= Duration::from_millis(3500));
    assert!(store.cart().is_empty());
    assert_eq!(store.badge().label(), "0");
    assert!(store.checkout_view().is_none());
    assert!(store
        .notifications()
        .iter()
        .any(|n| n.message == MSG_ORDER_CONFIRMED));

    store.settle().await;
    assert!(store.notifications().is_empty());
    assert_eq!(gateway.tokenize_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_success_waits_for_order_confirmation() {
    let mut store = storefront_with(SandboxGateway::new());
    fill_cart(&mut store);
    open_checkout(&mut store).await;

    let started = Instant::now();
    store.dispatch(UiEvent::PayNow).unwrap();
    assert!(store.run_until(|s| !s.receipts().is_empty()).await);

    // The token is in, but the order is still being processed.
    assert_eq!(store.checkout().phase(), CheckoutPhase::Tokenizing);
    assert_eq!(store.checkout_view().unwrap().pay.label, PROCESSING_LABEL);
    assert!(store.checkout().status().is_none());

    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::Success)
            .await
    );
    assert!(started.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_items_added_after_payment_survive_finalize() {
    let mut store = storefront_with(SandboxGateway::new());
    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();
    open_checkout(&mut store).await;

    store.dispatch(UiEvent::PayNow).unwrap();
    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::Success)
            .await
    );
    store.dispatch(UiEvent::ClosePayment).unwrap();
    store
        .dispatch(UiEvent::add_to_cart("Tote Bag", "30.00"))
        .unwrap();
    assert_eq!(store.cart().count(), 2);

    assert!(store.run_until(|s| !s.checkout().has_pending_order()).await);
    assert_eq!(store.receipts()[0].total.display(), "$45.00");
    let view = store.cart_view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].name, "Tote Bag");
    assert_eq!(view.total, "$30.00");
    assert_eq!(store.badge().count(), 1);
    assert!(store
        .notifications()
        .iter()
        .any(|n| n.message == MSG_ORDER_CONFIRMED));
}

#[tokio::test(start_paused = true)]
async fn test_crashed_tokenize_is_recoverable() {
    let mut store = crashing_storefront(Crash::OnTokenize);
    fill_cart(&mut store);
    open_checkout(&mut store).await;

    store.dispatch(UiEvent::PayNow).unwrap();
    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::CheckoutOpen)
            .await
    );

    let view = store.checkout_view().unwrap();
    assert_eq!(view.status.unwrap().text, MSG_PAYMENT_ERROR);
    assert!(view.pay.enabled);
    assert_eq!(view.pay.label, PAY_LABEL);
    assert_eq!(store.cart().count(), 2);

    // The control works again.
    store.dispatch(UiEvent::PayNow).unwrap();
    assert_eq!(store.checkout().phase(), CheckoutPhase::Tokenizing);
}

#[tokio::test(start_paused = true)]
async fn test_crashed_initialization_is_a_page_fault() {
    let mut store = crashing_storefront(Crash::OnCreate);
    fill_cart(&mut store);
    store.dispatch(UiEvent::OpenCart).unwrap();
    store.dispatch(UiEvent::Checkout).unwrap();

    assert!(
        store
            .run_until(|s| s.checkout().is_gateway_unavailable())
            .await
    );
    let view = store.checkout_view().unwrap();
    assert_eq!(view.status.unwrap().text, MSG_GATEWAY_UNAVAILABLE);
    assert!(!view.pay.enabled);
}

#[tokio::test(start_paused = true)]
async fn test_declined_card_can_retry() {
    let gateway = SandboxGateway::new();
    gateway.push_response(SandboxResponse::decline("Invalid card number"));
    let mut store = storefront_with(gateway.clone());
    fill_cart(&mut store);
    open_checkout(&mut store).await;

    store.dispatch(UiEvent::PayNow).unwrap();
    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::CheckoutOpen)
            .await
    );

    let view = store.checkout_view().unwrap();
    let status = view.status.unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "Invalid card number");
    assert!(view.pay.enabled);
    assert_eq!(store.cart().count(), 2);
    assert!(store.receipts().is_empty());

    store.dispatch(UiEvent::PayNow).unwrap();
    assert!(store.checkout_view().unwrap().status.is_none());
    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::Success)
            .await
    );
    assert_eq!(gateway.tokenize_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_tokenize_fault_shows_generic_error() {
    let gateway = SandboxGateway::new();
    gateway.push_response(SandboxResponse::fault("connection reset"));
    let mut store = storefront_with(gateway);
    fill_cart(&mut store);
    open_checkout(&mut store).await;

    store.dispatch(UiEvent::PayNow).unwrap();
    assert!(
        store
            .run_until(|s| s.checkout().phase() == CheckoutPhase::CheckoutOpen)
            .await
    );
    assert_eq!(
        store.checkout().status().map(|s| s.text.as_str()),
        Some(MSG_PAYMENT_ERROR)
    );
    assert_eq!(store.cart().count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_missing_gateway_is_a_page_fault() {
    let mut store = Storefront::new(
        StorefrontConfig::default(),
        Arc::new(SandboxLoader::Missing),
    );
    store.page_loaded();
    fill_cart(&mut store);
    store.dispatch(UiEvent::OpenCart).unwrap();
    store.dispatch(UiEvent::Checkout).unwrap();
    assert!(
        store
            .run_until(|s| s.checkout().is_gateway_unavailable())
            .await
    );

    let view = store.checkout_view().unwrap();
    assert_eq!(view.status.unwrap().text, MSG_GATEWAY_UNAVAILABLE);
    assert!(!view.pay.enabled);

    let err = store.dispatch(UiEvent::PayNow).unwrap_err();
    assert!(matches!(
        err.as_commerce(),
        Some(CommerceError::GatewayUnavailable(_))
    ));
    assert_eq!(store.checkout().phase(), CheckoutPhase::CheckoutOpen);
}

#[tokio::test(start_paused = true)]
async fn test_lazy_init_on_first_checkout() {
    let gateway = SandboxGateway::new();
    let mut config = StorefrontConfig::default();
    config.gateway.eager_init = false;
    let mut store = Storefront::new(config, Arc::new(SandboxLoader::Available(gateway.clone())));
    store.page_loaded();
    assert_eq!(store.pending_tasks(), 0);

    fill_cart(&mut store);
    open_checkout(&mut store).await;
    assert_eq!(gateway.attach_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_card_input_attached_once() {
    let gateway = SandboxGateway::new();
    let mut store = storefront_with(gateway.clone());
    fill_cart(&mut store);

    for _ in 0..3 {
        open_checkout(&mut store).await;
        store.dispatch(UiEvent::ClosePayment).unwrap();
        assert_eq!(store.checkout().phase(), CheckoutPhase::Idle);
    }

    assert_eq!(gateway.cards_created(), 1);
    assert_eq!(gateway.attach_count(), 1);
    assert_eq!(store.cart().count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_close_while_tokenizing_abandons_attempt() {
    let gateway = SandboxGateway::with_latency(Duration::from_millis(500));
    let mut store = storefront_with(gateway.clone());
    fill_cart(&mut store);
    open_checkout(&mut store).await;

    store.dispatch(UiEvent::PayNow).unwrap();
    store.dispatch(UiEvent::PaymentBackdropClicked).unwrap();
    assert_eq!(store.checkout().phase(), CheckoutPhase::Idle);

    store.settle().await;
    assert_eq!(gateway.tokenize_calls(), 1);
    assert_eq!(store.checkout().phase(), CheckoutPhase::Idle);
    assert!(store.receipts().is_empty());
    assert_eq!(store.cart().count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_notification_dismissal_timing() {
    let mut store = storefront_with(SandboxGateway::new());
    let started = Instant::now();
    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();
    assert_eq!(
        store.notifications()[0].stage,
        NotificationStage::Visible
    );

    assert!(
        store
            .run_until(|s| {
                s.notifications().first().map(|n| n.stage) == Some(NotificationStage::Leaving)
            })
            .await
    );
    assert!(started.elapsed() >= Duration::from_millis(3000));

    assert!(store.run_until(|s| s.notifications().is_empty()).await);
    assert!(started.elapsed() >= Duration::from_millis(3300));
}

#[tokio::test(start_paused = true)]
async fn test_buy_control_feedback_restarts() {
    let mut store = storefront_with(SandboxGateway::new());
    let started = Instant::now();
    assert_eq!(store.buy_control_label("Silk Scarf"), BUY_LABEL);

    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();
    assert_eq!(store.buy_control_label("Silk Scarf"), BUY_ADDED_LABEL);
    assert_eq!(store.buy_control_label("Tote Bag"), BUY_LABEL);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();

    assert!(
        store
            .run_until(|s| s.buy_control_label("Silk Scarf") == BUY_LABEL)
            .await
    );
    assert!(started.elapsed() >= Duration::from_millis(3500));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_buy_control() {
    let mut store = storefront_with(SandboxGateway::new());

    let err = store
        .dispatch(UiEvent::AddToCart {
            product: None,
            price: Some("45.00".to_string()),
        })
        .unwrap_err();
    assert_eq!(
        err.as_commerce(),
        Some(&CommerceError::MissingAttribute("data-product"))
    );

    let err = store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "free"))
        .unwrap_err();
    assert!(matches!(
        err.as_commerce(),
        Some(CommerceError::InvalidPrice { .. })
    ));
    assert!(store.cart().is_empty());
    assert_eq!(store.buy_control_label("Silk Scarf"), BUY_LABEL);
}

#[tokio::test(start_paused = true)]
async fn test_drain_ready_applies_only_finished_work() {
    let mut store = storefront_with(SandboxGateway::new());
    store
        .dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00"))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(3100)).await;

    // Gateway init, buy feedback and notification expiry have finished; the
    // removal timer the expiry scheduled has not.
    assert_eq!(store.drain_ready().await, 3);
    assert!(store.checkout().is_gateway_ready());
    assert_eq!(store.buy_control_label("Silk Scarf"), BUY_LABEL);
    assert_eq!(store.notifications()[0].stage, NotificationStage::Leaving);
    assert_eq!(store.pending_tasks(), 1);
}
