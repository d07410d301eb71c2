//! Storefront event loop.
//!
//! [`Storefront`] is the application root. UI events are applied
//! synchronously through [`Storefront::dispatch`]; the effects they produce
//! (gateway calls and timers) run as tasks on a [`JoinSet`] and their
//! results are fed back one at a time by [`Storefront::step`]. All state is
//! owned by the storefront, so nothing here needs a lock.
//!
//! Gateway tasks are tracked by task id. If one panics, the coordinator is
//! told the call failed, so a crashed card widget never leaves checkout
//! stuck waiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use boutique_commerce::cart::{CartStore, LineItem};
use boutique_commerce::checkout::{
    initialize_card, AttemptId, CardInput, CheckoutCoordinator, CheckoutPhase, CheckoutView,
    GatewayError, GatewayLoader, TokenizeResult,
};
use boutique_commerce::effect::{Effect, Timer};
use boutique_commerce::notify::{Notification, Notifications};
use boutique_commerce::view::{CartBadge, CartView, RemoveHandle};
use serde::Serialize;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::nav::MobileMenu;
use crate::receipt::OrderReceipt;

/// Buy control label at rest.
pub const BUY_LABEL: &str = "Add to Cart";
/// Buy control label right after a successful add.
pub const BUY_ADDED_LABEL: &str = "Added! ✓";

/// User interactions with the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A buy control was pressed. Carries the control's product attributes,
    /// either of which may be missing on a malformed control.
    AddToCart {
        product: Option<String>,
        price: Option<String>,
    },
    OpenCart,
    CloseCart,
    CartBackdropClicked,
    RemoveItem(RemoveHandle),
    Checkout,
    PayNow,
    ClosePayment,
    PaymentBackdropClicked,
    Escape,
    ToggleMenu,
    NavLinkClicked,
    ClickedOutsideNav,
}

impl UiEvent {
    /// A buy control with both attributes present.
    pub fn add_to_cart(product: impl Into<String>, price: impl Into<String>) -> Self {
        Self::AddToCart {
            product: Some(product.into()),
            price: Some(price.into()),
        }
    }
}

#[derive(Debug)]
enum Wake {
    Timer(Timer),
    BuyFeedback { product: String, generation: u64 },
}

enum Completion {
    GatewayReady(Result<Arc<dyn CardInput>, GatewayError>),
    Tokenized {
        attempt: AttemptId,
        outcome: Result<TokenizeResult, GatewayError>,
    },
    Wake(Wake),
}

/// Gateway call running on a task.
#[derive(Debug, Clone, Copy)]
enum GatewayCall {
    Initialize,
    Tokenize(AttemptId),
}

impl GatewayCall {
    /// Result to report when the task running this call dies.
    fn failed(self, e: &JoinError) -> Completion {
        match self {
            GatewayCall::Initialize => Completion::GatewayReady(Err(GatewayError::Unavailable(
                format!("initialization task failed: {e}"),
            ))),
            GatewayCall::Tokenize(attempt) => Completion::Tokenized {
                attempt,
                outcome: Err(GatewayError::Tokenize(format!("tokenize task failed: {e}"))),
            },
        }
    }
}

#[derive(Debug, Default)]
struct BuyControl {
    generation: u64,
    added: bool,
}

/// Everything a front end needs to draw the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorefrontSnapshot {
    pub phase: CheckoutPhase,
    pub badge: usize,
    pub cart: CartView,
    pub checkout: Option<CheckoutView>,
    pub notifications: Vec<Notification>,
    pub menu_open: bool,
    pub receipts: Vec<OrderReceipt>,
}

/// The storefront page.
pub struct Storefront {
    config: StorefrontConfig,
    cart: CartStore,
    badge: CartBadge,
    checkout: CheckoutCoordinator,
    notifications: Notifications,
    menu: MobileMenu,
    buy_controls: HashMap<String, BuyControl>,
    receipts: Vec<OrderReceipt>,
    loader: Arc<dyn GatewayLoader>,
    tasks: JoinSet<Completion>,
    calls: HashMap<task::Id, GatewayCall>,
}

impl Storefront {
    /// Create a storefront. Nothing runs until [`Storefront::page_loaded`].
    pub fn new(config: StorefrontConfig, loader: Arc<dyn GatewayLoader>) -> Self {
        let cart = CartStore::new();
        let badge = CartBadge::new(&cart);
        let checkout = CheckoutCoordinator::with_delays(
            config.timing.confirm_delay(),
            config.timing.success_display(),
        );
        let notifications = Notifications::with_durations(
            config.timing.notification(),
            config.timing.notification_exit(),
        );

        Self {
            config,
            cart,
            badge,
            checkout,
            notifications,
            menu: MobileMenu::new(),
            buy_controls: HashMap::new(),
            receipts: Vec::new(),
            loader,
            tasks: JoinSet::new(),
            calls: HashMap::new(),
        }
    }

    /// Page load: start gateway initialization if configured to do so
    /// eagerly. Must be called inside a tokio runtime.
    pub fn page_loaded(&mut self) {
        info!(
            store = %self.config.store.name,
            eager_init = self.config.gateway.eager_init,
            "storefront loaded"
        );
        if self.config.gateway.eager_init {
            let effects = self.checkout.preload_gateway();
            self.run(effects);
        }
    }

    /// Apply a UI event.
    ///
    /// A rejected event leaves the page unchanged and is logged.
    pub fn dispatch(&mut self, event: UiEvent) -> Result<(), StorefrontError> {
        debug!(?event, "ui event");
        let result = self.handle(event);
        if let Err(e) = &result {
            warn!(error = %e, "ui event rejected");
        }
        result
    }

    fn handle(&mut self, event: UiEvent) -> Result<(), StorefrontError> {
        match event {
            UiEvent::AddToCart { product, price } => {
                let item = LineItem::from_attributes(product.as_deref(), price.as_deref())?;
                let name = item.name().to_string();
                let price = item.price();
                self.cart.add(item)?;
                info!(product = %name, %price, total = %self.cart.total(), "added to cart");

                self.show_notification(format!("{name} added to cart!"));
                self.mark_added(name);
            }
            UiEvent::OpenCart => {
                self.checkout.open_cart(&self.cart)?;
            }
            UiEvent::CloseCart | UiEvent::CartBackdropClicked => {
                self.checkout.close_cart();
            }
            UiEvent::RemoveItem(handle) => {
                let item = handle.activate(&mut self.cart)?;
                info!(product = %item.name(), total = %self.cart.total(), "removed from cart");
            }
            UiEvent::Checkout => {
                let effects = self.checkout.proceed_to_checkout(&self.cart)?;
                self.run(effects);
            }
            UiEvent::PayNow => {
                let effects = self.checkout.pay()?;
                self.run(effects);
            }
            UiEvent::ClosePayment | UiEvent::PaymentBackdropClicked => {
                self.checkout.close_modal();
            }
            UiEvent::Escape => {
                // Topmost overlay first.
                if !self.checkout.close_modal() {
                    self.checkout.close_cart();
                }
                self.menu.close();
            }
            UiEvent::ToggleMenu => {
                self.menu.toggle();
            }
            UiEvent::NavLinkClicked | UiEvent::ClickedOutsideNav => {
                self.menu.close();
            }
        }
        Ok(())
    }

    /// Wait for the next background task and apply its result.
    ///
    /// Returns `false` when nothing is pending.
    pub async fn step(&mut self) -> bool {
        let Some(joined) = self.tasks.join_next_with_id().await else {
            return false;
        };
        match joined {
            Ok((id, completion)) => {
                self.calls.remove(&id);
                self.complete(completion);
            }
            Err(e) => {
                error!(error = %e, "background task failed");
                if let Some(call) = self.calls.remove(&e.id()) {
                    self.complete(call.failed(&e));
                }
            }
        }
        true
    }

    /// Step until `done` holds. Returns `false` if the tasks ran out first.
    pub async fn run_until(&mut self, mut done: impl FnMut(&Self) -> bool) -> bool {
        while !done(self) {
            if !self.step().await {
                return false;
            }
        }
        true
    }

    /// Step until every timer has fired and every gateway call has returned.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Apply results that are already available without waiting for more.
    /// Returns how many were applied.
    pub async fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(true) = tokio::time::timeout(Duration::ZERO, self.step()).await {
            applied += 1;
        }
        applied
    }

    /// Number of background tasks not yet applied.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::GatewayReady(result) => self.checkout.gateway_initialized(result),
            Completion::Tokenized { attempt, outcome } => {
                let effects = self.checkout.tokenize_finished(attempt, outcome);
                self.run(effects);
            }
            Completion::Wake(Wake::Timer(Timer::OrderConfirmed(attempt))) => {
                let effects = self.checkout.order_confirmed(attempt);
                self.run(effects);
            }
            Completion::Wake(Wake::Timer(Timer::FinalizeOrder(attempt))) => {
                let effects = self.checkout.finalize_order(attempt, &mut self.cart);
                self.run(effects);
            }
            Completion::Wake(Wake::Timer(timer)) => {
                if let Some(effect) = self.notifications.on_timer(timer) {
                    self.run(vec![effect]);
                }
            }
            Completion::Wake(Wake::BuyFeedback {
                product,
                generation,
            }) => {
                // A later add restarts the feedback; only its own timer resets it.
                if let Some(control) = self.buy_controls.get_mut(&product) {
                    if control.generation == generation {
                        control.added = false;
                    }
                }
            }
        }
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::InitializeGateway => {
                    let loader = Arc::clone(&self.loader);
                    let credentials = self.config.gateway.credentials();
                    let mount_point = self.config.gateway.mount_point.clone();
                    let handle = self.tasks.spawn(async move {
                        Completion::GatewayReady(
                            initialize_card(loader.as_ref(), &credentials, &mount_point).await,
                        )
                    });
                    self.calls.insert(handle.id(), GatewayCall::Initialize);
                }
                Effect::Tokenize { attempt, card } => {
                    debug!(%attempt, "tokenizing card");
                    let handle = self.tasks.spawn(async move {
                        Completion::Tokenized {
                            attempt,
                            outcome: card.tokenize().await,
                        }
                    });
                    self.calls.insert(handle.id(), GatewayCall::Tokenize(attempt));
                }
                Effect::ConfirmOrder {
                    attempt,
                    token,
                    summary,
                } => {
                    let receipt = OrderReceipt::new(token, summary);
                    info!(
                        %attempt,
                        token = %receipt.masked_token(),
                        items = receipt.lines.len(),
                        total = %receipt.total,
                        "order confirmed"
                    );
                    self.receipts.push(receipt);
                }
                Effect::Schedule { after, timer } => self.schedule(after, Wake::Timer(timer)),
                Effect::Notify(message) => self.show_notification(message),
            }
        }
    }

    fn schedule(&mut self, after: Duration, wake: Wake) {
        self.tasks.spawn(async move {
            tokio::time::sleep(after).await;
            Completion::Wake(wake)
        });
    }

    fn show_notification(&mut self, message: String) {
        let (_, effect) = self.notifications.show(message);
        self.run(vec![effect]);
    }

    fn mark_added(&mut self, product: String) {
        let control = self.buy_controls.entry(product.clone()).or_default();
        control.generation += 1;
        control.added = true;
        let generation = control.generation;

        let after = self.config.timing.added_feedback();
        self.schedule(after, Wake::BuyFeedback { product, generation });
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Render the cart overlay contents.
    pub fn cart_view(&self) -> CartView {
        CartView::render(&self.cart)
    }

    pub fn badge(&self) -> &CartBadge {
        &self.badge
    }

    pub fn checkout(&self) -> &CheckoutCoordinator {
        &self.checkout
    }

    /// Render the payment modal, if it is open.
    pub fn checkout_view(&self) -> Option<CheckoutView> {
        self.checkout.view()
    }

    /// Notifications currently shown, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        self.notifications.active()
    }

    pub fn menu(&self) -> &MobileMenu {
        &self.menu
    }

    /// Label of the buy control for `product`.
    pub fn buy_control_label(&self, product: &str) -> &'static str {
        match self.buy_controls.get(product) {
            Some(control) if control.added => BUY_ADDED_LABEL,
            _ => BUY_LABEL,
        }
    }

    /// Orders confirmed so far.
    pub fn receipts(&self) -> &[OrderReceipt] {
        &self.receipts
    }

    pub fn snapshot(&self) -> StorefrontSnapshot {
        StorefrontSnapshot {
            phase: self.checkout.phase(),
            badge: self.badge.count(),
            cart: self.cart_view(),
            checkout: self.checkout_view(),
            notifications: self.notifications().to_vec(),
            menu_open: self.menu.is_open(),
            receipts: self.receipts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{SandboxGateway, SandboxLoader};

    fn storefront() -> Storefront {
        Storefront::new(
            StorefrontConfig::default(),
            Arc::new(SandboxLoader::Available(SandboxGateway::new())),
        )
    }

    #[tokio::test]
    async fn test_escape_closes_topmost_overlay() {
        let mut store = storefront();
        store.dispatch(UiEvent::add_to_cart("Silk Scarf", "45.00")).unwrap();
        store.dispatch(UiEvent::OpenCart).unwrap();
        store.dispatch(UiEvent::Checkout).unwrap();
        store.dispatch(UiEvent::ToggleMenu).unwrap();
        assert!(store.checkout().phase().is_modal());

        store.dispatch(UiEvent::Escape).unwrap();
        assert_eq!(store.checkout().phase(), CheckoutPhase::Idle);
        assert!(!store.menu().is_open());

        store.dispatch(UiEvent::OpenCart).unwrap();
        store.dispatch(UiEvent::Escape).unwrap();
        assert_eq!(store.checkout().phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_menu_events() {
        let mut store = storefront();
        store.dispatch(UiEvent::ToggleMenu).unwrap();
        assert!(store.menu().scroll_locked());

        store.dispatch(UiEvent::NavLinkClicked).unwrap();
        assert!(!store.menu().is_open());

        store.dispatch(UiEvent::ToggleMenu).unwrap();
        store.dispatch(UiEvent::ClickedOutsideNav).unwrap();
        assert!(!store.menu().is_open());
    }

    #[tokio::test]
    async fn test_rejected_event_leaves_state_alone() {
        let mut store = storefront();
        let err = store
            .dispatch(UiEvent::AddToCart {
                product: Some("Silk Scarf".to_string()),
                price: None,
            })
            .unwrap_err();
        assert!(err.as_commerce().is_some());
        assert!(store.cart().is_empty());
        assert!(store.notifications().is_empty());
        assert_eq!(store.pending_tasks(), 0);
    }
}
