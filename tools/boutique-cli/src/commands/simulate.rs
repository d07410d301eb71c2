//! Scripted shopping sessions.
//!
//! A script is a TOML file with an optional `[gateway]` table that sets up
//! the sandbox and a list of `[[step]]` tables, each naming an `action`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use boutique_storefront::commerce::checkout::CheckoutPhase;
use boutique_storefront::commerce::view::RemoveHandle;
use boutique_storefront::{
    SandboxGateway, SandboxLoader, SandboxResponse, Storefront, StorefrontConfig, UiEvent,
};
use serde::Deserialize;

use super::SimulateArgs;
use crate::context::Context;
use crate::output::Output;

/// Demo session: a decline followed by a successful retry.
pub const DEFAULT_SCRIPT: &str = r#"[gateway]
latency_ms = 300
responses = [
    { outcome = "decline", messages = ["Invalid card number"] },
    { outcome = "approve" },
]

[[step]]
action = "add-to-cart"
product = "Silk Scarf"
price = "45.00"

[[step]]
action = "add-to-cart"
product = "Tote Bag"
price = "30.00"

[[step]]
action = "add-to-cart"
product = "Silk Scarf"
price = "45.00"

[[step]]
action = "open-cart"

[[step]]
action = "remove-item"
index = 2

[[step]]
action = "checkout"

[[step]]
action = "wait-for-gateway"

[[step]]
action = "pay-now"

[[step]]
action = "wait-for-payment"

[[step]]
action = "pay-now"

[[step]]
action = "wait-for-payment"

[[step]]
action = "wait-for-checkout-closed"
"#;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptGateway {
    #[serde(default)]
    latency_ms: u64,
    /// Simulate a payment client that never loads.
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    responses: Vec<SandboxResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum Step {
    AddToCart {
        product: Option<String>,
        price: Option<String>,
    },
    OpenCart,
    CloseCart,
    RemoveItem {
        index: usize,
    },
    Checkout,
    PayNow,
    ClosePayment,
    Escape,
    ToggleMenu,
    NavLinkClicked,
    WaitForGateway,
    WaitForPayment,
    WaitForCheckoutClosed,
    Sleep {
        ms: u64,
    },
    Settle,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::AddToCart { .. } => "add-to-cart",
            Step::OpenCart => "open-cart",
            Step::CloseCart => "close-cart",
            Step::RemoveItem { .. } => "remove-item",
            Step::Checkout => "checkout",
            Step::PayNow => "pay-now",
            Step::ClosePayment => "close-payment",
            Step::Escape => "escape",
            Step::ToggleMenu => "toggle-menu",
            Step::NavLinkClicked => "nav-link-clicked",
            Step::WaitForGateway => "wait-for-gateway",
            Step::WaitForPayment => "wait-for-payment",
            Step::WaitForCheckoutClosed => "wait-for-checkout-closed",
            Step::Sleep { .. } => "sleep",
            Step::Settle => "settle",
        }
    }

    /// The UI event this step stands for, if it is not a wait.
    fn event(&self, store: &Storefront) -> Option<UiEvent> {
        let event = match self {
            Step::AddToCart { product, price } => UiEvent::AddToCart {
                product: product.clone(),
                price: price.clone(),
            },
            Step::OpenCart => UiEvent::OpenCart,
            Step::CloseCart => UiEvent::CloseCart,
            Step::RemoveItem { index } => UiEvent::RemoveItem(RemoveHandle {
                index: *index,
                revision: store.cart().revision(),
            }),
            Step::Checkout => UiEvent::Checkout,
            Step::PayNow => UiEvent::PayNow,
            Step::ClosePayment => UiEvent::ClosePayment,
            Step::Escape => UiEvent::Escape,
            Step::ToggleMenu => UiEvent::ToggleMenu,
            Step::NavLinkClicked => UiEvent::NavLinkClicked,
            Step::WaitForGateway
            | Step::WaitForPayment
            | Step::WaitForCheckoutClosed
            | Step::Sleep { .. }
            | Step::Settle => return None,
        };
        Some(event)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default)]
    gateway: ScriptGateway,
    #[serde(default, rename = "step")]
    steps: Vec<Step>,
}

impl Script {
    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse simulation script")
    }

    fn loader(&self) -> (SandboxLoader, SandboxGateway) {
        let gateway = SandboxGateway::with_latency(Duration::from_millis(self.gateway.latency_ms));
        gateway.extend_responses(self.gateway.responses.iter().cloned());
        let loader = if self.gateway.missing {
            SandboxLoader::Missing
        } else {
            SandboxLoader::Available(gateway.clone())
        };
        (loader, gateway)
    }
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    if args.print_default {
        print!("{DEFAULT_SCRIPT}");
        return Ok(());
    }

    let script = match &args.script {
        Some(path) => {
            let path = ctx.resolve_path(path);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read script: {}", path.display()))?;
            Script::parse(&content)?
        }
        None => Script::parse(DEFAULT_SCRIPT)?,
    };

    ctx.config.validate()?;
    ctx.output.header(&format!(
        "Simulating {} step(s) at {}",
        script.steps.len(),
        ctx.config.store.name
    ));

    let store = run_script(&script, ctx.config.clone(), &ctx.output).await?;

    if ctx.output.is_json() {
        ctx.output.json(&store.snapshot());
        return Ok(());
    }

    ctx.output.header("Result");
    ctx.output.kv("cart items", &store.cart().count().to_string());
    ctx.output.kv("orders confirmed", &store.receipts().len().to_string());
    for receipt in store.receipts() {
        ctx.output.list_item(&format!(
            "{} for {} ({} item(s)) at {}",
            receipt.masked_token(),
            receipt.total,
            receipt.lines.len(),
            receipt.confirmed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    Ok(())
}

async fn run_script(
    script: &Script,
    config: StorefrontConfig,
    output: &Output,
) -> Result<Storefront> {
    let (loader, gateway) = script.loader();
    let mut store = Storefront::new(config, Arc::new(loader));
    store.page_loaded();

    let total = script.steps.len();
    for (i, step) in script.steps.iter().enumerate() {
        output.step(i + 1, total, step.name());

        match step.event(&store) {
            Some(event) => {
                if let Err(e) = store.dispatch(event) {
                    output.warn(&format!("rejected: {e}"));
                }
            }
            None => wait(step, &mut store, output).await,
        }

        store.drain_ready().await;
        render(&store, output);
    }

    output.debug(&format!(
        "sandbox: {} card(s), {} tokenize call(s), {} response(s) unused",
        gateway.cards_created(),
        gateway.tokenize_calls(),
        gateway.pending_responses()
    ));

    Ok(store)
}

async fn wait(step: &Step, store: &mut Storefront, output: &Output) {
    let reached = match step {
        Step::WaitForGateway => {
            store
                .run_until(|s| {
                    s.checkout().is_gateway_ready() || s.checkout().is_gateway_unavailable()
                })
                .await
        }
        Step::WaitForPayment => {
            store
                .run_until(|s| s.checkout().phase() != CheckoutPhase::Tokenizing)
                .await
        }
        Step::WaitForCheckoutClosed => {
            store
                .run_until(|s| !s.checkout().phase().is_modal())
                .await
        }
        Step::Sleep { ms } => {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(*ms);
            while let Ok(true) = tokio::time::timeout_at(deadline, store.step()).await {}
            tokio::time::sleep_until(deadline).await;
            true
        }
        Step::Settle => {
            store.settle().await;
            true
        }
        _ => true,
    };

    if !reached {
        output.warn("nothing left to wait for");
    }
}

fn render(store: &Storefront, output: &Output) {
    output.kv("cart", &store.badge().label());
    if store.checkout().phase() == CheckoutPhase::CartOpen {
        output.cart(&store.cart_view());
    }
    if let Some(view) = store.checkout_view() {
        output.checkout(&view);
    }
    if store.menu().is_open() {
        output.kv("menu", "open");
    }
    output.notifications(store.notifications());
}
