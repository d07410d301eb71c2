//! Interactive shopping session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use boutique_storefront::commerce::checkout::CheckoutPhase;
use boutique_storefront::{SandboxGateway, SandboxLoader, SandboxResponse, Storefront, UiEvent};
use dialoguer::{theme::ColorfulTheme, Select};

use super::ShopArgs;
use crate::context::Context;

/// Products on the demo shelf: name and `data-price` value.
const CATALOG: &[(&str, &str)] = &[
    ("Silk Scarf", "45.00"),
    ("Tote Bag", "30.00"),
    ("Pearl Earrings", "65.00"),
    ("Linen Blouse", "58.50"),
];

/// Test cards offered at the payment form, with what the sandbox answers.
const CARDS: &[&str] = &[
    "4111 1111 1111 1111 (approves)",
    "4000 0000 0000 0002 (declines)",
    "Network drops mid-request",
];

/// Run the shop command.
pub async fn run(args: ShopArgs, ctx: &Context) -> Result<()> {
    ctx.config.validate()?;

    let gateway = SandboxGateway::with_latency(Duration::from_millis(args.latency_ms));
    let mut store = Storefront::new(
        ctx.config.clone(),
        Arc::new(SandboxLoader::Available(gateway.clone())),
    );
    store.page_loaded();

    ctx.output.header(&format!("Welcome to {}", ctx.config.store.name));

    loop {
        store.drain_ready().await;
        ctx.output.notifications(store.notifications());

        let keep_going = match store.checkout().phase() {
            CheckoutPhase::Idle => browse(&mut store, ctx)?,
            CheckoutPhase::CartOpen => review_cart(&mut store, ctx)?,
            CheckoutPhase::CheckoutOpen => pay(&mut store, &gateway, ctx).await?,
            CheckoutPhase::Tokenizing => {
                let spinner = ctx.output.spinner("Processing payment...");
                store
                    .run_until(|s| s.checkout().phase() != CheckoutPhase::Tokenizing)
                    .await;
                spinner.finish_and_clear();
                true
            }
            CheckoutPhase::Success => {
                if let Some(view) = store.checkout_view() {
                    ctx.output.checkout(&view);
                }
                let spinner = ctx.output.spinner("Finalizing order...");
                store
                    .run_until(|s| s.checkout().phase() != CheckoutPhase::Success)
                    .await;
                spinner.finish_and_clear();
                true
            }
        };

        if !keep_going {
            break;
        }
    }

    ctx.output.header("Goodbye");
    ctx.output.kv("orders confirmed", &store.receipts().len().to_string());
    for receipt in store.receipts() {
        ctx.output.list_item(&format!("{} for {}", receipt.masked_token(), receipt.total));
    }

    Ok(())
}

fn browse(store: &mut Storefront, ctx: &Context) -> Result<bool> {
    let mut items: Vec<String> = CATALOG
        .iter()
        .map(|(name, price)| format!("{name} ${price}  [{}]", store.buy_control_label(name)))
        .collect();
    items.push(format!("View cart ({})", store.badge().label()));
    items.push("Quit".to_string());

    let choice = prompt("Browse the shop", &items)?;
    if let Some((name, price)) = CATALOG.get(choice) {
        dispatch(store, ctx, UiEvent::add_to_cart(*name, *price));
        return Ok(true);
    }
    if choice == CATALOG.len() {
        dispatch(store, ctx, UiEvent::OpenCart);
        return Ok(true);
    }
    Ok(false)
}

fn review_cart(store: &mut Storefront, ctx: &Context) -> Result<bool> {
    let view = store.cart_view();
    ctx.output.header("Your cart");
    ctx.output.cart(&view);

    let mut items: Vec<String> = view
        .rows
        .iter()
        .map(|row| format!("Remove {} ({})", row.name, row.price))
        .collect();
    if view.checkout_enabled {
        items.push("Checkout".to_string());
    }
    items.push("Close cart".to_string());

    let choice = prompt("Cart", &items)?;
    let event = match view.rows.get(choice) {
        Some(row) => UiEvent::RemoveItem(row.remove),
        None if view.checkout_enabled && choice == view.rows.len() => UiEvent::Checkout,
        None => UiEvent::CloseCart,
    };
    dispatch(store, ctx, event);
    Ok(true)
}

async fn pay(store: &mut Storefront, gateway: &SandboxGateway, ctx: &Context) -> Result<bool> {
    if !store.checkout().is_gateway_ready() && !store.checkout().is_gateway_unavailable() {
        let spinner = ctx.output.spinner("Loading payment form...");
        store
            .run_until(|s| s.checkout().is_gateway_ready() || s.checkout().is_gateway_unavailable())
            .await;
        spinner.finish_and_clear();
    }

    let Some(view) = store.checkout_view() else {
        return Ok(true);
    };
    ctx.output.header("Checkout");
    ctx.output.checkout(&view);

    let mut items: Vec<String> = Vec::new();
    if view.pay.enabled {
        items.extend(CARDS.iter().map(|card| format!("{} with {card}", view.pay.label)));
    }
    items.push("Close".to_string());

    let choice = prompt("Payment", &items)?;
    if !view.pay.enabled || choice >= CARDS.len() {
        dispatch(store, ctx, UiEvent::ClosePayment);
        return Ok(true);
    }

    gateway.push_response(match choice {
        0 => SandboxResponse::approve(),
        1 => SandboxResponse::decline("Your card was declined"),
        _ => SandboxResponse::fault("connection reset by peer"),
    });
    dispatch(store, ctx, UiEvent::PayNow);
    Ok(true)
}

fn prompt(title: &str, items: &[String]) -> Result<usize> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(title)
        .items(items)
        .default(0)
        .interact()
        .context("Failed to read selection")
}

/// Apply an event, reporting a rejection instead of failing the session.
fn dispatch(store: &mut Storefront, ctx: &Context, event: UiEvent) {
    if let Err(e) = store.dispatch(event) {
        ctx.output.warn(&e.to_string());
    }
}
