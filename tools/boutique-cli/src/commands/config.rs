//! Configuration commands.

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "built-in defaults"),
    }

    let config = &ctx.config;

    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("name", &config.store.name);

    ctx.output.info("");
    ctx.output.info("[gateway]");
    ctx.output.kv("application_id", &config.gateway.application_id);
    ctx.output.kv("location_id", &config.gateway.location_id);
    ctx.output.kv("mount_point", &config.gateway.mount_point);
    ctx.output.kv("eager_init", &config.gateway.eager_init.to_string());

    ctx.output.info("");
    ctx.output.info("[timing]");
    ctx.output.kv("notification_ms", &config.timing.notification_ms.to_string());
    ctx.output.kv(
        "notification_exit_ms",
        &config.timing.notification_exit_ms.to_string(),
    );
    ctx.output.kv("confirm_delay_ms", &config.timing.confirm_delay_ms.to_string());
    ctx.output.kv(
        "success_display_ms",
        &config.timing.success_display_ms.to_string(),
    );
    ctx.output.kv(
        "added_feedback_ms",
        &config.timing.added_feedback_ms.to_string(),
    );

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut warnings: Vec<String> = Vec::new();

    if ctx.config.gateway.has_placeholder_credentials() {
        warnings.push(
            "gateway credentials are placeholders; only the sandbox gateway will accept them"
                .to_string(),
        );
    }
    if !ctx.config.gateway.eager_init {
        warnings.push(
            "gateway.eager_init is off; the payment form loads on first checkout".to_string(),
        );
    }
    if ctx.config.timing.notification_exit_ms >= ctx.config.timing.notification_ms {
        warnings.push(
            "timing.notification_exit_ms is not shorter than timing.notification_ms".to_string(),
        );
    }

    if let Err(e) = ctx.config.validate() {
        ctx.output.error(&format!("Error: {}", e));
        for warning in &warnings {
            ctx.output.warn(&format!("Warning: {}", warning));
        }
        bail!("Configuration is invalid");
    }

    if warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
