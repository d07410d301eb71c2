//! Write a default storefront config.

use anyhow::{bail, Context as _, Result};
use boutique_storefront::{generate_default_config, StorefrontConfig};

use super::InitArgs;
use crate::context::Context;

/// Run the init command.
pub async fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("boutique.toml");

    ctx.output.header(&format!("Initializing storefront: {}", args.name));

    if config_path.exists() && !args.force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    ctx.output.step(1, 2, "Generating boutique.toml");
    let content = generate_default_config(&args.name);
    // Make sure what we write parses back.
    StorefrontConfig::from_toml_str(&content)?;

    ctx.output.step(2, 2, "Writing config");
    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));
    ctx.output.info("");
    ctx.output.info("Next steps:");
    ctx.output.list_item("Set gateway.application_id and gateway.location_id");
    ctx.output.list_item("boutique config validate");
    ctx.output.list_item("boutique simulate");

    Ok(())
}
