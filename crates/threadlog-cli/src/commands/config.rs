//! Configuration management commands.

use std::sync::Arc;

use crate::{AppContext, ConfigAction};

pub fn handle(action: ConfigAction, ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("# Config directory: {}", threadlog_core::Config::config_dir().display());
            let mut shown = ctx.config.clone();
            if shown.client.cookie.is_some() {
                shown.client.cookie = Some("<redacted>".to_string());
            }
            print!("{}", shown.to_toml_string()?);
        }
        ConfigAction::Validate => {
            let result = ctx.config.validate();
            for issue in result.warnings() {
                println!("  warning  {}: {}", issue.field, issue.message);
            }
            for issue in result.errors() {
                println!("  error    {}: {}", issue.field, issue.message);
            }
            if !result.is_ok() {
                anyhow::bail!("Configuration is invalid ({} errors)", result.errors().len());
            }
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
