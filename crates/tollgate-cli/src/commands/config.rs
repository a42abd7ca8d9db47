//! Config command - inspect the resolved configuration.

use std::path::Path;

use anyhow::Context as _;
use tollgate_config::{Config, ResolvedConfig};

use crate::theme::Theme;

/// Print the resolved configuration with source annotations.
pub(crate) fn show_config(workspace_root: Option<&Path>) -> anyhow::Result<()> {
    let resolved = Config::load(workspace_root)?;
    print!("{}", render_config(&resolved)?);
    Ok(())
}

fn render_config(resolved: &ResolvedConfig) -> anyhow::Result<String> {
    resolved
        .show_toml()
        .context("failed to render configuration")
}

/// Print the files consulted while loading configuration.
pub(crate) fn show_paths(workspace_root: Option<&Path>) {
    println!("\n{}", Theme::header("Config files (lowest to highest precedence)"));
    println!("{}", Theme::separator());
    println!("  {}", Theme::dimmed("<embedded defaults>"));
    println!("  ~/.tollgate/config.toml");
    match workspace_root {
        Some(root) => println!("  {}", root.join(".tollgate").join("config.toml").display()),
        None => println!("  {}", Theme::dimmed("{workspace}/.tollgate/config.toml")),
    }
    println!();
}
