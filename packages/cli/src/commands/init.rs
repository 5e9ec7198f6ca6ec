use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use embedtweet_editor::{Alignment, EmbedConfig, ToolbarPosition, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Toolbar position (top, bottom)
    #[arg(short, long, default_value = "top")]
    pub toolbar: String,

    /// Preview alignment (left, center, right)
    #[arg(short, long, default_value = "center")]
    pub alignment: String,

    /// Give up on preview renders after this many milliseconds
    #[arg(long)]
    pub preview_timeout_ms: Option<u64>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = build_config(&args)?;
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    Ok(())
}

fn build_config(args: &InitArgs) -> Result<EmbedConfig> {
    let toolbar_position = match args.toolbar.as_str() {
        "top" => ToolbarPosition::Top,
        "bottom" => ToolbarPosition::Bottom,
        other => return Err(anyhow!("Invalid toolbar position: {}. Use: top or bottom", other)),
    };

    let alignment = match args.alignment.as_str() {
        "left" => Alignment::Left,
        "center" => Alignment::Center,
        "right" => Alignment::Right,
        other => return Err(anyhow!("Invalid alignment: {}. Use: left, center, or right", other)),
    };

    Ok(EmbedConfig {
        toolbar_position,
        alignment,
        preview_timeout_ms: args.preview_timeout_ms,
        ..EmbedConfig::default()
    })
}
