use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use embedtweet_editor::{
    Alignment, BlockId, Document, EditSession, EmbedConfig, RenderError, RenderOptions, TweetId, TweetRenderer,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Script describing the session (JSON)
    pub script: PathBuf,

    /// Config file (defaults to embedtweet.config.json in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the final document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// A scripted editing session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Initial document markup
    #[serde(default)]
    pub document: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    /// Run a registered command by name
    Command { name: String },
    EmbedTweet { raw: String },
    /// Replace the embed popup's input text
    Input { text: String },
    Click { block: String },
    Type { html: String },
    Cursor { index: usize },
    Escape,
    /// Wait for the pending preview render to settle
    AwaitPreview,
}

/// Renders previews locally instead of loading the widget script
pub struct OfflineRenderer;

impl TweetRenderer for OfflineRenderer {
    fn render(&self, tweet_id: &TweetId, options: RenderOptions) -> BoxFuture<'static, Result<String, RenderError>> {
        let align = match options.alignment {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        };
        let body = format!(
            r#"<blockquote class="twitter-tweet" data-align="{align}"><a href="https://twitter.com/i/status/{tweet_id}"></a></blockquote>"#
        );

        async move { Ok(body) }.boxed()
    }
}

pub async fn replay(args: ReplayArgs, cwd: &Path) -> Result<()> {
    let config = match &args.config {
        Some(path) => EmbedConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EmbedConfig::load(cwd)?,
    };

    let content = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&content)?;

    info!(steps = script.steps.len(), "Replaying script");
    let mut session = EditSession::new(
        "replay",
        Document::from_html(&script.document),
        config,
        Arc::new(OfflineRenderer),
    );

    for (i, step) in script.steps.iter().enumerate() {
        let summary = run_step(&mut session, step).await?;
        eprintln!("  {} {:>3} {}", "✓".green(), i + 1, summary);
    }

    eprintln!();
    eprintln!("{} {:?}", "Surface:".bright_white(), session.surface_state());
    if let Some(selection) = session.selection() {
        eprintln!("{} {}", "Selected:".bright_white(), selection.block.id);
    }
    if let Some(body) = session.preview_body() {
        eprintln!("{} {}", "Preview:".bright_white(), body);
    }

    let html = session.document().to_html();
    match &args.output {
        Some(path) => {
            std::fs::write(path, &html)?;
            eprintln!("{} {}", "Wrote".green().bold(), path.display());
        }
        None => println!("{html}"),
    }

    Ok(())
}

/// Run one step against the session and describe what happened
pub async fn run_step(session: &mut EditSession, step: &Step) -> Result<String> {
    let summary = match step {
        Step::Command { name } => {
            let outcome = session.execute_command(name)?;
            format!("{name} ({} outcome(s))", outcome.outcomes.len())
        }
        Step::EmbedTweet { raw } => match session.embed_tweet(raw) {
            Some(block) => format!("inserted {}", block.id),
            None => "insert failed".to_string(),
        },
        Step::Input { text } => {
            session.update_embed_input(text.as_str());
            format!("typed {} chars into embed popup", text.len())
        }
        Step::Click { block } => {
            let id = BlockId::from(block.as_str());
            match session.click_block(&id) {
                Some(_) => format!("clicked {id}"),
                None => format!("click on {id} ignored"),
            }
        }
        Step::Type { html } => {
            session.insert_markup(html.as_str());
            format!("typed {} chars of markup", html.len())
        }
        Step::Cursor { index } => {
            session.set_cursor(*index);
            format!("cursor at {}", session.document().cursor())
        }
        Step::Escape => {
            session.escape();
            "escape".to_string()
        }
        Step::AwaitPreview => {
            if session.next_completion().await {
                format!("preview settled ({:?})", session.surface_state())
            } else {
                "no preview pending".to_string()
            }
        }
    };

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedtweet_editor::SurfaceState;

    const SCRIPT: &str = r#"{
        "document": "<p>intro</p>",
        "steps": [
            { "action": "cursor", "index": 1 },
            { "action": "command", "name": "embedTweet" },
            { "action": "input", "text": "<blockquote><a href=\"https://twitter.com/a/status/99\"></a></blockquote>" },
            { "action": "command", "name": "embedInsert" },
            { "action": "click", "block": "tweet-1-99" },
            { "action": "command", "name": "previewTweet" },
            { "action": "awaitPreview" },
            { "action": "escape" }
        ]
    }"#;

    #[test]
    fn test_parse_script() {
        let script: Script = serde_json::from_str(SCRIPT).unwrap();
        assert_eq!(script.document, "<p>intro</p>");
        assert_eq!(script.steps.len(), 8);
        assert_eq!(script.steps[0], Step::Cursor { index: 1 });
        assert_eq!(script.steps[6], Step::AwaitPreview);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<Script, _> = serde_json::from_str(r#"{ "steps": [{ "action": "explode" }] }"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_script() {
        let script: Script = serde_json::from_str(SCRIPT).unwrap();
        let mut session = EditSession::new(
            "test",
            Document::from_html(&script.document),
            EmbedConfig::default(),
            Arc::new(OfflineRenderer),
        );

        let mut summaries = Vec::new();
        for step in &script.steps[..7] {
            summaries.push(run_step(&mut session, step).await.unwrap());
        }

        assert_eq!(summaries[4], "clicked tweet-1-99");
        assert_eq!(session.surface_state(), SurfaceState::Preview);
        assert!(session.preview_body().unwrap().contains("status/99"));

        run_step(&mut session, &script.steps[7]).await.unwrap();
        assert_eq!(session.surface_state(), SurfaceState::Closed);
        assert!(session.document().to_html().starts_with("<p>intro</p><div id=\"tweet-1-99\""));
    }

    #[tokio::test]
    async fn test_unknown_command_fails_step() {
        let mut session = EditSession::new("test", Document::new(), EmbedConfig::default(), Arc::new(OfflineRenderer));
        let step = Step::Command { name: "bold".to_string() };
        assert!(run_step(&mut session, &step).await.is_err());
    }
}
