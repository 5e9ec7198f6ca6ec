//! Integration tests for the editing session

use embedtweet_editor::{
    commands, BlockId, Document, EditSession, EmbedConfig, PopupDirection, Rect, RenderError, RenderOptions,
    SurfaceChange, SurfaceState, ToolbarPosition, TweetId, TweetRenderer, Viewport,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

const NUMERIC_EMBED: &str = r#"<blockquote><a href="https://twitter.com/user/status/123456789"></a></blockquote>"#;
const NON_NUMERIC_EMBED: &str = r#"<blockquote><a href="https://twitter.com/user/status/abc"></a></blockquote>"#;

/// Resolves immediately with the tweet id in the body
struct EchoRenderer;

impl TweetRenderer for EchoRenderer {
    fn render(&self, tweet_id: &TweetId, options: RenderOptions) -> BoxFuture<'static, Result<String, RenderError>> {
        let body = format!("<blockquote data-align=\"{:?}\">{tweet_id}</blockquote>", options.alignment);
        async move { Ok(body) }.boxed()
    }
}

/// Never resolves
struct StalledRenderer;

impl TweetRenderer for StalledRenderer {
    fn render(&self, _tweet_id: &TweetId, _options: RenderOptions) -> BoxFuture<'static, Result<String, RenderError>> {
        futures::future::pending().boxed()
    }
}

/// Takes as many milliseconds as the tweet id's value
struct SlowRenderer;

impl TweetRenderer for SlowRenderer {
    fn render(&self, tweet_id: &TweetId, _options: RenderOptions) -> BoxFuture<'static, Result<String, RenderError>> {
        let delay = tweet_id.as_str().parse::<u64>().unwrap_or(0);
        let body = tweet_id.to_string();
        async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(body)
        }
        .boxed()
    }
}

struct FailingRenderer;

impl TweetRenderer for FailingRenderer {
    fn render(&self, _tweet_id: &TweetId, _options: RenderOptions) -> BoxFuture<'static, Result<String, RenderError>> {
        async { Err(RenderError::Failed("widget script unavailable".to_string())) }.boxed()
    }
}

/// Every block sits at the same spot below a fixed toolbar button
struct FixedViewport;

impl Viewport for FixedViewport {
    fn toolbar_button_rect(&self, _command: &str) -> Option<Rect> {
        Some(Rect::new(100.0, 0.0, 40.0, 30.0))
    }

    fn block_rect(&self, _block: &BlockId) -> Option<Rect> {
        Some(Rect::new(0.0, 200.0, 400.0, 300.0))
    }
}

fn session_with(renderer: impl TweetRenderer + 'static, config: EmbedConfig) -> EditSession {
    EditSession::new("test-client", Document::new(), config, Arc::new(renderer))
}

fn session() -> EditSession {
    session_with(EchoRenderer, EmbedConfig::default())
}

fn embed_for(id: &str) -> String {
    format!(r#"<blockquote><a href="https://twitter.com/someone/status/{id}"></a></blockquote>"#)
}

#[test]
fn test_numeric_id_round_trips_into_document() {
    let mut session = session();

    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();

    assert_eq!(block.tweet_id.as_ref().map(|id| id.as_str()), Some("123456789"));
    let html = session.document().to_html();
    assert!(html.contains(r#"data-tweet-id="123456789""#));
    assert!(html.contains(r#"contenteditable="false""#));
    assert!(html.contains(r#"data-verified="true""#));
}

#[test]
fn test_non_numeric_id_still_inserts() {
    let mut session = session();

    let block = session.embed_tweet(NON_NUMERIC_EMBED).unwrap();

    assert!(block.tweet_id.is_none());
    assert!(session.document().contains_block(&block.id));
    assert!(session.document().to_html().contains(r#"data-tweet-id="""#));
}

#[test]
fn test_click_then_delete() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();

    let response = session.click_block(&block.id).unwrap();
    assert!(response.prevent_default && response.stop_propagation);
    assert_eq!(session.surface_state(), SurfaceState::EditActions);
    assert_eq!(session.selection().unwrap().block.id, block.id);

    let removed = session.delete_tweet().unwrap();
    assert_eq!(removed.id, block.id);
    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(session.selection().is_none());
    assert!(!session.document().contains_block(&block.id));
}

#[test]
fn test_undo_redo_then_click_reopens_edit_popup() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();

    assert!(session.undo());
    assert!(!session.document().contains_block(&block.id));

    assert!(session.redo());
    assert!(session.document().contains_block(&block.id));
    assert!(session.is_block_bound(&block.id));

    session.click_block(&block.id).unwrap();
    assert_eq!(session.surface_state(), SurfaceState::EditActions);
    assert_eq!(session.selection().unwrap().block.id, block.id);
}

#[test]
fn test_binding_gap_until_command_completes() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();

    // History steps without the post-command event leave restored blocks unbound
    session.dispatch(embedtweet_editor::SessionEvent::Undo);
    session.dispatch(embedtweet_editor::SessionEvent::Redo);
    session.process();

    assert!(session.document().contains_block(&block.id));
    assert!(session.click_block(&block.id).is_none());
    assert_eq!(session.surface_state(), SurfaceState::Closed);

    session.notify_command_completed(commands::REDO);
    assert!(session.click_block(&block.id).is_some());
}

#[test]
fn test_delete_then_undo_restores_clickable_block() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();
    session.delete_tweet().unwrap();

    assert!(session.undo());

    assert!(session.document().contains_block(&block.id));
    assert!(session.click_block(&block.id).is_some());
    assert_eq!(session.selection().unwrap().block.id, block.id);
}

#[test]
fn test_ids_distinct_across_many_inserts() {
    let mut session = session();

    let mut ids = std::collections::HashSet::new();
    for i in 0..20 {
        let raw = if i % 2 == 0 { NUMERIC_EMBED } else { "<p>not an embed</p>" };
        ids.insert(session.embed_tweet(raw).unwrap().id);
    }

    assert_eq!(ids.len(), 20);
}

#[test]
fn test_only_one_surface_visible() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();
    session.take_surface_changes();

    session.show_embed_popup();

    assert_eq!(session.surface_state(), SurfaceState::EmbedInput);
    assert!(session.selection().is_none());
    let changes = session.take_surface_changes();
    assert_eq!(changes[0], SurfaceChange::Hidden(SurfaceState::EditActions));
    assert!(matches!(changes[1], SurfaceChange::Shown { surface: SurfaceState::EmbedInput, .. }));
}

#[test]
fn test_embed_input_never_leaks_between_opens() {
    let mut session = session();

    for _ in 0..3 {
        session.show_embed_popup();
        assert_eq!(session.embed_input(), "");
        session.update_embed_input(NUMERIC_EMBED);
        session.hide_embed_popup();
    }

    session.show_embed_popup();
    assert_eq!(session.embed_input(), "");
}

#[test]
fn test_submit_embed_through_commands() {
    let mut session = session();

    session.execute_command(commands::EMBED_TWEET).unwrap();
    session.update_embed_input(NUMERIC_EMBED);
    let outcome = session.execute_command(commands::EMBED_INSERT).unwrap();

    assert!(outcome.focus_editor);
    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert_eq!(session.document().embeds().count(), 1);
    assert_eq!(session.history().undo_description(), Some("Insert tweet"));
}

#[test]
fn test_placement_follows_toolbar_position() {
    let mut top = session().with_viewport(FixedViewport);
    top.show_embed_popup();
    let placement = top.placement().unwrap();
    assert_eq!(placement.left, 120.0);
    assert_eq!(placement.top, 20.0);
    assert_eq!(placement.direction, PopupDirection::Below);

    let config = EmbedConfig {
        toolbar_position: ToolbarPosition::Bottom,
        ..EmbedConfig::default()
    };
    let mut bottom = session_with(EchoRenderer, config).with_viewport(FixedViewport);
    let block = bottom.embed_tweet(NUMERIC_EMBED).unwrap();
    bottom.click_block(&block.id).unwrap();
    let placement = bottom.placement().unwrap();
    assert_eq!(placement.left, 200.0);
    assert_eq!(placement.top, 210.0);
    assert_eq!(placement.direction, PopupDirection::Above);
}

#[test]
fn test_host_typing_moves_insertion_point() {
    let mut session = session();
    session.insert_markup("<p>first</p>");
    session.insert_markup("<p>second</p>");
    session.set_cursor(1);

    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();

    let (index, _) = session.document().find_block(&block.id).unwrap();
    assert_eq!(index, 1);
    assert_eq!(session.history().undo_levels(), 3);
}

#[test]
fn test_loaded_document_blocks_are_bound() {
    let html = format!(
        "<p>intro</p>{}",
        r#"<div id="tweet-7-42" class="tweet-embed" contenteditable="false" data-verified="true" data-tweet-id="42"><blockquote></blockquote></div>"#
    );
    let doc = Document::from_html(&html);
    let mut session = EditSession::new("loaded", doc, EmbedConfig::default(), Arc::new(EchoRenderer));

    let id = BlockId::from("tweet-7-42");
    assert!(session.is_block_bound(&id));
    assert!(session.click_block(&id).is_some());
    assert_eq!(session.document().to_html(), html);
}

#[test]
fn test_undo_removes_selected_block_closes_popup() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();

    assert!(session.undo());

    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(session.selection().is_none());
}

#[test]
fn test_delete_without_selection_is_noop() {
    let mut session = session();
    session.embed_tweet(NUMERIC_EMBED).unwrap();

    assert!(session.delete_tweet().is_none());
    assert_eq!(session.document().embeds().count(), 1);
    assert_eq!(session.history().undo_levels(), 1);
}

#[tokio::test]
async fn test_preview_shows_after_render() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();

    session.preview_tweet();
    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(session.selection().is_none());

    assert!(session.next_completion().await);
    assert_eq!(session.surface_state(), SurfaceState::Preview);
    assert_eq!(session.preview_body(), Some("<blockquote data-align=\"Center\">123456789</blockquote>"));
    assert_eq!(session.selection().unwrap().block.id, block.id);

    session.dismiss_preview();
    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(session.preview_body().is_none());
}

#[tokio::test]
async fn test_preview_of_null_tweet_id_is_inert() {
    let mut session = session();
    let block = session.embed_tweet(NON_NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();

    session.preview_tweet();

    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(!session.is_awaiting_preview());
    assert!(!session.next_completion().await);
}

#[tokio::test]
async fn test_stalled_preview_stays_in_limbo() {
    let mut session = session_with(StalledRenderer, EmbedConfig::default());
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();

    session.preview_tweet();

    let waited = tokio::time::timeout(Duration::from_millis(30), session.next_completion()).await;
    assert!(waited.is_err());
    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(session.is_awaiting_preview());
    assert!(session.last_preview_error().is_none());
}

#[tokio::test]
async fn test_configured_timeout_gives_up() {
    let config = EmbedConfig {
        preview_timeout_ms: Some(20),
        ..EmbedConfig::default()
    };
    let mut session = session_with(StalledRenderer, config);
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();

    session.preview_tweet();
    assert!(session.next_completion().await);

    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(!session.is_awaiting_preview());
    assert_eq!(
        session.last_preview_error(),
        Some(&RenderError::TimedOut(Duration::from_millis(20)))
    );
}

#[tokio::test]
async fn test_failed_render_keeps_surface_closed() {
    let mut session = session_with(FailingRenderer, EmbedConfig::default());
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();

    session.preview_tweet();
    assert!(session.next_completion().await);

    assert_eq!(session.surface_state(), SurfaceState::Closed);
    assert!(matches!(session.last_preview_error(), Some(RenderError::Failed(_))));
}

#[tokio::test]
async fn test_last_completion_wins() {
    let mut session = session_with(SlowRenderer, EmbedConfig::default());
    let slow = session.embed_tweet(&embed_for("80")).unwrap();
    let fast = session.embed_tweet(&embed_for("1")).unwrap();

    session.click_block(&slow.id).unwrap();
    session.preview_tweet();
    session.click_block(&fast.id).unwrap();
    session.preview_tweet();

    assert!(session.next_completion().await);
    assert_eq!(session.preview_body(), Some("1"));
    assert_eq!(session.selection().unwrap().block.id, fast.id);

    assert!(session.next_completion().await);
    assert_eq!(session.preview_body(), Some("80"));
    assert_eq!(session.selection().unwrap().block.id, slow.id);
    assert!(!session.is_awaiting_preview());
}

#[tokio::test]
async fn test_preview_overrides_surface_opened_while_pending() {
    let mut session = session_with(SlowRenderer, EmbedConfig::default());
    let block = session.embed_tweet(&embed_for("10")).unwrap();
    session.click_block(&block.id).unwrap();
    session.preview_tweet();

    session.show_embed_popup();
    assert_eq!(session.surface_state(), SurfaceState::EmbedInput);

    assert!(session.next_completion().await);
    assert_eq!(session.surface_state(), SurfaceState::Preview);
}

#[tokio::test]
async fn test_preview_of_block_deleted_while_pending() {
    let mut session = session_with(SlowRenderer, EmbedConfig::default());
    let block = session.embed_tweet(&embed_for("10")).unwrap();
    session.click_block(&block.id).unwrap();
    session.preview_tweet();

    assert!(session.undo());
    assert!(session.next_completion().await);

    assert_eq!(session.surface_state(), SurfaceState::Preview);
    assert!(session.selection().is_none());
    assert!(session.delete_tweet().is_none());
}

#[test]
fn test_deleted_loaded_block_id_is_never_reused() {
    let html = r#"<div id="tweet-2" class="tweet-embed" contenteditable="false" data-verified="true" data-tweet-id=""><blockquote></blockquote></div>"#;
    let mut session = EditSession::new("loaded", Document::from_html(html), EmbedConfig::default(), Arc::new(EchoRenderer));
    let loaded = BlockId::from("tweet-2");

    session.click_block(&loaded).unwrap();
    session.delete_tweet().unwrap();

    let first = session.embed_tweet("<p>one</p>").unwrap();
    let second = session.embed_tweet("<p>two</p>").unwrap();
    assert_eq!(first.id.as_str(), "tweet-1");
    assert_eq!(second.id.as_str(), "tweet-3");
}

#[tokio::test]
async fn test_delete_ignored_while_preview_open() {
    let mut session = session();
    let block = session.embed_tweet(NUMERIC_EMBED).unwrap();
    session.click_block(&block.id).unwrap();
    session.preview_tweet();
    assert!(session.next_completion().await);
    assert_eq!(session.surface_state(), SurfaceState::Preview);

    assert!(session.delete_tweet().is_none());
    assert!(session.document().contains_block(&block.id));
    assert_eq!(session.surface_state(), SurfaceState::Preview);
    assert_eq!(session.history().undo_levels(), 1);
}
