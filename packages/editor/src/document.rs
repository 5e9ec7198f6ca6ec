//! # Document Model
//!
//! A document is a flat sequence of top-level nodes plus an insertion cursor.
//! Nodes are either opaque markup owned by the host editor or embedded tweet
//! blocks owned by this crate.
//!
//! ## Node identity
//!
//! Every node carries a [`NodeInstance`] that is fresh each time the node is
//! materialized: on insertion, and again when undo or redo puts it back.
//! Handlers bound to an older instance are stale, which mirrors how a live
//! editor drops event handlers when undo/redo replaces DOM subtrees.
//!
//! ## On-document layout
//!
//! ```text
//! <div id="tweet-3-123" class="tweet-embed" contenteditable="false"
//!      data-verified="true" data-tweet-id="123"><div>…markup…</div></div>
//! ```

use crate::mutations::{Mutation, MutationError, MutationResult};
use embedtweet_common::BlockId;
use embedtweet_parser::TweetId;
use scraper::{ElementRef, Html, Node as HtmlNode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Class marking an element as an embedded tweet block
pub const EMBED_CLASS: &str = "tweet-embed";

/// Attribute carrying the tweet id (empty when unknown)
pub const TWEET_ID_ATTR: &str = "data-tweet-id";

/// Identity of one materialization of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeInstance(u64);

/// Embedded tweet block as stored in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedBlock {
    pub id: BlockId,
    pub tweet_id: Option<TweetId>,
    pub markup: String,
}

impl EmbeddedBlock {
    /// Serialize as a non-editable, trusted container element
    pub fn to_html(&self) -> String {
        let tweet_id = self.tweet_id.as_ref().map(|id| id.as_str()).unwrap_or("");

        format!(
            r#"<div id="{}" class="{}" contenteditable="false" data-verified="true" {}="{}">{}</div>"#,
            escape_attr(self.id.as_str()),
            EMBED_CLASS,
            TWEET_ID_ATTR,
            tweet_id,
            self.markup,
        )
    }

    fn from_element(el: ElementRef<'_>) -> Option<Self> {
        let value = el.value();
        if !value.classes().any(|class| class == EMBED_CLASS) {
            return None;
        }

        let id = value.attr("id").filter(|id| !id.is_empty())?;
        let tweet_id = value.attr(TWEET_ID_ATTR).and_then(TweetId::new);

        Some(Self {
            id: BlockId::from(id),
            tweet_id,
            markup: el.inner_html(),
        })
    }
}

/// Content of a top-level node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeContent {
    /// Host-owned markup, kept verbatim
    Markup { html: String },

    /// Embedded tweet block
    Embed(EmbeddedBlock),
}

impl NodeContent {
    pub fn markup(html: impl Into<String>) -> Self {
        NodeContent::Markup { html: html.into() }
    }

    pub fn as_embed(&self) -> Option<&EmbeddedBlock> {
        match self {
            NodeContent::Embed(block) => Some(block),
            NodeContent::Markup { .. } => None,
        }
    }

    fn to_html(&self) -> String {
        match self {
            NodeContent::Markup { html } => html.clone(),
            NodeContent::Embed(block) => block.to_html(),
        }
    }
}

/// A materialized top-level node
#[derive(Debug, Clone)]
pub struct Node {
    pub instance: NodeInstance,
    pub content: NodeContent,
}

/// Editable document
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Current version number (increments on each applied mutation)
    pub version: u64,

    nodes: Vec<Node>,
    cursor: usize,
    next_instance: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document from serialized markup. Top-level elements using the
    /// embed layout become blocks; everything else is kept as opaque markup.
    pub fn from_html(html: &str) -> Self {
        let fragment = Html::parse_fragment(html);
        let mut doc = Self::new();

        for child in fragment.root_element().children() {
            let content = match child.value() {
                HtmlNode::Element(_) => {
                    let Some(el) = ElementRef::wrap(child) else {
                        continue;
                    };

                    match EmbeddedBlock::from_element(el) {
                        Some(block) if doc.contains_block(&block.id) => {
                            warn!(block_id = %block.id, "Duplicate embed id in loaded document; keeping it as markup");
                            NodeContent::markup(el.html())
                        }
                        Some(block) => NodeContent::Embed(block),
                        None => NodeContent::markup(el.html()),
                    }
                }
                HtmlNode::Text(text) if !text.trim().is_empty() => {
                    NodeContent::markup(escape_text(text))
                }
                _ => continue,
            };

            let index = doc.nodes.len();
            doc.insert_node(index, content);
        }

        debug!(nodes = doc.nodes.len(), embeds = doc.embeds().count(), "Loaded document");
        doc
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        self.nodes.iter().map(|node| node.content.to_html()).collect()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index new content is inserted at
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the insertion point (clamped to the document length)
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index.min(self.nodes.len());
    }

    /// All embedded blocks in document order
    pub fn embeds(&self) -> impl Iterator<Item = (NodeInstance, &EmbeddedBlock)> {
        self.nodes
            .iter()
            .filter_map(|node| node.content.as_embed().map(|block| (node.instance, block)))
    }

    /// Position and node of the block with the given id
    pub fn find_block(&self, id: &BlockId) -> Option<(usize, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, node)| node.content.as_embed().is_some_and(|block| &block.id == id))
    }

    pub fn block(&self, id: &BlockId) -> Option<&EmbeddedBlock> {
        self.find_block(id).and_then(|(_, node)| node.content.as_embed())
    }

    pub fn contains_block(&self, id: &BlockId) -> bool {
        self.find_block(id).is_some()
    }

    /// Current materialization of the block with the given id
    pub fn instance_of(&self, id: &BlockId) -> Option<NodeInstance> {
        self.find_block(id).map(|(_, node)| node.instance)
    }

    /// Apply a mutation, bumping the version on success
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationResult, MutationError> {
        mutation.apply(self)?;
        self.version += 1;

        Ok(MutationResult { version: self.version })
    }

    pub(crate) fn insert_node(&mut self, index: usize, content: NodeContent) -> NodeInstance {
        self.next_instance += 1;
        let instance = NodeInstance(self.next_instance);

        self.nodes.insert(index, Node { instance, content });
        if index <= self.cursor {
            self.cursor += 1;
        }

        instance
    }

    pub(crate) fn remove_node(&mut self, index: usize) -> Node {
        let node = self.nodes.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        }

        node
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
