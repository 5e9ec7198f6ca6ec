//! # Block Registry / Document Binder
//!
//! Inserts and removes embedded blocks through the undo history and keeps
//! track of which blocks have a live click handler.
//!
//! A binding belongs to one [`NodeInstance`]. Undo and redo put nodes back
//! as new instances, which silently orphans their bindings; until
//! [`Binder::rebind_all`] runs, clicks on those blocks are inert.

use crate::document::{Document, EmbeddedBlock, NodeContent, NodeInstance};
use crate::errors::EditorError;
use crate::id_generator::BlockIdGenerator;
use crate::mutations::{Mutation, MutationError};
use crate::surface::ActiveSelection;
use crate::undo_stack::UndoStack;
use embedtweet_common::BlockId;
use embedtweet_parser::Tweet;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Reference to one materialization of an embedded block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub id: BlockId,
    pub instance: NodeInstance,
}

/// What a bound click handler asks of the host event
#[derive(Debug, Clone, PartialEq)]
pub struct ClickResponse {
    pub block: BlockRef,
    /// Links inside the block must not navigate
    pub prevent_default: bool,
    /// The editor must not see the click
    pub stop_propagation: bool,
}

#[derive(Debug, Default)]
pub struct Binder {
    ids: BlockIdGenerator,
    bindings: HashMap<BlockId, NodeInstance>,
    /// Every id this session has issued or seen loaded; never reused
    issued: HashSet<BlockId>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parsed tweet at the cursor as one undo step and bind it
    pub fn insert(
        &mut self,
        tweet: &Tweet,
        doc: &mut Document,
        history: &mut UndoStack,
    ) -> Result<EmbeddedBlock, EditorError> {
        let id = self.allocate_id(tweet, doc);
        let block = EmbeddedBlock {
            id: id.clone(),
            tweet_id: tweet.id.clone(),
            markup: tweet.markup.clone(),
        };

        history.begin_batch();
        history.set_batch_description("Insert tweet");
        let applied = history.apply(
            Mutation::InsertNode {
                index: doc.cursor(),
                content: NodeContent::Embed(block.clone()),
            },
            doc,
        );
        match applied {
            Ok(_) => history.end_batch(),
            Err(err) => {
                history.abandon_batch();
                return Err(err.into());
            }
        }

        let instance = doc
            .instance_of(&id)
            .ok_or_else(|| MutationError::BlockNotFound(id.clone()))?;
        self.bind(BlockRef { id, instance });

        info!(block_id = %block.id, tweet_id = ?block.tweet_id.as_ref().map(|t| t.as_str()), "Inserted tweet");
        Ok(block)
    }

    /// Attach the click handler to one block instance
    pub fn bind(&mut self, block: BlockRef) {
        debug!(block_id = %block.id, "Bound block");
        self.issued.insert(block.id.clone());
        self.bindings.insert(block.id, block.instance);
    }

    /// Re-attach handlers to every block in the document. Returns how many
    /// blocks are bound afterwards.
    pub fn rebind_all(&mut self, doc: &Document) -> usize {
        self.bindings = doc
            .embeds()
            .map(|(instance, block)| (block.id.clone(), instance))
            .collect();
        self.issued.extend(self.bindings.keys().cloned());

        debug!(bound = self.bindings.len(), "Rebound all blocks");
        self.bindings.len()
    }

    /// Whether `block` currently has a live handler
    pub fn is_bound(&self, block: &BlockRef) -> bool {
        self.bindings.get(&block.id) == Some(&block.instance)
    }

    /// Run the click handler of the block, if it has a live one
    pub fn handle_click(&self, doc: &Document, id: &BlockId) -> Option<ClickResponse> {
        let block = BlockRef {
            id: id.clone(),
            instance: doc.instance_of(id)?,
        };

        if !self.is_bound(&block) {
            debug!(block_id = %id, "Click on unbound block ignored");
            return None;
        }

        Some(ClickResponse {
            block,
            prevent_default: true,
            stop_propagation: true,
        })
    }

    /// Remove the selected block as one undo step
    pub fn delete(
        &mut self,
        selection: ActiveSelection,
        doc: &mut Document,
        history: &mut UndoStack,
    ) -> Result<EmbeddedBlock, EditorError> {
        let id = selection.block.id;
        let block = doc
            .block(&id)
            .cloned()
            .ok_or_else(|| MutationError::BlockNotFound(id.clone()))?;

        history.begin_batch();
        history.set_batch_description("Delete tweet");
        let applied = history.apply(Mutation::RemoveBlock { block_id: id.clone() }, doc);
        match applied {
            Ok(_) => history.end_batch(),
            Err(err) => {
                history.abandon_batch();
                return Err(err.into());
            }
        }

        self.bindings.remove(&id);
        info!(block_id = %id, "Deleted tweet");
        Ok(block)
    }

    /// Next id not taken by a block in `doc` and never handed out before
    fn allocate_id(&mut self, tweet: &Tweet, doc: &Document) -> BlockId {
        loop {
            let id = self.ids.next_id(tweet.id.as_ref());
            if !doc.contains_block(&id) && self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}
