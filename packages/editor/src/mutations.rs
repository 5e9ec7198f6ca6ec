//! # Document Mutations
//!
//! Every change to a [`Document`] goes through a [`Mutation`] so it can be
//! validated, inverted and recorded in the undo history.
//!
//! ## Mutation Semantics
//!
//! ### InsertNode
//! - Inserts content at an index (`0..=len`)
//! - Fails if an embedded block with the same id is already present
//!
//! ### RemoveNode
//! - Removes whatever node sits at the index
//!
//! ### RemoveBlock
//! - Removes an embedded block by id, wherever it currently sits

use crate::document::{Document, NodeContent};
use embedtweet_common::BlockId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert content at index
    InsertNode { index: usize, content: NodeContent },

    /// Remove the node at index
    RemoveNode { index: usize },

    /// Remove an embedded block by id
    RemoveBlock { block_id: BlockId },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Index {index} out of bounds (document has {len} nodes)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Block already in document: {0}")]
    DuplicateBlock(BlockId),
}

impl Mutation {
    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut Document) -> Result<(), MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::InsertNode { index, content } => {
                doc.insert_node(*index, content.clone());
            }

            Mutation::RemoveNode { index } => {
                doc.remove_node(*index);
            }

            Mutation::RemoveBlock { block_id } => {
                let (index, _) = doc
                    .find_block(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                doc.remove_node(index);
            }
        }

        Ok(())
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNode { index, content } => {
                if *index > doc.len() {
                    return Err(MutationError::IndexOutOfBounds { index: *index, len: doc.len() });
                }

                match content.as_embed() {
                    Some(block) if doc.contains_block(&block.id) => {
                        Err(MutationError::DuplicateBlock(block.id.clone()))
                    }
                    _ => Ok(()),
                }
            }

            Mutation::RemoveNode { index } => {
                if *index >= doc.len() {
                    return Err(MutationError::IndexOutOfBounds { index: *index, len: doc.len() });
                }
                Ok(())
            }

            Mutation::RemoveBlock { block_id } => {
                if doc.contains_block(block_id) {
                    Ok(())
                } else {
                    Err(MutationError::BlockNotFound(block_id.clone()))
                }
            }
        }
    }

    /// Mutation that undoes `self` when applied right after it
    pub fn to_inverse(&self, doc: &Document) -> Result<Mutation, MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::InsertNode { index, .. } => Ok(Mutation::RemoveNode { index: *index }),

            Mutation::RemoveNode { index } => Ok(Mutation::InsertNode {
                index: *index,
                content: doc.nodes()[*index].content.clone(),
            }),

            Mutation::RemoveBlock { block_id } => {
                let (index, node) = doc
                    .find_block(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;

                Ok(Mutation::InsertNode {
                    index,
                    content: node.content.clone(),
                })
            }
        }
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    /// New version number
    pub version: u64,
}
