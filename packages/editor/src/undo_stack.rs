//! # Undo/Redo Stack
//!
//! Tracks mutation history for a [`Document`].
//!
//! - Each mutation records its inverse before being applied
//! - Undo applies the inverses and moves the step to the redo stack
//! - Redo reapplies the original mutations
//! - New steps clear the redo stack
//! - `begin_batch`/`end_batch` group several mutations into one step; ending
//!   a batch is the "save undo step" operation
//!
//! Undo and redo re-materialize nodes, so every node they put back has a new
//! [`NodeInstance`](crate::document::NodeInstance).

use crate::document::Document;
use crate::mutations::{Mutation, MutationError, MutationResult};
use tracing::debug;

/// A group of mutations undone/redone together
#[derive(Debug, Clone)]
pub struct MutationBatch {
    /// Mutations in application order
    pub mutations: Vec<Mutation>,

    /// Inverses in the order they must be applied to undo the batch
    pub inverses: Vec<Mutation>,

    pub description: Option<String>,
}

impl MutationBatch {
    fn empty() -> Self {
        Self {
            mutations: Vec::new(),
            inverses: Vec::new(),
            description: None,
        }
    }

    pub fn single(mutation: Mutation, inverse: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
            inverses: vec![inverse],
            description: None,
        }
    }
}

/// Undo/redo history for one document
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<MutationBatch>,
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    current_batch: Option<MutationBatch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Apply a mutation and record it for undo
    pub fn apply(&mut self, mutation: Mutation, doc: &mut Document) -> Result<MutationResult, MutationError> {
        let inverse = mutation.to_inverse(doc)?;
        let result = doc.apply(&mutation)?;

        match &mut self.current_batch {
            Some(batch) => {
                batch.mutations.push(mutation);
                batch.inverses.insert(0, inverse);
            }
            None => self.push_batch(MutationBatch::single(mutation, inverse)),
        }

        Ok(result)
    }

    /// Start grouping mutations into one step
    pub fn begin_batch(&mut self) {
        self.current_batch = Some(MutationBatch::empty());
    }

    /// Close the current group and record it as one step
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    /// Drop the current group without recording it. Mutations already
    /// applied stay applied.
    pub fn abandon_batch(&mut self) {
        self.current_batch = None;
    }

    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    fn push_batch(&mut self, batch: MutationBatch) {
        debug!(
            mutations = batch.mutations.len(),
            description = batch.description.as_deref().unwrap_or(""),
            "Recorded undo step"
        );
        self.undo_stack.push(batch);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Undo the most recent step. Returns false when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, MutationError> {
        let Some(batch) = self.undo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = apply_all(doc, &batch.inverses) {
            self.undo_stack.push(batch);
            return Err(err);
        }

        self.redo_stack.push(batch);
        Ok(true)
    }

    /// Redo the most recently undone step. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, MutationError> {
        let Some(batch) = self.redo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = apply_all(doc, &batch.mutations) {
            self.redo_stack.push(batch);
            return Err(err);
        }

        self.undo_stack.push(batch);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().and_then(|batch| batch.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|batch| batch.description.as_deref())
    }
}

/// Apply a whole batch or nothing: a failure part way through leaves `doc`
/// untouched
fn apply_all(doc: &mut Document, mutations: &[Mutation]) -> Result<(), MutationError> {
    let mut scratch = doc.clone();
    for mutation in mutations {
        scratch.apply(mutation)?;
    }

    *doc = scratch;
    Ok(())
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
