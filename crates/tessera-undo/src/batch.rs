//! Ordered, atomic groups of commands

use crate::command::{BoxedCommand, UndoCommand};
use tessera_core::Result;

/// An ordered sequence of commands undone and redone as one unit.
///
/// Undo runs the children last-to-first, redo first-to-last. If a child fails
/// part way, the children already processed are rolled back so the batch is
/// never left half applied.
pub struct BatchUndoCommand<C> {
    commands: Vec<BoxedCommand<C>>,
    description: String,
}

impl<C> Default for BatchUndoCommand<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> BatchUndoCommand<C> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            description: String::from("Batch"),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn push(&mut self, command: BoxedCommand<C>) {
        self.commands.push(command);
    }

    /// Push a command if there is one
    pub fn push_opt(&mut self, command: Option<BoxedCommand<C>>) {
        if let Some(command) = command {
            self.commands.push(command);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `None` for an empty batch, so callers can skip pushing no-op edits
    pub fn into_command(self) -> Option<BoxedCommand<C>>
    where
        C: 'static,
    {
        if self.is_empty() {
            None
        } else {
            Some(Box::new(self))
        }
    }
}

impl<C> UndoCommand<C> for BatchUndoCommand<C> {
    fn undo(&mut self, ctx: &mut C) -> Result<()> {
        let count = self.commands.len();
        for i in (0..count).rev() {
            if let Err(err) = self.commands[i].undo(ctx) {
                log::warn!("batch '{}' undo failed at step {}: {}", self.description, i, err);
                for cmd in self.commands[i + 1..].iter_mut() {
                    if let Err(rollback) = cmd.redo(ctx) {
                        log::error!("batch '{}' rollback failed: {}", self.description, rollback);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn redo(&mut self, ctx: &mut C) -> Result<()> {
        for i in 0..self.commands.len() {
            if let Err(err) = self.commands[i].redo(ctx) {
                log::warn!("batch '{}' redo failed at step {}: {}", self.description, i, err);
                for cmd in self.commands[..i].iter_mut().rev() {
                    if let Err(rollback) = cmd.undo(ctx) {
                        log::error!("batch '{}' rollback failed: {}", self.description, rollback);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn is_significant(&self) -> bool {
        self.commands.iter().any(|c| c.is_significant())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn discard(&mut self, ctx: &mut C) {
        for cmd in self.commands.iter_mut().rev() {
            cmd.discard(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::TesseraError;

    /// Appends/removes a value on a Vec context
    struct PushValue(i32);

    impl UndoCommand<Vec<i32>> for PushValue {
        fn undo(&mut self, ctx: &mut Vec<i32>) -> Result<()> {
            match ctx.pop() {
                Some(v) if v == self.0 => Ok(()),
                _ => Err(TesseraError::InvalidOperation("unexpected top".into())),
            }
        }

        fn redo(&mut self, ctx: &mut Vec<i32>) -> Result<()> {
            ctx.push(self.0);
            Ok(())
        }
    }

    struct Failing;

    impl UndoCommand<Vec<i32>> for Failing {
        fn undo(&mut self, _ctx: &mut Vec<i32>) -> Result<()> {
            Err(TesseraError::InvalidOperation("fail".into()))
        }

        fn redo(&mut self, _ctx: &mut Vec<i32>) -> Result<()> {
            Err(TesseraError::InvalidOperation("fail".into()))
        }

        fn is_significant(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_batch_order() {
        let mut ctx = vec![1, 2, 3];
        let mut batch = BatchUndoCommand::new();
        batch.push(Box::new(PushValue(1)));
        batch.push(Box::new(PushValue(2)));
        batch.push(Box::new(PushValue(3)));

        // Undo must pop 3, then 2, then 1.
        batch.undo(&mut ctx).unwrap();
        assert!(ctx.is_empty());

        batch.redo(&mut ctx).unwrap();
        assert_eq!(ctx, vec![1, 2, 3]);
    }

    #[test]
    fn test_batch_rolls_back_on_failure() {
        let mut ctx = vec![5];
        let mut batch = BatchUndoCommand::new();
        batch.push(Box::new(Failing));
        batch.push(Box::new(PushValue(5)));

        assert!(batch.undo(&mut ctx).is_err());
        assert_eq!(ctx, vec![5]);

        let mut ctx = Vec::new();
        let mut batch = BatchUndoCommand::new();
        batch.push(Box::new(PushValue(7)));
        batch.push(Box::new(Failing));
        assert!(batch.redo(&mut ctx).is_err());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_significance() {
        let mut batch: BatchUndoCommand<Vec<i32>> = BatchUndoCommand::new();
        assert!(!batch.is_significant());
        batch.push(Box::new(Failing));
        assert!(!batch.is_significant());
        batch.push(Box::new(PushValue(1)));
        assert!(batch.is_significant());
    }

    #[test]
    fn test_empty_batch_into_command() {
        let batch: BatchUndoCommand<Vec<i32>> = BatchUndoCommand::new();
        assert!(batch.into_command().is_none());
    }
}
