//! Undo/redo history with bounded depth

use crate::command::BoxedCommand;
use tessera_core::Result;

pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Undo/redo stacks.
///
/// The queue is usually owned by the context its commands mutate, so undo
/// and redo are split into `take_*` and `finish_*` halves: the caller takes
/// the command out, runs it against itself, and hands it back.
pub struct UndoQueue<C> {
    undo: Vec<BoxedCommand<C>>,
    redo: Vec<BoxedCommand<C>>,
    max_depth: usize,
}

impl<C> Default for UndoQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> UndoQueue<C> {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Push a new command onto the undo stack (clears redo).
    ///
    /// Returns the commands that fell out of history: the cleared redo stack
    /// and anything evicted past `max_depth`. The caller owns their
    /// `discard`.
    pub fn push(&mut self, command: BoxedCommand<C>) -> Vec<BoxedCommand<C>> {
        self.undo.push(command);
        let mut dropped: Vec<BoxedCommand<C>> = self.redo.drain(..).collect();
        if self.undo.len() > self.max_depth {
            let evicted = self.undo.remove(0);
            log::debug!("undo history full, dropping '{}'", evicted.description());
            dropped.push(evicted);
        }
        dropped
    }

    pub fn take_undo(&mut self) -> Option<BoxedCommand<C>> {
        self.undo.pop()
    }

    /// Return a command after a successful undo
    pub fn finish_undo(&mut self, command: BoxedCommand<C>) {
        self.redo.push(command);
    }

    pub fn take_redo(&mut self) -> Option<BoxedCommand<C>> {
        self.redo.pop()
    }

    /// Return a command after a successful redo
    pub fn finish_redo(&mut self, command: BoxedCommand<C>) {
        self.undo.push(command);
    }

    /// Undo the last command against a separately owned context
    pub fn undo(&mut self, ctx: &mut C) -> Result<bool> {
        let Some(mut command) = self.take_undo() else {
            return Ok(false);
        };
        command.undo(ctx)?;
        self.finish_undo(command);
        Ok(true)
    }

    /// Redo the last undone command against a separately owned context
    pub fn redo(&mut self, ctx: &mut C) -> Result<bool> {
        let Some(mut command) = self.take_redo() else {
            return Ok(false);
        };
        command.redo(ctx)?;
        self.finish_redo(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.last().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|c| c.description())
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.redo.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::UndoCommand;

    struct Add(i32);

    impl UndoCommand<i32> for Add {
        fn undo(&mut self, ctx: &mut i32) -> Result<()> {
            *ctx -= self.0;
            Ok(())
        }

        fn redo(&mut self, ctx: &mut i32) -> Result<()> {
            *ctx += self.0;
            Ok(())
        }

        fn description(&self) -> &str {
            "Add"
        }
    }

    #[test]
    fn test_undo_redo() {
        let mut value = 0;
        let mut queue = UndoQueue::new();

        value += 5;
        queue.push(Box::new(Add(5)));
        value += 3;
        queue.push(Box::new(Add(3)));

        assert!(queue.undo(&mut value).unwrap());
        assert_eq!(value, 5);
        assert!(queue.can_redo());
        assert_eq!(queue.redo_description(), Some("Add"));

        assert!(queue.redo(&mut value).unwrap());
        assert_eq!(value, 8);
        assert!(!queue.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut value = 1;
        let mut queue = UndoQueue::new();
        queue.push(Box::new(Add(1)));
        queue.undo(&mut value).unwrap();
        assert!(queue.can_redo());

        let dropped = queue.push(Box::new(Add(2)));
        assert!(!queue.can_redo());
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].description(), "Add");
    }

    #[test]
    fn test_max_depth() {
        let mut value = 0;
        let mut queue = UndoQueue::with_max_depth(2);
        for i in 1..=3 {
            value += i;
            let dropped = queue.push(Box::new(Add(i)));
            assert_eq!(dropped.len(), usize::from(i == 3));
        }
        assert_eq!(queue.len(), 2);
        queue.undo(&mut value).unwrap();
        queue.undo(&mut value).unwrap();
        assert!(!queue.undo(&mut value).unwrap());
        assert_eq!(value, 1);
    }
}
