//! The command trait

use tessera_core::Result;

/// A reversible mutation of a context `C`.
///
/// A command is created after its change has already been applied, so the
/// first call it receives is `undo`.
pub trait UndoCommand<C> {
    fn undo(&mut self, ctx: &mut C) -> Result<()>;

    fn redo(&mut self, ctx: &mut C) -> Result<()>;

    /// Significant commands are rejected while the context is not editable.
    fn is_significant(&self) -> bool {
        true
    }

    fn description(&self) -> &str {
        "Edit"
    }

    /// Called once the command has left history for good, so it can release
    /// whatever it kept alive for undo.
    fn discard(&mut self, _ctx: &mut C) {}
}

pub type BoxedCommand<C> = Box<dyn UndoCommand<C>>;
