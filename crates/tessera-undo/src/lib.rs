//! Tessera Undo - Reversible commands and undo/redo history
//!
//! Commands are generic over the context they mutate, so the same batch and
//! property machinery serves any owner of editable state.

mod batch;
mod command;
mod property;
mod queue;

pub use batch::BatchUndoCommand;
pub use command::{BoxedCommand, UndoCommand};
pub use property::PropertyUndoCommand;
pub use queue::UndoQueue;
