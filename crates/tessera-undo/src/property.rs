//! Generic get/set property commands

use crate::command::UndoCommand;
use tessera_core::Result;

type Getter<C, V> = Box<dyn Fn(&C) -> Result<V>>;
type Setter<C, V> = Box<dyn Fn(&mut C, V) -> Result<()>>;

/// Restores a single property value through an accessor pair.
///
/// Holds the value to put back; undo and redo both swap it with the live
/// value, so either can run first.
pub struct PropertyUndoCommand<C, V> {
    getter: Getter<C, V>,
    setter: Setter<C, V>,
    value: V,
    significant: bool,
    description: String,
}

impl<C, V: Clone> PropertyUndoCommand<C, V> {
    /// Capture the current value of the property in `ctx`
    pub fn capture<G, S>(ctx: &C, getter: G, setter: S) -> Result<Self>
    where
        G: Fn(&C) -> Result<V> + 'static,
        S: Fn(&mut C, V) -> Result<()> + 'static,
    {
        let value = getter(ctx)?;
        Ok(Self::with_value(value, getter, setter))
    }

    /// Build a command that will restore `value`
    pub fn with_value<G, S>(value: V, getter: G, setter: S) -> Self
    where
        G: Fn(&C) -> Result<V> + 'static,
        S: Fn(&mut C, V) -> Result<()> + 'static,
    {
        Self {
            getter: Box::new(getter),
            setter: Box::new(setter),
            value,
            significant: true,
            description: String::from("Property"),
        }
    }

    pub fn with_significance(mut self, significant: bool) -> Self {
        self.significant = significant;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    fn swap(&mut self, ctx: &mut C) -> Result<()> {
        let live = (self.getter)(ctx)?;
        (self.setter)(ctx, self.value.clone())?;
        self.value = live;
        Ok(())
    }
}

impl<C, V: Clone> UndoCommand<C> for PropertyUndoCommand<C, V> {
    fn undo(&mut self, ctx: &mut C) -> Result<()> {
        self.swap(ctx)
    }

    fn redo(&mut self, ctx: &mut C) -> Result<()> {
        self.swap(ctx)
    }

    fn is_significant(&self) -> bool {
        self.significant
    }

    fn description(&self) -> &str {
        &self.description
    }
}
