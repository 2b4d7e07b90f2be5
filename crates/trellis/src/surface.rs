//! Display surfaces.
//!
//! A component owns at most one surface: the thing that actually puts pixels
//! on screen. The tree drives surfaces through these traits and never knows
//! what is behind them.

use crate::{error::Result, value::Attributes};

/// A renderable display region owned by a component.
pub trait Surface {
    /// Draw the surface contents from the given data.
    fn render(&mut self, data: &Attributes) -> Result<()>;

    /// Reveal the surface.
    fn show(&mut self) -> Result<()>;

    /// Conceal the surface without destroying it.
    fn hide(&mut self);

    /// Tear the surface down permanently.
    fn remove(&mut self);
}

/// A surface that displays an ordered list of items and supports incremental
/// updates as the backing collection changes.
pub trait ListSurface: Surface {
    /// Insert an item row at the given index.
    fn insert_item(&mut self, index: usize, attrs: &Attributes) -> Result<()>;

    /// Remove the item row at the given index.
    fn remove_item(&mut self, index: usize);

    /// Remove every item row.
    fn clear_items(&mut self);

    /// Number of item rows currently displayed.
    fn item_count(&self) -> usize;
}

/// A surface with editable input fields whose values can be collected for
/// saving.
pub trait FormSurface: Surface {
    /// The current values of the input fields, keyed by field name.
    fn field_values(&self) -> Attributes;
}
