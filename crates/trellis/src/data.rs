//! Data abstractions backing model and collection components.

use crate::{
    remote::Remote,
    value::{Attributes, Params, Value},
};

/// A single record with keyed attributes and remote load/save operations.
///
/// Implementations track a change generation counter: any mutation that
/// should be reflected on screen bumps the counter, and the tree re-renders
/// a component when its entity's counter has moved since the last sweep.
pub trait Entity {
    /// The record identifier, if the entity has been assigned one.
    fn id(&self) -> Option<Value>;

    /// Assign the record identifier.
    fn set_id(&mut self, id: Value);

    /// Apply a set of attributes on top of the current ones.
    fn apply(&mut self, attrs: &Attributes);

    /// A snapshot of the current attributes.
    fn attributes(&self) -> Attributes;

    /// Begin fetching the record from its backing store.
    fn fetch(&mut self) -> Remote<Attributes>;

    /// Begin persisting the given attributes to the backing store. The
    /// resolved value carries the stored attributes, which may include
    /// server-assigned fields.
    fn save(&mut self, attrs: &Attributes) -> Remote<Attributes>;

    /// Monotonic counter bumped on every observable mutation.
    fn change_gen(&self) -> u64;
}

/// A factory for blank entities, used when a component must materialize a
/// record from an identifier or start a fresh one for form entry.
pub trait EntitySource {
    /// Create a blank entity.
    fn create(&self) -> Box<dyn Entity>;
}

/// A change notification drained from a collection after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    /// An item was inserted at the given index.
    Added {
        /// Position of the inserted item.
        index: usize,
    },
    /// The item at the given index was removed.
    Removed {
        /// Position the item was removed from.
        index: usize,
    },
    /// The collection was wholesale replaced by a completed fetch.
    Loaded,
}

/// An ordered set of records with a remote fetch operation.
///
/// After a successful fetch resolves, the collection must queue a
/// [`CollectionEvent::Loaded`] event; incremental mutations queue `Added`
/// and `Removed` events. The tree drains the queue on every poll sweep.
pub trait Collection {
    /// Begin fetching the collection contents with the given parameters.
    fn fetch(&mut self, params: &Params) -> Remote<()>;

    /// Number of items currently held.
    fn len(&self) -> usize;

    /// True if the collection holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The attributes of the item at the given index.
    fn item(&self, index: usize) -> Option<Attributes>;

    /// Drain queued change notifications, oldest first.
    fn poll_events(&mut self) -> Vec<CollectionEvent>;
}
