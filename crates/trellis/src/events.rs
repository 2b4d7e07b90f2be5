//! Well-known event names fired by the tree.

/// Fired on a component as it is shown, before it becomes visible.
pub const SHOWN: &str = "component:shown";

/// Fired on a component after it is hidden.
pub const HIDDEN: &str = "component:hidden";

/// Fired after a component's surface has been rendered and revealed.
pub const RENDER_COMPLETE: &str = "render:complete";

/// Fired on a model component after a load completes. Payload: the loaded
/// attributes as a map.
pub const MODEL_LOADED: &str = "model:loaded";

/// Fired on a collection component after a fetch completes. Payload: the
/// item count as an integer.
pub const COLLECTION_LOADED: &str = "collection:loaded";

/// Fired on a model component after a save completes. Payload: the stored
/// attributes as a map.
pub const SAVED: &str = "saved";

/// Fired on a model component when a save fails. Payload: the entity's
/// attributes as a map, then the failure message as a string.
pub const SAVE_FAILED: &str = "save:failed";

/// Fired on a list component when an item is selected. Payload: the item
/// attributes as a map, then the index as an integer.
pub const ITEM_SELECTED: &str = "item:selected";
