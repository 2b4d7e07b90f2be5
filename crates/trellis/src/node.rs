//! Arena node storage.

use std::collections::HashMap;

use crate::{
    class::Instance,
    data::{Collection, Entity, EntitySource},
    emitter::Emitter,
    id::ComponentId,
    remote::Remote,
    surface::{FormSurface, ListSurface, Surface},
    tree::{Callback, Tree},
    value::{Attributes, Params, Value},
};

/// The surface attached to a node, retaining its most capable interface.
pub(crate) enum SurfaceSlot {
    Plain(Box<dyn Surface>),
    List(Box<dyn ListSurface>),
    Form(Box<dyn FormSurface>),
}

impl SurfaceSlot {
    /// The surface as its base interface.
    pub(crate) fn surface_mut(&mut self) -> &mut dyn Surface {
        match self {
            SurfaceSlot::Plain(s) => s.as_mut(),
            SurfaceSlot::List(s) => s.as_mut(),
            SurfaceSlot::Form(s) => s.as_mut(),
        }
    }

    pub(crate) fn as_list_mut(&mut self) -> Option<&mut dyn ListSurface> {
        match self {
            SurfaceSlot::List(s) => Some(s.as_mut()),
            _ => None,
        }
    }

    pub(crate) fn as_form_mut(&mut self) -> Option<&mut dyn FormSurface> {
        match self {
            SurfaceSlot::Form(s) => Some(s.as_mut()),
            _ => None,
        }
    }
}

/// Model bookkeeping for a node bound to a single entity.
pub(crate) struct ModelSlot {
    pub(crate) source: Box<dyn EntitySource>,
    pub(crate) entity: Option<Box<dyn Entity>>,
    /// The entity change generation last observed by a poll sweep.
    pub(crate) seen_gen: u64,
}

/// Collection bookkeeping for a node bound to a fetchable collection.
pub(crate) struct CollectionSlot {
    pub(crate) collection: Box<dyn Collection>,
    /// Parameters every fetch starts from.
    pub(crate) default_params: Params,
    /// Parameters used by the most recent fetch.
    pub(crate) params: Params,
    /// True once any fetch has completed successfully.
    pub(crate) loaded: bool,
}

/// The data binding of a node.
pub(crate) enum DataSlot {
    None,
    Model(ModelSlot),
    Collection(CollectionSlot),
}

/// Selection and row bookkeeping for a list node.
#[derive(Default)]
pub(crate) struct ListState {
    /// Item identifiers in display order.
    pub(crate) item_ids: Vec<Value>,
    /// Identifier of the selected item, if any.
    pub(crate) selected: Option<Value>,
}

/// An in-flight remote operation attached to a node, completed by the poll
/// sweep once its remote settles.
pub(crate) enum Pending {
    ModelLoad {
        remote: Remote<Attributes>,
        entity: Box<dyn Entity>,
        /// Show the component after a successful load. Carries the silent
        /// flag for the show.
        then_show: Option<bool>,
        callback: Option<Callback>,
    },
    ModelRefresh {
        remote: Remote<Attributes>,
        callback: Option<Callback>,
    },
    ModelSave {
        remote: Remote<Attributes>,
        callback: Option<Callback>,
    },
    CollectionFetch {
        remote: Remote<()>,
        then_show: Option<bool>,
        callback: Option<Callback>,
    },
}

impl Pending {
    pub(crate) fn is_ready(&self) -> bool {
        match self {
            Pending::ModelLoad { remote, .. } => !remote.is_pending(),
            Pending::ModelRefresh { remote, .. } => !remote.is_pending(),
            Pending::ModelSave { remote, .. } => !remote.is_pending(),
            Pending::CollectionFetch { remote, .. } => !remote.is_pending(),
        }
    }
}

/// A single component stored in the tree arena.
pub struct Node {
    pub(crate) name: Option<String>,
    pub(crate) identity: String,
    pub(crate) parent: Option<ComponentId>,
    /// Children registered by name.
    pub(crate) children: HashMap<String, ComponentId>,
    pub(crate) visible: bool,
    pub(crate) singly: bool,
    pub(crate) overlay: bool,
    pub(crate) surface: Option<SurfaceSlot>,
    /// True once the surface has been rendered at least once.
    pub(crate) rendered: bool,
    pub(crate) data: DataSlot,
    pub(crate) list: Option<ListState>,
    pub(crate) emitter: Emitter<Tree>,
    /// Bubble table: (child name, child event) to the event name re-fired
    /// on this node.
    pub(crate) bubbles: HashMap<(String, String), String>,
    pub(crate) pending: Vec<Pending>,
    pub(crate) instance: Option<Instance>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("identity", &self.identity)
            .field("name", &self.name)
            .field("visible", &self.visible)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Node {
    /// The identity string, used for diagnostics and default naming.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The registration name within the parent, if registered.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The parent component, if attached.
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    /// True while the component is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True if showing a child hides its visible siblings.
    pub fn is_singly(&self) -> bool {
        self.singly
    }

    /// Registered child names, in no particular order.
    pub fn child_names(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    /// Look up a registered child by name.
    pub fn child(&self, name: &str) -> Option<ComponentId> {
        self.children.get(name).copied()
    }

    pub(crate) fn model_slot(&self) -> Option<&ModelSlot> {
        match &self.data {
            DataSlot::Model(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn model_slot_mut(&mut self) -> Option<&mut ModelSlot> {
        match &mut self.data {
            DataSlot::Model(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn collection_slot(&self) -> Option<&CollectionSlot> {
        match &self.data {
            DataSlot::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn collection_slot_mut(&mut self) -> Option<&mut CollectionSlot> {
        match &mut self.data {
            DataSlot::Collection(c) => Some(c),
            _ => None,
        }
    }
}
