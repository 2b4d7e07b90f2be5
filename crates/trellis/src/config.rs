//! Construction-time configuration for the tree and its components.

use crate::{
    class::Instance,
    data::{Collection, Entity, EntitySource},
    surface::{FormSurface, ListSurface, Surface},
    value::{Params, Value},
};

/// Tree-wide behavior switches.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// When true, API misuse that is normally tolerated with a warning is
    /// promoted to [`Error::Misconfigured`](crate::Error::Misconfigured).
    pub strict: bool,
}

/// Immutable description of a plain component, consumed at insertion.
#[derive(Default)]
pub struct ComponentSpec {
    pub(crate) name: Option<String>,
    pub(crate) identity: Option<String>,
    pub(crate) singly: bool,
    pub(crate) visible: bool,
    pub(crate) overlay: bool,
    pub(crate) surface: Option<Box<dyn Surface>>,
    pub(crate) instance: Option<Instance>,
}

impl ComponentSpec {
    /// Start an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit registration name. When absent, the identity is
    /// converted to a valid name at registration time.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the identity string used for diagnostics and default naming.
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Show at most one child at a time: showing a child hides its visible
    /// siblings.
    pub fn singly(mut self, singly: bool) -> Self {
        self.singly = singly;
        self
    }

    /// Start the component visible.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Mark the component as an overlay. When shown under a singly parent
    /// an overlay does not hide its siblings.
    pub fn overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    /// Attach a display surface.
    pub fn surface(mut self, surface: impl Surface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Attach a class instance whose methods can be invoked through
    /// [`Tree::call`](crate::Tree::call).
    pub fn instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }
}

/// Description of a model component: a plain component bound to a single
/// entity drawn from a source.
pub struct ModelSpec {
    pub(crate) source: Box<dyn EntitySource>,
    pub(crate) component: ComponentSpec,
}

impl ModelSpec {
    /// Build a model spec around an entity source.
    pub fn new(source: impl EntitySource + 'static) -> Self {
        Self {
            source: Box::new(source),
            component: ComponentSpec::new(),
        }
    }

    /// Set the underlying component spec.
    pub fn component(mut self, spec: ComponentSpec) -> Self {
        self.component = spec;
        self
    }
}

/// Description of a collection component: a plain component bound to a
/// fetchable collection.
pub struct CollectionSpec {
    pub(crate) collection: Box<dyn Collection>,
    pub(crate) default_params: Params,
    pub(crate) component: ComponentSpec,
}

impl CollectionSpec {
    /// Build a collection spec around a collection.
    pub fn new(collection: impl Collection + 'static) -> Self {
        Self {
            collection: Box::new(collection),
            default_params: Params::new(),
            component: ComponentSpec::new(),
        }
    }

    /// Set the parameters every fetch starts from.
    pub fn default_params(mut self, params: Params) -> Self {
        self.default_params = params;
        self
    }

    /// Set the underlying component spec.
    pub fn component(mut self, spec: ComponentSpec) -> Self {
        self.component = spec;
        self
    }
}

/// Description of a list component: a collection component whose surface
/// displays one row per item and tracks a selection.
pub struct ListSpec {
    pub(crate) collection: Box<dyn Collection>,
    pub(crate) default_params: Params,
    pub(crate) surface: Box<dyn ListSurface>,
    pub(crate) component: ComponentSpec,
}

impl ListSpec {
    /// Build a list spec around a collection and a list surface.
    pub fn new(collection: impl Collection + 'static, surface: impl ListSurface + 'static) -> Self {
        Self {
            collection: Box::new(collection),
            default_params: Params::new(),
            surface: Box::new(surface),
            component: ComponentSpec::new(),
        }
    }

    /// Set the parameters every fetch starts from.
    pub fn default_params(mut self, params: Params) -> Self {
        self.default_params = params;
        self
    }

    /// Set the underlying component spec.
    pub fn component(mut self, spec: ComponentSpec) -> Self {
        self.component = spec;
        self
    }
}

/// Description of a form component: a model component whose surface carries
/// editable fields that can be submitted back to the entity.
pub struct FormSpec {
    pub(crate) source: Box<dyn EntitySource>,
    pub(crate) surface: Box<dyn FormSurface>,
    pub(crate) component: ComponentSpec,
}

impl FormSpec {
    /// Build a form spec around an entity source and a form surface.
    pub fn new(source: impl EntitySource + 'static, surface: impl FormSurface + 'static) -> Self {
        Self {
            source: Box::new(source),
            surface: Box::new(surface),
            component: ComponentSpec::new(),
        }
    }

    /// Set the underlying component spec.
    pub fn component(mut self, spec: ComponentSpec) -> Self {
        self.component = spec;
        self
    }
}

/// Options governing a show operation.
#[derive(Default)]
pub struct ShowOptions {
    pub(crate) silent: bool,
    pub(crate) record: Option<Value>,
    pub(crate) entity: Option<Box<dyn Entity>>,
    pub(crate) params: Option<Params>,
}

impl ShowOptions {
    /// Start with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the shown event.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// For a model component, load the record with this identifier before
    /// showing.
    pub fn record(mut self, id: impl Into<Value>) -> Self {
        self.record = Some(id.into());
        self
    }

    /// For a model component, adopt this already-loaded entity and show
    /// immediately.
    pub fn entity(mut self, entity: impl Entity + 'static) -> Self {
        self.entity = Some(Box::new(entity));
        self
    }

    /// For a collection component, fetch with these parameters before
    /// showing.
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

/// Options governing a hide operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HideOptions {
    pub(crate) silent: bool,
}

impl HideOptions {
    /// Start with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the hidden event.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}
