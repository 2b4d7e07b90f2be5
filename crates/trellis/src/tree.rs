//! The component tree.
//!
//! All components live in a single slotmap arena owned by [`Tree`] and are
//! addressed by [`ComponentId`]. Parent/child links are registered by name,
//! events dispatch through per-node emitters with an explicit bubble table,
//! and in-flight remote operations are completed by [`Tree::poll`].

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::{
    config::{ComponentSpec, Config, HideOptions, ShowOptions},
    emitter::{Emitter, HandlerId},
    error::{Error, Result},
    events,
    id::ComponentId,
    ident::ComponentName,
    node::{DataSlot, Node, Pending, SurfaceSlot},
    value::{Attributes, Value},
};

/// A one-shot completion callback attached to a remote operation, invoked
/// when the operation finishes successfully.
pub type Callback = Box<dyn FnOnce(&mut Tree, ComponentId)>;

/// Data binding discriminant, used to dispatch show operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Plain,
    Model,
    Collection,
}

/// The component arena and lifecycle engine.
pub struct Tree {
    pub(crate) nodes: SlotMap<ComponentId, Node>,
    config: Config,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("components", &self.nodes.len())
            .finish()
    }
}

impl Tree {
    /// Create an empty tree with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty tree with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            config,
        }
    }

    /// The tree configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds no components.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn build_node(spec: ComponentSpec, data: DataSlot) -> Node {
        let identity = spec
            .identity
            .or_else(|| spec.instance.as_ref().map(|i| i.identity()))
            .unwrap_or_else(|| "component".to_string());
        Node {
            name: spec.name,
            identity,
            parent: None,
            children: HashMap::new(),
            visible: spec.visible,
            singly: spec.singly,
            overlay: spec.overlay,
            surface: spec.surface.map(SurfaceSlot::Plain),
            rendered: false,
            data,
            list: None,
            emitter: Emitter::new(),
            bubbles: HashMap::new(),
            pending: Vec::new(),
            instance: spec.instance,
        }
    }

    /// Insert a plain component.
    pub fn insert(&mut self, spec: ComponentSpec) -> ComponentId {
        self.nodes.insert(Self::build_node(spec, DataSlot::None))
    }

    /// Fetch a reference to a component.
    pub fn node(&self, id: ComponentId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::ComponentNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: ComponentId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::ComponentNotFound(id))
    }

    /// True if the id resolves to a live component.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.nodes.contains_key(id)
    }

    /// True while the component is shown.
    pub fn is_visible(&self, id: ComponentId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visible)
    }

    /// Look up a registered child by name.
    pub fn component(&self, parent: ComponentId, name: &str) -> Result<ComponentId> {
        self.node(parent)?
            .children
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownChild(name.into()))
    }

    /// Tolerate an API misuse: warn in default mode, error in strict mode.
    pub(crate) fn misconfig(&self, msg: impl Into<String>) -> Result<()> {
        let msg = msg.into();
        if self.config.strict {
            Err(Error::Misconfigured(msg))
        } else {
            warn!("{msg}");
            Ok(())
        }
    }

    fn kind(&self, id: ComponentId) -> Result<Kind> {
        Ok(match &self.node(id)?.data {
            DataSlot::None => Kind::Plain,
            DataSlot::Model(_) => Kind::Model,
            DataSlot::Collection(_) => Kind::Collection,
        })
    }

    /// Register a child under a parent. The registration name is taken from
    /// the explicit argument, falling back to the child's preset name, then
    /// to its identity munged into a valid name. Returns the registered name.
    ///
    /// A child already attached elsewhere is detached from its previous
    /// parent first. Registering over an existing name detaches the previous
    /// occupant. If the child carries a surface, a child marked visible is
    /// shown silently and any other child has its surface concealed without
    /// events.
    pub fn add_component(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        name: Option<&str>,
    ) -> Result<String> {
        if parent == child {
            return Err(Error::Invalid("cannot add a component to itself".into()));
        }
        // Reject attachments that would close a cycle.
        let mut cur = Some(parent);
        while let Some(c) = cur {
            if c == child {
                return Err(Error::Invalid(
                    "attachment would create a component cycle".into(),
                ));
            }
            cur = self.node(c)?.parent;
        }
        let name = match name {
            Some(n) => ComponentName::convert(n).to_string(),
            None => {
                let child_node = self.node(child)?;
                match &child_node.name {
                    Some(preset) => ComponentName::convert(preset).to_string(),
                    None => ComponentName::convert(&child_node.identity).to_string(),
                }
            }
        };
        if let Some(old) = self.node(child)?.parent {
            if let Some(old_node) = self.nodes.get_mut(old) {
                debug!(?child, "detaching component from previous parent");
                old_node.children.retain(|_, v| *v != child);
            }
        }
        if let Some(prev) = self.node(parent)?.children.get(&name).copied() {
            if prev != child {
                debug!(%name, "overwriting existing child registration");
                if let Some(prev_node) = self.nodes.get_mut(prev) {
                    prev_node.parent = None;
                    prev_node.name = None;
                }
            }
        }
        {
            let child_node = self.node_mut(child)?;
            child_node.name = Some(name.clone());
            child_node.parent = Some(parent);
        }
        self.node_mut(parent)?.children.insert(name.clone(), child);

        let child_node = self.node(child)?;
        let has_surface = child_node.surface.is_some();
        let visible = child_node.visible;
        if has_surface {
            if visible {
                self.show(child, ShowOptions::new().silent())?;
            } else if let Some(slot) = self.node_mut(child)?.surface.as_mut() {
                slot.surface_mut().hide();
            }
        }
        Ok(name)
    }

    /// Rename a component: the given text becomes its identity, and it is
    /// re-registered under the converted name if attached to a parent.
    /// Returns the new registration name.
    pub fn set_name(&mut self, id: ComponentId, name: &str) -> Result<String> {
        let converted = ComponentName::convert(name).to_string();
        let parent = self.node(id)?.parent;
        if let Some(p) = parent {
            if let Some(old) = self.node(id)?.name.clone() {
                self.node_mut(p)?.children.remove(&old);
            }
            if let Some(prev) = self.node(p)?.children.get(&converted).copied() {
                if prev != id {
                    debug!(name = %converted, "overwriting existing child registration");
                    if let Some(prev_node) = self.nodes.get_mut(prev) {
                        prev_node.parent = None;
                        prev_node.name = None;
                    }
                }
            }
            self.node_mut(p)?.children.insert(converted.clone(), id);
        }
        let node = self.node_mut(id)?;
        node.name = Some(converted.clone());
        node.identity = name.to_string();
        Ok(converted)
    }

    /// Unregister a child by name without destroying it. Returns the
    /// detached component.
    pub fn remove_component(&mut self, parent: ComponentId, name: &str) -> Result<ComponentId> {
        let node = self.node_mut(parent)?;
        let Some(child) = node.children.remove(name) else {
            return Err(Error::UnknownChild(name.into()));
        };
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
            child_node.name = None;
        }
        Ok(child)
    }

    /// Forward a child's event so that it re-fires on the parent under the
    /// same name.
    pub fn bubble(&mut self, parent: ComponentId, child_name: &str, event: &str) -> Result<()> {
        self.bubble_as(parent, child_name, event, event)
    }

    /// Forward a child's event so that it re-fires on the parent under a
    /// different name. Registering again for the same child and event
    /// replaces the rule. No child registered under the name means no rule
    /// is installed.
    pub fn bubble_as(
        &mut self,
        parent: ComponentId,
        child_name: &str,
        event: &str,
        as_event: &str,
    ) -> Result<()> {
        if !self.node(parent)?.children.contains_key(child_name) {
            return self.misconfig(format!("bubble on unregistered child {child_name}"));
        }
        self.node_mut(parent)?.bubbles.insert(
            (child_name.to_string(), event.to_string()),
            as_event.to_string(),
        );
        Ok(())
    }

    /// Stop forwarding a child's event.
    pub fn unbubble(&mut self, parent: ComponentId, child_name: &str, event: &str) -> Result<()> {
        let removed = self
            .node_mut(parent)?
            .bubbles
            .remove(&(child_name.to_string(), event.to_string()));
        if removed.is_none() {
            return self.misconfig(format!("no bubble registered for {child_name}/{event}"));
        }
        Ok(())
    }

    /// Register an event handler on a component.
    pub fn on(
        &mut self,
        id: ComponentId,
        event: impl Into<String>,
        func: impl FnMut(&mut Tree, &[Value]) + 'static,
    ) -> Result<HandlerId> {
        Ok(self.node_mut(id)?.emitter.on(event, func))
    }

    /// Remove a previously registered event handler.
    pub fn off(&mut self, id: ComponentId, event: &str, handler: HandlerId) -> Result<bool> {
        Ok(self.node_mut(id)?.emitter.off(event, handler))
    }

    /// Fire an event on a component. Handlers run first on a snapshot of the
    /// registered list, then a shown event coordinates singly display with
    /// the parent, then the event is forwarded through the parent's bubble
    /// table.
    pub fn trigger(&mut self, id: ComponentId, event: &str, args: &[Value]) -> Result<()> {
        let handlers = self.node(id)?.emitter.snapshot(event);
        for func in handlers {
            match func.try_borrow_mut() {
                Ok(mut f) => f(self, args),
                Err(_) => warn!(event, "skipping re-entrant event handler"),
            }
        }
        // A handler may have destroyed the component.
        if !self.contains(id) {
            return Ok(());
        }
        if event == events::SHOWN {
            self.coordinate_singly(id)?;
        }
        self.forward_bubbles(id, event, args)
    }

    /// When a registered child announces it is being shown, hide its visible
    /// siblings if the parent shows one child at a time, then make sure the
    /// parent itself is shown.
    fn coordinate_singly(&mut self, id: ComponentId) -> Result<()> {
        let (parent, name) = {
            let node = self.node(id)?;
            match (node.parent, node.name.clone()) {
                (Some(p), Some(n)) => (p, n),
                _ => return Ok(()),
            }
        };
        if self.node(parent)?.children.get(&name) != Some(&id) {
            return Ok(());
        }
        let singly = self.node(parent)?.singly;
        let overlay = self.node(id)?.overlay;
        if singly && !overlay {
            self.hide_components(parent)?;
        }
        self.show(parent, ShowOptions::new())
    }

    fn forward_bubbles(&mut self, id: ComponentId, event: &str, args: &[Value]) -> Result<()> {
        let (parent, name) = {
            let node = self.node(id)?;
            match (node.parent, node.name.clone()) {
                (Some(p), Some(n)) => (p, n),
                _ => return Ok(()),
            }
        };
        let mapped = self
            .node(parent)?
            .bubbles
            .get(&(name, event.to_string()))
            .cloned();
        if let Some(mapped) = mapped {
            self.trigger(parent, &mapped, args)?;
        }
        Ok(())
    }

    /// Show a component. For model and collection components this may defer
    /// behind a remote operation; see [`Tree::poll`].
    pub fn show(&mut self, id: ComponentId, opts: ShowOptions) -> Result<()> {
        match self.kind(id)? {
            Kind::Model => self.show_model(id, opts),
            Kind::Collection => self.show_collection(id, opts),
            Kind::Plain => {
                if opts.record.is_some() || opts.entity.is_some() || opts.params.is_some() {
                    self.misconfig(
                        "show options carry data directives but the component has no data binding",
                    )?;
                }
                self.show_base(id, opts.silent)
            }
        }
    }

    /// The unconditional show path: fire the shown event, render the surface
    /// if it has never been rendered, reveal it, and mark the component
    /// visible. The shown event fires before the visibility flag flips, so a
    /// singly parent reacting to it does not hide the component being shown.
    pub(crate) fn show_base(&mut self, id: ComponentId, silent: bool) -> Result<()> {
        let identity = self.node(id)?.identity.clone();
        debug!(%identity, "showing component");
        if !silent {
            self.trigger(id, events::SHOWN, &[Value::String(identity)])?;
        }
        self.render_and_reveal(id)?;
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = true;
        }
        Ok(())
    }

    pub(crate) fn render_data(&self, id: ComponentId) -> Result<Attributes> {
        let node = self.node(id)?;
        Ok(match &node.data {
            DataSlot::Model(m) => m
                .entity
                .as_ref()
                .map(|e| e.attributes())
                .unwrap_or_default(),
            _ => Attributes::new(),
        })
    }

    fn render_and_reveal(&mut self, id: ComponentId) -> Result<()> {
        let data = self.render_data(id)?;
        let did_render = {
            let node = self.node_mut(id)?;
            if let Some(slot) = node.surface.as_mut() {
                let render = !node.rendered;
                if render {
                    slot.surface_mut().render(&data)?;
                    node.rendered = true;
                }
                slot.surface_mut().show()?;
                render
            } else {
                false
            }
        };
        if did_render {
            self.trigger(id, events::RENDER_COMPLETE, &[])?;
        }
        Ok(())
    }

    /// Re-render a component's surface from its current data, firing the
    /// render complete event.
    pub fn render(&mut self, id: ComponentId) -> Result<()> {
        let data = self.render_data(id)?;
        let did_render = {
            let node = self.node_mut(id)?;
            if let Some(slot) = node.surface.as_mut() {
                slot.surface_mut().render(&data)?;
                node.rendered = true;
                true
            } else {
                false
            }
        };
        if did_render {
            self.trigger(id, events::RENDER_COMPLETE, &[])?;
        }
        Ok(())
    }

    /// Hide a component. Returns false if the component was not visible, in
    /// which case nothing happens and no event fires.
    pub fn hide(&mut self, id: ComponentId, opts: HideOptions) -> Result<bool> {
        {
            let node = self.node_mut(id)?;
            if !node.visible {
                return Ok(false);
            }
            if let Some(slot) = node.surface.as_mut() {
                slot.surface_mut().hide();
            }
        }
        if !opts.silent {
            let identity = self.node(id)?.identity.clone();
            self.trigger(id, events::HIDDEN, &[Value::String(identity)])?;
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = false;
        }
        Ok(true)
    }

    /// Hide every registered child of a component.
    pub fn hide_components(&mut self, parent: ComponentId) -> Result<()> {
        let kids: Vec<ComponentId> = self.node(parent)?.children.values().copied().collect();
        for kid in kids {
            if self.contains(kid) {
                self.hide(kid, HideOptions::new())?;
            }
        }
        Ok(())
    }

    /// Hide a registered child by name. Returns false if it was not visible.
    /// An unknown name is tolerated with a warning.
    pub fn hide_component(
        &mut self,
        parent: ComponentId,
        name: &str,
        opts: HideOptions,
    ) -> Result<bool> {
        let Some(child) = self.node(parent)?.children.get(name).copied() else {
            self.misconfig(format!("no child registered under {name}"))?;
            return Ok(false);
        };
        self.hide(child, opts)
    }

    /// Show a registered child by name. An already-visible child is left
    /// alone. Under a singly parent, visible siblings are hidden first
    /// unless the child is an overlay.
    pub fn show_component(
        &mut self,
        parent: ComponentId,
        name: &str,
        opts: ShowOptions,
    ) -> Result<()> {
        let Some(child) = self.node(parent)?.children.get(name).copied() else {
            return self.misconfig(format!("no child registered under {name}"));
        };
        if self.node(child)?.visible {
            debug!(name, "child already visible");
            return Ok(());
        }
        let singly = self.node(parent)?.singly;
        let overlay = self.node(child)?.overlay;
        if singly && !overlay {
            self.hide_components(parent)?;
        }
        self.show(parent, ShowOptions::new())?;
        self.show(child, opts)
    }

    /// Destroy a component and its whole subtree: surfaces are removed,
    /// children are destructed depth-first, class instances run their
    /// destruct chains, and the nodes leave the arena.
    pub fn destruct(&mut self, id: ComponentId) -> Result<()> {
        let parent = self.node(id)?.parent;
        if let Some(p) = parent {
            if let Some(parent_node) = self.nodes.get_mut(p) {
                parent_node.children.retain(|_, v| *v != id);
            }
        }
        self.destruct_inner(id);
        Ok(())
    }

    fn destruct_inner(&mut self, id: ComponentId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if let Some(mut slot) = node.surface.take() {
            slot.surface_mut().remove();
        }
        let kids: Vec<ComponentId> = node.children.values().copied().collect();
        for kid in kids {
            self.destruct_inner(kid);
        }
        if let Some(node) = self.nodes.remove(id) {
            if let Some(instance) = node.instance {
                instance.destruct();
            }
        }
    }

    /// Invoke a class method on the component's attached instance.
    pub fn call(&mut self, id: ComponentId, method: &str, args: &[Value]) -> Result<Value> {
        if self.node(id)?.instance.is_none() {
            self.misconfig(format!("no class instance attached for method {method}"))?;
            return Ok(Value::Null);
        }
        let node = self.node_mut(id)?;
        let instance = node
            .instance
            .as_mut()
            .ok_or_else(|| Error::Internal("instance vanished".into()))?;
        Ok(instance.call(method, args))
    }

    /// Sweep the tree once: complete settled remote operations, re-render
    /// components whose entity changed, and drain collection change events.
    /// Returns the number of remote operations completed. Surface failures
    /// during the sweep are logged rather than propagated.
    pub fn poll(&mut self) -> usize {
        let ids: Vec<ComponentId> = self.nodes.keys().collect();
        let mut completed = 0;
        for id in ids {
            if !self.contains(id) {
                continue;
            }
            completed += self.poll_pending(id);
            self.poll_changes(id);
            self.poll_collection_events(id);
        }
        completed
    }

    fn poll_pending(&mut self, id: ComponentId) -> usize {
        let ready: Vec<Pending> = {
            let Some(node) = self.nodes.get_mut(id) else {
                return 0;
            };
            if node.pending.is_empty() {
                return 0;
            }
            let mut keep = Vec::new();
            let mut ready = Vec::new();
            for p in node.pending.drain(..) {
                if p.is_ready() {
                    ready.push(p);
                } else {
                    keep.push(p);
                }
            }
            node.pending = keep;
            ready
        };
        let count = ready.len();
        for p in ready {
            match p {
                Pending::ModelLoad {
                    remote,
                    entity,
                    then_show,
                    callback,
                } => self.complete_model_load(id, remote, entity, then_show, callback),
                Pending::ModelRefresh { remote, callback } => {
                    self.complete_model_refresh(id, remote, callback)
                }
                Pending::ModelSave { remote, callback } => {
                    self.complete_model_save(id, remote, callback)
                }
                Pending::CollectionFetch {
                    remote,
                    then_show,
                    callback,
                } => self.complete_collection_fetch(id, remote, then_show, callback),
            }
        }
        count
    }
}
