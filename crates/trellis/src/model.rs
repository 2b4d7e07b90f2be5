//! Model components: a component bound to a single entity.
//!
//! A model component owns at most one [`Entity`] drawn from its
//! [`EntitySource`](crate::data::EntitySource). Loads, refreshes and saves
//! run as remote operations completed by [`Tree::poll`], and entity
//! mutations re-render the surface through the change generation sweep.

use tracing::warn;

use crate::{
    config::{ModelSpec, ShowOptions},
    data::Entity,
    error::{Error, Result},
    events,
    id::ComponentId,
    node::{DataSlot, ModelSlot, Pending},
    remote::Remote,
    tree::{Callback, Tree},
    value::{Attributes, Value},
};

/// What to load into a model component: a record identifier to fetch, or an
/// already-populated entity to adopt.
pub enum LoadTarget {
    /// Fetch the record with this identifier from the entity source.
    Id(Value),
    /// Adopt this entity as-is.
    Entity(Box<dyn Entity>),
}

impl From<Value> for LoadTarget {
    fn from(v: Value) -> Self {
        LoadTarget::Id(v)
    }
}

impl From<i64> for LoadTarget {
    fn from(v: i64) -> Self {
        LoadTarget::Id(Value::Int(v))
    }
}

impl From<&str> for LoadTarget {
    fn from(v: &str) -> Self {
        LoadTarget::Id(Value::from(v))
    }
}

impl From<Box<dyn Entity>> for LoadTarget {
    fn from(e: Box<dyn Entity>) -> Self {
        LoadTarget::Entity(e)
    }
}

impl Tree {
    /// Insert a model component.
    pub fn insert_model(&mut self, spec: ModelSpec) -> ComponentId {
        let data = DataSlot::Model(ModelSlot {
            source: spec.source,
            entity: None,
            seen_gen: 0,
        });
        self.nodes.insert(Self::build_node(spec.component, data))
    }

    /// Load a record into a model component. An identifier target begins a
    /// fetch completed by [`Tree::poll`]; an entity target is adopted
    /// immediately and fires the loaded event. The callback, if given, runs
    /// after a successful load.
    pub fn load_model(
        &mut self,
        id: ComponentId,
        target: impl Into<LoadTarget>,
        callback: Option<Callback>,
    ) -> Result<()> {
        if self.node(id)?.model_slot().is_none() {
            return self.misconfig("load on a component without a model binding");
        }
        match target.into() {
            LoadTarget::Id(record) => {
                let (remote, entity) = self.begin_fetch(id, record)?;
                self.node_mut(id)?.pending.push(Pending::ModelLoad {
                    remote,
                    entity,
                    then_show: None,
                    callback,
                });
            }
            LoadTarget::Entity(entity) => {
                let attrs = entity.attributes();
                self.set_model(id, entity)?;
                self.trigger(id, events::MODEL_LOADED, &[Value::Map(attrs)])?;
                if let Some(cb) = callback {
                    cb(self, id);
                }
            }
        }
        Ok(())
    }

    /// Create a blank entity for the record id and begin fetching it.
    fn begin_fetch(
        &mut self,
        id: ComponentId,
        record: Value,
    ) -> Result<(Remote<Attributes>, Box<dyn Entity>)> {
        let slot = self
            .node_mut(id)?
            .model_slot_mut()
            .ok_or_else(|| Error::Internal("model binding vanished".into()))?;
        let mut entity = slot.source.create();
        entity.set_id(record);
        let remote = entity.fetch();
        Ok((remote, entity))
    }

    /// Replace the entity behind a model component. The surface is marked
    /// unrendered and redrawn immediately if the component is visible.
    pub fn set_model(&mut self, id: ComponentId, entity: Box<dyn Entity>) -> Result<()> {
        let seen = entity.change_gen();
        let visible = {
            let node = self.node_mut(id)?;
            let Some(slot) = node.model_slot_mut() else {
                return self.misconfig("set_model on a component without a model binding");
            };
            slot.entity = Some(entity);
            slot.seen_gen = seen;
            node.rendered = false;
            node.visible
        };
        if visible {
            self.render(id)?;
        }
        Ok(())
    }

    /// Re-fetch the current entity from its backing store.
    pub fn refresh_model(&mut self, id: ComponentId, callback: Option<Callback>) -> Result<()> {
        let remote = {
            let node = self.node_mut(id)?;
            let entity = node.model_slot_mut().and_then(|s| s.entity.as_mut());
            match entity {
                Some(e) => e.fetch(),
                None => {
                    return self.misconfig("refresh on a model component with no entity loaded");
                }
            }
        };
        self.node_mut(id)?
            .pending
            .push(Pending::ModelRefresh { remote, callback });
        Ok(())
    }

    /// Apply attributes to the current entity and begin persisting it. Fires
    /// the saved event on success and the save failed event on failure.
    pub fn save_model(
        &mut self,
        id: ComponentId,
        attrs: &Attributes,
        callback: Option<Callback>,
    ) -> Result<()> {
        let remote = {
            let node = self.node_mut(id)?;
            let entity = node.model_slot_mut().and_then(|s| s.entity.as_mut());
            match entity {
                Some(e) => {
                    e.apply(attrs);
                    let full = e.attributes();
                    e.save(&full)
                }
                None => {
                    return self.misconfig("save on a model component with no entity loaded");
                }
            }
        };
        self.node_mut(id)?
            .pending
            .push(Pending::ModelSave { remote, callback });
        Ok(())
    }

    /// A snapshot of the current entity's attributes, empty when no entity
    /// is loaded.
    pub fn model_attributes(&self, id: ComponentId) -> Result<Attributes> {
        Ok(self
            .node(id)?
            .model_slot()
            .and_then(|s| s.entity.as_ref())
            .map(|e| e.attributes())
            .unwrap_or_default())
    }

    pub(crate) fn show_model(&mut self, id: ComponentId, opts: ShowOptions) -> Result<()> {
        if let Some(record) = opts.record {
            let (remote, entity) = self.begin_fetch(id, record)?;
            self.node_mut(id)?.pending.push(Pending::ModelLoad {
                remote,
                entity,
                then_show: Some(opts.silent),
                callback: None,
            });
            return Ok(());
        }
        if let Some(entity) = opts.entity {
            self.set_model(id, entity)?;
        }
        self.show_base(id, opts.silent)
    }

    pub(crate) fn complete_model_load(
        &mut self,
        id: ComponentId,
        remote: Remote<Attributes>,
        mut entity: Box<dyn Entity>,
        then_show: Option<bool>,
        callback: Option<Callback>,
    ) {
        let Some(outcome) = remote.take() else {
            return;
        };
        match outcome {
            Ok(attrs) => {
                entity.apply(&attrs);
                if let Err(err) = self.set_model(id, entity) {
                    warn!(%err, "adopting loaded entity failed");
                    return;
                }
                if let Err(err) = self.trigger(id, events::MODEL_LOADED, &[Value::Map(attrs)]) {
                    warn!(%err, "model loaded event failed");
                }
                if let Some(cb) = callback {
                    cb(self, id);
                }
                if let Some(silent) = then_show {
                    if let Err(err) = self.show_base(id, silent) {
                        warn!(%err, "deferred show after load failed");
                    }
                }
            }
            Err(err) => warn!(%err, "model load failed"),
        }
    }

    pub(crate) fn complete_model_refresh(
        &mut self,
        id: ComponentId,
        remote: Remote<Attributes>,
        callback: Option<Callback>,
    ) {
        let Some(outcome) = remote.take() else {
            return;
        };
        match outcome {
            Ok(attrs) => {
                if let Some(slot) = self
                    .nodes
                    .get_mut(id)
                    .and_then(|n| n.model_slot_mut())
                {
                    if let Some(entity) = slot.entity.as_mut() {
                        entity.apply(&attrs);
                    }
                }
                if let Err(err) = self.trigger(id, events::MODEL_LOADED, &[Value::Map(attrs)]) {
                    warn!(%err, "model loaded event failed");
                }
                if let Some(cb) = callback {
                    cb(self, id);
                }
            }
            Err(err) => warn!(%err, "model refresh failed"),
        }
    }

    pub(crate) fn complete_model_save(
        &mut self,
        id: ComponentId,
        remote: Remote<Attributes>,
        callback: Option<Callback>,
    ) {
        let Some(outcome) = remote.take() else {
            return;
        };
        match outcome {
            Ok(attrs) => {
                if let Some(slot) = self
                    .nodes
                    .get_mut(id)
                    .and_then(|n| n.model_slot_mut())
                {
                    if let Some(entity) = slot.entity.as_mut() {
                        entity.apply(&attrs);
                    }
                }
                if let Err(err) = self.trigger(id, events::SAVED, &[Value::Map(attrs)]) {
                    warn!(%err, "saved event failed");
                }
                if let Some(cb) = callback {
                    cb(self, id);
                }
            }
            Err(err) => {
                warn!(%err, "model save failed");
                let attrs = self
                    .nodes
                    .get(id)
                    .and_then(|n| n.model_slot())
                    .and_then(|s| s.entity.as_ref())
                    .map(|e| e.attributes())
                    .unwrap_or_default();
                let payload = [Value::Map(attrs), Value::from(err.to_string())];
                if let Err(err) = self.trigger(id, events::SAVE_FAILED, &payload) {
                    warn!(%err, "save failed event failed");
                }
            }
        }
    }

    /// Redraw a model component whose entity changed since the last sweep.
    pub(crate) fn poll_changes(&mut self, id: ComponentId) {
        let needs_render = {
            let Some(node) = self.nodes.get_mut(id) else {
                return;
            };
            let rendered = node.rendered;
            let has_surface = node.surface.is_some();
            let Some(slot) = node.model_slot_mut() else {
                return;
            };
            let Some(entity) = slot.entity.as_ref() else {
                return;
            };
            let current = entity.change_gen();
            if current == slot.seen_gen {
                return;
            }
            slot.seen_gen = current;
            has_surface && rendered
        };
        if needs_render {
            if let Err(err) = self.render(id) {
                warn!(%err, "re-render after entity change failed");
            }
        }
    }
}
