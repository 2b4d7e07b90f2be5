//! Collection components: a component bound to a fetchable set of records.
//!
//! Fetch parameters always start from the component's defaults: an explicit
//! parameter map is merged over the defaults, and a fetch without one resets
//! to the defaults alone. Show gates on the first successful fetch.

use tracing::warn;

use crate::{
    config::{CollectionSpec, ShowOptions},
    data::{Collection, CollectionEvent},
    error::Result,
    events,
    id::ComponentId,
    node::{CollectionSlot, DataSlot, Pending},
    remote::Remote,
    tree::{Callback, Tree},
    value::{merged, Params, Value},
};

impl Tree {
    /// Insert a collection component.
    pub fn insert_collection(&mut self, spec: CollectionSpec) -> ComponentId {
        let params = spec.default_params.clone();
        let data = DataSlot::Collection(CollectionSlot {
            collection: spec.collection,
            default_params: spec.default_params,
            params,
            loaded: false,
        });
        self.nodes.insert(Self::build_node(spec.component, data))
    }

    /// Begin fetching the collection. Explicit parameters are merged over
    /// the defaults; passing none resets to the defaults alone. The callback,
    /// if given, runs after a successful fetch.
    pub fn fetch_collection(
        &mut self,
        id: ComponentId,
        params: Option<Params>,
        callback: Option<Callback>,
    ) -> Result<()> {
        self.begin_collection_fetch(id, params, None, callback)
    }

    /// Re-fetch with the parameters of the most recent fetch.
    pub fn refresh_collection(&mut self, id: ComponentId, callback: Option<Callback>) -> Result<()> {
        let current = match self.node(id)?.collection_slot() {
            Some(slot) => slot.params.clone(),
            None => {
                return self.misconfig("refresh on a component without a collection binding");
            }
        };
        self.begin_collection_fetch(id, Some(current), None, callback)
    }

    /// Forget any parameter overrides, so the next refresh uses the
    /// defaults alone.
    pub fn clear_params(&mut self, id: ComponentId) -> Result<()> {
        match self.node_mut(id)?.collection_slot_mut() {
            Some(slot) => {
                slot.params = Params::new();
                Ok(())
            }
            None => self.misconfig("clear_params on a component without a collection binding"),
        }
    }

    /// Replace the collection behind a component wholesale. Queued change
    /// events from the old collection are dropped, and the surface is
    /// redrawn immediately if the component is visible.
    pub fn load_collection(
        &mut self,
        id: ComponentId,
        collection: Box<dyn Collection>,
    ) -> Result<()> {
        let visible = {
            let node = self.node_mut(id)?;
            let visible = node.visible;
            let Some(slot) = node.collection_slot_mut() else {
                return self.misconfig("load_collection on a component without a collection binding");
            };
            slot.collection = collection;
            slot.collection.poll_events();
            visible
        };
        if self.node(id)?.list.is_some() {
            self.list_rebuild(id)?;
        } else if visible {
            self.render(id)?;
        }
        Ok(())
    }

    /// Number of items in the backing collection.
    pub fn collection_len(&self, id: ComponentId) -> Result<usize> {
        Ok(self
            .node(id)?
            .collection_slot()
            .map(|s| s.collection.len())
            .unwrap_or(0))
    }

    /// The parameters used by the most recent fetch.
    pub fn collection_params(&self, id: ComponentId) -> Result<Params> {
        Ok(self
            .node(id)?
            .collection_slot()
            .map(|s| s.params.clone())
            .unwrap_or_default())
    }

    fn begin_collection_fetch(
        &mut self,
        id: ComponentId,
        params: Option<Params>,
        then_show: Option<bool>,
        callback: Option<Callback>,
    ) -> Result<()> {
        let remote = {
            let node = self.node_mut(id)?;
            let Some(slot) = node.collection_slot_mut() else {
                return self.misconfig("fetch on a component without a collection binding");
            };
            let effective = match params {
                Some(p) => merged(&slot.default_params, &p),
                None => slot.default_params.clone(),
            };
            slot.params = effective.clone();
            slot.collection.fetch(&effective)
        };
        self.node_mut(id)?.pending.push(Pending::CollectionFetch {
            remote,
            then_show,
            callback,
        });
        Ok(())
    }

    pub(crate) fn show_collection(&mut self, id: ComponentId, opts: ShowOptions) -> Result<()> {
        if let Some(params) = opts.params {
            return self.begin_collection_fetch(id, Some(params), Some(opts.silent), None);
        }
        let loaded = self
            .node(id)?
            .collection_slot()
            .is_some_and(|s| s.loaded);
        if !loaded {
            let current = self
                .node(id)?
                .collection_slot()
                .map(|s| s.params.clone())
                .unwrap_or_default();
            return self.begin_collection_fetch(id, Some(current), Some(opts.silent), None);
        }
        self.show_base(id, opts.silent)
    }

    pub(crate) fn complete_collection_fetch(
        &mut self,
        id: ComponentId,
        remote: Remote<()>,
        then_show: Option<bool>,
        callback: Option<Callback>,
    ) {
        let Some(outcome) = remote.take() else {
            return;
        };
        match outcome {
            Ok(()) => {
                let len = {
                    let Some(node) = self.nodes.get_mut(id) else {
                        return;
                    };
                    let Some(slot) = node.collection_slot_mut() else {
                        return;
                    };
                    slot.loaded = true;
                    slot.collection.len()
                };
                let count = Value::Int(len as i64);
                if let Err(err) = self.trigger(id, events::COLLECTION_LOADED, &[count]) {
                    warn!(%err, "collection loaded event failed");
                }
                if let Some(cb) = callback {
                    cb(self, id);
                }
                if let Some(silent) = then_show {
                    if let Err(err) = self.show_base(id, silent) {
                        warn!(%err, "deferred show after fetch failed");
                    }
                }
            }
            Err(err) => warn!(%err, "collection fetch failed"),
        }
    }

    /// Drain queued change events from the backing collection and reflect
    /// them on the surface.
    pub(crate) fn poll_collection_events(&mut self, id: ComponentId) {
        let drained = {
            let Some(node) = self.nodes.get_mut(id) else {
                return;
            };
            let Some(slot) = node.collection_slot_mut() else {
                return;
            };
            slot.collection.poll_events()
        };
        if drained.is_empty() {
            return;
        }
        let is_list = self.nodes.get(id).is_some_and(|n| n.list.is_some());
        if is_list {
            for event in drained {
                let res = match event {
                    CollectionEvent::Added { index } => self.list_added(id, index),
                    CollectionEvent::Removed { index } => self.list_removed(id, index),
                    CollectionEvent::Loaded => self.list_rebuild(id),
                };
                if let Err(err) = res {
                    warn!(%err, "applying collection event to list failed");
                }
            }
        } else {
            let rendered = self.nodes.get(id).is_some_and(|n| n.rendered);
            if rendered {
                if let Err(err) = self.render(id) {
                    warn!(%err, "re-render after collection change failed");
                }
            }
        }
    }
}
