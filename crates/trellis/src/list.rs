//! List components: a collection component whose surface shows one row per
//! item and tracks a selection.

use crate::{
    config::ListSpec,
    error::Result,
    events,
    id::ComponentId,
    node::{CollectionSlot, DataSlot, ListState, SurfaceSlot},
    tree::Tree,
    value::Value,
};

impl Tree {
    /// Insert a list component.
    pub fn insert_list(&mut self, spec: ListSpec) -> ComponentId {
        let params = spec.default_params.clone();
        let data = DataSlot::Collection(CollectionSlot {
            collection: spec.collection,
            default_params: spec.default_params,
            params,
            loaded: false,
        });
        let mut node = Self::build_node(spec.component, data);
        node.surface = Some(SurfaceSlot::List(spec.surface));
        node.list = Some(ListState::default());
        self.nodes.insert(node)
    }

    /// Select the item at the given index and fire the item selected event
    /// with the item's attributes and index. Selecting out of range is
    /// tolerated with a warning.
    pub fn select_item(&mut self, id: ComponentId, index: usize) -> Result<()> {
        let attrs = {
            let node = self.node(id)?;
            if node.list.is_none() {
                return self.misconfig("select on a component without list state");
            }
            node.collection_slot().and_then(|s| s.collection.item(index))
        };
        let Some(attrs) = attrs else {
            return self.misconfig(format!("selection index {index} out of range"));
        };
        {
            let node = self.node_mut(id)?;
            let item_id = node
                .list
                .as_ref()
                .and_then(|l| l.item_ids.get(index).cloned())
                .or_else(|| attrs.get("id").cloned());
            if let Some(list) = node.list.as_mut() {
                list.selected = item_id;
            }
        }
        self.trigger(
            id,
            events::ITEM_SELECTED,
            &[Value::Map(attrs), Value::Int(index as i64)],
        )
    }

    /// Identifier of the selected item, if any.
    pub fn selected_item(&self, id: ComponentId) -> Result<Option<Value>> {
        Ok(self.node(id)?.list.as_ref().and_then(|l| l.selected.clone()))
    }

    /// Item identifiers in display order.
    pub fn list_items(&self, id: ComponentId) -> Result<Vec<Value>> {
        Ok(self
            .node(id)?
            .list
            .as_ref()
            .map(|l| l.item_ids.clone())
            .unwrap_or_default())
    }

    /// Reflect an item insertion on the list surface and bookkeeping.
    pub(crate) fn list_added(&mut self, id: ComponentId, index: usize) -> Result<()> {
        let node = self.node_mut(id)?;
        let DataSlot::Collection(slot) = &mut node.data else {
            return Ok(());
        };
        let Some(attrs) = slot.collection.item(index) else {
            return Ok(());
        };
        let item_id = attrs.get("id").cloned().unwrap_or(Value::Null);
        if let Some(list) = node.list.as_mut() {
            let at = index.min(list.item_ids.len());
            list.item_ids.insert(at, item_id);
        }
        if let Some(surface) = node.surface.as_mut().and_then(|s| s.as_list_mut()) {
            surface.insert_item(index, &attrs)?;
        }
        Ok(())
    }

    /// Reflect an item removal on the list surface and bookkeeping. A
    /// removed item that was selected clears the selection.
    pub(crate) fn list_removed(&mut self, id: ComponentId, index: usize) -> Result<()> {
        let node = self.node_mut(id)?;
        if let Some(list) = node.list.as_mut() {
            if index < list.item_ids.len() {
                let removed = list.item_ids.remove(index);
                if list.selected.as_ref() == Some(&removed) {
                    list.selected = None;
                }
            }
        }
        if let Some(surface) = node.surface.as_mut().and_then(|s| s.as_list_mut()) {
            surface.remove_item(index);
        }
        Ok(())
    }

    /// Rebuild the list surface from the backing collection after a fetch
    /// replaced its contents. The selection survives only if the selected
    /// item is still present.
    pub(crate) fn list_rebuild(&mut self, id: ComponentId) -> Result<()> {
        let node = self.node_mut(id)?;
        let DataSlot::Collection(slot) = &mut node.data else {
            return Ok(());
        };
        let Some(list) = node.list.as_mut() else {
            return Ok(());
        };
        let Some(surface) = node.surface.as_mut().and_then(|s| s.as_list_mut()) else {
            return Ok(());
        };
        surface.clear_items();
        list.item_ids.clear();
        for index in 0..slot.collection.len() {
            let Some(attrs) = slot.collection.item(index) else {
                continue;
            };
            let item_id = attrs.get("id").cloned().unwrap_or(Value::Null);
            list.item_ids.push(item_id);
            surface.insert_item(index, &attrs)?;
        }
        node.rendered = true;
        if let Some(selected) = list.selected.clone() {
            if !list.item_ids.contains(&selected) {
                list.selected = None;
            }
        }
        Ok(())
    }
}
