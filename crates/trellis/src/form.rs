//! Form components: a model component whose surface carries editable fields
//! submitted back to the entity.

use crate::{
    config::FormSpec,
    error::Result,
    id::ComponentId,
    node::{DataSlot, ModelSlot, SurfaceSlot},
    tree::{Callback, Tree},
};

impl Tree {
    /// Insert a form component. A blank entity is created up front so the
    /// form can be submitted without loading a record first.
    pub fn insert_form(&mut self, spec: FormSpec) -> ComponentId {
        let entity = spec.source.create();
        let seen = entity.change_gen();
        let data = DataSlot::Model(ModelSlot {
            source: spec.source,
            entity: Some(entity),
            seen_gen: seen,
        });
        let mut node = Self::build_node(spec.component, data);
        node.surface = Some(SurfaceSlot::Form(spec.surface));
        self.nodes.insert(node)
    }

    /// Collect the form's field values, apply them to the entity, and begin
    /// persisting it. Completion fires the saved or save failed event.
    pub fn submit_form(&mut self, id: ComponentId, callback: Option<Callback>) -> Result<()> {
        let values = {
            let node = self.node_mut(id)?;
            match node.surface.as_mut().and_then(|s| s.as_form_mut()) {
                Some(surface) => surface.field_values(),
                None => {
                    return self.misconfig("submit on a component without a form surface");
                }
            }
        };
        self.save_model(id, &values, callback)
    }

    /// Discard the current entity and start over with a blank one. The
    /// surface is redrawn if the component is visible.
    pub fn clear_form(&mut self, id: ComponentId) -> Result<()> {
        let entity = {
            let node = self.node(id)?;
            match node.model_slot() {
                Some(slot) => slot.source.create(),
                None => {
                    return self.misconfig("clear on a component without a model binding");
                }
            }
        };
        self.set_model(id, entity)
    }
}
