use slotmap::new_key_type;

new_key_type! {
    /// Opaque identifier for a component stored in the Tree arena.
    pub struct ComponentId;
}
