//! Test doubles for surfaces, entities and collections. These record every
//! interaction and hand out resolvers so tests can settle remote operations
//! deterministically.

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
};

use crate::{
    data::{Collection, CollectionEvent, Entity, EntitySource},
    error::{Error, Result},
    remote::{Remote, RemoteError, Resolver},
    surface::{FormSurface, ListSurface, Surface},
    value::{Attributes, Params, Value},
};

/// Install a log subscriber writing to the test output, so a failing test
/// can be rerun with tracing visible. Safe to call more than once.
#[cfg(feature = "testing")]
pub fn log_init() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Build an attribute map from key/value pairs.
pub fn attrs(pairs: &[(&str, Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[derive(Default)]
struct SurfaceState {
    calls: Vec<String>,
    data: Attributes,
    visible: bool,
    removed: bool,
    render_fails: bool,
    items: Vec<Attributes>,
    fields: Attributes,
}

/// A surface that records every call and the data it was last rendered
/// with. Cloning shares the underlying state, so tests keep a clone for
/// inspection while the tree owns the original.
#[derive(Clone, Default)]
pub struct TestSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl TestSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent render fail.
    pub fn fail_renders(&self) {
        self.state.borrow_mut().render_fails = true;
    }

    /// The calls recorded so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// The data passed to the most recent render.
    pub fn data(&self) -> Attributes {
        self.state.borrow().data.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn is_removed(&self) -> bool {
        self.state.borrow().removed
    }

    /// The rows inserted so far, in display order. Only meaningful when the
    /// surface is driven as a list.
    pub fn items(&self) -> Vec<Attributes> {
        self.state.borrow().items.clone()
    }

    /// Set an input field value. Only meaningful when the surface is driven
    /// as a form.
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.state
            .borrow_mut()
            .fields
            .insert(name.into(), value.into());
    }
}

impl Surface for TestSurface {
    fn render(&mut self, data: &Attributes) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.render_fails {
            return Err(Error::Surface("render failed".into()));
        }
        state.calls.push("render".into());
        state.data = data.clone();
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push("show".into());
        state.visible = true;
        Ok(())
    }

    fn hide(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls.push("hide".into());
        state.visible = false;
    }

    fn remove(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls.push("remove".into());
        state.removed = true;
    }
}

impl ListSurface for TestSurface {
    fn insert_item(&mut self, index: usize, attrs: &Attributes) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("insert_item:{index}"));
        let at = index.min(state.items.len());
        state.items.insert(at, attrs.clone());
        Ok(())
    }

    fn remove_item(&mut self, index: usize) {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("remove_item:{index}"));
        if index < state.items.len() {
            state.items.remove(index);
        }
    }

    fn clear_items(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls.push("clear_items".into());
        state.items.clear();
    }

    fn item_count(&self) -> usize {
        self.state.borrow().items.len()
    }
}

impl FormSurface for TestSurface {
    fn field_values(&self) -> Attributes {
        self.state.borrow().fields.clone()
    }
}

struct EntityState {
    attrs: Attributes,
    change_gen: u64,
    auto: Option<Attributes>,
    fetch_resolvers: VecDeque<Resolver<Attributes>>,
    save_resolvers: VecDeque<Resolver<Attributes>>,
    fetch_count: usize,
    save_count: usize,
}

/// An entity backed by shared state. In manual mode every fetch and save
/// stays pending until a test settles it through a resolver; in auto mode
/// fetches resolve immediately with a fixed attribute map and saves echo
/// what was saved.
#[derive(Clone)]
pub struct TestEntity {
    state: Rc<RefCell<EntityState>>,
}

impl Default for TestEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEntity {
    /// A manual-mode entity with no attributes.
    pub fn new() -> Self {
        Self::with_attrs(Attributes::new())
    }

    /// A manual-mode entity with initial attributes.
    pub fn with_attrs(attrs: Attributes) -> Self {
        Self {
            state: Rc::new(RefCell::new(EntityState {
                attrs,
                change_gen: 0,
                auto: None,
                fetch_resolvers: VecDeque::new(),
                save_resolvers: VecDeque::new(),
                fetch_count: 0,
                save_count: 0,
            })),
        }
    }

    /// An auto-mode entity whose fetches resolve immediately with the given
    /// attributes.
    pub fn auto(remote_attrs: Attributes) -> Self {
        let e = Self::new();
        e.state.borrow_mut().auto = Some(remote_attrs);
        e
    }

    /// Mutate an attribute directly, bumping the change generation.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        let mut state = self.state.borrow_mut();
        state.attrs.insert(name.into(), value.into());
        state.change_gen += 1;
    }

    pub fn fetch_count(&self) -> usize {
        self.state.borrow().fetch_count
    }

    pub fn save_count(&self) -> usize {
        self.state.borrow().save_count
    }

    /// Settle the oldest pending fetch with the given attributes.
    pub fn resolve_fetch(&self, attrs: Attributes) {
        if let Some(r) = self.state.borrow_mut().fetch_resolvers.pop_front() {
            r.resolve(attrs);
        }
    }

    /// Fail the oldest pending fetch.
    pub fn fail_fetch(&self, msg: &str) {
        if let Some(r) = self.state.borrow_mut().fetch_resolvers.pop_front() {
            r.fail(RemoteError::new(msg));
        }
    }

    /// Settle the oldest pending save with the given attributes.
    pub fn resolve_save(&self, attrs: Attributes) {
        if let Some(r) = self.state.borrow_mut().save_resolvers.pop_front() {
            r.resolve(attrs);
        }
    }

    /// Fail the oldest pending save.
    pub fn fail_save(&self, msg: &str) {
        if let Some(r) = self.state.borrow_mut().save_resolvers.pop_front() {
            r.fail(RemoteError::new(msg));
        }
    }
}

impl Entity for TestEntity {
    fn id(&self) -> Option<Value> {
        self.state.borrow().attrs.get("id").cloned()
    }

    fn set_id(&mut self, id: Value) {
        let mut state = self.state.borrow_mut();
        state.attrs.insert("id".into(), id);
        state.change_gen += 1;
    }

    fn apply(&mut self, attrs: &Attributes) {
        let mut state = self.state.borrow_mut();
        for (k, v) in attrs {
            state.attrs.insert(k.clone(), v.clone());
        }
        state.change_gen += 1;
    }

    fn attributes(&self) -> Attributes {
        self.state.borrow().attrs.clone()
    }

    fn fetch(&mut self) -> Remote<Attributes> {
        let mut state = self.state.borrow_mut();
        state.fetch_count += 1;
        if let Some(auto) = state.auto.clone() {
            return Remote::ready(auto);
        }
        let (remote, resolver) = Remote::pending();
        state.fetch_resolvers.push_back(resolver);
        remote
    }

    fn save(&mut self, attrs: &Attributes) -> Remote<Attributes> {
        let mut state = self.state.borrow_mut();
        state.save_count += 1;
        if state.auto.is_some() {
            return Remote::ready(attrs.clone());
        }
        let (remote, resolver) = Remote::pending();
        state.save_resolvers.push_back(resolver);
        remote
    }

    fn change_gen(&self) -> u64 {
        self.state.borrow().change_gen
    }
}

struct SourceState {
    auto: Option<Attributes>,
    created: Vec<TestEntity>,
}

/// An entity source that records every entity it creates, so tests can
/// drive the entity the tree is holding.
#[derive(Clone)]
pub struct TestSource {
    state: Rc<RefCell<SourceState>>,
}

impl Default for TestSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSource {
    /// A source producing manual-mode entities.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SourceState {
                auto: None,
                created: Vec::new(),
            })),
        }
    }

    /// A source producing auto-mode entities that fetch the given
    /// attributes.
    pub fn auto(remote_attrs: Attributes) -> Self {
        let s = Self::new();
        s.state.borrow_mut().auto = Some(remote_attrs);
        s
    }

    /// Every entity created so far, oldest first.
    pub fn created(&self) -> Vec<TestEntity> {
        self.state.borrow().created.clone()
    }

    /// The most recently created entity.
    pub fn last_created(&self) -> Option<TestEntity> {
        self.state.borrow().created.last().cloned()
    }
}

impl EntitySource for TestSource {
    fn create(&self) -> Box<dyn Entity> {
        let mut state = self.state.borrow_mut();
        let entity = match state.auto.clone() {
            Some(auto) => TestEntity::auto(auto),
            None => TestEntity::new(),
        };
        state.created.push(entity.clone());
        Box::new(entity)
    }
}

struct CollectionState {
    items: Vec<Attributes>,
    events: Vec<CollectionEvent>,
    fetch_resolvers: VecDeque<Resolver<()>>,
    fetches: Vec<Params>,
    auto: Option<Vec<Attributes>>,
}

/// A collection backed by shared state, with manual and auto fetch modes
/// mirroring [`TestEntity`].
#[derive(Clone)]
pub struct TestCollection {
    state: Rc<RefCell<CollectionState>>,
}

impl Default for TestCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCollection {
    /// A manual-mode empty collection.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(CollectionState {
                items: Vec::new(),
                events: Vec::new(),
                fetch_resolvers: VecDeque::new(),
                fetches: Vec::new(),
                auto: None,
            })),
        }
    }

    /// An auto-mode collection whose fetches resolve immediately with the
    /// given items.
    pub fn auto(items: Vec<Attributes>) -> Self {
        let c = Self::new();
        c.state.borrow_mut().auto = Some(items);
        c
    }

    /// Append an item, queueing an added event.
    pub fn push_item(&self, attrs: Attributes) {
        let mut state = self.state.borrow_mut();
        state.items.push(attrs);
        let index = state.items.len() - 1;
        state.events.push(CollectionEvent::Added { index });
    }

    /// Remove an item, queueing a removed event.
    pub fn take_item(&self, index: usize) {
        let mut state = self.state.borrow_mut();
        if index < state.items.len() {
            state.items.remove(index);
            state.events.push(CollectionEvent::Removed { index });
        }
    }

    /// Settle the oldest pending fetch, replacing the items and queueing a
    /// loaded event.
    pub fn resolve_fetch(&self, items: Vec<Attributes>) {
        let resolver = self.state.borrow_mut().fetch_resolvers.pop_front();
        if let Some(r) = resolver {
            let mut state = self.state.borrow_mut();
            state.items = items;
            state.events.push(CollectionEvent::Loaded);
            drop(state);
            r.resolve(());
        }
    }

    /// Fail the oldest pending fetch.
    pub fn fail_fetch(&self, msg: &str) {
        if let Some(r) = self.state.borrow_mut().fetch_resolvers.pop_front() {
            r.fail(RemoteError::new(msg));
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.state.borrow().fetches.len()
    }

    /// The parameters of the most recent fetch.
    pub fn last_params(&self) -> Option<Params> {
        self.state.borrow().fetches.last().cloned()
    }
}

impl Collection for TestCollection {
    fn fetch(&mut self, params: &Params) -> Remote<()> {
        let mut state = self.state.borrow_mut();
        state.fetches.push(params.clone());
        if let Some(items) = state.auto.clone() {
            state.items = items;
            state.events.push(CollectionEvent::Loaded);
            return Remote::ready(());
        }
        let (remote, resolver) = Remote::pending();
        state.fetch_resolvers.push_back(resolver);
        remote
    }

    fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    fn item(&self, index: usize) -> Option<Attributes> {
        self.state.borrow().items.get(index).cloned()
    }

    fn poll_events(&mut self) -> Vec<CollectionEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}
