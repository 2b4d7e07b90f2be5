//! Class definitions with chained construction and explicit inherited
//! dispatch.
//!
//! A [`Class`] is an immutable behavior table: named methods, default
//! properties, and optional construct/destruct hooks, with an optional parent
//! class. [`Class::create`] builds an [`Instance`], running every construct
//! hook in the chain from the root class down to the most derived one.
//! Dropping an instance via [`Instance::destruct`] runs destruct hooks in the
//! reverse order. Method calls resolve from the most derived class upward,
//! and a method body may call [`Call::inherited`] to invoke the next
//! definition above its own class in the chain.

use std::{collections::HashMap, rc::Rc};

use tracing::warn;

use crate::value::{Attributes, Value};

/// Shared handle to an immutable class definition.
pub type ClassRef = Rc<Class>;

type Method = Rc<dyn Fn(&mut Call<'_>, &[Value]) -> Value>;
type Hook = Rc<dyn Fn(&mut Instance, &Attributes)>;
type DestructHook = Rc<dyn Fn(&mut Instance)>;

#[derive(Clone)]
enum IdentitySpec {
    Fixed(String),
    Computed(Rc<dyn Fn() -> String>),
}

impl IdentitySpec {
    fn resolve(&self) -> String {
        match self {
            IdentitySpec::Fixed(s) => s.clone(),
            IdentitySpec::Computed(f) => f(),
        }
    }
}

/// Builder for a class definition.
pub struct Descriptor {
    identity: Option<IdentitySpec>,
    parent: Option<ClassRef>,
    construct: Option<Hook>,
    destruct: Option<DestructHook>,
    methods: HashMap<String, Method>,
    props: Attributes,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor {
    /// Start an empty class descriptor.
    pub fn new() -> Self {
        Self {
            identity: None,
            parent: None,
            construct: None,
            destruct: None,
            methods: HashMap::new(),
            props: Attributes::new(),
        }
    }

    /// Set the identity string reported by instances of this class.
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(IdentitySpec::Fixed(identity.into()));
        self
    }

    /// Compute the identity on demand instead of fixing it.
    pub fn identity_with(mut self, func: impl Fn() -> String + 'static) -> Self {
        self.identity = Some(IdentitySpec::Computed(Rc::new(func)));
        self
    }

    /// Derive from a parent class.
    pub fn extend(mut self, parent: &ClassRef) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Derive from an optional parent class. A missing parent is tolerated
    /// with a warning, producing a root class.
    pub fn extend_from(mut self, parent: Option<&ClassRef>) -> Self {
        match parent {
            Some(p) => self.parent = Some(p.clone()),
            None => warn!("extending from a missing parent class"),
        }
        self
    }

    /// Set the construct hook, run when an instance is created.
    pub fn construct(mut self, hook: impl Fn(&mut Instance, &Attributes) + 'static) -> Self {
        self.construct = Some(Rc::new(hook));
        self
    }

    /// Set the destruct hook, run when an instance is destructed.
    pub fn destruct(mut self, hook: impl Fn(&mut Instance) + 'static) -> Self {
        self.destruct = Some(Rc::new(hook));
        self
    }

    /// Define a named method.
    pub fn method(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&mut Call<'_>, &[Value]) -> Value + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(func));
        self
    }

    /// Set a default property value.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }
}

/// An immutable class definition.
pub struct Class {
    identity: Option<IdentitySpec>,
    parent: Option<ClassRef>,
    construct: Option<Hook>,
    destruct: Option<DestructHook>,
    methods: HashMap<String, Method>,
    props: Attributes,
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("identity", &self.identity.as_ref().map(IdentitySpec::resolve))
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Class {
    /// Seal a descriptor into a class definition.
    pub fn define(desc: Descriptor) -> ClassRef {
        Rc::new(Class {
            identity: desc.identity,
            parent: desc.parent,
            construct: desc.construct,
            destruct: desc.destruct,
            methods: desc.methods,
            props: desc.props,
        })
    }

    /// The parent class, if this class derives from one.
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    /// The classes in the chain, ordered root first.
    fn lineage(self: &ClassRef) -> Vec<ClassRef> {
        let mut chain = Vec::new();
        let mut cur = Some(self.clone());
        while let Some(c) = cur {
            cur = c.parent.clone();
            chain.push(c);
        }
        chain.reverse();
        chain
    }

    /// Look up a property default, walking from this class toward the root.
    fn find_prop(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.props.get(name) {
            return Some(v);
        }
        self.parent.as_ref().and_then(|p| p.find_prop(name))
    }

    /// Find the class at or above this one that defines the named method.
    fn find_defining(self: &ClassRef, method: &str) -> Option<ClassRef> {
        let mut cur = Some(self.clone());
        while let Some(c) = cur {
            if c.methods.contains_key(method) {
                return Some(c);
            }
            cur = c.parent.clone();
        }
        None
    }

    /// Create an instance, running construct hooks from the root class down.
    pub fn create(self: &ClassRef, config: impl Into<Option<Attributes>>) -> Instance {
        let config = config.into().unwrap_or_default();
        let mut instance = Instance {
            class: self.clone(),
            props: config.clone(),
            identity_override: None,
        };
        for class in self.lineage() {
            if let Some(hook) = class.construct.clone() {
                hook(&mut instance, &config);
            }
        }
        instance
    }
}

/// A live instance of a class.
pub struct Instance {
    class: ClassRef,
    props: Attributes,
    identity_override: Option<String>,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("identity", &self.identity())
            .finish()
    }
}

impl Instance {
    /// The class this instance was created from.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Read a property, falling back to class defaults up the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.props.get(name) {
            return Some(v.clone());
        }
        self.class.find_prop(name).cloned()
    }

    /// Set an instance property, shadowing any class default.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.props.insert(name.into(), value.into());
    }

    /// The instance identity: an explicit override if set, otherwise the
    /// nearest class identity up the chain, otherwise "instance".
    pub fn identity(&self) -> String {
        if let Some(identity) = &self.identity_override {
            return identity.clone();
        }
        let mut cur = Some(&self.class);
        while let Some(c) = cur {
            if let Some(identity) = &c.identity {
                return identity.resolve();
            }
            cur = c.parent.as_ref();
        }
        "instance".to_string()
    }

    /// Override the identity for this instance alone.
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.identity_override = Some(identity.into());
    }

    /// Invoke a named method, resolving from the most derived class upward.
    /// An undefined method warns and yields [`Value::Null`].
    pub fn call(&mut self, method: &str, args: &[Value]) -> Value {
        let Some(defined_in) = self.class.clone().find_defining(method) else {
            warn!(method, identity = %self.identity(), "undefined method");
            return Value::Null;
        };
        let func = defined_in.methods[method].clone();
        let mut call = Call {
            instance: self,
            method,
            defined_in,
        };
        func(&mut call, args)
    }

    /// Destroy the instance, running destruct hooks from the most derived
    /// class up to the root.
    pub fn destruct(mut self) {
        let mut lineage = self.class.clone().lineage();
        lineage.reverse();
        for class in lineage {
            if let Some(hook) = class.destruct.clone() {
                hook(&mut self);
            }
        }
    }
}

/// Scope passed to a method body during a call. Tracks which class in the
/// chain defined the executing body so that [`Call::inherited`] can resolve
/// the next definition above it.
pub struct Call<'a> {
    instance: &'a mut Instance,
    method: &'a str,
    defined_in: ClassRef,
}

impl<'a> Call<'a> {
    /// The instance the method was invoked on.
    pub fn instance(&mut self) -> &mut Instance {
        self.instance
    }

    /// The name of the executing method.
    pub fn method(&self) -> &str {
        self.method
    }

    /// Invoke the nearest definition of this method above the class that
    /// defined the executing body. Warns and yields [`Value::Null`] if no
    /// ancestor defines it.
    pub fn inherited(&mut self, args: &[Value]) -> Value {
        let above = self
            .defined_in
            .parent()
            .and_then(|p| p.find_defining(self.method));
        let Some(defined_in) = above else {
            warn!(method = self.method, "no inherited method definition");
            return Value::Null;
        };
        let func = defined_in.methods[self.method].clone();
        let mut call = Call {
            instance: &mut *self.instance,
            method: self.method,
            defined_in,
        };
        func(&mut call, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_runs_root_first() {
        let base = Class::define(Descriptor::new().identity("base").construct(|i, _| {
            i.set("order", "base");
        }));
        let derived = Class::define(Descriptor::new().extend(&base).construct(|i, _| {
            let prev = i.get("order").and_then(|v| v.as_str().map(String::from));
            i.set("order", format!("{},derived", prev.unwrap_or_default()));
        }));
        let inst = derived.create(None);
        assert_eq!(inst.get("order"), Some(Value::from("base,derived")));
        assert_eq!(inst.identity(), "base");
    }

    #[test]
    fn inherited_dispatch() {
        let base = Class::define(
            Descriptor::new()
                .identity("base")
                .method("greet", |_, _| Value::from("base")),
        );
        let derived = Class::define(Descriptor::new().extend(&base).method("greet", |call, args| {
            let above = call.inherited(args);
            Value::from(format!("{}+derived", above.as_str().unwrap_or("")))
        }));
        let mut inst = derived.create(None);
        assert_eq!(inst.call("greet", &[]), Value::from("base+derived"));
    }

    #[test]
    fn inherited_skips_classes_without_a_definition() {
        let root = Class::define(
            Descriptor::new().method("greet", |_, _| Value::from("root")),
        );
        // The middle class defines no greet at all.
        let middle = Class::define(Descriptor::new().extend(&root).prop("depth", 2i64));
        let leaf = Class::define(Descriptor::new().extend(&middle).method(
            "greet",
            |call, args| {
                let above = call.inherited(args);
                Value::from(format!("{}+leaf", above.as_str().unwrap_or("")))
            },
        ));
        let mut inst = leaf.create(None);
        assert_eq!(inst.call("greet", &[]), Value::from("root+leaf"));
    }

    #[test]
    fn computed_identity() {
        let counter = std::rc::Rc::new(std::cell::Cell::new(0));
        let c = counter.clone();
        let base = Class::define(Descriptor::new().identity_with(move || {
            c.set(c.get() + 1);
            format!("gen{}", c.get())
        }));
        let inst = base.create(None);
        assert_eq!(inst.identity(), "gen1");
        assert_eq!(inst.identity(), "gen2");
    }

    #[test]
    fn missing_method_yields_null() {
        let base = Class::define(Descriptor::new());
        let mut inst = base.create(None);
        assert_eq!(inst.call("nope", &[]), Value::Null);
    }

    #[test]
    fn inherited_past_root_yields_null() {
        let base = Class::define(
            Descriptor::new().method("m", |call, args| call.inherited(args)),
        );
        let mut inst = base.create(None);
        assert_eq!(inst.call("m", &[]), Value::Null);
    }

    #[test]
    fn props_fall_back_to_class_defaults() {
        let base = Class::define(Descriptor::new().prop("color", "red"));
        let derived = Class::define(Descriptor::new().extend(&base).prop("size", 3i64));
        let mut inst = derived.create(Attributes::from([(
            "size".to_string(),
            Value::Int(9),
        )]));
        assert_eq!(inst.get("color"), Some(Value::from("red")));
        assert_eq!(inst.get("size"), Some(Value::Int(9)));
        inst.set("color", "blue");
        assert_eq!(inst.get("color"), Some(Value::from("blue")));
    }

    #[test]
    fn destruct_runs_leaf_first() {
        use std::{cell::RefCell, rc::Rc};
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let l1 = log.clone();
        let base = Class::define(Descriptor::new().destruct(move |_| l1.borrow_mut().push("base")));
        let l2 = log.clone();
        let derived = Class::define(
            Descriptor::new()
                .extend(&base)
                .destruct(move |_| l2.borrow_mut().push("derived")),
        );
        derived.create(None).destruct();
        assert_eq!(*log.borrow(), vec!["derived", "base"]);
    }
}
