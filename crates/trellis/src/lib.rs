//! Trellis is a component composition and lifecycle library. Components
//! live in an arena-backed [`Tree`], are registered under their parents by
//! name, and communicate through named events with explicit bubbling.
//! Model, collection, list and form components bind data to display
//! surfaces, with remote loads and saves completed by [`Tree::poll`].

mod class;
mod collection;
mod config;
mod data;
mod emitter;
mod error;
pub mod events;
mod form;
mod id;
mod ident;
mod list;
mod model;
mod node;
mod remote;
mod surface;
mod tree;
mod value;

pub use class::{Call, Class, ClassRef, Descriptor, Instance};
pub use config::{
    CollectionSpec, ComponentSpec, Config, FormSpec, HideOptions, ListSpec, ModelSpec,
    ShowOptions,
};
pub use data::{Collection, CollectionEvent, Entity, EntitySource};
pub use emitter::{Emitter, HandlerId};
pub use error::{Error, Result};
pub use id::ComponentId;
pub use ident::ComponentName;
pub use model::LoadTarget;
pub use node::Node;
pub use remote::{Remote, RemoteError, Resolver};
pub use surface::{FormSurface, ListSurface, Surface};
pub use tree::{Callback, Tree};
pub use value::{merged, Attributes, Params, Value};

#[cfg(any(test, feature = "testing"))]
pub mod tutils;
