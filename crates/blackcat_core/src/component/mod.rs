//! Component identity, descriptors and registration.
//!
//! - [`ComponentId`] - Stable type identifier (works for trait objects)
//! - [`ComponentKey`] - Registration identity: type plus optional name
//! - [`Component`] - Typed builder describing how to construct and wire a component
//! - [`ComponentDescriptor`] - The type-erased record stored in the registry
//! - [`DependencyDescriptor`] - One injection point on a component
//!
//! # Interfaces
//!
//! There is no runtime subtype introspection. A registration declares the
//! interfaces it satisfies with [`Component::provides`], and lookups for
//! those interfaces match it by ancestor-type fallback.

mod builder;
mod descriptor;
mod id;

pub use builder::Component;
pub use descriptor::{ComponentDescriptor, DependencyDescriptor, Instance};
pub use id::{ComponentId, ComponentKey};
