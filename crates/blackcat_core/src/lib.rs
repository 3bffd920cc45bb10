//! The resolution-and-construction engine behind blackcat.
//!
//! `blackcat_core` provides the primitives of the container:
//!
//! - [`component`] - Component identity and the [`Component`](component::Component) builder
//! - [`registry`] - Thread-safe storage and type/name matching of descriptors
//! - [`injector`] - Recursive resolution, injection and post-construction hooks
//! - [`lifecycle`] - Transient, singleton and thread-scoped policies
//! - [`module`] - Grouped registrations
//! - [`error`] - The [`InjectError`](error::InjectError) type
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use blackcat_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Body;
//!
//! #[derive(Default)]
//! struct Bass {
//!     body: Option<Arc<Body>>,
//! }
//!
//! let injector = Injector::new();
//! injector
//!     .register(Component::new(Body::default))?
//!     .register(
//!         Component::new(Bass::default)
//!             .inject::<Body, _>("body", |bass, body| bass.body = Some(body)),
//!     )?;
//!
//! let bass = injector.resolve::<Bass>()?;
//! assert!(bass.body.is_some());
//! # Ok::<(), InjectError>(())
//! ```

/// Component identity, descriptors and the registration builder.
pub mod component;

/// Error types for registration and resolution.
pub mod error;

/// The injector: resolution entry point.
pub mod injector;

/// Lifecycle policies and their per-descriptor state.
pub mod lifecycle;

/// Modules for grouping registrations.
pub mod module;

/// Component storage and lookup.
pub mod registry;

mod validate;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::component::*;
    pub use crate::error::*;
    pub use crate::injector::*;
    pub use crate::lifecycle::{Lifecycle, LifecycleState};
    pub use crate::module::*;
    pub use crate::registry::*;
}
