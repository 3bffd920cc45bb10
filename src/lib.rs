//! A small dependency-injection container.
//!
//! Components are registered under a type and an optional name, declare
//! the dependencies they need, and are built on demand by an
//! [`Injector`](blackcat_core::injector::Injector) as transient,
//! singleton or thread-scoped instances.

pub use blackcat_core::*;

/// Log subscriber setup, installable as a module.
#[cfg(feature = "tracing")]
pub use blackcat_tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use blackcat_core::prelude::*;

    #[cfg(feature = "tracing")]
    pub use blackcat_tracing::{TracingConfig, TracingFormat, TracingModule};
}
