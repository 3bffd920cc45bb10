//! Modules group related registrations.
//!
//! A [`Module`] is a static registration list: it knows which components
//! exist, how to build them and what they depend on. Installing a module
//! hands that list to an [`Injector`].
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
//! struct Guitar {
//!     body: Option<Arc<Body>>,
//! }
//!
//! struct WoodshopModule;
//!
//! impl Module for WoodshopModule {
//!     fn register(&self, injector: &Injector) -> Result<(), InjectError> {
//!         injector.register(Component::new(Body::default))?;
//!         Ok(())
//!     }
//! }
//!
//! struct GuitarModule;
//!
//! impl Module for GuitarModule {
//!     fn register(&self, injector: &Injector) -> Result<(), InjectError> {
//!         injector.register(
//!             Component::new(Guitar::default)
//!                 .inject::<Body, _>("body", |guitar, body| guitar.body = Some(body)),
//!         )?;
//!         Ok(())
//!     }
//! }
//!
//! let injector = Injector::new();
//! injector.install((WoodshopModule, GuitarModule))?;
//! assert!(injector.resolve::<Guitar>()?.body.is_some());
//! # Ok::<(), InjectError>(())
//! ```

use crate::error::InjectError;
use crate::injector::Injector;
use variadics_please::all_tuples;

/// A group of component registrations.
pub trait Module: Send + Sync + 'static {
    /// Registers this module's components.
    ///
    /// Fails on the first duplicate registration.
    fn register(&self, injector: &Injector) -> Result<(), InjectError>;

    /// Returns the module's name for logs.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

/// Types that can be installed into an injector as modules.
///
/// Implemented for single modules and tuples of modules. Users typically
/// don't implement this trait directly.
pub trait Modules {
    /// Registers these modules' components, in order.
    fn install_into(self, injector: &Injector) -> Result<(), InjectError>;
}

/// Single modules implement `Modules` directly.
impl<M: Module> Modules for M {
    fn install_into(self, injector: &Injector) -> Result<(), InjectError> {
        tracing::debug!(module = self.name(), "installing module");
        self.register(injector)
    }
}

/// Macro to implement `Modules` for tuples of modules.
macro_rules! impl_modules_for_tuple {
    ($($M:ident),*) => {
        impl<$($M: Module),*> Modules for ($($M,)*) {
            #[expect(non_snake_case, reason = "bindings reuse the tuple's type parameter names")]
            fn install_into(self, injector: &Injector) -> Result<(), InjectError> {
                let ($($M,)*) = self;
                $($M.install_into(injector)?;)*
                Ok(())
            }
        }
    };
}

// Generate implementations for tuples from 2 to 8 elements
all_tuples!(impl_modules_for_tuple, 2, 8, M);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentKey};

    struct Strings;
    struct Pick;

    struct StringsModule;
    impl Module for StringsModule {
        fn register(&self, injector: &Injector) -> Result<(), InjectError> {
            injector.register(Component::new(|| Strings))?;
            Ok(())
        }
    }

    struct PickModule;
    impl Module for PickModule {
        fn register(&self, injector: &Injector) -> Result<(), InjectError> {
            injector.register(Component::new(|| Pick))?;
            Ok(())
        }

        fn name(&self) -> &str {
            "picks"
        }
    }

    #[test]
    fn install_single_module() {
        let injector = Injector::new();
        injector.install(StringsModule).unwrap();
        assert!(
            injector
                .registry()
                .contains(&ComponentKey::of::<Strings>(None))
        );
    }

    #[test]
    fn install_tuple_in_order() {
        let injector = Injector::new();
        injector.install((StringsModule, PickModule)).unwrap();
        assert_eq!(injector.registry().len(), 2);
    }

    #[test]
    fn install_stops_at_first_duplicate() {
        let injector = Injector::new();
        let err = injector
            .install((StringsModule, StringsModule, PickModule))
            .unwrap_err();
        assert!(matches!(err, InjectError::DuplicateComponent(_)));
        assert!(
            !injector
                .registry()
                .contains(&ComponentKey::of::<Pick>(None))
        );
    }

    #[test]
    fn module_name_defaults_to_type_name() {
        assert!(StringsModule.name().ends_with("StringsModule"));
        assert_eq!(PickModule.name(), "picks");
    }
}
