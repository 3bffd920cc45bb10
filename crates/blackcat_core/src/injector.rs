//! The injector: registration and resolution entry point.
//!
//! [`Injector::resolve`] looks up a descriptor, applies its lifecycle
//! policy, and constructs new instances:
//!
//! 1. **Factory** - invoke the component factory
//! 2. **Injection** - resolve each declared dependency (a full, recursive
//!    resolution honouring the dependency's own lifecycle) and assign it,
//!    in declaration order
//! 3. **Post-construction** - invoke the hook, if any
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
//! #[derive(Default)]
//! struct Band {
//!     bass: Option<Arc<Bass>>,
//!     ready: bool,
//! }
//!
//! let injector = Injector::new();
//! injector
//!     .register(Component::new(Body::default).singleton())?
//!     .register(Component::new(Bass::default).inject::<Body, _>("body", |bass, body| {
//!         bass.body = Some(body);
//!     }))?
//!     .register(
//!         Component::new(Band::default)
//!             .inject::<Bass, _>("bass", |band, bass| band.bass = Some(bass))
//!             .post_construct(|band| band.ready = band.bass.is_some()),
//!     )?;
//!
//! let band = injector.resolve::<Band>()?;
//! assert!(band.ready);
//! assert!(band.bass.as_ref().and_then(|bass| bass.body.as_ref()).is_some());
//! # Ok::<(), InjectError>(())
//! ```

use crate::component::{
    Component, ComponentDescriptor, ComponentKey, DependencyDescriptor, Instance,
};
use crate::error::{HookStage, InjectError};
use crate::lifecycle::{Lifecycle, LifecycleState, ResolutionGuard};
use crate::module::Modules;
use crate::registry::Registry;
use std::sync::{Arc, LazyLock};

/// Process-wide convenience injector.
static GLOBAL: LazyLock<Injector> = LazyLock::new(Injector::new);

/// Builds fully wired components on demand.
///
/// An `Injector` owns its [`Registry`] and is independent of every other
/// injector. All operations take `&self`, so an injector can be shared
/// across threads behind an `Arc` or used through [`Injector::global`].
#[derive(Default)]
pub struct Injector {
    registry: Registry,
    /// Emit injection steps at `debug` instead of `trace` level.
    debug: bool,
}

impl Injector {
    /// Creates an injector with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide injector, created on first use.
    ///
    /// This is plain convenience: it is an ordinary `Injector` and nothing
    /// else in the crate refers to it.
    #[must_use]
    pub fn global() -> &'static Injector {
        &GLOBAL
    }

    /// Enables or disables debug-level logging of injection steps.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns whether injection steps are logged at `debug` level.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a component.
    ///
    /// # Errors
    ///
    /// [`InjectError::DuplicateComponent`] if the `(type, name)` key is taken.
    pub fn register<C: Send + Sync + 'static>(
        &self,
        component: Component<C>,
    ) -> Result<&Self, InjectError> {
        self.registry.register(component.into_descriptor())?;
        Ok(self)
    }

    /// Registers an already-built value as an unnamed singleton.
    ///
    /// Shorthand for `register(Component::from_instance(value))`. The value
    /// is not injected and has no post-construction hook.
    pub fn register_instance<C: Send + Sync + 'static>(
        &self,
        value: C,
    ) -> Result<&Self, InjectError> {
        self.register(Component::from_instance(value))
    }

    /// Installs one module or a tuple of modules, in order.
    ///
    /// Stops at the first failing registration.
    pub fn install<M: Modules>(&self, modules: M) -> Result<&Self, InjectError> {
        modules.install_into(self)?;
        Ok(self)
    }

    /// Registers a component and immediately resolves it.
    pub fn define_and_resolve<C: Send + Sync + 'static>(
        &self,
        component: Component<C>,
    ) -> Result<Arc<C>, InjectError> {
        let key = component.key();
        self.register(component)?;
        self.resolve_optional::<C>(key.name())?
            .ok_or(InjectError::Declined(key))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolves the unnamed component of type `T`.
    ///
    /// `T` may be a registered type or any interface a registration
    /// [`provides`](Component::provides).
    ///
    /// # Errors
    ///
    /// - [`InjectError::UnknownComponent`] if nothing matches
    /// - [`InjectError::AmbiguousComponent`] if several registrations match
    /// - [`InjectError::MissingDependency`] if a dependency in the graph is not registered
    /// - [`InjectError::CyclicDependency`] if the graph loops back on itself
    /// - [`InjectError::HookInvocation`] if a factory, setter or hook fails
    /// - [`InjectError::Declined`] if a factory produced no instance
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectError> {
        self.resolve_required(None)
    }

    /// Resolves the component of type `T` registered as `name`.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn resolve_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, InjectError> {
        self.resolve_required(Some(name))
    }

    /// Resolves `T`, returning `Ok(None)` if its factory declines.
    pub fn resolve_optional<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: Option<&str>,
    ) -> Result<Option<Arc<T>>, InjectError> {
        let key = ComponentKey::of::<T>(name);
        let descriptor = self
            .registry
            .lookup(&key)?
            .ok_or_else(|| InjectError::UnknownComponent(key.clone()))?;

        let Some(instance) = self.resolve_descriptor(&descriptor)? else {
            return Ok(None);
        };
        descriptor
            .cast(key.id(), instance)
            .and_then(|resolved| resolved.downcast::<Arc<T>>().ok())
            .map(|resolved| Some(*resolved))
            .ok_or(InjectError::UnknownComponent(key))
    }

    fn resolve_required<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: Option<&str>,
    ) -> Result<Arc<T>, InjectError> {
        self.resolve_optional::<T>(name)?
            .ok_or_else(|| InjectError::Declined(ComponentKey::of::<T>(name)))
    }

    /// Returns the creation state of a singleton or thread-scoped component.
    ///
    /// Thread-scoped state is reported for the calling thread. Transient
    /// components have no state and yield `Ok(None)`.
    pub fn state<T: ?Sized + 'static>(
        &self,
        name: Option<&str>,
    ) -> Result<Option<LifecycleState>, InjectError> {
        let key = ComponentKey::of::<T>(name);
        let descriptor = self
            .registry
            .lookup(&key)?
            .ok_or(InjectError::UnknownComponent(key))?;
        Ok(match descriptor.lifecycle() {
            Lifecycle::Transient => None,
            Lifecycle::Singleton => Some(descriptor.singleton().state()),
            Lifecycle::ThreadScoped => Some(descriptor.per_thread().state()),
        })
    }

    /// Checks the whole registry without constructing anything.
    ///
    /// Reports every missing dependency, ambiguous dependency and dependency
    /// cycle. Running this after registration rules out singleton cycles
    /// deadlocking across threads.
    pub fn validate(&self) -> Result<(), Vec<InjectError>> {
        crate::validate::validate(&self.registry)
    }

    /// Applies the descriptor's lifecycle policy around construction.
    fn resolve_descriptor(
        &self,
        descriptor: &ComponentDescriptor,
    ) -> Result<Option<Instance>, InjectError> {
        let _guard = ResolutionGuard::enter(descriptor)?;
        match descriptor.lifecycle() {
            Lifecycle::Transient => self.construct(descriptor),
            Lifecycle::Singleton => descriptor
                .singleton()
                .get_or_try_create(|| self.construct(descriptor)),
            Lifecycle::ThreadScoped => descriptor
                .per_thread()
                .get_or_try_create(|| self.construct(descriptor)),
        }
    }

    /// Runs factory, injection and post-construction for one new instance.
    fn construct(&self, descriptor: &ComponentDescriptor) -> Result<Option<Instance>, InjectError> {
        let span = tracing::trace_span!("construct", component = %descriptor.key());
        let _entered = span.enter();

        let created = descriptor.create().map_err(|source| {
            InjectError::hook(descriptor.key().clone(), HookStage::Factory, source)
        })?;
        let Some(mut raw) = created else {
            tracing::trace!("factory provided no instance");
            return Ok(None);
        };

        for dependency in descriptor.dependencies() {
            let target = self.dependency_target(descriptor, dependency)?;
            let instance = self
                .resolve_descriptor(&target)?
                .ok_or_else(|| InjectError::Declined(target.key().clone()))?;
            let value = target.cast(dependency.key().id(), instance).ok_or_else(|| {
                InjectError::MissingDependency {
                    component: descriptor.key().clone(),
                    field: dependency.field(),
                    dependency: dependency.key().clone(),
                }
            })?;

            if self.debug {
                tracing::debug!(
                    component = %descriptor.key(),
                    field = dependency.field(),
                    dependency = %target.key(),
                    "injecting dependency"
                );
            } else {
                tracing::trace!(
                    field = dependency.field(),
                    dependency = %target.key(),
                    "injecting dependency"
                );
            }

            dependency.assign(raw.as_mut(), value).map_err(|source| {
                InjectError::hook(descriptor.key().clone(), HookStage::Injection, source)
            })?;
        }

        if let Some(result) = descriptor.post_construct(raw.as_mut()) {
            result.map_err(|source| {
                InjectError::hook(descriptor.key().clone(), HookStage::PostConstruct, source)
            })?;
        }

        Ok(Some(Instance::from(raw)))
    }

    /// Finds the descriptor a dependency refers to, using the lookup memo
    /// while the registry is unchanged.
    fn dependency_target(
        &self,
        owner: &ComponentDescriptor,
        dependency: &DependencyDescriptor,
    ) -> Result<Arc<ComponentDescriptor>, InjectError> {
        let generation = self.registry.generation();
        if let Some(target) = dependency.memoized(generation) {
            return Ok(target);
        }

        let target = self.registry.lookup(dependency.key())?.ok_or_else(|| {
            InjectError::MissingDependency {
                component: owner.key().clone(),
                field: dependency.field(),
                dependency: dependency.key().clone(),
            }
        })?;
        dependency.memoize(generation, &target);
        Ok(target)
    }
}

impl core::fmt::Debug for Injector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Injector")
            .field("registry", &self.registry)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::panic::AssertUnwindSafe;

    #[derive(Default)]
    struct Body;

    #[derive(Default)]
    struct Guitar {
        body: Option<Arc<Body>>,
    }

    #[test]
    fn dependency_memo_is_reused_until_registry_changes() {
        let injector = Injector::new();
        injector
            .register(Component::new(Body::default))
            .unwrap()
            .register(
                Component::new(Guitar::default)
                    .inject::<Body, _>("body", |guitar, body| guitar.body = Some(body)),
            )
            .unwrap();

        injector.resolve::<Guitar>().unwrap();
        let owner = injector
            .registry()
            .lookup(&ComponentKey::of::<Guitar>(None))
            .unwrap()
            .unwrap();
        let dependency = &owner.dependencies()[0];
        let generation = injector.registry().generation();
        assert!(dependency.memoized(generation).is_some());

        injector
            .register(Component::new(Body::default).named("Maple"))
            .unwrap();
        assert!(dependency.memoized(injector.registry().generation()).is_none());
    }

    #[test]
    fn define_and_resolve_registers_and_builds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let injector = Injector::new();

        injector
            .define_and_resolve(Component::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Body
            }))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(
            injector
                .registry()
                .contains(&ComponentKey::of::<Body>(None))
        );
    }

    #[test]
    fn state_reports_lifecycle() {
        let injector = Injector::new();
        injector
            .register(Component::new(Body::default).singleton())
            .unwrap()
            .register(Component::new(Guitar::default))
            .unwrap();

        assert_eq!(
            injector.state::<Body>(None).unwrap(),
            Some(LifecycleState::Uncreated)
        );
        injector.resolve::<Body>().unwrap();
        assert_eq!(
            injector.state::<Body>(None).unwrap(),
            Some(LifecycleState::Created)
        );
        assert_eq!(injector.state::<Guitar>(None).unwrap(), None);
    }

    #[test]
    fn register_instance_returns_the_same_value() {
        let injector = Injector::new();
        injector.register_instance(Body).unwrap();

        let first = injector.resolve::<Body>().unwrap();
        let second = injector.resolve::<Body>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(
            injector.register_instance(Body).unwrap_err(),
            InjectError::DuplicateComponent(_)
        ));
    }

    #[test]
    fn panicking_singleton_factory_leaves_state_uncreated() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let injector = Injector::new();
        injector
            .register(
                Component::new(move || {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("factory blew a fuse");
                    }
                    Body
                })
                .singleton(),
            )
            .unwrap();

        let outcome =
            std::panic::catch_unwind(AssertUnwindSafe(|| injector.resolve::<Body>()));
        assert!(outcome.is_err());
        assert_eq!(
            injector.state::<Body>(None).unwrap(),
            Some(LifecycleState::Uncreated)
        );

        injector.resolve::<Body>().unwrap();
        assert_eq!(
            injector.state::<Body>(None).unwrap(),
            Some(LifecycleState::Created)
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn global_injector_is_shared() {
        assert!(core::ptr::eq(Injector::global(), Injector::global()));
    }
}
