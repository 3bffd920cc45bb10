//! The typed registration builder.

use super::descriptor::{
    Caster, ComponentDescriptor, DependencyDescriptor, Factory, Hook, Instance, RawInstance,
    Resolved,
};
use super::id::{ComponentId, ComponentKey};
use crate::error::BoxError;
use crate::lifecycle::{Lifecycle, SingletonSlot};
use core::any::Any;
use core::marker::PhantomData;
use hashbrown::HashMap;
use std::sync::Arc;

/// A declarative registration for a component of type `C`.
///
/// A component is a factory plus everything the injector needs to finish
/// the object it returns: the injection points, an optional
/// post-construction hook, the lifecycle policy and the interfaces it can
/// be resolved as.
///
/// Dependencies are assigned through setter closures on the exclusively
/// owned value, after the factory returns and before the value is shared.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use blackcat_core::prelude::*;
///
/// trait Instrument: Send + Sync {
///     fn sound(&self) -> &'static str;
/// }
///
/// #[derive(Default)]
/// struct Guitar {
///     tuned: bool,
/// }
///
/// impl Instrument for Guitar {
///     fn sound(&self) -> &'static str {
///         "twang"
///     }
/// }
///
/// let injector = Injector::new();
/// injector.register(
///     Component::new(Guitar::default)
///         .named("LesPaul")
///         .singleton()
///         .post_construct(|guitar| guitar.tuned = true)
///         .provides::<dyn Instrument, _>(|guitar| guitar as Arc<dyn Instrument>),
/// )?;
///
/// let instrument = injector.resolve_named::<dyn Instrument>("LesPaul")?;
/// assert_eq!(instrument.sound(), "twang");
/// assert!(injector.resolve_named::<Guitar>("LesPaul")?.tuned);
/// # Ok::<(), InjectError>(())
/// ```
pub struct Component<C> {
    name: Option<String>,
    lifecycle: Lifecycle,
    factory: Factory,
    dependencies: Vec<DependencyDescriptor>,
    post_construct: Option<Hook>,
    casts: Vec<(ComponentId, Caster)>,
    preset: Option<Instance>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> Component<C> {
    fn with_factory(factory: Factory) -> Self {
        Self {
            name: None,
            lifecycle: Lifecycle::default(),
            factory,
            dependencies: Vec::new(),
            post_construct: None,
            casts: Vec::new(),
            preset: None,
            _marker: PhantomData,
        }
    }

    /// Creates a component from an infallible factory.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self::with_factory(Box::new(move || {
            Ok(Some(Box::new(factory()) as RawInstance))
        }))
    }

    /// Creates a component from a fallible factory.
    ///
    /// A factory error is reported as
    /// [`InjectError::HookInvocation`](crate::error::InjectError::HookInvocation).
    pub fn try_new<F, E>(factory: F) -> Self
    where
        F: Fn() -> Result<C, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::with_factory(Box::new(move || {
            factory()
                .map(|component| Some(Box::new(component) as RawInstance))
                .map_err(Into::into)
        }))
    }

    /// Creates a component whose factory may decline to produce an instance.
    ///
    /// When the factory returns `None`, injection and the post-construction
    /// hook are skipped.
    pub fn optional<F>(factory: F) -> Self
    where
        F: Fn() -> Option<C> + Send + Sync + 'static,
    {
        Self::with_factory(Box::new(move || {
            Ok(factory().map(|component| Box::new(component) as RawInstance))
        }))
    }

    /// Creates a singleton component from an already-built value.
    ///
    /// The value is returned as-is on every resolution: it is never passed
    /// through injection or the post-construction hook.
    pub fn from_instance(value: C) -> Self {
        let mut component = Self::with_factory(Box::new(|| Ok(None)));
        component.lifecycle = Lifecycle::Singleton;
        component.preset = Some(Arc::new(value));
        component
    }

    /// Registers the component under `name`.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the lifecycle policy.
    #[must_use]
    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Shorthand for `lifecycle(Lifecycle::Singleton)`.
    #[must_use]
    pub fn singleton(self) -> Self {
        self.lifecycle(Lifecycle::Singleton)
    }

    /// Shorthand for `lifecycle(Lifecycle::ThreadScoped)`.
    #[must_use]
    pub fn thread_scoped(self) -> Self {
        self.lifecycle(Lifecycle::ThreadScoped)
    }

    /// Declares an unnamed dependency on `D`, assigned by `set`.
    ///
    /// `field` labels the injection point in errors and logs.
    #[must_use]
    pub fn inject<D, F>(self, field: &'static str, set: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut C, Arc<D>) + Send + Sync + 'static,
    {
        self.try_inject(field, move |component: &mut C, value: Arc<D>| {
            set(component, value);
            Ok::<(), BoxError>(())
        })
    }

    /// Declares a dependency on the component of type `D` registered as `name`.
    #[must_use]
    pub fn inject_named<D, F>(self, field: &'static str, name: &str, set: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut C, Arc<D>) + Send + Sync + 'static,
    {
        self.try_inject_named(field, name, move |component: &mut C, value: Arc<D>| {
            set(component, value);
            Ok::<(), BoxError>(())
        })
    }

    /// Declares an unnamed dependency on `D` with a fallible setter.
    ///
    /// A setter error fails the resolution with
    /// [`InjectError::HookInvocation`](crate::error::InjectError::HookInvocation)
    /// at the injection stage.
    #[must_use]
    pub fn try_inject<D, F, E>(self, field: &'static str, set: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut C, Arc<D>) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.push_dependency(field, ComponentKey::of::<D>(None), set)
    }

    /// Named variant of [`try_inject`](Self::try_inject).
    #[must_use]
    pub fn try_inject_named<D, F, E>(self, field: &'static str, name: &str, set: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut C, Arc<D>) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.push_dependency(field, ComponentKey::of::<D>(Some(name)), set)
    }

    fn push_dependency<D, F, E>(mut self, field: &'static str, key: ComponentKey, set: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut C, Arc<D>) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let setter = Box::new(
            move |target: &mut (dyn Any + Send + Sync), value: Resolved| -> Result<(), BoxError> {
                let target = target
                    .downcast_mut::<C>()
                    .ok_or_else(type_mismatch::<C>)?;
                let value = value
                    .downcast::<Arc<D>>()
                    .map_err(|_| type_mismatch::<Arc<D>>())?;
                set(target, *value).map_err(Into::into)
            },
        );
        self.dependencies
            .push(DependencyDescriptor::new(field, key, setter));
        self
    }

    /// Sets the post-construction hook.
    ///
    /// The hook runs once per constructed instance, after every dependency
    /// has been assigned.
    #[must_use]
    pub fn post_construct<F>(self, hook: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.try_post_construct(move |component: &mut C| {
            hook(component);
            Ok::<(), BoxError>(())
        })
    }

    /// Sets a fallible post-construction hook.
    #[must_use]
    pub fn try_post_construct<F, E>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.post_construct = Some(Box::new(
            move |target: &mut (dyn Any + Send + Sync)| -> Result<(), BoxError> {
                let target = target
                    .downcast_mut::<C>()
                    .ok_or_else(type_mismatch::<C>)?;
                hook(target).map_err(Into::into)
            },
        ));
        self
    }

    /// Declares that this component can also be resolved as `I`.
    ///
    /// `cast` performs the unsizing coercion, usually `|c| c as Arc<dyn Trait>`.
    /// Lookups for `I` then match this component through ancestor-type
    /// fallback.
    #[must_use]
    pub fn provides<I, F>(mut self, cast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<I> + Send + Sync + 'static,
    {
        let caster: Caster = Box::new(move |instance: Instance| {
            instance
                .downcast::<C>()
                .ok()
                .map(|component| Box::new(cast(component)) as Resolved)
        });
        self.casts.push((ComponentId::of::<I>(), caster));
        self
    }

    /// Returns the registration name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the registration key.
    #[must_use]
    pub fn key(&self) -> ComponentKey {
        ComponentKey::of::<C>(self.name())
    }

    /// Erases the component type into a registry descriptor.
    pub(crate) fn into_descriptor(self) -> ComponentDescriptor {
        let key = self.key();
        let mut casts: HashMap<ComponentId, Caster> = self.casts.into_iter().collect();
        casts.insert(
            ComponentId::of::<C>(),
            Box::new(|instance: Instance| {
                instance
                    .downcast::<C>()
                    .ok()
                    .map(|component| Box::new(component) as Resolved)
            }),
        );
        let singleton = match self.preset {
            Some(instance) => SingletonSlot::filled(instance),
            None => SingletonSlot::new(),
        };
        ComponentDescriptor::new(
            key,
            self.lifecycle,
            self.factory,
            self.dependencies,
            self.post_construct,
            casts,
            singleton,
        )
    }
}

fn type_mismatch<T: ?Sized>() -> BoxError {
    format!("value is not a `{}`", core::any::type_name::<T>()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Instrument: Send + Sync {}

    #[derive(Default)]
    struct Guitar {
        body: Option<Arc<Body>>,
        ready: bool,
    }

    impl Instrument for Guitar {}

    #[derive(Default)]
    struct Body;

    #[test]
    fn descriptor_provides_own_type_and_interfaces() {
        let descriptor = Component::new(Guitar::default)
            .provides::<dyn Instrument, _>(|guitar| guitar as Arc<dyn Instrument>)
            .into_descriptor();

        assert!(descriptor.provides(ComponentId::of::<Guitar>()));
        assert!(descriptor.provides(ComponentId::of::<dyn Instrument>()));
        assert!(!descriptor.provides(ComponentId::of::<Body>()));
        assert_eq!(descriptor.provided_types().len(), 2);
    }

    #[test]
    fn descriptor_keeps_declaration_order() {
        let descriptor = Component::new(Guitar::default)
            .named("LesPaul")
            .inject::<Body, _>("body", |guitar, body| guitar.body = Some(body))
            .inject_named::<Body, _>("spare", "Maple", |_, _| {})
            .into_descriptor();

        assert_eq!(descriptor.key(), &ComponentKey::of::<Guitar>(Some("LesPaul")));
        let fields: Vec<_> = descriptor.dependencies().iter().map(|d| d.field()).collect();
        assert_eq!(fields, ["body", "spare"]);
        assert_eq!(
            descriptor.dependencies()[1].key(),
            &ComponentKey::of::<Body>(Some("Maple"))
        );
    }

    #[test]
    fn setter_and_hook_operate_on_raw_instance() {
        let descriptor = Component::new(Guitar::default)
            .inject::<Body, _>("body", |guitar, body| guitar.body = Some(body))
            .post_construct(|guitar| guitar.ready = guitar.body.is_some())
            .into_descriptor();

        let mut raw = descriptor.create().unwrap().unwrap();
        let body: Resolved = Box::new(Arc::new(Body));
        descriptor.dependencies()[0]
            .assign(raw.as_mut(), body)
            .unwrap();
        descriptor.post_construct(raw.as_mut()).unwrap().unwrap();

        let guitar = raw.downcast::<Guitar>().unwrap();
        assert!(guitar.ready);
    }

    #[test]
    fn setter_rejects_wrong_value_type() {
        let descriptor = Component::new(Guitar::default)
            .inject::<Body, _>("body", |guitar, body| guitar.body = Some(body))
            .into_descriptor();

        let mut raw = descriptor.create().unwrap().unwrap();
        let wrong: Resolved = Box::new(Arc::new(42_u32));
        let err = descriptor.dependencies()[0]
            .assign(raw.as_mut(), wrong)
            .unwrap_err();
        assert!(err.to_string().contains("Body"));
    }

    #[test]
    fn fallible_setter_reports_its_error() {
        let descriptor = Component::new(Guitar::default)
            .try_inject::<Body, _, _>("body", |guitar, body| {
                if guitar.ready {
                    guitar.body = Some(body);
                    Ok(())
                } else {
                    Err("neck not set")
                }
            })
            .into_descriptor();

        let mut raw = descriptor.create().unwrap().unwrap();
        let body: Resolved = Box::new(Arc::new(Body));
        let err = descriptor.dependencies()[0]
            .assign(raw.as_mut(), body)
            .unwrap_err();
        assert_eq!(err.to_string(), "neck not set");
    }

    #[test]
    fn optional_factory_may_decline() {
        let descriptor = Component::<Guitar>::optional(|| None).into_descriptor();
        assert!(descriptor.create().unwrap().is_none());
    }

    #[test]
    fn from_instance_is_a_prefilled_singleton() {
        let descriptor = Component::from_instance(Body).into_descriptor();
        assert_eq!(descriptor.lifecycle(), Lifecycle::Singleton);
        assert_eq!(
            descriptor.singleton().state(),
            crate::lifecycle::LifecycleState::Created
        );
    }
}
