//! Type-erased component metadata held by the registry.

use super::id::{ComponentId, ComponentKey};
use crate::error::BoxError;
use crate::lifecycle::{Lifecycle, SingletonSlot, ThreadSlot};
use core::any::Any;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// A fully constructed component, shared by reference counting.
///
/// The concrete type behind the `dyn Any` is always the registered
/// component type.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A freshly created component that is still exclusively owned.
pub(crate) type RawInstance = Box<dyn Any + Send + Sync>;

/// An `Arc<T>` for some requested `T`, boxed so it can cross the erased boundary.
pub(crate) type Resolved = Box<dyn Any + Send + Sync>;

pub(crate) type Factory = Box<dyn Fn() -> Result<Option<RawInstance>, BoxError> + Send + Sync>;
pub(crate) type Setter =
    Box<dyn Fn(&mut (dyn Any + Send + Sync), Resolved) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type Hook =
    Box<dyn Fn(&mut (dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type Caster = Box<dyn Fn(Instance) -> Option<Resolved> + Send + Sync>;

/// Source of descriptor serial numbers, unique across every injector.
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

/// One injection point on a component.
///
/// Records the target label, the dependency key, and the setter that
/// assigns the resolved value. The descriptor last matched by lookup is
/// memoized and invalidated whenever the registry changes.
pub struct DependencyDescriptor {
    field: &'static str,
    key: ComponentKey,
    setter: Setter,
    memo: RwLock<Option<LookupMemo>>,
}

struct LookupMemo {
    generation: u64,
    target: Weak<ComponentDescriptor>,
}

impl DependencyDescriptor {
    pub(crate) fn new(field: &'static str, key: ComponentKey, setter: Setter) -> Self {
        Self {
            field,
            key,
            setter,
            memo: RwLock::new(None),
        }
    }

    /// Returns the injection point label.
    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Returns the requested dependency type and name.
    #[must_use]
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    pub(crate) fn assign(
        &self,
        target: &mut (dyn Any + Send + Sync),
        value: Resolved,
    ) -> Result<(), BoxError> {
        (self.setter)(target, value)
    }

    /// Returns the memoized lookup result if it was recorded at `generation`.
    pub(crate) fn memoized(&self, generation: u64) -> Option<Arc<ComponentDescriptor>> {
        let memo = self.memo.read();
        memo.as_ref()
            .filter(|memo| memo.generation == generation)
            .and_then(|memo| memo.target.upgrade())
    }

    pub(crate) fn memoize(&self, generation: u64, target: &Arc<ComponentDescriptor>) {
        *self.memo.write() = Some(LookupMemo {
            generation,
            target: Arc::downgrade(target),
        });
    }
}

impl core::fmt::Debug for DependencyDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DependencyDescriptor")
            .field("field", &self.field)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// The container's metadata record for one registered component.
///
/// Created once at registration and immutable afterwards, except for the
/// cached singleton and thread-scoped instances, which are dropped with it.
pub struct ComponentDescriptor {
    key: ComponentKey,
    serial: u64,
    lifecycle: Lifecycle,
    factory: Factory,
    dependencies: Vec<DependencyDescriptor>,
    post_construct: Option<Hook>,
    casts: HashMap<ComponentId, Caster>,
    singleton: SingletonSlot,
    per_thread: ThreadSlot,
}

impl ComponentDescriptor {
    pub(crate) fn new(
        key: ComponentKey,
        lifecycle: Lifecycle,
        factory: Factory,
        dependencies: Vec<DependencyDescriptor>,
        post_construct: Option<Hook>,
        casts: HashMap<ComponentId, Caster>,
        singleton: SingletonSlot,
    ) -> Self {
        Self {
            key,
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            lifecycle,
            factory,
            dependencies,
            post_construct,
            casts,
            singleton,
            per_thread: ThreadSlot::new(),
        }
    }

    /// Returns the registration key.
    #[must_use]
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// Returns the lifecycle policy.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns the injection points in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[DependencyDescriptor] {
        &self.dependencies
    }

    /// Returns `true` if a post-construction hook is declared.
    #[must_use]
    pub fn has_post_construct(&self) -> bool {
        self.post_construct.is_some()
    }

    /// Returns `true` if this component can be resolved as `id`.
    ///
    /// A component always provides its own type, plus every interface
    /// declared with [`Component::provides`](super::Component::provides).
    #[must_use]
    pub fn provides(&self, id: ComponentId) -> bool {
        self.casts.contains_key(&id)
    }

    /// Returns every type this component can be resolved as.
    #[must_use]
    pub fn provided_types(&self) -> Vec<ComponentId> {
        self.casts.keys().copied().collect()
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn create(&self) -> Result<Option<RawInstance>, BoxError> {
        (self.factory)()
    }

    pub(crate) fn post_construct(
        &self,
        instance: &mut (dyn Any + Send + Sync),
    ) -> Option<Result<(), BoxError>> {
        self.post_construct.as_ref().map(|hook| hook(instance))
    }

    /// Converts a constructed instance into a boxed `Arc` of the type `id`.
    pub(crate) fn cast(&self, id: ComponentId, instance: Instance) -> Option<Resolved> {
        self.casts.get(&id).and_then(|cast| cast(instance))
    }

    pub(crate) fn singleton(&self) -> &SingletonSlot {
        &self.singleton
    }

    pub(crate) fn per_thread(&self) -> &ThreadSlot {
        &self.per_thread
    }
}

impl core::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("lifecycle", &self.lifecycle)
            .field("dependencies", &self.dependencies)
            .field("post_construct", &self.post_construct.is_some())
            .field("provides", &self.casts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
