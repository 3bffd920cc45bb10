//! Lifecycle policies and their per-descriptor state.
//!
//! | Policy | Instances | Synchronization |
//! |--------|-----------|-----------------|
//! | [`Lifecycle::Transient`] | New instance per resolution | None |
//! | [`Lifecycle::Singleton`] | One per descriptor | Per-descriptor creation lock |
//! | [`Lifecycle::ThreadScoped`] | One per descriptor per thread | Per-descriptor thread map |
//!
//! Singleton and thread-scoped descriptors move through
//! `Uncreated` → `Creating` → `Created`. `Created` is terminal. A failed
//! construction returns to `Uncreated`, so a later resolution retries.
//!
//! Cached instances belong to their descriptor and are dropped with the
//! registry that owns it.

use crate::component::{ComponentDescriptor, ComponentKey, Instance};
use crate::error::InjectError;
use core::cell::RefCell;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU8, Ordering};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// How many instances of a component the injector creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    /// A fresh, independently injected instance on every resolution.
    #[default]
    Transient,
    /// One instance for the lifetime of the injector.
    Singleton,
    /// One instance per calling thread.
    ThreadScoped,
}

/// Creation state of a singleton or thread-scoped component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No instance has been created yet.
    Uncreated,
    /// A caller holds the creation lock and is constructing the instance.
    Creating,
    /// The instance is cached.
    Created,
}

const UNCREATED: u8 = 0;
const CREATING: u8 = 1;
const CREATED: u8 = 2;

/// Cached instance and creation lock of a singleton descriptor.
///
/// The lock guards both the cache check and the construction, so at most
/// one construction ever completes per descriptor.
pub(crate) struct SingletonSlot {
    state: AtomicU8,
    instance: Mutex<Option<Instance>>,
}

impl SingletonSlot {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(UNCREATED),
            instance: Mutex::new(None),
        }
    }

    pub(crate) fn filled(instance: Instance) -> Self {
        Self {
            state: AtomicU8::new(CREATED),
            instance: Mutex::new(Some(instance)),
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            CREATING => LifecycleState::Creating,
            CREATED => LifecycleState::Created,
            _ => LifecycleState::Uncreated,
        }
    }

    /// Returns the cached instance, creating it under the lock if needed.
    ///
    /// `Ok(None)` (factory declined), errors and panics leave the slot
    /// empty and `Uncreated`.
    pub(crate) fn get_or_try_create(
        &self,
        create: impl FnOnce() -> Result<Option<Instance>, InjectError>,
    ) -> Result<Option<Instance>, InjectError> {
        let mut slot = self.instance.lock();
        if let Some(instance) = slot.as_ref() {
            tracing::trace!("singleton cache hit");
            return Ok(Some(Arc::clone(instance)));
        }

        self.state.store(CREATING, Ordering::Release);
        let _reset = CreatingGuard(&self.state);
        let result = create();
        if let Ok(Some(instance)) = &result {
            *slot = Some(Arc::clone(instance));
            self.state.store(CREATED, Ordering::Release);
        }
        result
    }
}

/// Returns a slot left in `Creating` to `Uncreated`.
///
/// Runs on every exit from construction, including a panicking factory,
/// setter or hook.
struct CreatingGuard<'a>(&'a AtomicU8);

impl Drop for CreatingGuard<'_> {
    fn drop(&mut self) {
        let _ = self
            .0
            .compare_exchange(CREATING, UNCREATED, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// Per-thread instances of a thread-scoped descriptor.
///
/// Owned by the descriptor, so every instance is dropped with the
/// injector that created it. Entries of threads that have exited stay
/// until then.
pub(crate) struct ThreadSlot {
    instances: Mutex<HashMap<ThreadId, Instance>>,
}

impl ThreadSlot {
    pub(crate) fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the creation state as seen by the calling thread.
    pub(crate) fn state(&self) -> LifecycleState {
        if self.instances.lock().contains_key(&thread::current().id()) {
            LifecycleState::Created
        } else {
            LifecycleState::Uncreated
        }
    }

    /// Returns the calling thread's instance, creating it if needed.
    ///
    /// The lock is not held while `create` runs, so construction may
    /// resolve other thread-scoped components. Only the calling thread
    /// writes its own entry.
    pub(crate) fn get_or_try_create(
        &self,
        create: impl FnOnce() -> Result<Option<Instance>, InjectError>,
    ) -> Result<Option<Instance>, InjectError> {
        let thread = thread::current().id();
        if let Some(instance) = self.instances.lock().get(&thread).cloned() {
            tracing::trace!("thread-scoped cache hit");
            return Ok(Some(instance));
        }

        let created = create()?;
        if let Some(instance) = &created {
            self.instances.lock().insert(thread, Arc::clone(instance));
        }
        Ok(created)
    }

    /// Returns the number of threads holding an instance.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.instances.lock().len()
    }
}

thread_local! {
    /// Descriptors currently being resolved on this thread, outermost first.
    static RESOLVING: RefCell<Vec<(u64, ComponentKey)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a descriptor as being resolved on the current thread.
///
/// Entering a descriptor that is already on the thread's resolution stack
/// fails with [`InjectError::CyclicDependency`]. This happens before any
/// creation lock is taken, so a cycle is reported instead of deadlocking
/// or recursing without bound. The entry is popped on drop.
pub(crate) struct ResolutionGuard {
    serial: u64,
    _not_send: PhantomData<*const ()>,
}

impl ResolutionGuard {
    pub(crate) fn enter(descriptor: &ComponentDescriptor) -> Result<Self, InjectError> {
        let serial = descriptor.serial();
        RESOLVING.with_borrow_mut(|stack| {
            if let Some(start) = stack.iter().position(|(entry, _)| *entry == serial) {
                let mut path: Vec<ComponentKey> =
                    stack[start..].iter().map(|(_, key)| key.clone()).collect();
                path.push(descriptor.key().clone());
                return Err(InjectError::CyclicDependency { path });
            }
            stack.push((serial, descriptor.key().clone()));
            Ok(Self {
                serial,
                _not_send: PhantomData,
            })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with_borrow_mut(|stack| {
            if let Some(position) = stack.iter().rposition(|(entry, _)| *entry == self.serial) {
                stack.truncate(position);
            }
        });
    }
}
