//! Component storage and lookup.
//!
//! The [`Registry`] owns every [`ComponentDescriptor`] for its lifetime and
//! answers `(type, name)` queries.
//!
//! # Matching
//!
//! 1. An exact `(type, name)` match always wins.
//! 2. Otherwise the registrations sharing the requested name (or all
//!    unnamed registrations, for an unnamed query) are scanned, in
//!    registration order, for components that provide the requested type.
//! 3. Exactly one match is returned. Several matches are an
//!    [`InjectError::AmbiguousComponent`] error. None is "not found".
//!
//! # Thread Safety
//!
//! Indices sit behind a `RwLock`: lookups take a shared lock, and
//! registration takes the exclusive lock for the duration of one insert.
//! Registration is expected to finish before concurrent resolution starts,
//! but interleaving the two never corrupts the indices.

use crate::component::{ComponentDescriptor, ComponentKey};
use crate::error::InjectError;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Default)]
struct RegistryIndex {
    /// Exact `(type, name)` index.
    by_key: HashMap<ComponentKey, Arc<ComponentDescriptor>>,
    /// Unnamed registrations in registration order, scanned for fallback matches.
    unnamed: Vec<Arc<ComponentDescriptor>>,
    /// Named registrations grouped by name, in registration order.
    named: HashMap<String, Vec<Arc<ComponentDescriptor>>>,
}

/// Thread-safe store of component descriptors.
///
/// # Example
///
/// ```
/// use blackcat_core::prelude::*;
///
/// struct Body;
///
/// let registry = Registry::new();
/// let key = ComponentKey::of::<Body>(None);
/// assert!(registry.lookup(&key)?.is_none());
///
/// let injector = Injector::new();
/// injector.register(Component::new(|| Body))?;
/// assert!(injector.registry().lookup(&key)?.is_some());
/// # Ok::<(), InjectError>(())
/// ```
#[derive(Default)]
pub struct Registry {
    index: RwLock<RegistryIndex>,
    /// Bumped on every successful registration.
    generation: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a descriptor.
    ///
    /// # Errors
    ///
    /// [`InjectError::DuplicateComponent`] if a descriptor with the same
    /// `(type, name)` key exists. The existing registration is left intact.
    pub fn register(
        &self,
        descriptor: ComponentDescriptor,
    ) -> Result<Arc<ComponentDescriptor>, InjectError> {
        let mut index = self.index.write();
        let key = descriptor.key().clone();
        if index.by_key.contains_key(&key) {
            return Err(InjectError::DuplicateComponent(key));
        }

        let descriptor = Arc::new(descriptor);
        match key.name() {
            None => index.unnamed.push(Arc::clone(&descriptor)),
            Some(name) => index
                .named
                .entry(name.to_owned())
                .or_default()
                .push(Arc::clone(&descriptor)),
        }
        index.by_key.insert(key, Arc::clone(&descriptor));
        self.generation.fetch_add(1, Ordering::AcqRel);

        tracing::trace!(
            component = %descriptor.key(),
            lifecycle = ?descriptor.lifecycle(),
            dependencies = descriptor.dependencies().len(),
            "component registered"
        );
        Ok(descriptor)
    }

    /// Finds the descriptor matching `key`.
    ///
    /// Returns `Ok(None)` when nothing matches.
    ///
    /// # Errors
    ///
    /// [`InjectError::AmbiguousComponent`] when there is no exact match and
    /// more than one candidate provides the requested type.
    pub fn lookup(
        &self,
        key: &ComponentKey,
    ) -> Result<Option<Arc<ComponentDescriptor>>, InjectError> {
        let index = self.index.read();
        if let Some(descriptor) = index.by_key.get(key) {
            return Ok(Some(Arc::clone(descriptor)));
        }

        let candidates: &[Arc<ComponentDescriptor>] = match key.name() {
            None => &index.unnamed,
            Some(name) => index.named.get(name).map(Vec::as_slice).unwrap_or_default(),
        };
        let matches: Vec<&Arc<ComponentDescriptor>> = candidates
            .iter()
            .filter(|descriptor| descriptor.provides(key.id()))
            .collect();

        match matches.as_slice() {
            [] => Ok(None),
            [single] => {
                tracing::trace!(
                    requested = %key,
                    matched = %single.key(),
                    "resolved by ancestor-type match"
                );
                Ok(Some(Arc::clone(single)))
            }
            _ => Err(InjectError::AmbiguousComponent {
                requested: key.clone(),
                candidates: matches
                    .iter()
                    .map(|descriptor| descriptor.key().clone())
                    .collect(),
            }),
        }
    }

    /// Returns `true` if a component is registered under exactly `key`.
    #[must_use]
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.index.read().by_key.contains_key(key)
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().by_key.len()
    }

    /// Returns `true` if no components are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the keys of all registered components.
    #[must_use]
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.index.read().by_key.keys().cloned().collect()
    }

    /// Returns a snapshot of all descriptors.
    pub(crate) fn descriptors(&self) -> Vec<Arc<ComponentDescriptor>> {
        self.index.read().by_key.values().cloned().collect()
    }

    /// Returns the registration counter, used to invalidate lookup memos.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    trait Instrument: Send + Sync {}

    #[derive(Default)]
    struct Guitar;
    impl Instrument for Guitar {}

    #[derive(Default)]
    struct Bass;
    impl Instrument for Bass {}

    fn guitar() -> Component<Guitar> {
        Component::new(Guitar::default)
            .provides::<dyn Instrument, _>(|guitar| guitar as Arc<dyn Instrument>)
    }

    fn bass() -> Component<Bass> {
        Component::new(Bass::default)
            .provides::<dyn Instrument, _>(|bass| bass as Arc<dyn Instrument>)
    }

    #[test]
    fn register_and_lookup_exact() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        registry.register(guitar().into_descriptor()).unwrap();

        let key = ComponentKey::of::<Guitar>(None);
        assert!(registry.contains(&key));
        assert_eq!(registry.len(), 1);
        let found = registry.lookup(&key).unwrap().unwrap();
        assert_eq!(found.key(), &key);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = Registry::new();
        registry.register(guitar().into_descriptor()).unwrap();
        let generation = registry.generation();

        let err = registry.register(guitar().into_descriptor()).unwrap_err();
        assert!(matches!(err, InjectError::DuplicateComponent(_)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.generation(), generation);
    }

    #[test]
    fn same_type_different_names_coexist() {
        let registry = Registry::new();
        registry.register(guitar().into_descriptor()).unwrap();
        registry
            .register(guitar().named("LesPaul").into_descriptor())
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unnamed_lookup_falls_back_to_provided_interface() {
        let registry = Registry::new();
        registry.register(guitar().into_descriptor()).unwrap();

        let found = registry
            .lookup(&ComponentKey::of::<dyn Instrument>(None))
            .unwrap()
            .unwrap();
        assert_eq!(found.key(), &ComponentKey::of::<Guitar>(None));
    }

    #[test]
    fn multiple_fallback_matches_are_ambiguous() {
        let registry = Registry::new();
        registry.register(guitar().into_descriptor()).unwrap();
        registry.register(bass().into_descriptor()).unwrap();

        let err = registry
            .lookup(&ComponentKey::of::<dyn Instrument>(None))
            .unwrap_err();
        match err {
            InjectError::AmbiguousComponent { candidates, .. } => {
                assert_eq!(
                    candidates,
                    vec![
                        ComponentKey::of::<Guitar>(None),
                        ComponentKey::of::<Bass>(None)
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn named_lookup_only_scans_same_name() {
        let registry = Registry::new();
        registry
            .register(guitar().named("LesPaul").into_descriptor())
            .unwrap();
        registry.register(bass().into_descriptor()).unwrap();

        let found = registry
            .lookup(&ComponentKey::of::<dyn Instrument>(Some("LesPaul")))
            .unwrap()
            .unwrap();
        assert_eq!(found.key(), &ComponentKey::of::<Guitar>(Some("LesPaul")));

        let missing = registry
            .lookup(&ComponentKey::of::<Guitar>(Some("Stratocaster")))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn named_registration_is_not_an_unnamed_candidate() {
        let registry = Registry::new();
        registry
            .register(guitar().named("LesPaul").into_descriptor())
            .unwrap();
        assert!(
            registry
                .lookup(&ComponentKey::of::<Guitar>(None))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn concurrent_lookups_during_registration() {
        let registry = Arc::new(Registry::new());
        registry.register(guitar().into_descriptor()).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let key = ComponentKey::of::<Guitar>(None);
                        assert!(registry.lookup(&key).unwrap().is_some());
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let name = format!("guitar-{i}");
            registry
                .register(guitar().named(name).into_descriptor())
                .unwrap();
        }

        for reader in readers {
            reader.join().expect("Reader thread panicked");
        }
        assert_eq!(registry.len(), 51);
    }
}
