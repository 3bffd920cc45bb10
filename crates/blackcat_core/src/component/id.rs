//! Component type identifiers and registry keys.

use core::any::TypeId;
use core::fmt;

/// Unique identifier for a component or interface type.
///
/// Based on [`TypeId`], so each type has exactly one `ComponentId`. Unsized
/// types are accepted, which lets trait objects such as `dyn Instrument`
/// serve as lookup keys.
///
/// # Example
///
/// ```
/// use blackcat_core::component::ComponentId;
///
/// trait Instrument {}
/// struct Guitar;
///
/// let guitar = ComponentId::of::<Guitar>();
/// let instrument = ComponentId::of::<dyn Instrument>();
/// assert_ne!(guitar, instrument);
/// assert!(guitar.type_name().ends_with("Guitar"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ComponentId {
    /// Creates a `ComponentId` for the given type.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// The identity of a registration: a type plus an optional name.
///
/// At most one component may be registered per distinct key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    id: ComponentId,
    name: Option<String>,
}

impl ComponentKey {
    /// Creates a key from an id and an optional name.
    #[must_use]
    pub fn new(id: ComponentId, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(str::to_owned),
        }
    }

    /// Creates a key for type `T` and an optional name.
    #[must_use]
    pub fn of<T: ?Sized + 'static>(name: Option<&str>) -> Self {
        Self::new(ComponentId::of::<T>(), name)
    }

    /// Returns the type identifier.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Returns the name, or `None` for unnamed registrations.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}[\"{}\"]", self.id, name),
            None => write!(f, "{}", self.id),
        }
    }
}
