//! Error types for registration and resolution.

use crate::component::ComponentKey;
use core::fmt;

/// Boxed error produced by user-supplied factories, setters and hooks.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// The user-supplied step that failed while constructing a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// The component factory.
    Factory,
    /// Assigning a resolved dependency into the new instance.
    Injection,
    /// The post-construction hook.
    PostConstruct,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory => f.write_str("factory"),
            Self::Injection => f.write_str("injection"),
            Self::PostConstruct => f.write_str("post-construct hook"),
        }
    }
}

/// Errors that can occur while registering or resolving components.
///
/// None of these are retried internally. A partially injected instance is
/// dropped when construction fails.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// A component with the same type and name is already registered.
    #[error("duplicate component: {0}")]
    DuplicateComponent(ComponentKey),

    /// No registered component matches the requested type and name.
    #[error("unknown component: {0}")]
    UnknownComponent(ComponentKey),

    /// More than one registered component is assignable to the requested type.
    #[error("ambiguous component {requested}: {} candidates match", .candidates.len())]
    AmbiguousComponent {
        /// The key that was looked up.
        requested: ComponentKey,
        /// Keys of every matching registration, in registration order.
        candidates: Vec<ComponentKey>,
    },

    /// A declared dependency has no registered component.
    #[error("no component {dependency} defined for injection into `{field}` of {component}")]
    MissingDependency {
        /// The component being constructed.
        component: ComponentKey,
        /// The injection point label.
        field: &'static str,
        /// The dependency that could not be found.
        dependency: ComponentKey,
    },

    /// A component (transitively) depends on itself.
    #[error("cyclic dependency: {}", format_path(.path))]
    CyclicDependency {
        /// The resolution path, starting and ending with the same component.
        path: Vec<ComponentKey>,
    },

    /// A factory, setter or post-construction hook failed.
    #[error("{stage} of {component} failed: {source}")]
    HookInvocation {
        /// The component being constructed.
        component: ComponentKey,
        /// Which step failed.
        stage: HookStage,
        /// The original failure.
        #[source]
        source: BoxError,
    },

    /// The factory opted out and produced no instance.
    #[error("factory for {0} provided no instance")]
    Declined(ComponentKey),
}

impl InjectError {
    /// Creates a [`HookInvocation`](Self::HookInvocation) error.
    pub fn hook(component: ComponentKey, stage: HookStage, source: impl Into<BoxError>) -> Self {
        Self::HookInvocation {
            component,
            stage,
            source: source.into(),
        }
    }
}

fn format_path(path: &[ComponentKey]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKey;

    struct Guitar;
    struct Body;

    #[test]
    fn cyclic_dependency_display_lists_path() {
        let err = InjectError::CyclicDependency {
            path: vec![
                ComponentKey::of::<Guitar>(None),
                ComponentKey::of::<Body>(None),
                ComponentKey::of::<Guitar>(None),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("cyclic dependency: "));
        assert_eq!(message.matches(" -> ").count(), 2);
        assert!(message.contains("Body"));
    }

    #[test]
    fn hook_invocation_preserves_source() {
        let err = InjectError::hook(
            ComponentKey::of::<Guitar>(Some("LesPaul")),
            HookStage::PostConstruct,
            "strings snapped",
        );
        let source = core::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("strings snapped"));
        assert!(err.to_string().contains("post-construct hook"));
        assert!(err.to_string().contains("\"LesPaul\""));
    }
}
