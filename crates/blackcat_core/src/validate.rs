//! Static checks over the registered component graph.

use crate::component::{ComponentDescriptor, ComponentKey};
use crate::error::InjectError;
use crate::registry::Registry;
use hashbrown::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Edges from a descriptor serial to the descriptors its dependencies match.
type Edges = HashMap<u64, Vec<Arc<ComponentDescriptor>>>;

/// Validates every registration, collecting all problems found.
pub(crate) fn validate(registry: &Registry) -> Result<(), Vec<InjectError>> {
    let mut descriptors = registry.descriptors();
    // Deterministic report order.
    descriptors.sort_by_key(|descriptor| descriptor.serial());

    let mut errors = Vec::new();
    let mut edges = Edges::new();

    for descriptor in &descriptors {
        for dependency in descriptor.dependencies() {
            match registry.lookup(dependency.key()) {
                Ok(Some(target)) => edges
                    .entry(descriptor.serial())
                    .or_default()
                    .push(target),
                Ok(None) => errors.push(InjectError::MissingDependency {
                    component: descriptor.key().clone(),
                    field: dependency.field(),
                    dependency: dependency.key().clone(),
                }),
                Err(err) => errors.push(err),
            }
        }
    }

    let mut marks = HashMap::new();
    let mut path = Vec::new();
    for descriptor in &descriptors {
        visit(descriptor, &edges, &mut marks, &mut path, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Depth-first search reporting each back edge as a cycle.
fn visit(
    node: &Arc<ComponentDescriptor>,
    edges: &Edges,
    marks: &mut HashMap<u64, Mark>,
    path: &mut Vec<Arc<ComponentDescriptor>>,
    errors: &mut Vec<InjectError>,
) {
    match marks.get(&node.serial()) {
        Some(Mark::Done) => return,
        Some(Mark::Visiting) => {
            if let Some(start) = path.iter().position(|entry| entry.serial() == node.serial()) {
                let mut cycle: Vec<ComponentKey> =
                    path[start..].iter().map(|entry| entry.key().clone()).collect();
                cycle.push(node.key().clone());
                errors.push(InjectError::CyclicDependency { path: cycle });
            }
            return;
        }
        None => {}
    }

    marks.insert(node.serial(), Mark::Visiting);
    path.push(Arc::clone(node));
    for next in edges.get(&node.serial()).into_iter().flatten() {
        visit(next, edges, marks, path, errors);
    }
    path.pop();
    marks.insert(node.serial(), Mark::Done);
}

#[cfg(test)]
mod tests {
    use crate::component::Component;
    use crate::error::InjectError;
    use crate::injector::Injector;
    use std::sync::Arc;

    #[derive(Default)]
    struct Amp {
        cable: Option<Arc<Cable>>,
    }

    #[derive(Default)]
    struct Cable {
        amp: Option<Arc<Amp>>,
    }

    #[derive(Default)]
    struct Pedal;

    #[test]
    fn valid_graph_passes() {
        let injector = Injector::new();
        injector
            .register(Component::new(Pedal::default))
            .unwrap()
            .register(Component::new(Cable::default))
            .unwrap()
            .register(
                Component::new(Amp::default)
                    .inject::<Cable, _>("cable", |amp, cable| amp.cable = Some(cable)),
            )
            .unwrap();
        assert!(injector.validate().is_ok());
    }

    #[test]
    fn reports_missing_and_cycles_together() {
        let injector = Injector::new();
        injector
            .register(
                Component::new(Amp::default)
                    .singleton()
                    .inject::<Cable, _>("cable", |amp, cable| amp.cable = Some(cable)),
            )
            .unwrap()
            .register(
                Component::new(Cable::default)
                    .singleton()
                    .inject::<Amp, _>("amp", |cable, amp| cable.amp = Some(amp))
                    .inject::<Pedal, _>("pedal", |_, _| {}),
            )
            .unwrap();

        let errors = injector.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|err| matches!(
            err,
            InjectError::MissingDependency { field: "pedal", .. }
        )));
        assert!(errors.iter().any(|err| matches!(
            err,
            InjectError::CyclicDependency { path } if path.len() == 3
        )));
    }
}
