//! Dependency-ordered visitor dispatch
//!
//! Visitors form a graph: visitor `a` must run before visitor `b` when `b`
//! depends on the class `a` visits. The dispatcher keeps a stable
//! topological order of that graph, picking the earliest-registered ready
//! visitor at every step, so visitors without a dependency relation keep
//! their registration order. Registering a visitor that closes a cycle is
//! rejected and leaves the batch unchanged.

use std::collections::HashMap;

use blam_cache::{TagClass, TagEntry, TagMap};
use tracing::{debug, trace};

use crate::error::{DispatchError, Result, VisitError, VisitPhase};
use crate::visitor::TagVisitor;

/// A batch of visitors run in dependency order over one map.
pub struct TagDispatcher<'v, 'map> {
    visitors: Vec<Box<dyn TagVisitor<'map> + 'v>>,
    order: Vec<usize>,
}

impl Default for TagDispatcher<'_, '_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TagDispatcher<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagDispatcher")
            .field("classes", &self.scheduled_classes())
            .field("order", &self.order)
            .finish()
    }
}

impl<'v, 'map> TagDispatcher<'v, 'map> {
    /// An empty batch.
    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Add a visitor to the batch.
    ///
    /// Fails with [`DispatchError::DependencyCycle`] when the visitor's
    /// dependencies, together with the visitors already registered, form a
    /// cycle; the visitor is not added in that case.
    pub fn register(&mut self, visitor: impl TagVisitor<'map> + 'v) -> Result<()> {
        self.visitors.push(Box::new(visitor));
        match schedule(&self.visitors) {
            Ok(order) => {
                self.order = order;
                Ok(())
            }
            Err(err) => {
                self.visitors.pop();
                Err(err)
            }
        }
    }

    /// Add a visitor, builder style.
    pub fn with_visitor(mut self, visitor: impl TagVisitor<'map> + 'v) -> Result<Self> {
        self.register(visitor)?;
        Ok(self)
    }

    /// Number of registered visitors.
    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    /// Whether no visitor is registered.
    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Registration indices in execution order.
    pub fn execution_order(&self) -> &[usize] {
        &self.order
    }

    /// Visited classes in execution order.
    pub fn scheduled_classes(&self) -> Vec<TagClass> {
        self.order
            .iter()
            .map(|&index| self.visitors[index].visited_class())
            .collect()
    }

    /// Run every visitor over `map`.
    ///
    /// The directory is partitioned by primary class in one scan; each
    /// visitor then runs `begin`, `visit`, `end` to completion before the
    /// next one starts. The first failing callback aborts the batch.
    pub fn run(&mut self, map: &TagMap<'map>) -> Result<()> {
        let mut groups: HashMap<TagClass, Vec<&'map TagEntry>> = self
            .visitors
            .iter()
            .map(|visitor| (visitor.visited_class(), Vec::new()))
            .collect();
        for entry in map.entries() {
            if let Some(group) = groups.get_mut(&entry.primary_class()) {
                group.push(entry);
            }
        }

        debug!(
            "Dispatching {} visitors over {} tags in order {:?}",
            self.visitors.len(),
            map.len(),
            self.scheduled_classes()
        );

        for &index in &self.order {
            let visitor = &mut self.visitors[index];
            let class = visitor.visited_class();
            let entries = groups.get(&class).map_or(&[][..], Vec::as_slice);
            let fail = |phase: VisitPhase| move |source: VisitError| DispatchError::Visitor { class, phase, source };

            trace!("Visitor '{}': begin", class);
            visitor.on_begin(map).map_err(fail(VisitPhase::Begin))?;
            trace!("Visitor '{}': visiting {} entries", class, entries.len());
            visitor.on_visit(map, entries).map_err(fail(VisitPhase::Visit))?;
            trace!("Visitor '{}': end", class);
            visitor.on_end(map).map_err(fail(VisitPhase::End))?;
        }

        Ok(())
    }
}

/// Stable topological order of the visitors, or the cycle that prevents one.
fn schedule<'map>(visitors: &[Box<dyn TagVisitor<'map> + '_>]) -> Result<Vec<usize>> {
    let count = visitors.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut pending = vec![0usize; count];

    for (after, visitor) in visitors.iter().enumerate() {
        for dependency in visitor.dependencies() {
            for (before, other) in visitors.iter().enumerate() {
                // A visitor never waits for itself
                if before != after && other.visited_class() == *dependency && !successors[before].contains(&after) {
                    successors[before].push(after);
                    pending[after] += 1;
                }
            }
        }
    }

    let mut order = Vec::with_capacity(count);
    let mut placed = vec![false; count];
    while order.len() < count {
        let Some(next) = (0..count).find(|&i| !placed[i] && pending[i] == 0) else {
            let mut classes: Vec<TagClass> = (0..count)
                .filter(|&i| !placed[i])
                .map(|i| visitors[i].visited_class())
                .collect();
            classes.sort_unstable();
            classes.dedup();
            return Err(DispatchError::DependencyCycle { classes });
        };
        placed[next] = true;
        order.push(next);
        for &successor in &successors[next] {
            pending[successor] -= 1;
        }
    }

    Ok(order)
}
