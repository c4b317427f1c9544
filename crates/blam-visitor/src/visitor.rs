//! Visitor contract

use blam_cache::{TagClass, TagEntry, TagMap};

use crate::error::VisitResult;

/// A procedure that processes every tag of one class.
///
/// The dispatcher calls [`on_begin`](Self::on_begin), then
/// [`on_visit`](Self::on_visit) once with every directory entry whose
/// primary class equals [`visited_class`](Self::visited_class) (in directory
/// order, possibly empty), then [`on_end`](Self::on_end). It runs a visitor
/// only after every visitor of each class in
/// [`dependencies`](Self::dependencies) has finished.
pub trait TagVisitor<'map> {
    /// Class whose entries this visitor receives.
    fn visited_class(&self) -> TagClass;

    /// Classes whose visitors must finish first.
    fn dependencies(&self) -> &[TagClass] {
        &[]
    }

    /// Called before the entries are visited.
    fn on_begin(&mut self, _map: &TagMap<'map>) -> VisitResult {
        Ok(())
    }

    /// Called once with all matching entries.
    fn on_visit(&mut self, map: &TagMap<'map>, entries: &[&'map TagEntry]) -> VisitResult;

    /// Called after the entries were visited.
    fn on_end(&mut self, _map: &TagMap<'map>) -> VisitResult {
        Ok(())
    }
}

/// A visitor built from a closure.
///
/// ```
/// use blam_cache::TagClass;
/// use blam_visitor::FnVisitor;
///
/// let mut count = 0;
/// let visitor = FnVisitor::new(TagClass::SHADER_ENVIRONMENT, |_map, entries| {
///     count += entries.len();
///     Ok(())
/// })
/// .depends_on(TagClass::BITMAP);
/// # drop(visitor);
/// ```
pub struct FnVisitor<F> {
    class: TagClass,
    dependencies: Vec<TagClass>,
    visit: F,
}

impl<F> FnVisitor<F> {
    /// Visitor of `class` that runs `visit` on the matching entries.
    pub fn new<'map>(class: TagClass, visit: F) -> Self
    where
        F: FnMut(&TagMap<'map>, &[&'map TagEntry]) -> VisitResult,
    {
        Self {
            class,
            dependencies: Vec::new(),
            visit,
        }
    }

    /// Add a class whose visitors must finish first.
    #[must_use]
    pub fn depends_on(mut self, class: TagClass) -> Self {
        if !self.dependencies.contains(&class) {
            self.dependencies.push(class);
        }
        self
    }
}

impl<F> std::fmt::Debug for FnVisitor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnVisitor")
            .field("class", &self.class)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl<'map, F> TagVisitor<'map> for FnVisitor<F>
where
    F: FnMut(&TagMap<'map>, &[&'map TagEntry]) -> VisitResult,
{
    fn visited_class(&self) -> TagClass {
        self.class
    }

    fn dependencies(&self) -> &[TagClass] {
        &self.dependencies
    }

    fn on_visit(&mut self, map: &TagMap<'map>, entries: &[&'map TagEntry]) -> VisitResult {
        (self.visit)(map, entries)
    }
}
