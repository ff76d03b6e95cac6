//! Meta-annotation lookup.
//!
//! A lookup answers "is annotation `T` present on this element?", looking
//! both at the annotations declared directly on the element and, through the
//! annotation types themselves, at annotations on annotations. This lets a
//! composed annotation stand in for the annotations it is annotated with.
//!
//! Search order for a single target type:
//! 1. An annotation of the target type declared directly on the current
//!    element wins immediately.
//! 2. Otherwise every declared annotation is explored depth-first in
//!    declaration order, skipping definitional types and annotation instances
//!    already visited during this search.
//!
//! Each top-level call owns its visited set; lookups never error and report
//! "not found" (including absent inputs) as `None` / `false`.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::config::LookupConfig;
use crate::model::{Annotation, Element, TypeName};
use crate::policy::{ExclusionPolicy, NamespaceExclusion};
use crate::source::MetadataSource;

/// Searches annotations on elements of a [`MetadataSource`].
#[derive(Debug, Clone)]
pub struct AnnotationLookup<S, P = NamespaceExclusion> {
    source: S,
    policy: P,
}

impl<S: MetadataSource> AnnotationLookup<S> {
    /// Lookup excluding the default definitional namespace.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_policy(source, NamespaceExclusion::default())
    }

    /// Lookup excluding the namespaces configured in `config`.
    #[must_use]
    pub fn from_config(source: S, config: &LookupConfig) -> Self {
        Self::with_policy(source, config.exclusion_policy())
    }
}

impl<S: MetadataSource, P: ExclusionPolicy> AnnotationLookup<S, P> {
    #[must_use]
    pub fn with_policy(source: S, policy: P) -> Self {
        Self { source, policy }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Checks whether an annotation of type `target` is present on `element`,
    /// directly or through meta-annotations.
    #[must_use]
    pub fn has_annotation(&self, element: Option<&Element>, target: Option<&TypeName>) -> bool {
        self.find_annotation(element, target).is_some()
    }

    /// Finds the first annotation of type `target` reachable from `element`.
    #[must_use]
    pub fn find_annotation(
        &self,
        element: Option<&Element>,
        target: Option<&TypeName>,
    ) -> Option<&Annotation> {
        let (element, target) = (element?, target?);
        let found = self.search_from(element, target, &mut Vec::new());
        tracing::debug!(
            %element,
            %target,
            found = found.is_some(),
            "Annotation lookup finished"
        );
        found
    }

    /// Finds an annotation of the first type in `targets` that is reachable
    /// from `element`.
    ///
    /// Targets are tried in order, each with its own search: an earlier
    /// target wins even when a later one sits closer to `element`.
    #[must_use]
    pub fn find_any_annotation(
        &self,
        element: Option<&Element>,
        targets: Option<&[TypeName]>,
    ) -> Option<&Annotation> {
        let element = element?;
        targets?
            .iter()
            .find_map(|target| self.find_annotation(Some(element), Some(target)))
    }

    /// Like [`find_annotation`](Self::find_annotation), but also reports the
    /// chain of annotations that led to the match.
    #[must_use]
    pub fn find_annotation_path(
        &self,
        element: Option<&Element>,
        target: Option<&TypeName>,
    ) -> Option<MetaPath<'_>> {
        let (element, target) = (element?, target?);
        let mut trail = Vec::new();
        let found = self.search_from(element, target, &mut trail)?;
        Some(MetaPath { via: trail, found })
    }

    /// Depth-first search over an explicit stack of declaration iterators.
    ///
    /// `trail` holds the annotation that opened each frame above the root, so
    /// `frames.len() == trail.len() + 1` while the search runs.
    fn search_from<'a>(
        &'a self,
        element: &Element,
        target: &TypeName,
        trail: &mut Vec<&'a Annotation>,
    ) -> Option<&'a Annotation> {
        if let Some(found) = self.source.declared_annotation(element, target) {
            tracing::trace!(%element, %target, depth = 0, "Found annotation");
            return Some(found);
        }

        let mut visited: HashSet<Visited<'a>> = HashSet::new();
        let mut frames = vec![self.source.declared_annotations(element).iter()];
        while let Some(frame) = frames.last_mut() {
            let Some(annotation) = frame.next() else {
                frames.pop();
                trail.pop();
                continue;
            };
            let ty = annotation.annotation_type();
            if self.policy.is_definitional(ty) || !visited.insert(Visited(annotation)) {
                continue;
            }
            let depth = trail.len();
            tracing::trace!(annotation = %ty, depth, "Descending into annotation type");

            trail.push(annotation);
            let meta = Element::Type(ty.clone());
            if let Some(found) = self.source.declared_annotation(&meta, target) {
                tracing::trace!(element = %meta, %target, depth = depth + 1, "Found annotation");
                return Some(found);
            }
            frames.push(self.source.declared_annotations(&meta).iter());
        }
        None
    }
}

/// Annotation instance keyed by address.
struct Visited<'a>(&'a Annotation);

impl PartialEq for Visited<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Visited<'_> {}

impl Hash for Visited<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state);
    }
}

/// A match together with the annotations traversed to reach it.
#[derive(Debug, Clone)]
pub struct MetaPath<'a> {
    via: Vec<&'a Annotation>,
    found: &'a Annotation,
}

impl<'a> MetaPath<'a> {
    /// The matching annotation.
    #[must_use]
    pub fn annotation(&self) -> &'a Annotation {
        self.found
    }

    /// Annotations traversed before the match, starting with the one declared
    /// on the searched element. Empty for direct declarations.
    #[must_use]
    pub fn via(&self) -> &[&'a Annotation] {
        &self.via
    }

    /// Number of annotation types traversed; `0` for direct declarations.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.via.len()
    }

    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.via.is_empty()
    }

    /// Types along the path, ending with the matched type.
    pub fn types(&self) -> impl Iterator<Item = &'a TypeName> + '_ {
        self.via
            .iter()
            .chain(std::iter::once(&self.found))
            .map(|&ann| ann.annotation_type())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::policy::NoExclusion;
    use crate::registry::AnnotationRegistry;

    fn ty(name: &str) -> TypeName {
        TypeName::new(name)
    }

    #[test]
    fn direct_annotation_is_found() {
        let el = Element::of_type("app.C");
        let registry = AnnotationRegistry::builder()
            .annotate(el.clone(), Annotation::new("app.Foo"))
            .build();
        let lookup = AnnotationLookup::new(&registry);

        let found = lookup.find_annotation(Some(&el), Some(&ty("app.Foo"))).unwrap();
        assert!(found.same_instance(&registry.declared_annotations(&el)[0]));
        assert!(lookup.has_annotation(Some(&el), Some(&ty("app.Foo"))));
        assert!(!lookup.has_annotation(Some(&el), Some(&ty("app.Bar"))));
    }

    #[test]
    fn meta_annotation_is_found_on_annotation_type() {
        let el = Element::of_type("app.C");
        let registry = AnnotationRegistry::builder()
            .annotate(el.clone(), Annotation::new("app.Foo"))
            .annotate_type("app.Foo", Annotation::new("app.Bar"))
            .build();
        let lookup = AnnotationLookup::new(&registry);

        let bar = lookup.find_annotation(Some(&el), Some(&ty("app.Bar"))).unwrap();
        let on_foo = &registry.declared_annotations(&Element::of_type("app.Foo"))[0];
        assert!(bar.same_instance(on_foo));
    }

    #[test]
    fn definitional_annotations_are_not_traversed() {
        let el = Element::of_type("app.C");
        let registry = AnnotationRegistry::builder()
            .annotate(el.clone(), Annotation::new("lang.annotation.Documented"))
            .annotate_type("lang.annotation.Documented", Annotation::new("app.Hidden"))
            .build();

        let excluding = AnnotationLookup::new(&registry);
        assert!(!excluding.has_annotation(Some(&el), Some(&ty("app.Hidden"))));
        assert!(excluding.has_annotation(Some(&el), Some(&ty("lang.annotation.Documented"))));

        let permissive = AnnotationLookup::with_policy(&registry, NoExclusion);
        assert!(permissive.has_annotation(Some(&el), Some(&ty("app.Hidden"))));
    }

    #[test]
    fn absent_inputs_are_not_found() {
        let el = Element::of_type("app.C");
        let registry = AnnotationRegistry::builder()
            .annotate(el.clone(), Annotation::new("app.Foo"))
            .build();
        let lookup = AnnotationLookup::new(&registry);
        let foo = ty("app.Foo");

        assert!(!lookup.has_annotation(None, Some(&foo)));
        assert!(!lookup.has_annotation(Some(&el), None));
        assert!(lookup.find_annotation(None, None).is_none());
        assert!(lookup.find_any_annotation(None, Some(&[foo])).is_none());
        assert!(lookup.find_any_annotation(Some(&el), None).is_none());
        assert!(lookup.find_any_annotation(Some(&el), Some(&[])).is_none());
        assert!(lookup.find_annotation_path(Some(&el), None).is_none());
    }

    #[test]
    fn path_reports_traversed_annotations() {
        let el = Element::method("app.Api", "list");
        let registry = AnnotationRegistry::builder()
            .annotate(el.clone(), Annotation::new("web.GetJson"))
            .annotate_type("web.GetJson", Annotation::new("web.Get"))
            .annotate_type("web.Get", Annotation::new("web.Mapping"))
            .build();
        let lookup = AnnotationLookup::new(&registry);

        let path = lookup
            .find_annotation_path(Some(&el), Some(&ty("web.Mapping")))
            .unwrap();
        assert_eq!(path.depth(), 2);
        assert!(!path.is_direct());
        let types: Vec<&str> = path.types().map(TypeName::as_str).collect();
        assert_eq!(types, ["web.GetJson", "web.Get", "web.Mapping"]);

        let direct = lookup
            .find_annotation_path(Some(&el), Some(&ty("web.GetJson")))
            .unwrap();
        assert!(direct.is_direct());
        assert_eq!(direct.depth(), 0);
        assert!(direct.via().is_empty());
    }

    #[test]
    fn dead_ends_are_dropped_from_path() {
        let el = Element::of_type("app.C");
        let registry = AnnotationRegistry::builder()
            .annotate(el.clone(), Annotation::new("app.Unrelated"))
            .annotate(el.clone(), Annotation::new("app.Composed"))
            .annotate_type("app.Unrelated", Annotation::new("app.Other"))
            .annotate_type("app.Composed", Annotation::new("app.Target"))
            .build();
        let lookup = AnnotationLookup::new(&registry);

        let path = lookup
            .find_annotation_path(Some(&el), Some(&ty("app.Target")))
            .unwrap();
        let types: Vec<&str> = path.types().map(TypeName::as_str).collect();
        assert_eq!(types, ["app.Composed", "app.Target"]);
    }

    #[test]
    fn closure_policy_is_honoured() {
        let el = Element::of_type("app.C");
        let registry = AnnotationRegistry::builder()
            .annotate(el.clone(), Annotation::new("internal.Marker"))
            .annotate_type("internal.Marker", Annotation::new("app.Target"))
            .build();
        let lookup =
            AnnotationLookup::with_policy(&registry, |t: &TypeName| t.namespace() == "internal");
        assert!(!lookup.has_annotation(Some(&el), Some(&ty("app.Target"))));
    }
}
